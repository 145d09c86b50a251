//! Cached dashboard service

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::aggregator::{build_dashboard, DashboardItem};
use super::cache::TtlCache;
use super::window::LookbackWindow;
use crate::data::read_snapshots;
use crate::snapshot::{PropType, Snapshot};
use crate::telemetry::{record_duration, DASHBOARD_RECOMPUTE_SECONDS};

/// Source of raw snapshots for the dashboard
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Snapshots observed at or after `since`, optionally for one prop type
    async fn snapshots_since(
        &self,
        prop_type: Option<PropType>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Snapshot>>;
}

fn keep(snapshot: &Snapshot, prop_type: Option<PropType>, since: DateTime<Utc>) -> bool {
    snapshot.observed_at >= since && prop_type.map_or(true, |p| snapshot.prop_type == p)
}

/// In-memory snapshot source, appended to by the collection side
///
/// Clones share the same snapshot buffer.
#[derive(Clone, Default)]
pub struct MemorySnapshotSource {
    snapshots: Arc<RwLock<Vec<Snapshot>>>,
}

impl MemorySnapshotSource {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(snapshots)),
        }
    }

    pub async fn append(&self, batch: impl IntoIterator<Item = Snapshot>) {
        self.snapshots.write().await.extend(batch);
    }

    pub async fn replace(&self, snapshots: Vec<Snapshot>) {
        *self.snapshots.write().await = snapshots;
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotSource for MemorySnapshotSource {
    async fn snapshots_since(
        &self,
        prop_type: Option<PropType>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .filter(|s| keep(s, prop_type, since))
            .cloned()
            .collect())
    }
}

/// Snapshot source reading a JSON Lines feed file on every fill
pub struct JsonlSnapshotSource {
    path: PathBuf,
}

impl JsonlSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for JsonlSnapshotSource {
    async fn snapshots_since(
        &self,
        prop_type: Option<PropType>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Snapshot>> {
        let path = self.path.clone();
        let snapshots = tokio::task::spawn_blocking(move || read_snapshots(path)).await??;
        Ok(snapshots
            .into_iter()
            .filter(|s| keep(s, prop_type, since))
            .collect())
    }
}

/// Longest accepted dashboard lookback (hours)
pub const MAX_LOOKBACK_HOURS: f64 = 24.0 * 365.0;

/// Cache key: prop type filter plus lookback in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DashboardKey {
    pub prop_type: Option<PropType>,
    pub lookback_minutes: i64,
}

impl DashboardKey {
    /// Fails unless the lookback is in (0, `MAX_LOOKBACK_HOURS`]
    pub fn new(prop_type: Option<PropType>, lookback_hours: f64) -> anyhow::Result<Self> {
        if !(lookback_hours > 0.0 && lookback_hours <= MAX_LOOKBACK_HOURS) {
            anyhow::bail!(
                "lookback must be in (0, {}] hours, got {}",
                MAX_LOOKBACK_HOURS,
                lookback_hours
            );
        }
        Ok(Self {
            prop_type,
            lookback_minutes: ((lookback_hours * 60.0).round() as i64).max(1),
        })
    }

    pub fn lookback(&self) -> anyhow::Result<Duration> {
        Duration::try_minutes(self.lookback_minutes)
            .ok_or_else(|| anyhow::anyhow!("lookback of {} minutes out of range", self.lookback_minutes))
    }
}

/// Dashboard rows served through a single-flight TTL cache
pub struct DashboardService<S> {
    source: S,
    cache: TtlCache<DashboardKey, Vec<DashboardItem>>,
}

impl<S: SnapshotSource> DashboardService<S> {
    pub fn new(source: S, ttl: std::time::Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Dashboard rows as of now
    pub async fn items(
        &self,
        prop_type: Option<PropType>,
        lookback_hours: f64,
    ) -> anyhow::Result<Arc<Vec<DashboardItem>>> {
        self.items_at(prop_type, lookback_hours, Utc::now()).await
    }

    /// Dashboard rows as of `now`
    ///
    /// Rows are the series observed within the lookback. Their window deltas
    /// are computed over at least `LookbackWindow::history_span()` of
    /// history, so the 24h window has a baseline under a 24h lookback.
    ///
    /// A cached value is returned as-is while fresh, even if `now` differs
    /// from the time it was computed for.
    pub async fn items_at(
        &self,
        prop_type: Option<PropType>,
        lookback_hours: f64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Arc<Vec<DashboardItem>>> {
        let key = DashboardKey::new(prop_type, lookback_hours)?;
        let lookback = key.lookback()?;
        self.cache
            .get_or_try_fill(key, || async move {
                let started = Instant::now();
                let since = now - lookback.max(LookbackWindow::history_span());
                let snapshots = self.source.snapshots_since(prop_type, since).await?;
                let fetched = snapshots.len();

                let cutoff = now - lookback;
                let items: Vec<DashboardItem> = build_dashboard(snapshots, now)
                    .into_iter()
                    .filter(|item| item.last_observed_at().is_some_and(|t| t >= cutoff))
                    .collect();

                record_duration(DASHBOARD_RECOMPUTE_SECONDS, started.elapsed());
                tracing::debug!(
                    prop_type = ?prop_type,
                    lookback_minutes = key.lookback_minutes,
                    snapshots = fetched,
                    items = items.len(),
                    "Dashboard recomputed"
                );
                Ok::<_, anyhow::Error>(items)
            })
            .await
    }

    /// Drop all cached dashboards, called after new snapshots are persisted
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
        tracing::debug!("Dashboard cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Bookmaker;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-05T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn snap(player: &str, prop: PropType, minutes_ago: i64, line: rust_decimal::Decimal) -> Snapshot {
        Snapshot::new("evt", player, prop, now() + Duration::hours(2), now() - Duration::minutes(minutes_ago))
            .with_line(Bookmaker::Consensus, line)
    }

    struct CountingSource {
        inner: MemorySnapshotSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn snapshots_since(
            &self,
            prop_type: Option<PropType>,
            since: DateTime<Utc>,
        ) -> anyhow::Result<Vec<Snapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.snapshots_since(prop_type, since).await
        }
    }

    #[tokio::test]
    async fn test_memory_source_filters() {
        let source = MemorySnapshotSource::new(vec![
            snap("a", PropType::RushingYards, 600, dec!(50.5)),
            snap("a", PropType::RushingYards, 30, dec!(48.5)),
            snap("b", PropType::ReceivingYards, 30, dec!(70.5)),
        ]);

        let since = now() - Duration::hours(1);
        assert_eq!(source.snapshots_since(None, since).await.unwrap().len(), 2);
        let rushing = source
            .snapshots_since(Some(PropType::RushingYards), since)
            .await
            .unwrap();
        assert_eq!(rushing.len(), 1);
        assert_eq!(rushing[0].player, "a");
    }

    #[tokio::test]
    async fn test_items_cached_per_key() {
        let source = CountingSource {
            inner: MemorySnapshotSource::new(vec![
                snap("a", PropType::RushingYards, 30, dec!(48.5)),
                snap("b", PropType::ReceivingYards, 30, dec!(70.5)),
            ]),
            calls: AtomicUsize::new(0),
        };
        let service = DashboardService::new(source, std::time::Duration::from_secs(30));

        let all = service.items_at(None, 24.0, now()).await.unwrap();
        let again = service.items_at(None, 24.0, now()).await.unwrap();
        let rushing = service
            .items_at(Some(PropType::RushingYards), 24.0, now())
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert!(Arc::ptr_eq(&all, &again));
        assert_eq!(rushing.len(), 1);
        assert_eq!(service.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_new_snapshots() {
        let service = DashboardService::new(
            MemorySnapshotSource::new(vec![snap("a", PropType::RushingYards, 30, dec!(48.5))]),
            std::time::Duration::from_secs(30),
        );

        assert_eq!(service.items_at(None, 24.0, now()).await.unwrap().len(), 1);

        service
            .source()
            .append(vec![snap("b", PropType::RushingYards, 20, dec!(60.5))])
            .await;
        assert_eq!(service.items_at(None, 24.0, now()).await.unwrap().len(), 1);

        service.invalidate().await;
        assert_eq!(service.items_at(None, 24.0, now()).await.unwrap().len(), 2);
    }

    #[test]
    fn test_key_rounds_to_minutes() {
        assert_eq!(DashboardKey::new(None, 1.5).unwrap().lookback_minutes, 90);
        assert_eq!(DashboardKey::new(None, 0.001).unwrap().lookback_minutes, 1);
        assert_eq!(
            DashboardKey::new(Some(PropType::RushingYards), 24.0).unwrap(),
            DashboardKey::new(Some(PropType::RushingYards), 24.0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalid_lookback_rejected() {
        let service = DashboardService::new(
            MemorySnapshotSource::new(vec![snap("a", PropType::RushingYards, 30, dec!(48.5))]),
            std::time::Duration::from_secs(30),
        );

        for hours in [1e300, MAX_LOOKBACK_HOURS + 1.0, 0.0, -6.0, f64::NAN, f64::INFINITY] {
            assert!(service.items_at(None, hours, now()).await.is_err(), "{hours}");
        }
        assert!(service.items_at(None, MAX_LOOKBACK_HOURS, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_day_window_has_baseline_under_day_lookback() {
        let service = DashboardService::new(
            MemorySnapshotSource::new(vec![
                snap("a", PropType::RushingYards, 25 * 60, dec!(60.5)),
                snap("a", PropType::RushingYards, 23 * 60, dec!(55.5)),
                snap("a", PropType::RushingYards, 0, dec!(50.5)),
            ]),
            std::time::Duration::from_secs(30),
        );

        let items = service.items_at(None, 24.0, now()).await.unwrap();
        let consensus = &items[0].books[&Bookmaker::Consensus];
        assert_eq!(consensus.deltas.h24.absolute, Some(dec!(-10.0)));
        assert_eq!(consensus.deltas.since_open.old_line, Some(dec!(60.5)));
    }

    #[tokio::test]
    async fn test_rows_limited_to_lookback() {
        let service = DashboardService::new(
            MemorySnapshotSource::new(vec![
                snap("stale", PropType::RushingYards, 30 * 60, dec!(40.5)),
                snap("fresh", PropType::RushingYards, 30 * 60, dec!(70.5)),
                snap("fresh", PropType::RushingYards, 10, dec!(68.5)),
            ]),
            std::time::Duration::from_secs(30),
        );

        let items = service.items_at(None, 24.0, now()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].player, "fresh");
        let consensus = &items[0].books[&Bookmaker::Consensus];
        assert_eq!(consensus.deltas.since_open.absolute, Some(dec!(-2.0)));

        let wider = service.items_at(None, 48.0, now()).await.unwrap();
        assert_eq!(wider.len(), 2);
    }
}
