//! Integration tests for the dashboard service

use chrono::{DateTime, Duration, Utc};
use prop_lines::dashboard::{DashboardService, JsonlSnapshotSource, LookbackWindow, MemorySnapshotSource};
use prop_lines::snapshot::{BookQuote, Bookmaker, PropType, Snapshot};
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-12-01T16:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn snapshot(player: &str, prop_type: PropType, minutes_ago: i64, line: rust_decimal::Decimal) -> Snapshot {
    Snapshot::new(
        "401672001",
        player,
        prop_type,
        now() + Duration::hours(2),
        now() - Duration::minutes(minutes_ago),
    )
    .with_quote(Bookmaker::FanDuel, BookQuote::priced(line, -115, -105))
    .with_line(Bookmaker::Consensus, line)
}

fn feed() -> Vec<Snapshot> {
    vec![
        snapshot("Bijan Robinson", PropType::RushingYards, 300, dec!(88.5)),
        snapshot("Bijan Robinson", PropType::RushingYards, 70, dec!(86.5)),
        snapshot("Bijan Robinson", PropType::RushingYards, 20, dec!(84.5)),
        snapshot("Bijan Robinson", PropType::RushingYards, 5, dec!(81.5)),
        snapshot("Drake London", PropType::ReceivingYards, 120, dec!(64.5)),
        snapshot("Drake London", PropType::ReceivingYards, 10, dec!(66.5)),
    ]
}

#[tokio::test]
async fn test_memory_source_deltas() {
    let service = DashboardService::new(MemorySnapshotSource::new(feed()), std::time::Duration::from_secs(60));

    let items = service.items_at(None, 24.0, now()).await.unwrap();
    assert_eq!(items.len(), 2);

    let bijan = items.iter().find(|i| i.player == "Bijan Robinson").unwrap();
    let consensus = &bijan.books[&Bookmaker::Consensus];
    assert_eq!(consensus.line, dec!(81.5));
    assert_eq!(consensus.deltas.get(LookbackWindow::M15).absolute, Some(dec!(-3.0)));
    assert_eq!(consensus.deltas.get(LookbackWindow::SinceOpen).absolute, Some(dec!(-7.0)));

    let fanduel = &bijan.books[&Bookmaker::FanDuel];
    assert_eq!(fanduel.over_price, Some(-115));
}

#[tokio::test]
async fn test_prop_filter_and_cache() {
    let source = MemorySnapshotSource::new(feed());
    let service = DashboardService::new(source.clone(), std::time::Duration::from_secs(60));

    let receiving = service
        .items_at(Some(PropType::ReceivingYards), 24.0, now())
        .await
        .unwrap();
    assert_eq!(receiving.len(), 1);
    assert_eq!(receiving[0].player, "Drake London");

    // New snapshots are not visible until the cache is invalidated
    source
        .append(vec![snapshot("Kyle Pitts", PropType::ReceivingYards, 1, dec!(40.5))])
        .await;
    let cached = service
        .items_at(Some(PropType::ReceivingYards), 24.0, now())
        .await
        .unwrap();
    assert_eq!(cached.len(), 1);

    service.invalidate().await;
    let fresh = service
        .items_at(Some(PropType::ReceivingYards), 24.0, now())
        .await
        .unwrap();
    assert_eq!(fresh.len(), 2);
}

#[tokio::test]
async fn test_jsonl_source() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshots.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for snapshot in feed() {
        writeln!(file, "{}", serde_json::to_string(&snapshot).unwrap()).unwrap();
    }
    drop(file);

    let service = DashboardService::new(JsonlSnapshotSource::new(&path), std::time::Duration::from_secs(60));
    let items = service.items_at(Some(PropType::RushingYards), 1.0, now()).await.unwrap();

    // A one-hour lookback still reaches the full window history for deltas
    assert_eq!(items.len(), 1);
    let consensus = &items[0].books[&Bookmaker::Consensus];
    assert_eq!(consensus.deltas.get(LookbackWindow::SinceOpen).absolute, Some(dec!(-7.0)));
    assert_eq!(consensus.deltas.get(LookbackWindow::H1).absolute, Some(dec!(-5.0)));
}
