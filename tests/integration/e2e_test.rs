//! End-to-end integration tests: feed -> detect -> store -> analyze -> report

use chrono::{DateTime, Duration, Utc};
use prop_lines::analysis::{
    summary_report, AnalysisStore, Conclusion, CorrelationAnalyzer, ThesisPolicy, ThresholdGrid,
};
use prop_lines::config::Config;
use prop_lines::data::{read_game_stats, read_snapshots, ParquetExporter, ParquetReader};
use prop_lines::movement::{GameStat, MovementFilter, MovementStore, StatsIndex};
use prop_lines::pipeline::DetectionBatch;
use prop_lines::snapshot::{Bookmaker, PropType, Snapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn kickoff() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-10-20T17:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn snapshot(player: &str, hours_before: i64, line: Decimal) -> Snapshot {
    Snapshot::new(
        format!("evt-{player}"),
        player,
        PropType::RushingYards,
        kickoff(),
        kickoff() - Duration::hours(hours_before),
    )
    .with_line(Bookmaker::Consensus, line)
    .with_line(Bookmaker::DraftKings, line + dec!(0.5))
}

fn stat(player: &str, yards: i32) -> GameStat {
    let mut stat = GameStat::new(format!("evt-{player}"), player);
    stat.rushing_yards = Some(yards);
    stat
}

fn write_jsonl<T: serde::Serialize>(path: &Path, records: &[T]) {
    let mut file = std::fs::File::create(path).unwrap();
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
    }
}

/// 40 late drops (28 under, 12 over) and 20 flat lines (10 under, 10 over)
fn write_feeds(dir: &Path) -> Config {
    let mut snapshots = Vec::new();
    let mut stats = Vec::new();

    for i in 0..40 {
        let player = format!("Dropper {i:02}");
        snapshots.push(snapshot(&player, 8, dec!(92.5)));
        snapshots.push(snapshot(&player, 1, dec!(82.5)));
        stats.push(stat(&player, if i < 28 { 70 } else { 95 }));
    }
    for i in 0..20 {
        let player = format!("Steady {i:02}");
        snapshots.push(snapshot(&player, 8, dec!(80.5)));
        snapshots.push(snapshot(&player, 1, dec!(80.5)));
        stats.push(stat(&player, if i < 10 { 60 } else { 100 }));
    }

    let mut config = Config::default();
    config.data.snapshots_path = dir.join("snapshots.jsonl");
    config.data.stats_path = dir.join("game_stats.jsonl");
    config.data.movements_path = dir.join("movements.json");
    config.data.results_path = dir.join("analysis_results.json");
    config.data.export_dir = dir.join("output");
    config.detection.keep_all_magnitudes = true;

    write_jsonl(&config.data.snapshots_path, &snapshots);
    write_jsonl(&config.data.stats_path, &stats);
    config
}

fn detect(config: &Config) -> MovementStore {
    let snapshots = read_snapshots(&config.data.snapshots_path).unwrap();
    let stats: StatsIndex = read_game_stats(&config.data.stats_path)
        .unwrap()
        .into_iter()
        .collect();

    let report = DetectionBatch::from(&config.detection).run(snapshots, &stats, kickoff());
    assert!(!report.has_failures());

    let mut store = MovementStore::load(&config.data.movements_path).unwrap();
    for movement in report.movements {
        store.upsert(movement);
    }
    store.save(&config.data.movements_path).unwrap();
    store
}

#[test]
fn test_detect_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_feeds(temp_dir.path());

    let first = detect(&config);
    assert_eq!(first.len(), 60);

    let second = detect(&config);
    assert_eq!(second.len(), 60);

    let reloaded = MovementStore::load(&config.data.movements_path).unwrap();
    assert_eq!(reloaded.len(), 60);
    assert_eq!(reloaded.with_outcomes().len(), 60);
}

#[test]
fn test_redetect_without_stats_keeps_outcomes() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_feeds(temp_dir.path());
    let mut store = detect(&config);
    assert_eq!(store.with_outcomes().len(), 60);

    let snapshots = read_snapshots(&config.data.snapshots_path).unwrap();
    let report = DetectionBatch::from(&config.detection).run(snapshots, &StatsIndex::new(), kickoff());
    assert_eq!(report.matched(), 0);
    for movement in report.movements {
        store.upsert(movement);
    }

    assert_eq!(store.len(), 60);
    assert_eq!(store.with_outcomes().len(), 60);
}

#[test]
fn test_movement_queries() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_feeds(temp_dir.path());
    let store = detect(&config);

    let drops = MovementFilter {
        min_drop_pct: Some(dec!(10)),
        ..Default::default()
    };
    assert_eq!(store.query(&drops).len(), 40);

    let summary = store.summary(&drops);
    assert_eq!(summary.with_results, 40);
    assert_eq!(summary.under_count, 28);
    assert_eq!(summary.over_count, 12);

    let player = MovementFilter {
        player: Some("steady 0".to_string()),
        ..Default::default()
    };
    assert_eq!(store.query(&player).len(), 10);
}

#[test]
fn test_analysis_supports_thesis() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_feeds(temp_dir.path());
    let movements = detect(&config).with_outcomes();

    let policy = ThesisPolicy::from(&config.analysis);
    let results = ThresholdGrid::from(&config.analysis).run(&CorrelationAnalyzer::new(policy), &movements);

    let mut store = AnalysisStore::load(&config.data.results_path).unwrap();
    let (inserted, updated) = store.upsert_all(results.clone());
    assert_eq!(inserted, results.len());
    assert_eq!(updated, 0);
    store.save(&config.data.results_path).unwrap();

    let main = store.get("thesis_all_pct10.0_abs5.0_hrs3.0").unwrap();
    assert_eq!(main.sample_size, 40);
    assert_eq!(main.under_count, 28);
    assert_eq!(main.baseline.total, 20);
    assert!((main.expected_under_rate - 0.5).abs() < 1e-12);
    assert!((main.chi_square - 6.4).abs() < 1e-9);
    assert!(main.is_significant);
    assert!(main.ci_low > 0.5 && main.ci_high < 0.85);
    assert_eq!(Conclusion::of(main, &policy), Conclusion::Supported);

    // Only rushing props in the feed
    assert!(store.get("thesis_receiving_yards_pct10.0_abs5.0_hrs3.0").is_none());

    let report = summary_report(&store.to_vec(), &config.detection.primary_set(), &policy);
    assert!(report.contains("The thesis is SUPPORTED"));
    assert!(report.contains("Under Rate:       70.0% (28/40)"));

    // Re-running upserts the same names
    let mut reloaded = AnalysisStore::load(&config.data.results_path).unwrap();
    let (inserted, updated) = reloaded.upsert_all(results);
    assert_eq!(inserted, 0);
    assert_eq!(updated, reloaded.len());
}

#[test]
fn test_parquet_export_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_feeds(temp_dir.path());
    let store = detect(&config);

    let exporter = ParquetExporter::new(config.data.export_dir.clone());
    exporter.ensure_dir().unwrap();
    let path = exporter.file_path("movements", kickoff());
    let movements: Vec<_> = store.iter().cloned().collect();
    exporter.write_movements(&path, &movements).unwrap();

    let read = ParquetReader::new(path).read_movements().unwrap();
    assert_eq!(read, movements);
}

#[test]
fn test_example_config_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();
    assert_eq!(config.detection.threshold_pct, dec!(10.0));
    assert_eq!(ThresholdGrid::from(&config.analysis).len(), 15);
}
