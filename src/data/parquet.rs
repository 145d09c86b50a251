//! Parquet export of movements and analysis results

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray,
    TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::analysis::AnalysisResult;
use crate::movement::Movement;

fn timestamp_field(name: &str, nullable: bool) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        nullable,
    )
}

fn timestamps(values: Vec<i64>) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from(values).with_timezone("UTC"))
}

fn decimals(values: impl Iterator<Item = Decimal>) -> ArrayRef {
    let strings: Vec<String> = values.map(|d| d.to_string()).collect();
    Arc::new(StringArray::from(
        strings.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    ))
}

/// Movement schema
pub fn movement_schema() -> Schema {
    Schema::new(vec![
        Field::new("event_id", DataType::Utf8, false),
        Field::new("player", DataType::Utf8, false),
        Field::new("prop_type", DataType::Utf8, false),
        timestamp_field("game_commence_time", false),
        Field::new("initial_line", DataType::Utf8, false), // Decimal as string
        Field::new("final_line", DataType::Utf8, false),
        timestamp_field("initial_observed_at", false),
        timestamp_field("final_observed_at", false),
        Field::new("movement_absolute", DataType::Utf8, false),
        Field::new("movement_pct", DataType::Utf8, false),
        Field::new("hours_before_kickoff", DataType::Utf8, false),
        Field::new("actual", DataType::Int32, true),
        Field::new("went_over", DataType::Boolean, true),
        Field::new("went_under", DataType::Boolean, true),
    ])
}

/// Analysis result schema
pub fn analysis_schema() -> Schema {
    Schema::new(vec![
        Field::new("analysis_name", DataType::Utf8, false),
        Field::new("prop_type", DataType::Utf8, true),
        Field::new("threshold_pct", DataType::Utf8, false),
        Field::new("threshold_abs", DataType::Utf8, false),
        Field::new("hours_before", DataType::Utf8, false),
        timestamp_field("date_range_start", false),
        timestamp_field("date_range_end", false),
        Field::new("sample_size", DataType::UInt64, false),
        Field::new("over_count", DataType::UInt64, false),
        Field::new("under_count", DataType::UInt64, false),
        Field::new("push_count", DataType::UInt64, false),
        Field::new("over_rate", DataType::Float64, false),
        Field::new("under_rate", DataType::Float64, false),
        Field::new("chi_square", DataType::Float64, false),
        Field::new("p_value", DataType::Float64, false),
        Field::new("is_significant", DataType::Boolean, false),
        Field::new("ci_low", DataType::Float64, false),
        Field::new("ci_high", DataType::Float64, false),
        Field::new("baseline_sample_size", DataType::UInt64, false),
        Field::new("baseline_over_rate", DataType::Float64, true),
        Field::new("baseline_under_rate", DataType::Float64, true),
    ])
}

/// Writes Parquet files into an output directory
pub struct ParquetExporter {
    output_dir: PathBuf,
}

impl ParquetExporter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Generate file path for a given timestamp and prefix
    pub fn file_path(&self, prefix: &str, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!("{}_{}.parquet", prefix, timestamp.format("%Y%m%d_%H%M%S"));
        self.output_dir.join(filename)
    }

    fn write_batch(&self, path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> anyhow::Result<()> {
        self.ensure_dir()?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        let batch = RecordBatch::try_new(schema, columns)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    /// Write movements; an empty slice writes nothing
    pub fn write_movements(&self, path: &Path, movements: &[Movement]) -> anyhow::Result<()> {
        if movements.is_empty() {
            return Ok(());
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(
                movements.iter().map(|m| m.event_id.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                movements.iter().map(|m| m.player.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                movements.iter().map(|m| m.prop_type.as_str()).collect::<Vec<_>>(),
            )),
            timestamps(movements.iter().map(|m| m.game_commence_time.timestamp_micros()).collect()),
            decimals(movements.iter().map(|m| m.initial_line)),
            decimals(movements.iter().map(|m| m.final_line)),
            timestamps(movements.iter().map(|m| m.initial_observed_at.timestamp_micros()).collect()),
            timestamps(movements.iter().map(|m| m.final_observed_at.timestamp_micros()).collect()),
            decimals(movements.iter().map(|m| m.movement_absolute)),
            decimals(movements.iter().map(|m| m.movement_pct)),
            decimals(movements.iter().map(|m| m.hours_before_kickoff)),
            Arc::new(Int32Array::from(movements.iter().map(|m| m.actual).collect::<Vec<_>>())),
            Arc::new(BooleanArray::from(movements.iter().map(|m| m.went_over).collect::<Vec<_>>())),
            Arc::new(BooleanArray::from(movements.iter().map(|m| m.went_under).collect::<Vec<_>>())),
        ];

        self.write_batch(path, Arc::new(movement_schema()), columns)?;
        tracing::debug!(path = ?path, count = movements.len(), "Wrote movements to Parquet");
        Ok(())
    }

    /// Write analysis results; an empty slice writes nothing
    pub fn write_analysis_results(&self, path: &Path, results: &[AnalysisResult]) -> anyhow::Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let floats = |f: fn(&AnalysisResult) -> f64| -> ArrayRef {
            Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
        };
        let counts = |f: fn(&AnalysisResult) -> usize| -> ArrayRef {
            Arc::new(UInt64Array::from(
                results.iter().map(|r| f(r) as u64).collect::<Vec<_>>(),
            ))
        };

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(
                results.iter().map(|r| r.analysis_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                results
                    .iter()
                    .map(|r| r.prop_type.map(|p| p.as_str()))
                    .collect::<Vec<_>>(),
            )),
            decimals(results.iter().map(|r| r.threshold_pct)),
            decimals(results.iter().map(|r| r.threshold_abs)),
            decimals(results.iter().map(|r| r.hours_before)),
            timestamps(results.iter().map(|r| r.date_range_start.timestamp_micros()).collect()),
            timestamps(results.iter().map(|r| r.date_range_end.timestamp_micros()).collect()),
            counts(|r| r.sample_size),
            counts(|r| r.over_count),
            counts(|r| r.under_count),
            counts(|r| r.push_count),
            floats(|r| r.over_rate),
            floats(|r| r.under_rate),
            floats(|r| r.chi_square),
            floats(|r| r.p_value),
            Arc::new(BooleanArray::from(
                results.iter().map(|r| r.is_significant).collect::<Vec<_>>(),
            )),
            floats(|r| r.ci_low),
            floats(|r| r.ci_high),
            counts(|r| r.baseline.total),
            Arc::new(Float64Array::from(
                results.iter().map(|r| r.baseline.over_rate).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                results.iter().map(|r| r.baseline.under_rate).collect::<Vec<_>>(),
            )),
        ];

        self.write_batch(path, Arc::new(analysis_schema()), columns)?;
        tracing::debug!(path = ?path, count = results.len(), "Wrote analysis results to Parquet");
        Ok(())
    }
}

/// Reader for exported movement files
pub struct ParquetReader {
    path: PathBuf,
}

impl ParquetReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read movements back from a Parquet file
    pub fn read_movements(&self) -> anyhow::Result<Vec<Movement>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut movements = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let strings = |idx: usize| {
                batch
                    .column(idx)
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| anyhow::anyhow!("Invalid string column {}", idx))
            };
            let times = |idx: usize| {
                batch
                    .column(idx)
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column {}", idx))
            };
            let bools = |idx: usize| {
                batch
                    .column(idx)
                    .as_any()
                    .downcast_ref::<BooleanArray>()
                    .ok_or_else(|| anyhow::anyhow!("Invalid boolean column {}", idx))
            };

            let event_ids = strings(0)?;
            let players = strings(1)?;
            let prop_types = strings(2)?;
            let kickoffs = times(3)?;
            let initial_lines = strings(4)?;
            let final_lines = strings(5)?;
            let initial_times = times(6)?;
            let final_times = times(7)?;
            let absolutes = strings(8)?;
            let pcts = strings(9)?;
            let hours = strings(10)?;
            let actuals = batch
                .column(11)
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| anyhow::anyhow!("Invalid actual column"))?;
            let overs = bools(12)?;
            let unders = bools(13)?;

            let ts = |array: &TimestampMicrosecondArray, i: usize| {
                DateTime::from_timestamp_micros(array.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))
            };

            for i in 0..batch.num_rows() {
                movements.push(Movement {
                    event_id: event_ids.value(i).to_string(),
                    player: players.value(i).to_string(),
                    prop_type: prop_types.value(i).parse().map_err(anyhow::Error::msg)?,
                    game_commence_time: ts(kickoffs, i)?,
                    initial_line: Decimal::from_str(initial_lines.value(i))?,
                    final_line: Decimal::from_str(final_lines.value(i))?,
                    initial_observed_at: ts(initial_times, i)?,
                    final_observed_at: ts(final_times, i)?,
                    movement_absolute: Decimal::from_str(absolutes.value(i))?,
                    movement_pct: Decimal::from_str(pcts.value(i))?,
                    hours_before_kickoff: Decimal::from_str(hours.value(i))?,
                    actual: (!actuals.is_null(i)).then(|| actuals.value(i)),
                    went_over: (!overs.is_null(i)).then(|| overs.value(i)),
                    went_under: (!unders.is_null(i)).then(|| unders.value(i)),
                });
            }
        }

        Ok(movements)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::PropType;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn movement(player: &str, actual: Option<i32>) -> Movement {
        let kickoff = DateTime::parse_from_rfc3339("2025-01-05T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Movement {
            event_id: "401671789".to_string(),
            player: player.to_string(),
            prop_type: PropType::ReceivingYards,
            game_commence_time: kickoff,
            initial_line: dec!(52.5),
            final_line: dec!(46.0),
            initial_observed_at: kickoff - Duration::hours(6),
            final_observed_at: kickoff - Duration::minutes(30),
            movement_absolute: dec!(-6.5),
            movement_pct: dec!(-12.38),
            hours_before_kickoff: dec!(0.5),
            actual,
            went_over: actual.map(|a| a > 46),
            went_under: actual.map(|a| a < 46),
        }
    }

    #[test]
    fn test_movement_schema() {
        let schema = movement_schema();
        assert_eq!(schema.fields().len(), 14);
        assert_eq!(schema.field(0).name(), "event_id");
        assert!(schema.field(11).is_nullable());
    }

    #[test]
    fn test_analysis_schema() {
        assert_eq!(analysis_schema().fields().len(), 21);
    }

    #[test]
    fn test_file_path() {
        let exporter = ParquetExporter::new(PathBuf::from("/out"));
        let timestamp = DateTime::parse_from_rfc3339("2025-01-04T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            exporter.file_path("movements", timestamp),
            PathBuf::from("/out/movements_20250104_123000.parquet")
        );
    }

    #[test]
    fn test_write_and_read_movements() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = ParquetExporter::new(temp_dir.path().to_path_buf());

        let movements = vec![movement("Puka Nacua", Some(40)), movement("Cooper Kupp", None)];
        let path = exporter.file_path("movements", Utc::now());
        exporter.write_movements(&path, &movements).unwrap();

        let read = ParquetReader::new(path).read_movements().unwrap();
        assert_eq!(read, movements);
    }

    #[test]
    fn test_write_empty_movements() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = ParquetExporter::new(temp_dir.path().to_path_buf());

        let path = exporter.file_path("movements", Utc::now());
        exporter.write_movements(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_write_analysis_results() {
        use crate::analysis::{AnalysisParams, CorrelationAnalyzer};
        use crate::movement::DropThreshold;
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let temp_dir = TempDir::new().unwrap();
        let exporter = ParquetExporter::new(temp_dir.path().to_path_buf());

        let movements = vec![movement("Puka Nacua", Some(40)), movement("Cooper Kupp", Some(71))];
        let params = AnalysisParams::new("late_drops", DropThreshold::new(dec!(10), dec!(5)), dec!(3));
        let result = CorrelationAnalyzer::with_defaults().run(&movements, &params).unwrap();

        let path = exporter.file_path("analysis", Utc::now());
        exporter.write_analysis_results(&path, &[result]).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 1);
        assert_eq!(batches[0].num_columns(), 21);

        let names = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(names.value(0), "late_drops");
        // No baseline movements, so the baseline rates are null
        assert!(batches[0].column(20).is_null(0));
    }
}
