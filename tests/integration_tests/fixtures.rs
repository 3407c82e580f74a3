//! Test fixtures for integration tests
//!
//! Sample snapshot content and helpers for writing it to disk.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{ArrayRef, RecordBatch, StringArray, TimestampMicrosecondArray};
use hubstats::config::Config;
use hubstats::engine::SnapshotSet;
use tempfile::TempDir;

use crate::common::{at, space, tagged};

/// Models snapshot as JSON Lines, mixed timestamp spellings
pub const MODELS_JSONL: &str = r#"{"id":"org/a","createdAt":"2023-01-05T10:00:00Z","tags":["license:mit","base_model:X"]}
{"id":"org/b","createdAt":"2023-01-20 08:30:00","tags":["license:mit"],"downloads":12}

{"id":"org/c","createdAt":"2023-03-02","tags":["license:apache-2.0","base_model:X"]}
"#;

/// Datasets snapshot as a JSON array
pub const DATASETS_JSON: &str = r#"[
  {"id":"org/d1","createdAt":"2023-02-11T00:00:00Z","tags":["license:cc-by-4.0"]},
  {"id":"org/d2","createdAt":"2023-03-15T00:00:00Z"}
]"#;

/// The models of [`MODELS_JSONL`] as a parquet file, `createdAt` in UTC microseconds
pub fn models_parquet() -> Vec<u8> {
    let rows = [
        ("org/a", at_hms(2023, 1, 5, 10, 0), &["license:mit", "base_model:X"][..]),
        ("org/b", at_hms(2023, 1, 20, 8, 30), &["license:mit"][..]),
        ("org/c", at_hms(2023, 3, 2, 0, 0), &["license:apache-2.0", "base_model:X"][..]),
    ];

    let mut tags = ListBuilder::new(StringBuilder::new());
    for (_, _, row_tags) in &rows {
        for tag in *row_tags {
            tags.values().append_value(tag);
        }
        tags.append(true);
    }

    let batch = RecordBatch::try_from_iter([
        (
            "id",
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0))) as ArrayRef,
        ),
        (
            "createdAt",
            Arc::new(
                TimestampMicrosecondArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>())
                    .with_timezone("UTC"),
            ) as ArrayRef,
        ),
        ("tags", Arc::new(tags.finish()) as ArrayRef),
    ])
    .expect("build record batch");

    let mut buf = Vec::new();
    let mut writer = parquet::arrow::ArrowWriter::try_new(&mut buf, batch.schema(), None)
        .expect("create parquet writer");
    writer.write(&batch).expect("write parquet batch");
    writer.close().expect("finish parquet file");
    buf
}

fn at_hms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    use chrono::TimeZone;
    chrono::Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
        .timestamp_micros()
}

/// Spaces snapshot as JSON Lines, one without an SDK
pub const SPACES_JSONL: &str = r#"{"id":"org/s1","createdAt":"2023-01-01T00:00:00Z","sdk":"gradio"}
{"id":"org/s2","createdAt":"2023-03-31T23:59:59Z","sdk":null}
"#;

/// Snapshot set for the shared scenarios
///
/// - models created 2023-01, 2023-01, 2023-03
/// - `license:mit` on 3 models, `license:apache-2.0` on 2
/// - `base_model:X` on one model in 2023-05 and one in 2023-07
pub fn scenario_snapshots() -> SnapshotSet {
    SnapshotSet {
        models: vec![
            tagged("org/m1", at(2023, 1, 3), &["license:mit"]),
            tagged("org/m2", at(2023, 1, 28), &["license:mit", "text-generation"]),
            tagged("org/m3", at(2023, 3, 9), &["license:mit"]),
            tagged("org/m4", at(2023, 5, 17), &["license:apache-2.0", "base_model:X"]),
            tagged("org/m5", at(2023, 7, 1), &["license:apache-2.0", "base_model:X"]),
        ],
        datasets: vec![
            tagged("org/d1", at(2023, 1, 4), &["license:cc-by-4.0"]),
            tagged("org/d2", at(2023, 5, 4), &[]),
        ],
        spaces: vec![
            space("org/s1", at(2023, 3, 1), Some("gradio")),
            space("org/s2", at(2023, 3, 2), Some("gradio")),
            space("org/s3", at(2023, 7, 2), Some("streamlit")),
            space("org/s4", at(2023, 7, 3), None),
        ],
    }
}

/// Write the three fixture snapshots into `dir` and point a config at them
pub fn write_fixture_files(dir: &Path) -> Config {
    write_file(&dir.join("models.jsonl"), MODELS_JSONL);
    write_file(&dir.join("datasets.json"), DATASETS_JSON);
    write_file(&dir.join("spaces.jsonl"), SPACES_JSONL);

    let mut config = Config::default();
    config.sources.models = dir.join("models.jsonl").display().to_string();
    config.sources.datasets = dir.join("datasets.json").display().to_string();
    config.sources.spaces = dir.join("spaces.jsonl").display().to_string();
    config
}

pub fn write_file(path: &Path, content: &str) {
    let mut file = std::fs::File::create(path).expect("create fixture file");
    file.write_all(content.as_bytes()).expect("write fixture file");
}

/// Temp dir holding the fixture snapshots, plus a config pointing at them
pub fn fixture_dir() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = write_fixture_files(dir.path());
    (dir, config)
}
