//! Snapshot record decoding
//!
//! Accepts parquet (detected by its `PAR1` magic), a JSON array of objects or
//! JSON Lines. A single malformed record makes the whole snapshot unreadable;
//! there is no partial load.

use std::ops::RangeInclusive;

use bytes::Bytes;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, ListAccessor, Row};
use serde::Deserialize;

use super::SnapshotError;
use crate::models::{EntityKind, SnapshotRecord};

const PARQUET_MAGIC: &[u8] = b"PAR1";

/// Years the engine's date functions can truncate to a month
const SUPPORTED_YEARS: RangeInclusive<i32> = 0..=9999;

/// Raw record as published; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,

    #[serde(rename = "createdAt")]
    created_at: String,

    #[serde(default)]
    tags: Option<Vec<String>>,

    #[serde(default)]
    sdk: Option<String>,
}

/// Decode snapshot bytes into records of the given kind
///
/// Columns outside the kind's contract are dropped: spaces keep `sdk`,
/// models and datasets keep `tags`. Parquet rows are numbered from 1 in
/// `Decode` errors, like JSON lines.
pub fn decode_records(bytes: &[u8], kind: EntityKind) -> Result<Vec<SnapshotRecord>, SnapshotError> {
    if bytes.starts_with(PARQUET_MAGIC) {
        return decode_parquet(bytes, kind);
    }

    let text = std::str::from_utf8(bytes).map_err(|_| SnapshotError::Encoding)?;
    let text = text.trim_start_matches('\u{feff}');

    let raw: Vec<(usize, RawRecord)> = if text.trim_start().starts_with('[') {
        let records: Vec<RawRecord> =
            serde_json::from_str(text).map_err(|e| SnapshotError::Decode {
                line: e.line(),
                reason: e.to_string(),
            })?;
        // position in the array stands in for the line number
        records.into_iter().enumerate().map(|(idx, r)| (idx + 1, r)).collect()
    } else {
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<RawRecord>(line).map_err(|e| {
                SnapshotError::Decode {
                    line: idx + 1,
                    reason: e.to_string(),
                }
            })?;
            records.push((idx + 1, record));
        }
        records
    };

    raw.into_iter()
        .map(|(line, record)| into_record(record, kind, line))
        .collect()
}

fn into_record(raw: RawRecord, kind: EntityKind, line: usize) -> Result<SnapshotRecord, SnapshotError> {
    let created_at = parse_timestamp(&raw.created_at).ok_or_else(|| SnapshotError::Decode {
        line,
        reason: format!("unparseable createdAt '{}' for '{}'", raw.created_at, raw.id),
    })?;

    conform(
        SnapshotRecord {
            id: raw.id,
            created_at,
            tags: raw.tags.unwrap_or_default(),
            sdk: raw.sdk,
        },
        kind,
        line,
    )
}

/// Apply the kind's column contract and the supported year range
fn conform(mut record: SnapshotRecord, kind: EntityKind, line: usize) -> Result<SnapshotRecord, SnapshotError> {
    if !SUPPORTED_YEARS.contains(&record.created_at.year()) {
        return Err(SnapshotError::Decode {
            line,
            reason: format!(
                "createdAt '{}' for '{}' is outside years 0000-9999",
                record.created_at, record.id
            ),
        });
    }

    if !kind.has_tags() {
        record.tags.clear();
    }
    if !kind.has_sdk() {
        record.sdk = None;
    }
    Ok(record)
}

fn decode_parquet(bytes: &[u8], kind: EntityKind) -> Result<Vec<SnapshotRecord>, SnapshotError> {
    let reader = SerializedFileReader::new(Bytes::copy_from_slice(bytes))?;

    let mut records = Vec::new();
    for (idx, row) in reader.get_row_iter(None)?.enumerate() {
        let record = parquet_record(&row?, idx + 1)?;
        records.push(conform(record, kind, idx + 1)?);
    }
    Ok(records)
}

fn parquet_record(row: &Row, line: usize) -> Result<SnapshotRecord, SnapshotError> {
    let decode_error = |reason: String| SnapshotError::Decode { line, reason };

    let mut id = None;
    let mut created_at = None;
    let mut tags = None;
    let mut sdk = None;

    for (name, field) in row.get_column_iter() {
        match name.as_str() {
            "id" => id = text_field(field),
            "createdAt" => {
                created_at = Some(
                    timestamp_field(field)
                        .ok_or_else(|| decode_error(format!("unreadable createdAt {field}")))?,
                );
            }
            "tags" => tags = string_list_field(field),
            "sdk" => sdk = text_field(field),
            _ => {}
        }
    }

    let id = id.ok_or_else(|| decode_error("missing column `id`".to_string()))?;
    let created_at = created_at
        .ok_or_else(|| decode_error(format!("missing column `createdAt` for '{id}'")))?;

    Ok(SnapshotRecord {
        id,
        created_at,
        tags: tags.unwrap_or_default(),
        sdk,
    })
}

fn text_field(field: &Field) -> Option<String> {
    match field {
        Field::Str(value) => Some(value.clone()),
        _ => None,
    }
}

fn timestamp_field(field: &Field) -> Option<DateTime<Utc>> {
    match field {
        Field::TimestampMillis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
        Field::TimestampMicros(us) => DateTime::<Utc>::from_timestamp_micros(*us),
        // INT64 TIMESTAMP(NANOS) surfaces as a plain long
        Field::Long(ns) => Some(DateTime::<Utc>::from_timestamp_nanos(*ns)),
        Field::Date(days) => DateTime::<Utc>::from_timestamp(i64::from(*days) * 86_400, 0),
        Field::Str(value) => parse_timestamp(value),
        _ => None,
    }
}

/// String elements of a list column; null lists and non-text elements are skipped
fn string_list_field(field: &Field) -> Option<Vec<String>> {
    match field {
        Field::ListInternal(list) => Some(
            (0..list.len())
                .filter_map(|idx| list.get_string(idx).ok().cloned())
                .collect(),
        ),
        _ => None,
    }
}

/// Parse a creation timestamp, interpreting zone-less values as UTC
///
/// Accepted: RFC 3339 (`2023-05-01T12:00:00.000Z`), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
