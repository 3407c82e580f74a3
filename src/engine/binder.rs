//! View Binder
//!
//! Maps the three snapshot locations onto the named relations `models`,
//! `datasets` and `spaces`. Each snapshot is loaded into a backing table and
//! exposed through a view with the fixed column contract:
//!
//! | relation   | columns                  |
//! |------------|--------------------------|
//! | `models`   | `id`, `createdAt`, `tags`|
//! | `datasets` | `id`, `createdAt`, `tags`|
//! | `spaces`   | `id`, `createdAt`, `sdk` |
//!
//! `tags` is a JSON array of strings; `createdAt` is UTC
//! `YYYY-MM-DD HH:MM:SS` text.

use serde::Serialize;

use super::SqliteEngine;
use crate::config::SourcesConfig;
use crate::error::{Error, Result};
use crate::models::{EntityKind, SnapshotRecord};
use crate::snapshot::{decode_records, SnapshotFetcher, SnapshotLocation};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decoded contents of all three snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotSet {
    pub models: Vec<SnapshotRecord>,
    pub datasets: Vec<SnapshotRecord>,
    pub spaces: Vec<SnapshotRecord>,
}

impl SnapshotSet {
    pub fn records(&self, kind: EntityKind) -> &[SnapshotRecord] {
        match kind {
            EntityKind::Model => &self.models,
            EntityKind::Dataset => &self.datasets,
            EntityKind::Space => &self.spaces,
        }
    }
}

/// Row counts of the bound relations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BindReport {
    pub models: usize,
    pub datasets: usize,
    pub spaces: usize,
}

impl BindReport {
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Model => self.models,
            EntityKind::Dataset => self.datasets,
            EntityKind::Space => self.spaces,
        }
    }

    pub fn total(&self) -> usize {
        self.models + self.datasets + self.spaces
    }
}

/// Fetches the configured snapshots and binds them into an engine
pub struct ViewBinder {
    fetcher: SnapshotFetcher,
    sources: SourcesConfig,
}

impl ViewBinder {
    pub fn new(fetcher: SnapshotFetcher, sources: SourcesConfig) -> Self {
        Self { fetcher, sources }
    }

    /// Fetch and decode all three snapshots concurrently
    ///
    /// # Errors
    ///
    /// `Error::SourceUnavailable` for the first location that cannot be
    /// fetched or decoded. No partial set is returned.
    pub async fn fetch_all(&self) -> Result<SnapshotSet> {
        let (models, datasets, spaces) = tokio::try_join!(
            self.fetch(EntityKind::Model),
            self.fetch(EntityKind::Dataset),
            self.fetch(EntityKind::Space),
        )?;

        Ok(SnapshotSet {
            models,
            datasets,
            spaces,
        })
    }

    /// Fetch all snapshots, then bind them into `engine`
    pub async fn bind(&self, engine: &SqliteEngine) -> Result<BindReport> {
        let snapshots = self.fetch_all().await?;
        bind_snapshots(engine, &snapshots)
    }

    async fn fetch(&self, kind: EntityKind) -> Result<Vec<SnapshotRecord>> {
        let raw = self.sources.location(kind);
        let location =
            SnapshotLocation::parse(raw).map_err(|e| Error::source_unavailable(kind, raw, e))?;

        let bytes = self.fetcher.fetch(&location).await.map_err(|e| {
            tracing::warn!(relation = kind.relation(), location = %location, error = %e, "Snapshot fetch failed");
            Error::source_unavailable(kind, raw, e)
        })?;

        let records =
            decode_records(&bytes, kind).map_err(|e| Error::source_unavailable(kind, raw, e))?;

        tracing::info!(
            relation = kind.relation(),
            location = %location,
            bytes = bytes.len(),
            records = records.len(),
            "Snapshot fetched"
        );
        Ok(records)
    }
}

struct PreparedRow {
    id: String,
    created_at: String,
    tags: String,
    sdk: Option<String>,
}

fn prepare_rows(records: &[SnapshotRecord]) -> Result<Vec<PreparedRow>> {
    records
        .iter()
        .map(|record| -> Result<PreparedRow> {
            Ok(PreparedRow {
                id: record.id.clone(),
                created_at: record.created_at.format(TIMESTAMP_FORMAT).to_string(),
                tags: serde_json::to_string(&record.tags)?,
                sdk: record.sdk.clone(),
            })
        })
        .collect()
}

fn backing_table(kind: EntityKind) -> String {
    format!("snapshot_{}", kind.relation())
}

fn schema_sql() -> String {
    let mut sql = String::new();
    for kind in EntityKind::ALL {
        let table = backing_table(kind);
        let relation = kind.relation();
        if kind.has_sdk() {
            sql.push_str(&format!(
                "CREATE TABLE {table} (id TEXT NOT NULL, created_at TEXT NOT NULL, sdk TEXT);
                 CREATE VIEW {relation} AS SELECT id, created_at AS createdAt, sdk FROM {table};\n"
            ));
        } else {
            sql.push_str(&format!(
                "CREATE TABLE {table} (id TEXT NOT NULL, created_at TEXT NOT NULL, tags TEXT NOT NULL DEFAULT '[]');
                 CREATE VIEW {relation} AS SELECT id, created_at AS createdAt, tags FROM {table};\n"
            ));
        }
    }
    sql
}

/// Load decoded snapshots into `engine` and declare the three views
///
/// Runs in a single transaction: either all relations are bound or none.
/// A session binds exactly once; binding into an engine that already holds
/// the relations fails.
pub fn bind_snapshots(engine: &SqliteEngine, snapshots: &SnapshotSet) -> Result<BindReport> {
    let prepared: Vec<(EntityKind, Vec<PreparedRow>)> = EntityKind::ALL
        .into_iter()
        .map(|kind| -> Result<_> { Ok((kind, prepare_rows(snapshots.records(kind))?)) })
        .collect::<Result<_>>()?;

    engine.with_connection("bind_views", |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(&schema_sql())?;

        for (kind, rows) in &prepared {
            let table = backing_table(*kind);
            if kind.has_sdk() {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {table} (id, created_at, sdk) VALUES (?1, ?2, ?3)"
                ))?;
                for row in rows {
                    stmt.execute(rusqlite::params![row.id, row.created_at, row.sdk])?;
                }
            } else {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {table} (id, created_at, tags) VALUES (?1, ?2, ?3)"
                ))?;
                for row in rows {
                    stmt.execute(rusqlite::params![row.id, row.created_at, row.tags])?;
                }
            }
        }

        tx.commit()
    })?;

    let report = BindReport {
        models: snapshots.models.len(),
        datasets: snapshots.datasets.len(),
        spaces: snapshots.spaces.len(),
    };
    tracing::info!(
        models = report.models,
        datasets = report.datasets,
        spaces = report.spaces,
        "Snapshot views bound"
    );
    Ok(report)
}
