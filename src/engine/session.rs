//! Analytics session
//!
//! A [`Session`] is the explicit handle every aggregation runs against: one
//! engine, bound once to one immutable set of snapshots. Opening a session
//! acquires the engine and binds the views; dropping it (or calling
//! [`Session::close`]) releases them. Nothing is shared between sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::binder::{bind_snapshots, BindReport, SnapshotSet, ViewBinder};
use super::{QueryEngine, SqliteEngine};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::snapshot::SnapshotFetcher;

/// Bound snapshots plus the engine that queries them
pub struct Session {
    engine: Arc<SqliteEngine>,
    report: BindReport,
    opened_at: DateTime<Utc>,
}

impl Session {
    /// Fetch the configured snapshots and bind them into a new engine
    ///
    /// # Errors
    ///
    /// `Error::SourceUnavailable` if any snapshot cannot be read; the session
    /// is not created and no relation is usable.
    pub async fn open(config: &Config) -> Result<Self> {
        let fetcher = SnapshotFetcher::with_config(&config.fetch)
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        let binder = ViewBinder::new(fetcher, config.sources.clone());

        tracing::info!(
            models = %config.sources.models,
            datasets = %config.sources.datasets,
            spaces = %config.sources.spaces,
            "Opening analytics session"
        );
        let snapshots = binder.fetch_all().await?;
        Self::from_snapshots(&snapshots)
    }

    /// Bind already-decoded snapshots into a new engine
    pub fn from_snapshots(snapshots: &SnapshotSet) -> Result<Self> {
        let engine = SqliteEngine::open_in_memory()?;
        let report = bind_snapshots(&engine, snapshots)?;

        Ok(Self {
            engine: Arc::new(engine),
            report,
            opened_at: Utc::now(),
        })
    }

    /// The engine, for synchronous aggregation calls
    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    /// A shareable engine handle, for concurrent or blocking-task use
    pub fn shared_engine(&self) -> Arc<dyn QueryEngine> {
        self.engine.clone()
    }

    /// Row counts of the bound relations
    pub fn report(&self) -> &BindReport {
        &self.report
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// End the session
    ///
    /// Engine handles obtained through [`Session::shared_engine`] stay valid
    /// until they are dropped as well.
    pub fn close(self) {
        tracing::info!(
            rows = self.report.total(),
            open_for_secs = (Utc::now() - self.opened_at).num_seconds(),
            "Analytics session closed"
        );
    }
}
