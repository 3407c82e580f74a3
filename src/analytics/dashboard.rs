//! Dashboard bundle
//!
//! The once-per-session aggregations (monthly trends, both license
//! distributions and the SDK distribution) computed together. They are
//! independent reads, so [`Dashboard::compute`] runs them concurrently on
//! the blocking pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task;

use super::{license_distribution, monthly_trends, sdk_distribution};
use crate::engine::QueryEngine;
use crate::error::{Error, Result};
use crate::models::{CategoryCount, EntityKind, MonthlyCount};

/// All session-level aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub trends: Vec<MonthlyCount>,
    pub model_licenses: Vec<CategoryCount>,
    pub dataset_licenses: Vec<CategoryCount>,
    pub space_sdks: Vec<CategoryCount>,
    pub computed_at: DateTime<Utc>,
}

impl Dashboard {
    /// Compute every aggregate concurrently
    ///
    /// Fails with the first error any aggregation reports.
    pub async fn compute(engine: Arc<dyn QueryEngine>) -> Result<Self> {
        let start = std::time::Instant::now();

        let (trends, model_licenses, dataset_licenses, space_sdks) = tokio::try_join!(
            run_blocking(engine.clone(), |e| monthly_trends(e)),
            run_blocking(engine.clone(), |e| license_distribution(e, EntityKind::Model)),
            run_blocking(engine.clone(), |e| license_distribution(e, EntityKind::Dataset)),
            run_blocking(engine, |e| sdk_distribution(e)),
        )?;

        tracing::info!(
            months = trends.len(),
            model_licenses = model_licenses.len(),
            dataset_licenses = dataset_licenses.len(),
            sdks = space_sdks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dashboard computed"
        );

        Ok(Self {
            trends,
            model_licenses,
            dataset_licenses,
            space_sdks,
            computed_at: Utc::now(),
        })
    }

    /// Compute every aggregate sequentially on the calling thread
    pub fn compute_blocking(engine: &dyn QueryEngine) -> Result<Self> {
        Ok(Self {
            trends: monthly_trends(engine)?,
            model_licenses: license_distribution(engine, EntityKind::Model)?,
            dataset_licenses: license_distribution(engine, EntityKind::Dataset)?,
            space_sdks: sdk_distribution(engine)?,
            computed_at: Utc::now(),
        })
    }
}

async fn run_blocking<T, F>(engine: Arc<dyn QueryEngine>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn QueryEngine) -> Result<T> + Send + 'static,
{
    task::spawn_blocking(move || f(engine.as_ref()))
        .await
        .map_err(|e| Error::other(format!("Aggregation task failed: {e}")))?
}
