//! Monthly creation trends
//!
//! Counts newly created entities per calendar month and kind. All three
//! relations are tagged by kind, unioned, and grouped once by month with
//! conditional counts, so each relation is scanned a single time.
//!
//! The series is sparse: a month appears only if at least one entity of any
//! kind was created in it.

use crate::engine::{Query, QueryEngine, Row};
use crate::error::Result;
use crate::models::{EntityKind, MonthlyCount};

pub const OPERATION: &str = "monthly_trends";

/// Build the monthly trends query
///
/// Result columns: `month` (`YYYY-MM`), then one count column per relation
/// (`models`, `datasets`, `spaces`).
pub fn monthly_trends_query() -> Query {
    let union = EntityKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "SELECT strftime('%Y-%m', createdAt) AS month, '{}' AS kind FROM {}",
                kind.label(),
                kind.relation()
            )
        })
        .collect::<Vec<_>>()
        .join("\n        UNION ALL\n        ");

    let counts = EntityKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "COUNT(*) FILTER (WHERE kind = '{}') AS {}",
                kind.label(),
                kind.relation()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    Query::new(
        OPERATION,
        format!(
            "WITH all_data AS (
        {union}
    )
SELECT
    month,
    {counts}
FROM all_data
GROUP BY month
ORDER BY month"
        ),
    )
}

/// Entities created per month and kind, ascending by month
pub fn monthly_trends(engine: &dyn QueryEngine) -> Result<Vec<MonthlyCount>> {
    let rows = engine.execute(&monthly_trends_query())?;
    let trends = rows.iter().map(shape_row).collect::<Result<Vec<_>>>()?;

    tracing::debug!(months = trends.len(), "Monthly trends computed");
    Ok(trends)
}

fn shape_row(row: &Row) -> Result<MonthlyCount> {
    Ok(MonthlyCount {
        month: row.month(OPERATION, "month")?,
        model_count: row.count(OPERATION, EntityKind::Model.relation())?,
        dataset_count: row.count(OPERATION, EntityKind::Dataset.relation())?,
        space_count: row.count(OPERATION, EntityKind::Space.relation())?,
    })
}
