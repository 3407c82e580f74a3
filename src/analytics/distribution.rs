//! Categorical distributions
//!
//! Two modes:
//!
//! - **Tag prefix** (models, datasets): expand each entity's tags into one row
//!   per tag, keep tags starting with a literal prefix such as `license:`, and
//!   count distinct entities per tag. The prefix is stripped from the label.
//! - **Column** (spaces): count entities per `sdk` value.
//!
//! Results are ordered by descending count, then label.

use crate::engine::{Query, QueryEngine, Row};
use crate::error::{Error, Result};
use crate::models::{CategoryCount, EntityKind};

pub const TAG_PREFIX_OPERATION: &str = "tag_prefix_distribution";
pub const SDK_OPERATION: &str = "sdk_distribution";

/// Tag prefix designating a license
pub const LICENSE_PREFIX: &str = "license:";

/// Label for spaces without an `sdk` value
pub const UNKNOWN_SDK_LABEL: &str = "unknown";

/// Label of the bucket [`top_categories`] folds the tail into
pub const OTHER_LABEL: &str = "Other";

/// Build the tag-prefix distribution query for one relation
///
/// The prefix is bound as `?1` and matched literally (no wildcard
/// semantics).
///
/// # Errors
///
/// `Error::InvalidParameter` if `kind` carries no tags or `prefix` is empty.
pub fn tag_prefix_query(kind: EntityKind, prefix: &str) -> Result<Query> {
    if !kind.has_tags() {
        return Err(Error::invalid_parameter(
            "kind",
            format!("{} carry no tags", kind.relation()),
        ));
    }
    if prefix.is_empty() {
        return Err(Error::invalid_parameter("prefix", "must not be empty"));
    }

    let sql = format!(
        "SELECT substr(t.value, length(?1) + 1) AS label, COUNT(DISTINCT e.id) AS count
FROM {relation} AS e, json_each(e.tags) AS t
WHERE t.type = 'text' AND substr(t.value, 1, length(?1)) = ?1
GROUP BY t.value
ORDER BY count DESC, label ASC",
        relation = kind.relation()
    );

    Ok(Query::new(TAG_PREFIX_OPERATION, sql).bind(prefix))
}

/// Count entities per tag carrying `prefix`, labelled without the prefix
pub fn tag_prefix_distribution(
    engine: &dyn QueryEngine,
    kind: EntityKind,
    prefix: &str,
) -> Result<Vec<CategoryCount>> {
    let query = tag_prefix_query(kind, prefix)?;
    let rows = engine.execute(&query)?;
    let counts = shape_rows(&rows, TAG_PREFIX_OPERATION)?;

    tracing::debug!(
        relation = kind.relation(),
        prefix,
        categories = counts.len(),
        "Tag distribution computed"
    );
    Ok(counts)
}

/// License distribution (`license:<value>` tags) for models or datasets
pub fn license_distribution(engine: &dyn QueryEngine, kind: EntityKind) -> Result<Vec<CategoryCount>> {
    tag_prefix_distribution(engine, kind, LICENSE_PREFIX)
}

/// Build the space SDK distribution query
///
/// NULL `sdk` values are grouped under [`UNKNOWN_SDK_LABEL`], bound as `?1`.
pub fn sdk_query() -> Query {
    let sql = format!(
        "SELECT COALESCE(sdk, ?1) AS label, COUNT(*) AS count
FROM {relation}
GROUP BY label
ORDER BY count DESC, label ASC",
        relation = EntityKind::Space.relation()
    );
    Query::new(SDK_OPERATION, sql).bind(UNKNOWN_SDK_LABEL)
}

/// Count spaces per SDK
pub fn sdk_distribution(engine: &dyn QueryEngine) -> Result<Vec<CategoryCount>> {
    let rows = engine.execute(&sdk_query())?;
    let counts = shape_rows(&rows, SDK_OPERATION)?;

    tracing::debug!(categories = counts.len(), "SDK distribution computed");
    Ok(counts)
}

fn shape_rows(rows: &[Row], operation: &str) -> Result<Vec<CategoryCount>> {
    rows.iter()
        .map(|row| {
            Ok(CategoryCount {
                label: row.text(operation, "label")?,
                count: row.count(operation, "count")?,
            })
        })
        .collect()
}

/// Keep the `n` largest categories and fold the rest into one
/// [`OTHER_LABEL`] bucket
///
/// The total count is preserved. Input order does not matter; ties are
/// broken by label. No bucket is added when nothing is folded.
pub fn top_categories(counts: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    let mut sorted = counts.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    if sorted.len() <= n {
        return sorted;
    }

    let rest: u64 = sorted[n..].iter().map(|c| c.count).sum();
    sorted.truncate(n);
    if rest > 0 {
        sorted.push(CategoryCount::new(OTHER_LABEL, rest));
    }
    sorted
}
