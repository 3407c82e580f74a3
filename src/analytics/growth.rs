//! Cumulative growth of derived models
//!
//! A model derives from a base model when it carries the tag
//! `base_model:<identifier>`. For one base identifier this module produces a
//! gap-filled cumulative series:
//!
//! 1. One query counts distinct derived models per creation month.
//! 2. The anchor is the earliest such month. Without one the series is empty.
//! 3. Every month from the one before the anchor through the later of the
//!    current month and the last delta month is emitted, with missing deltas
//!    read as zero and a running sum carried along.
//!
//! The first point is therefore always zero, the series never decreases, and
//! its final value is the total number of derived models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::engine::{Query, QueryEngine};
use crate::error::{Error, Result};
use crate::models::{EntityKind, GrowthPoint, GrowthSeries, Month};

pub const OPERATION: &str = "growth_series";

/// Tag prefix linking a derived model to its base
pub const BASE_MODEL_PREFIX: &str = "base_model:";

/// Longest accepted base identifier, in bytes
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// A validated base model identifier such as `meta-llama/Llama-2-7b-hf`
///
/// Only ASCII letters, digits and `-_./` are accepted. The identifier is
/// additionally passed to the engine as a bound parameter, never spliced
/// into query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseIdentifier(String);

impl BaseIdentifier {
    /// Validate a caller-supplied identifier
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` for empty, overlong or out-of-alphabet input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(reject("must not be empty"));
        }
        if trimmed.len() > MAX_IDENTIFIER_LEN {
            return Err(reject(format!(
                "longer than {MAX_IDENTIFIER_LEN} bytes"
            )));
        }
        if let Some(c) = trimmed.chars().find(|c| !is_identifier_char(*c)) {
            return Err(reject(format!("character {c:?} is not allowed")));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full tag a derived model carries, e.g. `base_model:org/name`
    pub fn tag(&self) -> String {
        format!("{BASE_MODEL_PREFIX}{}", self.0)
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

fn reject(reason: impl Into<String>) -> Error {
    let reason = reason.into();
    tracing::warn!(%reason, "Rejected base identifier");
    Error::invalid_parameter("base", reason)
}

impl FromStr for BaseIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BaseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BaseIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the per-month delta query for one base identifier
///
/// The full tag is bound as `?1`. Result columns: `month`, `delta`.
pub fn derivations_query(base: &BaseIdentifier) -> Query {
    let sql = format!(
        "SELECT strftime('%Y-%m', m.createdAt) AS month, COUNT(DISTINCT m.id) AS delta
FROM {relation} AS m, json_each(m.tags) AS t
WHERE t.type = 'text' AND t.value = ?1
GROUP BY month
ORDER BY month",
        relation = EntityKind::Model.relation()
    );
    Query::new(OPERATION, sql).bind(base.tag())
}

/// Cumulative derived-model series for `base`, filled through `current`
pub fn growth_series(
    engine: &dyn QueryEngine,
    base: &BaseIdentifier,
    current: Month,
) -> Result<GrowthSeries> {
    let rows = engine.execute(&derivations_query(base))?;

    let mut deltas = BTreeMap::new();
    for row in &rows {
        let month = row.month(OPERATION, "month")?;
        let delta = row.count(OPERATION, "delta")?;
        *deltas.entry(month).or_insert(0) += delta;
    }

    let points = accumulate(&deltas, current);
    let series = GrowthSeries {
        base: base.to_string(),
        points,
    };

    tracing::debug!(
        base = %base,
        anchor = ?series.anchor(),
        months = series.points.len(),
        total = series.total(),
        "Growth series computed"
    );
    Ok(series)
}

/// [`growth_series`] filled through the current UTC month
pub fn growth_series_now(engine: &dyn QueryEngine, base: &BaseIdentifier) -> Result<GrowthSeries> {
    growth_series(engine, base, Month::current())
}

/// Turn sparse per-month deltas into a gap-filled running sum
///
/// Starts one month before the earliest delta with a zero point and runs
/// through `max(current, last delta month)`. Empty input yields no points.
pub fn accumulate(deltas: &BTreeMap<Month, u64>, current: Month) -> Vec<GrowthPoint> {
    let (Some((&anchor, _)), Some((&last, _))) =
        (deltas.first_key_value(), deltas.last_key_value())
    else {
        return Vec::new();
    };

    let end = current.max(last);
    let mut running = 0u64;

    Month::range_inclusive(anchor.pred(), end)
        .map(|month| {
            running += deltas.get(&month).copied().unwrap_or(0);
            GrowthPoint {
                month,
                cumulative_count: running,
            }
        })
        .collect()
}
