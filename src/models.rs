//! Core data structures for hubstats
//!
//! Snapshot input records, the calendar [`Month`] used by every aggregation,
//! and the derived result shapes handed to the presentation layer.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Entity Kinds
// ============================================================================

/// The three kinds of snapshot entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Model,
    Dataset,
    Space,
}

impl EntityKind {
    /// All kinds, in the column order used by monthly trends
    pub const ALL: [EntityKind; 3] = [Self::Model, Self::Dataset, Self::Space];

    /// Name of the bound relation holding entities of this kind
    pub fn relation(&self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
            Self::Space => "spaces",
        }
    }

    /// Singular label used to tag rows by kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Dataset => "dataset",
            Self::Space => "space",
        }
    }

    /// Whether entities of this kind carry a `tags` sequence
    pub fn has_tags(&self) -> bool {
        matches!(self, Self::Model | Self::Dataset)
    }

    /// Whether entities of this kind carry an `sdk` column
    pub fn has_sdk(&self) -> bool {
        matches!(self, Self::Space)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Calendar Month
// ============================================================================

/// Error returned when a month string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid month '{0}': expected YYYY-MM")]
pub struct ParseMonthError(String);

/// A calendar month, the truncation unit of every aggregation
///
/// Ordered chronologically. Formats as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month; `month` is 1-based
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing a calendar date
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month containing an instant (UTC)
    #[must_use]
    pub fn containing(instant: &DateTime<Utc>) -> Self {
        Self::from_date(instant.date_naive())
    }

    /// The current month (UTC)
    #[must_use]
    pub fn current() -> Self {
        Self::containing(&Utc::now())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month
    #[must_use]
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding calendar month
    #[must_use]
    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Iterate every month from `start` through `end`, both inclusive
    ///
    /// Yields nothing when `start > end`.
    #[must_use]
    pub fn range_inclusive(start: Month, end: Month) -> MonthRange {
        MonthRange {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ParseMonthError;

    /// Accepts `YYYY-MM`, optionally followed by a day and time
    /// (`2023-05-01`, `2023-05-01 00:00:00`), which are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(s.to_string());
        let trimmed = s.trim();
        let head = trimmed.get(..7).ok_or_else(err)?;
        if trimmed.len() > 7 && !trimmed[7..].starts_with('-') {
            return Err(err());
        }
        let (year, month) = head.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Bounded iterator over consecutive calendar months
#[derive(Debug, Clone)]
pub struct MonthRange {
    next: Option<Month>,
    end: Month,
}

impl Iterator for MonthRange {
    type Item = Month;

    fn next(&mut self) -> Option<Month> {
        let current = self.next?;
        self.next = (current < self.end).then(|| current.succ());
        Some(current)
    }
}

// ============================================================================
// Snapshot Records
// ============================================================================

/// One entity row from a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Identifier, unique within its kind
    pub id: String,

    /// Creation instant
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Free-text tags (models and datasets only)
    #[serde(default)]
    pub tags: Vec<String>,

    /// SDK label (spaces only)
    #[serde(default)]
    pub sdk: Option<String>,
}

impl SnapshotRecord {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            tags: Vec::new(),
            sdk: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = Some(sdk.into());
        self
    }

    /// Month of creation
    pub fn month(&self) -> Month {
        Month::containing(&self.created_at)
    }
}

// ============================================================================
// Derived Results
// ============================================================================

/// Entities created in one month, per kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: Month,
    pub model_count: u64,
    pub dataset_count: u64,
    pub space_count: u64,
}

impl MonthlyCount {
    /// Count for one kind
    pub fn count(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Model => self.model_count,
            EntityKind::Dataset => self.dataset_count,
            EntityKind::Space => self.space_count,
        }
    }

    /// Entities of all kinds created this month
    pub fn total(&self) -> u64 {
        self.model_count + self.dataset_count + self.space_count
    }
}

/// Number of entities carrying one category value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

impl CategoryCount {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Cumulative number of derived entities up to and including a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub month: Month,
    pub cumulative_count: u64,
}

/// Gap-filled cumulative adoption series for one base entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthSeries {
    /// The base identifier the series was computed for
    pub base: String,

    /// One point per consecutive month, ascending
    pub points: Vec<GrowthPoint>,
}

impl GrowthSeries {
    /// True when no entity references the base identifier
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Final cumulative count, 0 for an empty series
    pub fn total(&self) -> u64 {
        self.points.last().map_or(0, |p| p.cumulative_count)
    }

    /// Month of the earliest derived entity
    ///
    /// The first point is the zero month preceding it.
    pub fn anchor(&self) -> Option<Month> {
        self.points.first().map(|p| p.month.succ())
    }
}
