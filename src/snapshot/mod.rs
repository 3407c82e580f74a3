//! Snapshot sources
//!
//! A snapshot is an immutable, point-in-time table of one entity kind. This
//! module resolves snapshot locations, fetches their bytes and decodes them
//! into [`SnapshotRecord`](crate::models::SnapshotRecord)s:
//!
//! - [`SnapshotLocation`] - remote (`http`/`https`) or local (`file://`, bare path)
//! - [`SnapshotFetcher`] - one-shot reads, no retries
//! - [`decode_records`] - parquet, JSON array or JSON Lines

pub mod error;
pub mod fetcher;
pub mod format;

use std::fmt;
use std::path::PathBuf;

use url::Url;

pub use error::SnapshotError;
pub use fetcher::SnapshotFetcher;
pub use format::decode_records;

/// Where a snapshot is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLocation {
    /// Served over HTTP(S)
    Remote(Url),

    /// Read from the local filesystem
    Local(PathBuf),
}

impl SnapshotLocation {
    /// Resolve a location string
    ///
    /// `http://` and `https://` URIs are remote, `file://` URIs and strings
    /// without a scheme are local paths.
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SnapshotError::InvalidLocation(
                "location is empty".to_string(),
            ));
        }

        if !raw.contains("://") {
            return Ok(Self::Local(PathBuf::from(raw)));
        }

        let url = Url::parse(raw).map_err(|e| SnapshotError::InvalidLocation(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|()| SnapshotError::InvalidLocation(format!("not a file path: {raw}"))),
            other => Err(SnapshotError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SnapshotLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
