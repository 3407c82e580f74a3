//! Error types for snapshot sources

use thiserror::Error;

/// Errors that can occur while reading a snapshot location
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Location string is not a usable URI or path
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// URI scheme other than http, https or file
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Server responded with status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content is not valid UTF-8
    #[error("Snapshot content is not valid UTF-8")]
    Encoding,

    /// A record could not be decoded
    #[error("Malformed record at line {line}: {reason}")]
    Decode { line: usize, reason: String },

    /// Parquet footer, schema or page could not be read
    #[error("Invalid parquet snapshot: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl SnapshotError {
    /// Whether retrying the same location may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Io(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Status(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
            Self::InvalidLocation(_)
            | Self::UnsupportedScheme(_)
            | Self::Encoding
            | Self::Decode { .. }
            | Self::Parquet(_) => false,
        }
    }
}
