//! Unified error handling for the hubstats crate
//!
//! Every fallible operation in the library returns [`Result`], whose error type
//! distinguishes the failure kinds a dashboard caller has to react to
//! differently:
//!
//! - [`Error::SourceUnavailable`] - a snapshot location could not be read.
//!   Fatal for the session; the caller may retry by opening a new one.
//! - [`Error::QueryExecution`] - the engine rejected or failed a generated
//!   query. Carries the name of the offending operation.
//! - [`Error::InvalidParameter`] - user input was rejected before any query
//!   text was built.
//!
//! An empty result is never an error: aggregations return empty sequences.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hubstats::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Input => eprintln!("bad request: {err}"),
//!         _ if err.is_recoverable() => eprintln!("try again later: {err}"),
//!         _ => eprintln!("fatal: {err}"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::models::EntityKind;
use crate::snapshot::SnapshotError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Snapshot sources (HTTP, local files, record decoding)
    Source,
    /// Query construction or execution
    Query,
    /// Rejected user input
    Input,
    /// Configuration and validation errors
    Config,
    /// Local I/O errors
    Storage,
    /// Serialization errors
    Parsing,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short human-readable description of the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Source => "snapshot source error",
            Self::Query => "query error",
            Self::Input => "invalid input",
            Self::Config => "configuration error",
            Self::Storage => "storage error",
            Self::Parsing => "parsing error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the hubstats crate
#[derive(Error, Debug)]
pub enum Error {
    /// A snapshot location could not be fetched or decoded
    #[error("Snapshot source for '{relation}' unavailable ({location}): {source}")]
    SourceUnavailable {
        relation: &'static str,
        location: String,
        #[source]
        source: SnapshotError,
    },

    /// The query engine rejected or failed a generated query
    #[error("Query '{operation}' failed: {reason}")]
    QueryExecution { operation: String, reason: String },

    /// A caller-supplied parameter was rejected before query construction
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a source error for the relation backing `kind`
    pub fn source_unavailable(
        kind: EntityKind,
        location: impl Into<String>,
        source: SnapshotError,
    ) -> Self {
        Self::SourceUnavailable {
            relation: kind.relation(),
            location: location.into(),
            source,
        }
    }

    /// Create a query execution error for the named operation
    pub fn query(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::QueryExecution {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Check if the caller may reasonably retry the failed call
    ///
    /// The library never retries on its own. Only source failures are worth
    /// retrying (by opening a new session); everything else fails the same
    /// way on every attempt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SourceUnavailable { source, .. } => source.is_transient(),
            Self::Io(_) => true,
            Self::QueryExecution { .. }
            | Self::InvalidParameter { .. }
            | Self::Config(_)
            | Self::Json(_)
            | Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceUnavailable { .. } => ErrorCategory::Source,
            Self::QueryExecution { .. } => ErrorCategory::Query,
            Self::InvalidParameter { .. } => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
