//! hubstats - Adoption analytics over Hub snapshots
//!
//! Binds three tabular snapshots (models, datasets, spaces) as named
//! relations in an embedded query engine and derives the aggregates a
//! dashboard presents: monthly creation trends, license and SDK
//! distributions, and cumulative growth of models derived from a base model.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`snapshot`] - Snapshot locations, fetching and record decoding
//! - [`engine`] - Query engine abstraction, SQLite engine, view binding, sessions
//! - [`analytics`] - Trends, distributions, growth series, dashboard bundle
//! - [`server`] - JSON API for a dashboard front end
//! - [`models`] - Core data structures and types
//! - [`utils`] - Formatting helpers
//!
//! # Example
//!
//! ```no_run
//! use hubstats::analytics::{growth_series_now, monthly_trends, BaseIdentifier};
//! use hubstats::config::Config;
//! use hubstats::engine::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let session = Session::open(&config).await?;
//!
//!     let trends = monthly_trends(session.engine())?;
//!     let base = BaseIdentifier::parse("meta-llama/Llama-2-7b-hf")?;
//!     let growth = growth_series_now(session.engine(), &base)?;
//!     println!("{} months, {} derived models", trends.len(), growth.total());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod server;
pub mod snapshot;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{BaseIdentifier, Dashboard};
    pub use crate::config::Config;
    pub use crate::engine::{QueryEngine, Session};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        CategoryCount, EntityKind, GrowthPoint, GrowthSeries, Month, MonthlyCount, SnapshotRecord,
    };
}

pub use models::{CategoryCount, EntityKind, GrowthSeries, Month, MonthlyCount};
