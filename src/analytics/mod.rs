//! Analytics over the bound snapshot relations
//!
//! - [`monthly_trends`] - entities created per month and kind
//! - [`distribution`] - license and SDK distributions
//! - [`growth`] - cumulative derived-model series for one base model
//! - [`dashboard`] - the session-level bundle computed at startup
//!
//! Every operation takes a [`QueryEngine`](crate::engine::QueryEngine) and
//! is a pure read.

pub mod dashboard;
pub mod distribution;
pub mod growth;
pub mod monthly_trends;

pub use dashboard::Dashboard;
pub use distribution::{
    license_distribution, sdk_distribution, tag_prefix_distribution, top_categories,
    LICENSE_PREFIX, OTHER_LABEL, UNKNOWN_SDK_LABEL,
};
pub use growth::{growth_series, growth_series_now, BaseIdentifier, BASE_MODEL_PREFIX};
pub use monthly_trends::monthly_trends;
