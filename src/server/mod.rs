//! JSON API for a dashboard front end
//!
//! # Routes
//!
//! ```text
//! GET /health                   status, version, uptime, bound row counts
//! GET /api/dashboard            the whole session bundle
//! GET /api/trends               monthly creation counts
//! GET /api/licenses/models      license distribution (?top=N)
//! GET /api/licenses/datasets    license distribution (?top=N)
//! GET /api/sdks                 space SDK distribution (?top=N)
//! GET /api/growth?base=<id>     cumulative derived-model series
//! ```
//!
//! Every body is an [`ApiResponse`] envelope. Invalid parameters answer
//! `400`, engine failures `500`.
//!
//! # Usage
//!
//! ```ignore
//! use hubstats::config::Config;
//! use hubstats::engine::Session;
//! use hubstats::server::DashboardServer;
//!
//! let config = Config::from_env()?;
//! let session = Session::open(&config).await?;
//! let server = DashboardServer::from_session(config.server.clone(), &session).await?;
//! server.start().await?;
//! ```

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

pub use api::{create_router, ApiResponse, ErrorResponse, HealthResponse};
pub use server::{AppState, DashboardServer, ServerError, ServerInfo};
