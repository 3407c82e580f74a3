//! Dashboard API server
//!
//! Serves the session's aggregates to a presentation layer. The dashboard
//! bundle is computed once when the server is built; growth series are
//! computed per request.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analytics::Dashboard;
use crate::config::ServerConfig;
use crate::engine::{BindReport, QueryEngine, Session};

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Engine for per-request queries
    pub engine: Arc<dyn QueryEngine>,

    /// Aggregates computed at startup
    pub dashboard: Arc<Dashboard>,

    /// Row counts of the bound relations
    pub report: BindReport,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Dashboard Server
// ============================================================================

pub struct DashboardServer {
    config: ServerConfig,
    bind_address: SocketAddr,
    state: AppState,
}

impl DashboardServer {
    /// Create a server over precomputed state
    pub fn new(
        config: ServerConfig,
        engine: Arc<dyn QueryEngine>,
        dashboard: Dashboard,
        report: BindReport,
    ) -> Result<Self, ServerError> {
        let bind_address = config
            .bind_address
            .parse()
            .map_err(|_| ServerError::Config(format!("Invalid bind address: {}", config.bind_address)))?;

        let state = AppState {
            engine,
            dashboard: Arc::new(dashboard),
            report,
            start_time: Instant::now(),
        };

        Ok(Self {
            config,
            bind_address,
            state,
        })
    }

    /// Compute the dashboard for `session` and create a server over it
    pub async fn from_session(config: ServerConfig, session: &Session) -> Result<Self, ServerError> {
        let engine = session.shared_engine();
        let dashboard = Dashboard::compute(engine.clone())
            .await
            .map_err(|e| ServerError::Init(e.to_string()))?;

        Self::new(config, engine, dashboard, *session.report())
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Bind the configured address and serve until the process ends
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_address)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        self.serve(listener).await
    }

    /// Bind the configured address and serve until `shutdown_signal` fires
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_address)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!("Starting dashboard server on {} (with graceful shutdown)", self.bind_address);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Dashboard server shutdown complete");
        Ok(())
    }

    /// Serve on an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))?;
        tracing::info!("Starting dashboard server on {}", addr);

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.bind_address,
            rows: self.state.report,
            months: self.state.dashboard.trends.len(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub rows: BindReport,
    pub months: usize,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Dashboard Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Rows: {} models, {} datasets, {} spaces\n\
             Months: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.rows.models,
            self.rows.datasets,
            self.rows.spaces,
            self.months,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),
}
