//! REST API handlers for the dashboard server

use axum::{
    extract::{Query as UrlQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::analytics::{growth_series_now, top_categories, BaseIdentifier};
use crate::engine::BindReport;
use crate::error::{Error, ErrorCategory};
use crate::models::CategoryCount;

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub rows: BindReport,
}

/// Optional truncation of a distribution
#[derive(Debug, Default, Deserialize)]
pub struct TopParams {
    pub top: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GrowthParams {
    pub base: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/trends", get(get_trends))
        .route("/api/licenses/models", get(get_model_licenses))
        .route("/api/licenses/datasets", get(get_dataset_licenses))
        .route("/api/sdks", get(get_sdks))
        .route("/api/growth", get(get_growth))
        .with_state(state)
}

/// Status code for a library error
pub fn status_for(err: &Error) -> StatusCode {
    match err.category() {
        ErrorCategory::Input => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

fn distribution(counts: &[CategoryCount], params: &TopParams) -> Vec<CategoryCount> {
    match params.top {
        Some(n) => top_categories(counts, n),
        None => counts.to_vec(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        rows: state.report,
    }))
}

async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.dashboard.as_ref().clone()))
}

async fn get_trends(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.dashboard.trends.clone()))
}

async fn get_model_licenses(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<TopParams>,
) -> impl IntoResponse {
    Json(ApiResponse::success(distribution(
        &state.dashboard.model_licenses,
        &params,
    )))
}

async fn get_dataset_licenses(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<TopParams>,
) -> impl IntoResponse {
    Json(ApiResponse::success(distribution(
        &state.dashboard.dataset_licenses,
        &params,
    )))
}

async fn get_sdks(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<TopParams>,
) -> impl IntoResponse {
    Json(ApiResponse::success(distribution(
        &state.dashboard.space_sdks,
        &params,
    )))
}

/// Growth series for `?base=<identifier>`, computed on a blocking task
async fn get_growth(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<GrowthParams>,
) -> Response {
    let Some(raw) = params.base else {
        return error_response(&Error::invalid_parameter("base", "query parameter is required"));
    };
    let base = match BaseIdentifier::parse(&raw) {
        Ok(base) => base,
        Err(e) => return error_response(&e),
    };

    let engine = state.engine.clone();
    let result = task::spawn_blocking(move || growth_series_now(engine.as_ref(), &base)).await;

    match result {
        Ok(Ok(series)) => (StatusCode::OK, Json(ApiResponse::success(series))).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&Error::other(format!("Growth task failed: {e}"))),
    }
}
