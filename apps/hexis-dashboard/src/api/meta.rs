use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use utoipa::OpenApi;

use crate::AppState;

/// Store reachability plus core table counts.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Meta",
    responses(
        (status = 200, description = "Store reachable", body = crate::openapi::HealthReport),
        (status = 503, description = "Store unreachable", body = crate::openapi::HealthReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339();
    match state.store().health_counts_async().await {
        Ok(tables) => Json(json!({
            "status": "healthy",
            "database": {"connected": true, "tables": tables},
            "timestamp": timestamp,
        }))
        .into_response(),
        Err(err) => {
            let error = format!("{err:#}");
            tracing::error!(target: "hexis::api", error = %error, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": {"connected": false, "error": error},
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}

/// Service metadata and endpoints index.
#[utoipa::path(
    get,
    path = "/about",
    tag = "Meta",
    responses(
        (status = 200, description = "Service metadata", body = crate::openapi::AboutResponse)
    )
)]
pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    let server = &state.config().server;
    let endpoints = state.endpoints();
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "http": {"bind": server.bind, "port": server.port},
        "store": state.store().db_path().display().to_string(),
        "counts": {"total": endpoints.len()},
        "endpoints": endpoints.as_ref(),
        "endpoints_meta": state.endpoints_meta().as_ref(),
    }))
}

/// OpenAPI document generated from the handler annotations.
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "Meta",
    responses((status = 200, description = "OpenAPI document", content_type = "application/json"))
)]
pub async fn openapi_json() -> impl IntoResponse {
    Json(crate::openapi::ApiDoc::openapi())
}
