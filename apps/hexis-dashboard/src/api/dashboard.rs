use axum::{extract::State, Json};
use chrono::Utc;

use crate::read_models::composer::{compose, DashboardSnapshot};
use crate::AppState;

/// Every dashboard section in one response. Always 200; sections that could
/// not be read carry their defaults and are listed in `degraded`.
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Composed snapshot", body = DashboardSnapshot)
    )
)]
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(compose(state.store(), state.read_models(), Utc::now()).await)
}
