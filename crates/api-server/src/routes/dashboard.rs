//! Dashboard metrics endpoint

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;

use taskdeck_core::dashboard::DashboardMetrics;

use super::{api_error, session_user, RouteError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Evaluation instant; defaults to the server's local time
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

/// GET /api/dashboard
async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardMetrics>, RouteError> {
    let user_id = session_user(&headers)?;
    let tasks = state
        .repository()
        .list_tasks_for_user(&user_id)
        .await
        .map_err(api_error)?;

    let now = query.at.unwrap_or_else(|| Local::now().naive_local());
    Ok(Json(DashboardMetrics::compute(&tasks, now)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}
