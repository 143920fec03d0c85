//! Calendar endpoint

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use taskdeck_core::calendar::{events_in_range, CalendarEvent};

use super::{api_error, session_user, RouteError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// GET /api/calendar?from=&to= - Events coloured for the current theme
async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEvent>>, RouteError> {
    let user_id = session_user(&headers)?;
    let tasks = state
        .repository()
        .list_tasks_for_user(&user_id)
        .await
        .map_err(api_error)?;

    let theme = state.preferences().get().theme;
    Ok(Json(events_in_range(&tasks, theme, query.from, query.to)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/calendar", get(list_events))
}
