//! Accessibility preference endpoints

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use taskdeck_core::config::SignLanguageWidget;
use taskdeck_core::preferences::{parse_flag, FontScale, Preferences, RootSnapshot, Theme};
use taskdeck_core::style::{font_size_class, motion_class, token, ElementRole};
use taskdeck_core::task::{TaskPriority, TaskStatus};

use super::{api_error, RouteError};
use crate::state::AppState;

/// Partial update; values use their stored string form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default)]
    pub reduced_motion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesResponse {
    pub preferences: Preferences,
    pub root: RootSnapshot,
    pub font_size_class: &'static str,
    pub motion_class: &'static str,
    pub tokens: BTreeMap<String, &'static str>,
    pub sign_language_widget: SignLanguageWidget,
}

/// GET /api/preferences
async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.preferences().get())
}

/// PUT /api/preferences - Nothing changes unless every value is valid
async fn update_preferences(
    State(state): State<AppState>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<Preferences>, RouteError> {
    let theme = req
        .theme
        .as_deref()
        .map(str::parse::<Theme>)
        .transpose()
        .map_err(api_error)?;
    let font_size = req
        .font_size
        .as_deref()
        .map(str::parse::<FontScale>)
        .transpose()
        .map_err(api_error)?;
    let reduced_motion = req
        .reduced_motion
        .as_deref()
        .map(|raw| parse_flag("reducedMotion", raw))
        .transpose()
        .map_err(api_error)?;

    let store = state.preferences();
    if let Some(theme) = theme {
        store.set_theme(theme).await;
    }
    if let Some(font_size) = font_size {
        store.set_font_size(font_size).await;
    }
    if let Some(reduced_motion) = reduced_motion {
        store.set_reduced_motion(reduced_motion).await;
    }
    Ok(Json(store.get()))
}

/// GET /api/preferences/styles - Root styling and every token for the theme
async fn get_styles(State(state): State<AppState>) -> Json<StylesResponse> {
    let preferences = state.preferences().get();
    let theme = preferences.theme;

    let roles = ElementRole::STATIC
        .into_iter()
        .chain(TaskStatus::ALL.into_iter().map(ElementRole::Column))
        .chain(TaskStatus::ALL.into_iter().map(ElementRole::StatusBadge))
        .chain(
            [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High]
                .into_iter()
                .map(ElementRole::PriorityBadge),
        );
    let tokens: BTreeMap<String, &'static str> =
        roles.map(|role| (role.key(), token(theme, role))).collect();

    Json(StylesResponse {
        preferences,
        root: state.root().snapshot(),
        font_size_class: font_size_class(preferences.font_size),
        motion_class: motion_class(preferences.reduced_motion),
        tokens,
        sign_language_widget: state.config().sign_language_widget.clone(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/preferences", get(get_preferences).put(update_preferences))
        .route("/api/preferences/styles", get(get_styles))
}
