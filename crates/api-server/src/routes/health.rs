//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use taskdeck_core::config::{BackendKind, SignLanguageWidget};

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    backend: BackendKind,
    data_dir: String,
    preferences_persistent: bool,
    sign_language_widget: SignLanguageWidget,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.config();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: config.backend,
        data_dir: config.data_dir.to_string_lossy().to_string(),
        preferences_persistent: state.preferences().is_persistent(),
        sign_language_widget: config.sign_language_widget.clone(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{build_state, send};

    #[tokio::test]
    async fn health_reports_widget_presence() {
        let app = super::router().with_state(build_state().await);

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "file");
        assert_eq!(body["signLanguageWidget"]["enabled"], true);
        assert_eq!(
            body["signLanguageWidget"]["scriptUrl"],
            "https://vlibras.gov.br/app/vlibras-plugin.js"
        );
    }
}
