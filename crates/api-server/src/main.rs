//! API server for Taskdeck
//!
//! Serves the task list, calendar, kanban board, dashboard and accessibility
//! preferences as JSON view models.

mod routes;
mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck_core::config::Config;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::task::router())
        .merge(routes::kanban::router())
        .merge(routes::dashboard::router())
        .merge(routes::calendar::router())
        .merge(routes::preferences::router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskdeck_server=debug,taskdeck_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Using data directory: {:?}", config.data_dir);
    if config.sign_language_widget.enabled {
        tracing::info!(
            "Sign-language widget enabled: {}",
            config.sign_language_widget.script_url
        );
    }

    let port = config.port;
    let state = AppState::new(config).await?;

    // Bind to 0.0.0.0 for localhost/127.0.0.1 compatibility
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("REST API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{build_state, send};

    #[tokio::test]
    async fn routes_are_mounted_together() {
        let app = super::app(build_state().await);

        let (status, _) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, task) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "wire up" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, board) = send(&app, "GET", "/api/kanban", Some("u1"), None).await;
        assert_eq!(board["available"][0]["id"], task["id"]);

        let (status, _) = send(&app, "GET", "/api/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
