pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub use error::DexcomError;
pub use models::{AppConfig, AppState};

/// The dashboard application: routes, cookie sessions and request tracing.
pub fn app(app_state: AppState) -> Router {
    use handlers::oauth::{callback_handler, disconnect_handler, login_handler, refresh_handler};
    use handlers::readings::{export_handler, load_handler, summary_handler};
    use handlers::{dashboard_handler, health_handler};

    let session_store = MemoryStore::default();
    let session_expiry = Expiry::OnInactivity(Duration::hours(6));
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(session_expiry);

    Router::new()
        .route("/", get(dashboard_handler))
        .route("/health", get(health_handler))
        .route("/oauth/login", get(login_handler))
        .route("/oauth/callback", get(callback_handler))
        .route("/oauth/refresh", post(refresh_handler))
        .route("/oauth/disconnect", post(disconnect_handler))
        .route("/readings/load", post(load_handler))
        .route("/readings/export", get(export_handler))
        .route("/api/summary", get(summary_handler))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Stand-in application used when the configuration cannot be loaded: every
/// route explains what is missing and nothing else is reachable.
pub fn config_error_app(error: &DexcomError) -> Router {
    let page = handlers::page::render_config_error(&error.to_string());

    Router::new()
        .route("/health", get(handlers::health_handler))
        .fallback(move || {
            let page = page.clone();
            async move { (axum::http::StatusCode::SERVICE_UNAVAILABLE, Html(page)) }
        })
        .layer(TraceLayer::new_for_http())
}
