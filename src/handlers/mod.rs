pub mod dashboard_handler;
pub mod health_handler;
pub mod oauth;
pub mod page;
pub mod readings;

pub use dashboard_handler::dashboard_handler;
pub use health_handler::health_handler;

use crate::error::DexcomError;
use crate::models::{AppState, SessionContext};
use crate::services::SessionAction;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

/// Runs one action against the stored session and redirects back to the
/// dashboard, carrying the notices over as flash messages.
pub(crate) async fn apply_action(
    app_state: &AppState,
    session: &Session,
    action: SessionAction,
) -> Result<Response, DexcomError> {
    let mut ctx = SessionContext::load(session).await?;
    let transition = app_state.controller().dispatch(&mut ctx, action).await;

    ctx.flash.extend(transition.notices);
    ctx.store(session).await?;

    Ok(Redirect::to("/").into_response())
}
