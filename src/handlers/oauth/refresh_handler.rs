use crate::error::DexcomError;
use crate::handlers::apply_action;
use crate::models::AppState;
use crate::services::SessionAction;
use axum::{extract::State, response::Response};
use tower_sessions::Session;

pub async fn refresh_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, DexcomError> {
    apply_action(&app_state, &session, SessionAction::RefreshToken).await
}
