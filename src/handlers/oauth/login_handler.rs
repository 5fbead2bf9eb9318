use crate::error::DexcomError;
use crate::models::{AppState, SessionContext};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::info;

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, DexcomError> {
    let mut ctx = SessionContext::load(&session).await?;

    if ctx.token.is_some() {
        info!("session already holds a Dexcom token, skipping the OAuth flow");
        return Ok(Redirect::to("/").into_response());
    }

    let transition = app_state.controller().connect(&mut ctx);
    ctx.store(&session).await?;
    session.save().await?;

    match transition.authorization_url {
        Some(url) => {
            info!(session_id = ?session.id(), "redirecting to Dexcom authorization");
            Ok(Redirect::to(url.as_str()).into_response())
        }
        None => Ok(Redirect::to("/").into_response()),
    }
}
