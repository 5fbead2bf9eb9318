use crate::error::DexcomError;
use crate::models::{AppState, SessionContext};
use crate::services::SessionAction;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub async fn disconnect_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, DexcomError> {
    let mut ctx = SessionContext::load(&session).await?;
    let transition = app_state
        .controller()
        .dispatch(&mut ctx, SessionAction::Disconnect)
        .await;

    // Retire the old session id along with everything stored under it.
    session.cycle_id().await?;
    ctx.flash.extend(transition.notices);
    ctx.store(&session).await?;

    Ok(Redirect::to("/").into_response())
}
