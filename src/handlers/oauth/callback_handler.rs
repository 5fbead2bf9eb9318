use crate::error::DexcomError;
use crate::models::{AppState, CallbackParams, SessionContext, SessionPhase};
use crate::services::CallbackDecision;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::info;

pub async fn callback_handler(
    Query(params): Query<CallbackParams>,
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, DexcomError> {
    handle_callback(&app_state, &session, params).await
}

/// Shared with the dashboard route, which also accepts the redirect.
pub(crate) async fn handle_callback(
    app_state: &AppState,
    session: &Session,
    params: CallbackParams,
) -> Result<Response, DexcomError> {
    info!(
        has_code = params.code.is_some(),
        has_error = params.error.is_some(),
        "oauth callback received"
    );

    let _gate = app_state.callback_gate.lock().await;
    let mut ctx = SessionContext::load(session).await?;
    let controller = app_state.controller();

    let transition = match controller.accept_callback(&mut ctx, params) {
        CallbackDecision::Done(transition) => transition,
        CallbackDecision::Exchange(verified) => {
            // Commit the consumed state first: a replayed callback waiting on
            // the gate then finds nothing to match against.
            ctx.store(session).await?;
            session.save().await?;

            let transition = controller.complete_callback(&mut ctx, verified).await;
            if transition.phase == SessionPhase::Authenticated {
                session.cycle_id().await?;
            }
            transition
        }
    };

    ctx.flash.extend(transition.notices);
    ctx.store(session).await?;

    // Redirecting drops code and state from the address bar.
    Ok(Redirect::to("/").into_response())
}
