use crate::error::DexcomError;
use crate::handlers::oauth::callback_handler::handle_callback;
use crate::handlers::page::{DashboardView, render_dashboard};
use crate::models::{AppState, CallbackParams, RangeQuery, SessionContext};
use crate::services::SessionAction;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use time::OffsetDateTime;
use tower_sessions::Session;

pub async fn dashboard_handler(
    State(app_state): State<AppState>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Result<Response, DexcomError> {
    // The redirect URI may point at the root instead of /oauth/callback.
    if params.is_callback() {
        return handle_callback(&app_state, &session, params).await;
    }

    let mut ctx = SessionContext::load(&session).await?;
    let transition = app_state
        .controller()
        .dispatch(&mut ctx, SessionAction::Connect)
        .await;

    let mut notices = ctx.take_flash();
    notices.extend(transition.notices);
    ctx.store(&session).await?;

    let now = OffsetDateTime::now_utc();
    let form_range = ctx
        .last_load
        .as_ref()
        .map(|loaded| loaded.range)
        .unwrap_or_else(|| RangeQuery::default_for(now.date()));

    let view = DashboardView {
        phase: ctx.phase(),
        notices: &notices,
        authorization_url: transition.authorization_url.as_ref().map(|url| url.as_str()),
        token: ctx.token.as_ref(),
        now,
        form_range,
        loaded: ctx.last_load.as_ref(),
    };

    Ok(Html(render_dashboard(&view)).into_response())
}
