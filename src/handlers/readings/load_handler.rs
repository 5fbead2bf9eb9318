use crate::error::DexcomError;
use crate::handlers::apply_action;
use crate::models::readings::parse_date;
use crate::models::{AppState, Notice, RangeQuery, SessionContext};
use crate::services::SessionAction;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};
use tower_sessions::Session;

#[derive(Debug, Default, Deserialize)]
pub struct RangeForm {
    pub start: Option<String>,
    pub end: Option<String>,
    pub preset: Option<String>,
}

impl RangeForm {
    /// Presets win over explicit dates; missing dates fall back to
    /// yesterday and today.
    pub fn to_range(&self, today: Date) -> Result<RangeQuery, DexcomError> {
        match self.preset.as_deref() {
            Some("today") => return RangeQuery::for_dates(today, today),
            Some("last3days") => return Ok(RangeQuery::last_days(today, 3)),
            Some(other) if !other.is_empty() => {
                return Err(DexcomError::InvalidInput(format!("unknown preset {other:?}")));
            }
            _ => {}
        }

        let default = RangeQuery::default_for(today);
        let date = |raw: &Option<String>, fallback: Date| match raw.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_date(raw),
            _ => Ok(fallback),
        };

        RangeQuery::for_dates(
            date(&self.start, default.start().date())?,
            date(&self.end, default.end().date())?,
        )
    }
}

pub async fn load_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<RangeForm>,
) -> Result<Response, DexcomError> {
    let today = OffsetDateTime::now_utc().date();

    match form.to_range(today) {
        Ok(range) => apply_action(&app_state, &session, SessionAction::LoadData(range)).await,
        Err(err) => {
            let mut ctx = SessionContext::load(&session).await?;
            ctx.flash.push(Notice::error(err.to_string()));
            ctx.store(&session).await?;
            Ok(Redirect::to("/").into_response())
        }
    }
}
