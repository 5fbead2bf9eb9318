use crate::error::DexcomError;
use crate::models::{AppState, RangeQuery, SessionContext};
use crate::services::{ChartSeries, GlucoseSummary, summarize, to_chart_series};
use axum::{extract::State, response::Json};
use serde::Serialize;
use tower_sessions::Session;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub range: RangeQuery,
    pub summary: GlucoseSummary,
    pub chart: ChartSeries,
}

pub async fn summary_handler(
    State(_app_state): State<AppState>,
    session: Session,
) -> Result<Json<SummaryResponse>, DexcomError> {
    let ctx = SessionContext::load(&session).await?;
    let loaded = ctx.last_load.ok_or(DexcomError::NoData)?;

    Ok(Json(SummaryResponse {
        range: loaded.range,
        summary: summarize(&loaded.readings),
        chart: to_chart_series(&loaded.readings),
    }))
}
