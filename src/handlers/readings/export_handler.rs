use crate::error::DexcomError;
use crate::models::{AppState, SessionContext};
use crate::services::chart::sorted_readings;
use crate::services::export::readings_to_csv;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::info;

/// Downloads the readings currently on screen, in display order.
pub async fn export_handler(
    State(_app_state): State<AppState>,
    session: Session,
) -> Result<Response, DexcomError> {
    let ctx = SessionContext::load(&session).await?;
    let loaded = ctx.last_load.ok_or(DexcomError::NoData)?;

    let csv = readings_to_csv(&sorted_readings(&loaded.readings))?;
    let filename = loaded.range.export_filename();
    info!(rows = loaded.readings.len(), %filename, "exporting glucose data");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
