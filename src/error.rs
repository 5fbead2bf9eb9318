use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Every failure the dashboard can surface. The `Display` text is the
/// message shown to the user, so each variant says what to do next.
#[derive(Debug, Error)]
pub enum DexcomError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Security error: invalid state parameter. Please connect again.")]
    Security,

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid or expired authorization grant. Please connect again.")]
    InvalidGrant,

    #[error("Authentication failed. Please check your app credentials.")]
    AuthFailure,

    #[error("Access token expired. Please refresh your token or reconnect.")]
    Unauthorized,

    #[error("Access forbidden. Please check your app permissions.")]
    Forbidden,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Start date must be before end date")]
    InvalidRange,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not connected to Dexcom. Please connect first.")]
    NotConnected,

    #[error("No glucose data has been loaded yet")]
    NoData,

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

impl DexcomError {
    /// Short machine-readable name used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DexcomError::Configuration(_) => "configuration_error",
            DexcomError::Security => "security_error",
            DexcomError::Timeout => "timeout",
            DexcomError::Connection(_) => "connection_error",
            DexcomError::InvalidGrant => "invalid_grant",
            DexcomError::AuthFailure => "auth_failure",
            DexcomError::Unauthorized => "unauthorized",
            DexcomError::Forbidden => "forbidden",
            DexcomError::Api { .. } => "api_error",
            DexcomError::InvalidRange => "invalid_range",
            DexcomError::InvalidInput(_) => "invalid_input",
            DexcomError::NotConnected => "not_connected",
            DexcomError::NoData => "no_data",
            DexcomError::Session(_) => "session_error",
            DexcomError::Export(_) => "export_error",
        }
    }

    /// Network-level failures that say nothing about the validity of the
    /// credentials or tokens involved.
    pub fn is_transient(&self) -> bool {
        matches!(self, DexcomError::Timeout | DexcomError::Connection(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DexcomError::Configuration(_)
            | DexcomError::Session(_)
            | DexcomError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DexcomError::Security
            | DexcomError::InvalidGrant
            | DexcomError::InvalidRange
            | DexcomError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DexcomError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DexcomError::Connection(_) | DexcomError::AuthFailure | DexcomError::Api { .. } => {
                StatusCode::BAD_GATEWAY
            }
            DexcomError::Unauthorized | DexcomError::NotConnected => StatusCode::UNAUTHORIZED,
            DexcomError::Forbidden => StatusCode::FORBIDDEN,
            DexcomError::NoData => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl IntoResponse for DexcomError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        });

        (status, body).into_response()
    }
}
