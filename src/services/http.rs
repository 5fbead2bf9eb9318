use crate::error::DexcomError;
use reqwest::StatusCode;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 200;

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, DexcomError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DexcomError::Configuration(format!("cannot build HTTP client: {e}")))
}

/// Maps a failed send or body read onto the transport half of the taxonomy.
pub fn transport_error(err: reqwest::Error) -> DexcomError {
    if err.is_timeout() {
        DexcomError::Timeout
    } else {
        DexcomError::Connection(err.to_string())
    }
}

/// Token endpoint statuses: 400 is a bad or expired grant, 401 means the
/// client credentials were refused.
pub fn token_status_error(status: StatusCode, body: &str) -> DexcomError {
    match status {
        StatusCode::BAD_REQUEST => DexcomError::InvalidGrant,
        StatusCode::UNAUTHORIZED => DexcomError::AuthFailure,
        _ => api_error(status, body),
    }
}

/// Data endpoint statuses: 401 is an expired access token, 403 a missing
/// scope or permission.
pub fn data_status_error(status: StatusCode, body: &str) -> DexcomError {
    match status {
        StatusCode::UNAUTHORIZED => DexcomError::Unauthorized,
        StatusCode::FORBIDDEN => DexcomError::Forbidden,
        _ => api_error(status, body),
    }
}

pub fn api_error(status: StatusCode, body: &str) -> DexcomError {
    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string();
    }
    DexcomError::Api {
        status: status.as_u16(),
        message,
    }
}
