use crate::error::DexcomError;
use oauth2::{AccessToken, CsrfToken, RefreshToken};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

pub const OAUTH_SCOPE: &str = "offline_access";
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 7200;
pub const EXPIRY_WARNING_WINDOW: Duration = Duration::minutes(5);

const STATE_BYTES: u32 = 32;

/// An issued authorization request, alive until its callback arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthRequest {
    state: CsrfToken,
}

impl OAuthRequest {
    pub fn issue() -> Self {
        Self {
            state: CsrfToken::new_random_len(STATE_BYTES),
        }
    }

    pub fn state(&self) -> &str {
        self.state.secret()
    }

    pub fn matches(&self, returned_state: &str) -> bool {
        self.state.secret() == returned_state
    }
}

/// Query parameters delivered to the redirect target.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl TokenState {
    /// Validates a token endpoint body. `requested_at` is the instant the
    /// grant was sent, so `expires_at` never outlives the server's view.
    pub fn from_response(
        response: TokenResponse,
        requested_at: OffsetDateTime,
        status: u16,
    ) -> Result<Self, DexcomError> {
        let missing = |field: &str| DexcomError::Api {
            status,
            message: format!("token response is missing {field}"),
        };

        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("access_token"))?;
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("refresh_token"))?;
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = requested_at
            .checked_add(Duration::seconds(expires_in))
            .ok_or_else(|| DexcomError::Api {
                status,
                message: "token response has an out-of-range expires_in".to_string(),
            })?;

        Ok(Self {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
            expires_at,
        })
    }

    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        self.expires_at - now
    }

    pub fn expires_soon(&self, now: OffsetDateTime) -> bool {
        self.remaining(now) < EXPIRY_WARNING_WINDOW
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn response(expires_in: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: Some("access".into()),
            refresh_token: Some("refresh".into()),
            expires_in,
        }
    }

    #[test]
    fn issued_states_are_long_and_distinct() {
        let first = OAuthRequest::issue();
        let second = OAuthRequest::issue();

        // 32 random bytes, URL-safe base64 without padding.
        assert_eq!(first.state().len(), 43);
        assert_ne!(first.state(), second.state());
        assert!(first.matches(first.state()));
        assert!(!first.matches(second.state()));
        assert!(!first.matches(""));
    }

    #[test]
    fn expiry_is_request_time_plus_expires_in() {
        let requested_at = datetime!(2024-01-15 10:00:00 UTC);

        let token = TokenState::from_response(response(Some(600)), requested_at, 200).unwrap();
        assert_eq!(token.expires_at, datetime!(2024-01-15 10:10:00 UTC));

        let token = TokenState::from_response(response(None), requested_at, 200).unwrap();
        assert_eq!(token.expires_at, datetime!(2024-01-15 12:00:00 UTC));
    }

    #[test]
    fn out_of_range_expiry_is_an_api_error() {
        let requested_at = datetime!(2024-01-15 10:00:00 UTC);

        for expires_in in [i64::MAX, i64::MIN] {
            match TokenState::from_response(response(Some(expires_in)), requested_at, 200) {
                Err(DexcomError::Api { status, message }) => {
                    assert_eq!(status, 200);
                    assert!(message.contains("expires_in"));
                }
                other => panic!("expected api error, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_tokens_are_api_errors() {
        let requested_at = datetime!(2024-01-15 10:00:00 UTC);
        let body = TokenResponse {
            access_token: None,
            refresh_token: Some("refresh".into()),
            expires_in: None,
        };

        match TokenState::from_response(body, requested_at, 200) {
            Err(DexcomError::Api { status, message }) => {
                assert_eq!(status, 200);
                assert!(message.contains("access_token"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn warns_inside_the_last_five_minutes() {
        let requested_at = datetime!(2024-01-15 10:00:00 UTC);
        let token = TokenState::from_response(response(Some(3600)), requested_at, 200).unwrap();

        assert!(!token.expires_soon(datetime!(2024-01-15 10:54:59 UTC)));
        assert!(token.expires_soon(datetime!(2024-01-15 10:55:01 UTC)));
        assert!(token.expires_soon(datetime!(2024-01-15 11:30:00 UTC)));
    }

    #[test]
    fn token_state_survives_session_serialization() {
        let token = TokenState::from_response(
            response(Some(7200)),
            datetime!(2024-01-15 10:00:00 UTC),
            200,
        )
        .unwrap();

        let json = serde_json::to_string(&token).unwrap();
        let back: TokenState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.access_token.secret(), "access");
        assert_eq!(back.refresh_token.secret(), "refresh");
        assert_eq!(back.expires_at, token.expires_at);
    }

    #[test]
    fn callback_detection() {
        assert!(!CallbackParams::default().is_callback());
        let params = CallbackParams {
            code: Some("abc".into()),
            ..Default::default()
        };
        assert!(params.is_callback());
    }
}
