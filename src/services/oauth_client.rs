use crate::error::DexcomError;
use crate::models::app_config::{Credentials, DexcomEndpoints};
use crate::models::oauth::{OAUTH_SCOPE, OAuthRequest, TokenResponse, TokenState};
use crate::services::http;
use oauth2::RefreshToken;
use reqwest::Url;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Authorization-code client for the Dexcom token endpoint.
#[derive(Clone, Debug)]
pub struct OAuthClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: DexcomEndpoints,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        endpoints: DexcomEndpoints,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
        }
    }

    pub fn authorization_url(&self, request: &OAuthRequest) -> Url {
        let mut url = self.endpoints.authorize.clone();

        url.query_pairs_mut()
            .append_pair("client_id", self.credentials.client_id.as_str())
            .append_pair("redirect_uri", self.credentials.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("state", request.state());

        url
    }

    /// A callback is only valid against the most recently issued request.
    pub fn verify_state(
        issued: Option<&OAuthRequest>,
        returned_state: &str,
    ) -> Result<(), DexcomError> {
        match issued {
            Some(request) if request.matches(returned_state) => Ok(()),
            Some(_) => {
                warn!("oauth callback state does not match the issued state");
                Err(DexcomError::Security)
            }
            None => {
                warn!("oauth callback received with no authorization request outstanding");
                Err(DexcomError::Security)
            }
        }
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        returned_state: &str,
        issued: Option<&OAuthRequest>,
    ) -> Result<TokenState, DexcomError> {
        Self::verify_state(issued, returned_state)?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.secret().as_str()),
        ];

        let token = self.request_token(&form).await?;
        info!(expires_at = %token.expires_at, "exchanged authorization code");
        Ok(token)
    }

    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenState, DexcomError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.secret().as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.secret().as_str()),
        ];

        let token = self.request_token(&form).await?;
        info!(expires_at = %token.expires_at, "refreshed access token");
        Ok(token)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenState, DexcomError> {
        let requested_at = OffsetDateTime::now_utc();
        debug!(grant_type = form[0].1, url = %self.endpoints.token, "posting token grant");

        let response = self
            .http
            .post(self.endpoints.token.clone())
            .form(form)
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(http::transport_error)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected the grant");
            return Err(http::token_status_error(status, &body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| DexcomError::Api {
            status: status.as_u16(),
            message: format!("malformed token response: {e}"),
        })?;

        TokenState::from_response(parsed, requested_at, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppConfig;
    use std::collections::HashMap;

    fn client() -> OAuthClient {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DEXCOM_CLIENT_ID", "my client"),
            ("DEXCOM_CLIENT_SECRET", "shh"),
            ("DEXCOM_REDIRECT_URI", "http://localhost:8501/oauth/callback"),
        ]);
        let config = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        OAuthClient::new(reqwest::Client::new(), config.credentials, config.endpoints)
    }

    #[test]
    fn authorization_url_carries_every_parameter() {
        let request = OAuthRequest::issue();
        let url = client().authorization_url(&request);
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/v2/oauth2/login");
        assert_eq!(pairs["client_id"], "my client");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8501/oauth/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "offline_access");
        assert_eq!(pairs["state"], request.state());
        assert!(!url.as_str().contains("shh"));
    }

    #[test]
    fn state_verification() {
        let request = OAuthRequest::issue();
        let state = request.state().to_string();

        assert!(OAuthClient::verify_state(Some(&request), &state).is_ok());
        assert!(matches!(
            OAuthClient::verify_state(Some(&request), "forged"),
            Err(DexcomError::Security)
        ));
        assert!(matches!(
            OAuthClient::verify_state(None, &state),
            Err(DexcomError::Security)
        ));
    }
}
