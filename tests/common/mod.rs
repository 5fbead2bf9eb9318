#![allow(dead_code)]

use dexcom_dashboard_server::models::oauth::TokenResponse;
use dexcom_dashboard_server::models::{AppConfig, AppState, TokenState};
use serde_json::{Value, json};
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/v2/oauth2/token";
pub const EGVS_PATH: &str = "/v2/users/self/egvs";
pub const REDIRECT_URI: &str = "http://localhost:8501/oauth/callback";

pub fn config_for(base_url: &str, timeout_secs: &str) -> AppConfig {
    let env: HashMap<&str, String> = HashMap::from([
        ("DEXCOM_CLIENT_ID", "test-client".to_string()),
        ("DEXCOM_CLIENT_SECRET", "test-secret".to_string()),
        ("DEXCOM_REDIRECT_URI", REDIRECT_URI.to_string()),
        ("DEXCOM_BASE_URL", base_url.to_string()),
        ("DEXCOM_HTTP_TIMEOUT_SECS", timeout_secs.to_string()),
    ]);
    AppConfig::from_lookup(|key| env.get(key).cloned()).expect("test config")
}

pub fn state_for(base_url: &str) -> AppState {
    AppState::new(config_for(base_url, "5")).expect("test state")
}

pub fn token_body(access: &str, refresh: &str, expires_in: Option<i64>) -> Value {
    let mut body = json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
    });
    if let Some(expires_in) = expires_in {
        body["expires_in"] = json!(expires_in);
    }
    body
}

/// A token the session already holds, valid for `valid_for`.
pub fn held_token(access: &str, refresh: &str, valid_for: Duration) -> TokenState {
    TokenState::from_response(
        TokenResponse {
            access_token: Some(access.to_string()),
            refresh_token: Some(refresh.to_string()),
            expires_in: Some(valid_for.whole_seconds()),
        },
        OffsetDateTime::now_utc(),
        200,
    )
    .expect("valid token")
}

pub fn egvs_body(records: &[(&str, i32)]) -> Value {
    let egvs: Vec<Value> = records
        .iter()
        .map(|(time, value)| json!({ "displayTime": time, "value": value, "trend": "flat" }))
        .collect();
    json!({ "egvs": egvs })
}

pub async fn mount_token_response(
    server: &MockServer,
    template: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}
