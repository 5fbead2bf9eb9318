mod common;

use common::{REDIRECT_URI, TOKEN_PATH, config_for, mount_token_response, state_for, token_body};
use dexcom_dashboard_server::models::{AppState, OAuthRequest};
use dexcom_dashboard_server::DexcomError;
use oauth2::RefreshToken;
use time::{Duration, OffsetDateTime};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn exchange_sets_expiry_from_request_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", "r1", Some(3600))))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let request = OAuthRequest::issue();

    let before = OffsetDateTime::now_utc();
    let token = state
        .oauth
        .exchange_code("abc123", request.state(), Some(&request))
        .await
        .unwrap();
    let after = OffsetDateTime::now_utc();

    assert_eq!(token.access_token.secret(), "a1");
    assert_eq!(token.refresh_token.secret(), "r1");
    assert!(token.expires_at >= before + Duration::seconds(3600));
    assert!(token.expires_at <= after + Duration::seconds(3600));
}

#[tokio::test]
async fn exchange_defaults_to_two_hours() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200).set_body_json(token_body("a1", "r1", None)),
        1,
    )
    .await;

    let state = state_for(&server.uri());
    let request = OAuthRequest::issue();

    let before = OffsetDateTime::now_utc();
    let token = state
        .oauth
        .exchange_code("abc", request.state(), Some(&request))
        .await
        .unwrap();
    let after = OffsetDateTime::now_utc();

    assert!(token.expires_at >= before + Duration::seconds(7200));
    assert!(token.expires_at <= after + Duration::seconds(7200));
}

#[tokio::test]
async fn mismatched_state_never_reaches_the_network() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200).set_body_json(token_body("a1", "r1", None)),
        0,
    )
    .await;

    let state = state_for(&server.uri());
    let request = OAuthRequest::issue();
    let other = OAuthRequest::issue();

    let long_code = "x".repeat(512);
    for code in ["abc", "", long_code.as_str(), "%00"] {
        for returned in [other.state(), "", "forged"] {
            let result = state.oauth.exchange_code(code, returned, Some(&request)).await;
            assert!(matches!(result, Err(DexcomError::Security)));
        }
        let result = state.oauth.exchange_code(code, request.state(), None).await;
        assert!(matches!(result, Err(DexcomError::Security)));
    }
}

#[tokio::test]
async fn token_statuses_map_to_one_error_each() {
    let cases: [(u16, fn(&DexcomError) -> bool); 4] = [
        (400, |e| matches!(e, DexcomError::InvalidGrant)),
        (401, |e| matches!(e, DexcomError::AuthFailure)),
        (403, |e| matches!(e, DexcomError::Api { status: 403, .. })),
        (503, |e| matches!(e, DexcomError::Api { status: 503, .. })),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        mount_token_response(
            &server,
            ResponseTemplate::new(status).set_body_string("nope"),
            1,
        )
        .await;

        let state = state_for(&server.uri());
        let request = OAuthRequest::issue();
        let err = state
            .oauth
            .exchange_code("abc", request.state(), Some(&request))
            .await
            .unwrap_err();

        assert!(expected(&err), "status {status} produced {err:?}");
    }
}

#[tokio::test]
async fn malformed_token_body_is_an_api_error() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token_type": "Bearer" })),
        1,
    )
    .await;

    let state = state_for(&server.uri());
    let request = OAuthRequest::issue();
    let err = state
        .oauth
        .exchange_code("abc", request.state(), Some(&request))
        .await
        .unwrap_err();

    assert!(matches!(err, DexcomError::Api { status: 200, .. }));
}

#[tokio::test]
async fn refresh_posts_a_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", "r2", Some(7200))))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let token = state
        .oauth
        .refresh(&RefreshToken::new("old-refresh".to_string()))
        .await
        .unwrap();

    assert_eq!(token.access_token.secret(), "a2");
    assert_eq!(token.refresh_token.secret(), "r2");
}

#[tokio::test]
async fn slow_token_endpoint_times_out() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(token_body("a1", "r1", None))
            .set_delay(std::time::Duration::from_secs(3)),
        1,
    )
    .await;

    let state = AppState::new(config_for(&server.uri(), "1")).unwrap();
    let err = state
        .oauth
        .refresh(&RefreshToken::new("r".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, DexcomError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_host_is_a_connection_error() {
    let state = state_for("http://127.0.0.1:1");
    let err = state
        .oauth
        .refresh(&RefreshToken::new("r".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, DexcomError::Connection(_)));
}

#[test]
fn redirect_uri_round_trips_into_the_authorization_url() {
    let state = state_for("http://127.0.0.1:1");
    let url = state.oauth.authorization_url(&OAuthRequest::issue());

    assert!(url.query_pairs().any(|(k, v)| k == "redirect_uri" && v == REDIRECT_URI));
}

#[tokio::test]
async fn out_of_range_expires_in_is_an_api_error() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200).set_body_json(token_body("a1", "r1", Some(i64::MAX))),
        1,
    )
    .await;

    let state = state_for(&server.uri());
    let request = OAuthRequest::issue();
    let returned = request.state().to_string();
    let err = state
        .oauth
        .exchange_code("abc", &returned, Some(&request))
        .await
        .unwrap_err();

    assert!(matches!(err, DexcomError::Api { status: 200, .. }));
}
