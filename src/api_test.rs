use super::*;

use crate::{AuthPayload, VisitCount};

#[test]
fn api_response_decodes_count_body() {
    let resp = ApiResponse::new(true, 200, r#"{"count":42}"#);
    let body: VisitCount = resp.json().expect("valid body");
    assert_eq!(body.count, 42);
}

#[test]
fn api_response_decodes_auth_payload() {
    let resp = ApiResponse::new(
        true,
        200,
        r#"{"token":"abc","user":{"username":"alice","created_at":"2024-01-01T00:00:00Z"}}"#,
    );
    let payload: AuthPayload = resp.json().expect("valid body");
    assert_eq!(payload.token, "abc");
    assert_eq!(payload.user.username, "alice");
}

#[test]
fn api_response_rejects_malformed_body() {
    let resp = ApiResponse::new(true, 200, "not json");
    let err = resp.json::<VisitCount>().unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[test]
fn api_response_ignores_extra_fields() {
    let resp = ApiResponse::new(true, 200, r#"{"count":7,"extra":"ignored"}"#);
    let body: VisitCount = resp.json().expect("valid body");
    assert_eq!(body.count, 7);
}

// The home loader matches the expiry failure by message, so these strings
// are contractual.

#[test]
fn session_expired_message_is_exact() {
    assert_eq!(FetchError::SessionExpired.to_string(), "Session expired");
}

#[test]
fn http_error_message_carries_status() {
    let err = FetchError::Http { status: 503 };
    assert_eq!(err.to_string(), "HTTP error! Status: 503");
}
