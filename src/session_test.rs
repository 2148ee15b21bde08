use super::*;

use std::cell::Cell;

fn sample_user() -> User {
    User {
        username: "alice".to_string(),
        created_at: chrono::Utc::now(),
    }
}

// =============================================================
// SessionState
// =============================================================

#[test]
fn default_state_is_unauthenticated() {
    let state = SessionState::default();
    assert!(!state.is_authenticated());
    assert!(state.user.is_none());
    assert!(state.token.is_none());
}

#[test]
fn state_with_token_is_authenticated() {
    let state = SessionState::authenticated(sample_user(), "tok".to_string());
    assert!(state.is_authenticated());
    assert_eq!(state.user.unwrap().username, "alice");
}

#[test]
fn state_survives_a_storage_round_trip() {
    let state = SessionState::authenticated(sample_user(), "tok".to_string());
    let raw = serde_json::to_string(&state).unwrap();
    let back: SessionState = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, state);
}

// =============================================================
// load_visit_count — one refresh per authentication transition
// =============================================================

fn count_response(count: u64) -> ApiResponse {
    ApiResponse::new(true, 200, format!(r#"{{"count":{count}}}"#))
}

#[tokio::test]
async fn successful_fetch_yields_the_count() {
    let logged_out = Cell::new(0u32);
    let fetched = load_visit_count(
        || async { Ok(count_response(42)) },
        || logged_out.set(logged_out.get() + 1),
    )
    .await;
    assert_eq!(fetched, Some(42));
    assert_eq!(logged_out.get(), 0);
}

#[tokio::test]
async fn non_ok_response_yields_nothing_and_keeps_the_session() {
    let logged_out = Cell::new(0u32);
    let fetched = load_visit_count(
        || async { Ok(ApiResponse::new(false, 401, "")) },
        || logged_out.set(logged_out.get() + 1),
    )
    .await;
    // An HTTP failure is logged but is not an expiry signal.
    assert_eq!(fetched, None);
    assert_eq!(logged_out.get(), 0);
}

#[tokio::test]
async fn expired_session_triggers_logout_exactly_once() {
    let logged_out = Cell::new(0u32);
    let fetched = load_visit_count(
        || async { Err(FetchError::SessionExpired) },
        || logged_out.set(logged_out.get() + 1),
    )
    .await;
    assert_eq!(fetched, None);
    assert_eq!(logged_out.get(), 1);
}

#[tokio::test]
async fn malformed_body_yields_nothing() {
    let logged_out = Cell::new(0u32);
    let fetched = load_visit_count(
        || async { Ok(ApiResponse::new(true, 200, "not json")) },
        || logged_out.set(logged_out.get() + 1),
    )
    .await;
    assert_eq!(fetched, None);
    assert_eq!(logged_out.get(), 0);
}

#[tokio::test]
async fn transport_failure_yields_nothing_and_keeps_the_session() {
    let logged_out = Cell::new(0u32);
    let fetched = load_visit_count(
        || async { Err(FetchError::Network("connection refused".to_string())) },
        || logged_out.set(logged_out.get() + 1),
    )
    .await;
    assert_eq!(fetched, None);
    assert_eq!(logged_out.get(), 0);
}

// =============================================================
// refresh_visit_count — the stale-commit guard
// =============================================================

#[tokio::test]
async fn count_resolved_after_logout_is_not_applied() {
    let committed = Cell::new(None);
    refresh_visit_count(
        || async { Ok(count_response(42)) },
        || {},
        || false,
        |fresh| committed.set(Some(fresh)),
    )
    .await;
    assert_eq!(committed.get(), None);
}

#[tokio::test]
async fn count_is_applied_while_still_authenticated() {
    let committed = Cell::new(None);
    refresh_visit_count(
        || async { Ok(count_response(42)) },
        || {},
        || true,
        |fresh| committed.set(Some(fresh)),
    )
    .await;
    assert_eq!(committed.get(), Some(42));
}

#[tokio::test]
async fn failed_refresh_commits_nothing() {
    let committed = Cell::new(None);
    refresh_visit_count(
        || async { Err(FetchError::Network("connection refused".to_string())) },
        || {},
        || true,
        |fresh| committed.set(Some(fresh)),
    )
    .await;
    assert_eq!(committed.get(), None);
}

// =============================================================
// Restored-session validation
// =============================================================

#[test]
fn restored_session_is_dropped_when_the_server_refuses_the_token() {
    assert!(invalidates_restored_session(&FetchError::SessionExpired));
}

#[test]
fn transport_failures_keep_a_restored_session() {
    assert!(!invalidates_restored_session(&FetchError::Network(
        "connection refused".to_string()
    )));
    assert!(!invalidates_restored_session(&FetchError::Http {
        status: 500
    }));
    assert!(!invalidates_restored_session(&FetchError::Decode(
        "not json".to_string()
    )));
}
