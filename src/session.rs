//! The session service object.
//!
//! Holds the authenticated-user state behind a reactive signal and owns every
//! operation that touches session credentials: login, signup, logout, and
//! credential-attaching fetch. Views receive a [`Session`] through context
//! but the handle is constructed explicitly at the root, so the dependency
//! stays visible.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::future::Future;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

use crate::api::{self, ApiResponse};
use crate::error::FetchError;
use crate::{AuthPayload, Credentials, User, VisitCount};

/// In-memory session state. Created on successful login/signup, destroyed on
/// logout or detected expiry. A session is authenticated iff it holds a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl SessionState {
    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Cheap-to-copy handle on the current session.
#[derive(Clone, Copy)]
pub struct Session {
    state: RwSignal<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(SessionState::default()),
        }
    }

    /// Loads a persisted session from browser storage, reporting whether one
    /// was found. Runs from a client-side effect so the first render agrees
    /// with the server-rendered tree. The stored token is not trusted yet;
    /// call [`Session::validate`] to check it server-side.
    pub fn resume(&self) -> bool {
        match storage::load() {
            Some(saved) => {
                self.state.set(saved);
                true
            }
            None => false,
        }
    }

    /// Reactive read: re-runs the surrounding effect when the flag changes.
    pub fn is_authenticated(&self) -> bool {
        self.state.with(|s| s.is_authenticated())
    }

    /// Non-reactive read, for use inside spawned futures.
    pub fn is_authenticated_untracked(&self) -> bool {
        self.state.with_untracked(|s| s.is_authenticated())
    }

    pub fn username(&self) -> Option<String> {
        self.state
            .with(|s| s.user.as_ref().map(|u| u.username.clone()))
    }

    pub async fn login(&self, username: String, password: String) -> Result<(), FetchError> {
        self.authenticate("/login", username, password).await
    }

    pub async fn signup(&self, username: String, password: String) -> Result<(), FetchError> {
        self.authenticate("/signup", username, password).await
    }

    async fn authenticate(
        &self,
        path: &str,
        username: String,
        password: String,
    ) -> Result<(), FetchError> {
        let response = api::post_json(path, &Credentials { username, password }).await?;
        if !response.ok {
            return Err(FetchError::Http {
                status: response.status,
            });
        }
        let payload: AuthPayload = response.json()?;
        let next = SessionState::authenticated(payload.user, payload.token);
        storage::save(&next);
        self.state.set(next);
        Ok(())
    }

    pub fn logout(&self) {
        storage::clear();
        self.state.set(SessionState::default());
    }

    /// Issues a `GET` with the session token attached. A 401 rejects with the
    /// distinguished `Session expired` failure before the caller ever sees an
    /// ok flag; every other status resolves normally and the caller checks
    /// `ok` itself.
    pub async fn auth_fetch(&self, path: &str) -> Result<ApiResponse, FetchError> {
        let token = self
            .state
            .with_untracked(|s| s.token.clone())
            .ok_or(FetchError::SessionExpired)?;
        let response = api::get_authorized(path, &token).await?;
        if response.status == 401 {
            return Err(FetchError::SessionExpired);
        }
        Ok(response)
    }

    /// Checks a restored token against `GET /verify`, dropping the session if
    /// the server no longer accepts it.
    pub async fn validate(&self) {
        if !self.is_authenticated_untracked() {
            return;
        }
        if let Err(err) = self.auth_fetch("/verify").await {
            log::warn!("Stored session rejected: {err}");
            if invalidates_restored_session(&err) {
                self.logout();
            }
        }
    }
}

/// Whether a failed `/verify` means the persisted token is dead. Transport
/// failures keep the session; the next authenticated fetch re-checks.
pub(crate) fn invalidates_restored_session(err: &FetchError) -> bool {
    *err == FetchError::SessionExpired
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one counter refresh against an opaque fetch.
///
/// Non-ok responses become an HTTP failure carrying the status; any failure
/// is logged, and a failure whose message is exactly `Session expired` invokes
/// `logout`. Returns the fetched count on success and `None` otherwise, so a
/// failed fetch leaves the displayed value untouched. No retry, no timeout.
pub(crate) async fn load_visit_count<F, Fut, L>(fetch: F, logout: L) -> Option<u64>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ApiResponse, FetchError>>,
    L: FnOnce(),
{
    let result = async {
        let response = fetch().await?;
        if !response.ok {
            return Err(FetchError::Http {
                status: response.status,
            });
        }
        let body: VisitCount = response.json()?;
        Ok(body.count)
    }
    .await;

    match result {
        Ok(count) => Some(count),
        Err(err) => {
            log::error!("Failed to fetch count: {err}");
            if err.to_string() == "Session expired" {
                logout();
            }
            None
        }
    }
}

/// Runs one counter refresh and commits the result, unless the session
/// stopped being authenticated while the request was in flight. A logout
/// racing the fetch must not resurrect a stale value.
pub(crate) async fn refresh_visit_count<F, Fut, L, A, C>(
    fetch: F,
    logout: L,
    still_authenticated: A,
    commit: C,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ApiResponse, FetchError>>,
    L: FnOnce(),
    A: FnOnce() -> bool,
    C: FnOnce(u64),
{
    if let Some(fresh) = load_visit_count(fetch, logout).await {
        if still_authenticated() {
            commit(fresh);
        }
    }
}

/// Session persistence in `localStorage`. The browser is the only place this
/// exists; on the server every operation is a no-op.
mod storage {
    use super::SessionState;

    #[cfg(feature = "hydrate")]
    const STORAGE_KEY: &str = "visit-counter.session";

    #[cfg(feature = "hydrate")]
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }

    pub(super) fn load() -> Option<SessionState> {
        #[cfg(feature = "hydrate")]
        {
            let raw = local_storage()?.get_item(STORAGE_KEY).ok().flatten()?;
            serde_json::from_str(&raw).ok()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            None
        }
    }

    pub(super) fn save(state: &SessionState) {
        #[cfg(feature = "hydrate")]
        {
            if let (Some(storage), Ok(raw)) = (local_storage(), serde_json::to_string(state)) {
                let _ = storage.set_item(STORAGE_KEY, &raw);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = state;
        }
    }

    pub(super) fn clear() {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = local_storage() {
                let _ = storage.remove_item(STORAGE_KEY);
            }
        }
    }
}
