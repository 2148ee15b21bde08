//! Server half: account store, token handling, and the JSON API handlers.
//!
//! State lives in memory behind a mutex; tokens are HS256 JWTs with a 24 hour
//! expiry. Handlers reject with `(StatusCode, String)` and log anything that
//! turns into a 5xx.

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::warn;
use pbkdf2::password_hash::rand_core::OsRng;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AuthPayload, Credentials, User, VisitCount};

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    exp: i64,
}

struct UserRecord {
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Store {
    users: HashMap<String, UserRecord>,
    visits: u64,
}

/// Shared backend handle: the account/visit store plus the token keys.
#[derive(Clone)]
pub struct Backend {
    store: Arc<Mutex<Store>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Backend {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Creates the account and logs it straight in.
    ///
    /// Hashing is slow enough that holding the lock across it would serialize
    /// every handler behind one signup, so the lock is taken twice: a cheap
    /// duplicate check up front, then the decisive check-and-insert after the
    /// hash is ready.
    pub fn signup(&self, username: &str, password: &str) -> Result<AuthPayload, AuthError> {
        if self.store.lock().unwrap().users.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(password)?;
        let created_at = Utc::now();

        let mut store = self.store.lock().unwrap();
        if store.users.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }
        store.users.insert(
            username.to_owned(),
            UserRecord {
                password_hash,
                created_at,
            },
        );
        drop(store);

        self.issue_payload(username, created_at)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthPayload, AuthError> {
        // Clone the record out so verification runs without the lock held.
        let (password_hash, created_at) = {
            let store = self.store.lock().unwrap();
            let record = store
                .users
                .get(username)
                .ok_or(AuthError::InvalidCredentials)?;
            (record.password_hash.clone(), record.created_at)
        };
        if !verify_password(password, &password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_payload(username, created_at)
    }

    /// Counts this request as a visit and returns the new total.
    pub fn record_visit(&self) -> VisitCount {
        let mut store = self.store.lock().unwrap();
        store.visits += 1;
        VisitCount {
            count: store.visits,
        }
    }

    /// Returns the username a token names, or `None` for anything the
    /// validator refuses (bad signature, garbage, past expiry).
    pub fn verify_token(&self, token: &str) -> Option<String> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .ok()
            .map(|data| data.claims.username)
    }

    fn issue_payload(&self, username: &str, created_at: DateTime<Utc>) -> Result<AuthPayload, AuthError> {
        let expires_at = Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS);
        let token = self.issue_token(username, expires_at)?;
        Ok(AuthPayload {
            token,
            user: User {
                username: username.to_owned(),
                created_at,
            },
        })
    }

    fn issue_token(&self, username: &str, expires_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            username: username.to_owned(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to sign token")
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Pbkdf2.verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Checks the bearer token and yields the username it names.
fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<String, (StatusCode, String)> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Authorization header required".to_string(),
        ))?;

    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    backend
        .verify_token(token)
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid token".to_string()))
}

fn reject(err: AuthError) -> (StatusCode, String) {
    if matches!(err, AuthError::Internal(_)) {
        warn!("Returning error in response: {err:?}");
    }
    (err.status(), err.to_string())
}

/// `POST /login` => `{ "username": ..., "password": ... }`
pub async fn login(
    State(backend): State<Backend>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthPayload>, (StatusCode, String)> {
    backend
        .login(&req.username, &req.password)
        .map(Json)
        .map_err(reject)
}

/// `POST /signup` => `{ "username": ..., "password": ... }`
pub async fn signup(
    State(backend): State<Backend>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthPayload>, (StatusCode, String)> {
    backend
        .signup(&req.username, &req.password)
        .map(Json)
        .map_err(reject)
}

/// `GET /verify` => 200 if the bearer token is still good.
pub async fn verify(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    authorize(&backend, &headers)?;
    Ok(StatusCode::OK)
}

/// `GET /api` => increments and returns the visit counter.
pub async fn visit_count(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> Result<Json<VisitCount>, (StatusCode, String)> {
    let _username = authorize(&backend, &headers)?;
    Ok(Json(backend.record_visit()))
}
