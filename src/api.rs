//! HTTP transport for the browser client.
//!
//! Client-side (hydrate): real requests via `gloo-net`.
//! Server-side (SSR): stubs returning an error, since these endpoints are
//! only reachable from the browser.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FetchError;

/// Outcome of a request that reached the server, mirroring the parts of the
/// response the views are allowed to look at: the ok flag, the status code,
/// and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(ok: bool, status: u16, body: impl Into<String>) -> Self {
        Self {
            ok,
            status,
            body: body.into(),
        }
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// `POST` a JSON body without credentials. Used for login and signup.
pub async fn post_json<T: Serialize>(path: &str, body: &T) -> Result<ApiResponse, FetchError> {
    #[cfg(feature = "hydrate")]
    {
        let request = gloo_net::http::Request::post(path)
            .json(body)
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        into_api_response(response).await
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (path, body);
        Err(FetchError::Network("not available on the server".to_owned()))
    }
}

/// `GET` with a bearer token attached.
pub async fn get_authorized(path: &str, token: &str) -> Result<ApiResponse, FetchError> {
    #[cfg(feature = "hydrate")]
    {
        let response = gloo_net::http::Request::get(path)
            .header("Authorization", &format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        into_api_response(response).await
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (path, token);
        Err(FetchError::Network("not available on the server".to_owned()))
    }
}

#[cfg(feature = "hydrate")]
async fn into_api_response(response: gloo_net::http::Response) -> Result<ApiResponse, FetchError> {
    let ok = response.ok();
    let status = response.status();
    // A body that fails to read decodes to nothing later; the status still counts.
    let body = response.text().await.unwrap_or_default();
    Ok(ApiResponse::new(ok, status, body))
}
