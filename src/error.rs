use thiserror::Error;

/// Failures of a client-side HTTP call.
///
/// The `Display` strings are part of the contract: the home loader treats
/// `auth_fetch` as opaque and decides whether to tear the session down by
/// comparing the failure message against the literal `"Session expired"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered, but with a non-ok status.
    #[error("HTTP error! Status: {status}")]
    Http { status: u16 },
    /// The bearer token was rejected; the session is no longer valid.
    #[error("Session expired")]
    SessionExpired,
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(String),
    /// The response body did not decode as the expected JSON shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}
