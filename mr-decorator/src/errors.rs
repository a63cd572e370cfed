//! Crate-wide error hierarchy for mr-decorator.
//!
//! Every fatal condition of a decoration pass ends up here. Expected
//! non-matches (issue outside the MR, no blame for a line) and the
//! "Cannot transition status" quirk are not errors and never reach this type.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type DecorateResult<T> = Result<T, Error>;

/// Root error type for the mr-decorator crate.
#[derive(Debug, Error)]
pub enum Error {
    /// GitLab answered with something other than the documented contract.
    #[error(transparent)]
    Remote(#[from] RemoteApiError),

    /// The analysis did not carry what the pass needs (scanner properties, conditions).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures talking to the GitLab REST API.
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// Status code differs from the one the endpoint documents (200 for GET, 201 for POST).
    #[error("unexpected status from {url}: expected {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset/body read).
    #[error("network error: {0}")]
    Network(String),

    /// JSON deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Response decoded but does not carry a field we rely on.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Header value cannot be sent (e.g. token with control characters).
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// URL could not be parsed or extended.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The server handed out a `next` link we already followed.
    #[error("pagination loop detected at {0}")]
    PaginationLoop(String),
}

/// Missing or unusable analysis input. Raised before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not decorate GitLab merge request: '{0}' has not been set in scanner properties")]
    MissingScannerProperty(&'static str),

    #[error("could not find quality gate condition '{0}' in analysis")]
    MissingCondition(&'static str),

    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Remote(RemoteApiError::from(e))
    }
}

impl From<reqwest::Error> for RemoteApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return RemoteApiError::Timeout;
        }
        if e.is_builder() {
            return RemoteApiError::InvalidUrl(e.to_string());
        }
        RemoteApiError::Network(e.to_string())
    }
}
