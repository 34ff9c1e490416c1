//! Error types for the Netistrar API client.
//!
//! # Design
//! Transport failures and HTTP-level failures are separate variants because
//! only the former may be suppressed (`ignore_errors`). A response whose body
//! is a serialised remote exception is re-mapped by the dispatcher: declared
//! identifiers become `Remote(ClientException)`, undeclared ones become
//! `RemoteOperationFailed` with the remote detail attached. Unstructured
//! 4xx/5xx bodies stay `HttpRequestError`.

use thiserror::Error;

use crate::exception::{ClientException, RemoteError};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by transports, the dispatcher and the facades.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The exchange could not be completed (DNS, connect, timeout, I/O).
    #[error("network failure calling {url}: {message}")]
    NetworkFailure { url: String, message: String },

    /// A response arrived with status >= 400 and no recognised remote
    /// exception in its body.
    #[error("HTTP request to {url} failed with status {status}")]
    HttpRequestError { url: String, status: u16, body: String },

    /// A remote exception the caller declared in its exception map.
    #[error(transparent)]
    Remote(#[from] ClientException),

    /// A remote exception the caller did not declare.
    #[error("remote operation failed with status {}: {}", .0.status, .0)]
    RemoteOperationFailed(RemoteError),

    /// The request payload could not be serialised to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body did not match the expected result shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpRequestError { status, .. } => Some(*status),
            ApiError::Remote(exception) => Some(exception.remote().status),
            ApiError::RemoteOperationFailed(remote) => Some(remote.status),
            _ => None,
        }
    }

    pub fn is_network_failure(&self) -> bool {
        matches!(self, ApiError::NetworkFailure { .. })
    }
}
