//! Outbound HTTP transports.
//!
//! # Design
//! A transport performs exactly one exchange for a `RemoteRequest` and
//! returns the raw response body. Two implementations exist:
//! - `AgentTransport` uses the ureq HTTP client (http and https).
//! - `SocketTransport` speaks HTTP/1.1 over a plain `std::net::TcpStream`.
//!
//! Both render the request through `PreparedRequest::from_remote` and apply
//! the same outcome rules in `finish`, which is what makes them
//! interchangeable:
//! - a network failure is returned as `NetworkFailure`, or as an empty body
//!   when `ignore_errors` is set;
//! - a status >= 400 is always `HttpRequestError`, whatever `ignore_errors`
//!   says.
//!
//! Nothing is retried and no connection is reused across calls. Redirects
//! are not followed: a 3xx response is returned as is. Response bodies larger
//! than `MAX_RESPONSE_BYTES` are a network failure on both transports.

mod agent;
mod socket;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::http::{HttpResponse, PreparedRequest, RemoteRequest};

pub use agent::AgentTransport;
pub use socket::SocketTransport;

/// Largest response body either transport will read.
pub const MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Performs a single outbound HTTP call.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send `request` and return the response body.
    ///
    /// `timeout` overrides the request's own timeout (default 15 seconds).
    fn dispatch(&self, request: &RemoteRequest, ignore_errors: bool, timeout: Option<u64>) -> Result<String>;
}

/// Selects a transport implementation from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Agent,
    Socket,
}

impl TransportKind {
    pub fn build(&self) -> Arc<dyn Transport> {
        match self {
            TransportKind::Agent => Arc::new(AgentTransport::new()),
            TransportKind::Socket => Arc::new(SocketTransport::new()),
        }
    }
}

impl FromStr for TransportKind {
    type Err = ApiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" | "curl" | "library" => Ok(TransportKind::Agent),
            "socket" | "native" => Ok(TransportKind::Socket),
            other => Err(ApiError::Config(format!("unknown transport: {other}"))),
        }
    }
}

/// What one exchange produced. `Err` carries a network failure message.
pub(crate) type Exchange = std::result::Result<HttpResponse, String>;

/// The URL with its query string removed. Query strings carry the API
/// credentials, so only this form is logged or put into errors.
pub(crate) fn display_url(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

/// Apply the shared outcome rules to an exchange.
pub(crate) fn finish(
    transport: &'static str,
    prepared: &PreparedRequest,
    exchange: Exchange,
    ignore_errors: bool,
    started: Instant,
) -> Result<String> {
    let url = display_url(&prepared.url);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let response = match exchange {
        Ok(response) => response,
        Err(message) => {
            warn!(transport, method = %prepared.method, url, elapsed_ms, error = %message, ignore_errors, "transport_network_failure");
            if ignore_errors {
                return Ok(String::new());
            }
            return Err(ApiError::NetworkFailure {
                url: url.to_string(),
                message,
            });
        }
    };

    debug!(transport, method = %prepared.method, url, status = response.status, elapsed_ms, "transport_dispatch");

    if response.is_error() {
        return Err(ApiError::HttpRequestError {
            url: url.to_string(),
            status: response.status,
            body: response.body,
        });
    }
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn prepared() -> PreparedRequest {
        PreparedRequest::from_remote(
            &RemoteRequest::new("http://api.test/domains/ping", HttpMethod::Get)
                .with_parameters(crate::http::Parameters::new().with("apiSecret", "SECRET")),
        )
    }

    fn response(status: u16, body: &str) -> Exchange {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    #[test]
    fn success_returns_body() {
        let body = finish("test", &prepared(), response(200, "OK"), false, Instant::now()).unwrap();
        assert_eq!(body, "OK");
    }

    #[test]
    fn network_failure_is_suppressed_only_when_ignoring_errors() {
        let ignored = finish("test", &prepared(), Err("refused".to_string()), true, Instant::now()).unwrap();
        assert_eq!(ignored, "");

        let err = finish("test", &prepared(), Err("refused".to_string()), false, Instant::now()).unwrap_err();
        assert!(matches!(err, ApiError::NetworkFailure { ref message, .. } if message == "refused"));
    }

    #[test]
    fn http_errors_are_raised_even_when_ignoring_errors() {
        let err = finish("test", &prepared(), response(404, "missing"), true, Instant::now()).unwrap_err();
        match err {
            ApiError::HttpRequestError { url, status, body } => {
                assert_eq!(url, "http://api.test/domains/ping");
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn errors_never_carry_the_query_string() {
        let err = finish("test", &prepared(), Err("refused".to_string()), false, Instant::now()).unwrap_err();
        assert!(!err.to_string().contains("SECRET"));
    }

    #[test]
    fn transport_kind_parses_aliases() {
        assert_eq!("curl".parse::<TransportKind>().unwrap(), TransportKind::Agent);
        assert_eq!("Socket".parse::<TransportKind>().unwrap(), TransportKind::Socket);
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());
    }
}
