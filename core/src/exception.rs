//! Declarative re-mapping of remote exceptions to local error types.
//!
//! The remote API serialises its exceptions as JSON objects carrying the
//! remote class name under `exceptionClass` (older deployments use
//! `exceptionType`). Each facade call declares which of those it knows how to
//! translate by passing an `ExceptionMap`; the dispatcher looks the
//! identifier up and invokes the registered factory. Anything undeclared is
//! surfaced as `ApiError::RemoteOperationFailed` with the detail intact.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::types::{OrderedMap, TransactionError};

/// A structured error body returned by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    /// Identifier as sent by the remote, e.g.
    /// `\Kinikit\MVC\Exception\RateLimitExceededException`.
    pub identifier: String,
    pub message: String,
    pub status: u16,
    /// The full parsed error object.
    pub detail: Value,
    /// The raw response body.
    pub body: String,
}

impl RemoteError {
    /// Parse a response body into a `RemoteError`. Returns `None` when the
    /// body is not a JSON object naming an exception type.
    pub fn from_body(status: u16, body: &str) -> Option<Self> {
        let detail: Value = serde_json::from_str(body).ok()?;
        let object = detail.as_object()?;
        let identifier = object
            .get("exceptionClass")
            .or_else(|| object.get("exceptionType"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())?
            .to_string();
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            identifier,
            message,
            status,
            detail,
            body: body.to_string(),
        })
    }

    pub fn code(&self) -> Option<RemoteErrorCode> {
        RemoteErrorCode::from_identifier(&self.identifier)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.detail.get(name)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.identifier)
        } else {
            write!(f, "{}: {}", self.identifier, self.message)
        }
    }
}

/// Remote exception identifiers this client can translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorCode {
    RateLimitExceeded,
    Transaction,
}

impl RemoteErrorCode {
    /// Resolve a remote identifier. Namespace prefixes and a trailing
    /// `Exception` are ignored, so the fully qualified remote class name and
    /// the bare short name resolve to the same code.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let short = identifier.rsplit('\\').next().unwrap_or(identifier);
        let short = short.strip_suffix("Exception").unwrap_or(short);
        match short {
            "RateLimitExceeded" => Some(RemoteErrorCode::RateLimitExceeded),
            "Transaction" => Some(RemoteErrorCode::Transaction),
            _ => None,
        }
    }

    /// The class name the remote service uses for this code.
    pub fn remote_class(&self) -> &'static str {
        match self {
            RemoteErrorCode::RateLimitExceeded => "\\Kinikit\\MVC\\Exception\\RateLimitExceededException",
            RemoteErrorCode::Transaction => "\\Netistrar\\WebServices\\Common\\Exception\\TransactionException",
        }
    }
}

/// A failed transaction reported by the remote, with the per-reason errors
/// it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionException {
    pub remote: RemoteError,
    /// Errors keyed by reason code (e.g. `DOMAIN_NOT_IN_ACCOUNT`), in the
    /// order the remote sent them.
    pub transaction_errors: OrderedMap<TransactionError>,
}

impl TransactionException {
    pub fn from_remote(remote: RemoteError) -> Self {
        let transaction_errors = remote
            .field("transactionErrors")
            .cloned()
            .and_then(|errors| serde_json::from_value(errors).ok())
            .unwrap_or_default();
        Self {
            remote,
            transaction_errors,
        }
    }

    /// The first reason code, if any.
    pub fn reason(&self) -> Option<&str> {
        self.transaction_errors.keys().next()
    }

    /// The first transaction error message, falling back to the exception
    /// message.
    pub fn message(&self) -> &str {
        self.transaction_errors
            .values()
            .next()
            .map(|error| error.message.as_str())
            .unwrap_or(&self.remote.message)
    }
}

/// Local exception types produced by an `ExceptionMap`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientException {
    #[error("rate limit exceeded: {}", .0.message)]
    RateLimitExceeded(RemoteError),

    #[error("transaction failed: {}", .0.message())]
    Transaction(TransactionException),
}

impl ClientException {
    pub fn remote(&self) -> &RemoteError {
        match self {
            ClientException::RateLimitExceeded(remote) => remote,
            ClientException::Transaction(exception) => &exception.remote,
        }
    }
}

/// Builds a local exception from the remote detail.
pub type ExceptionFactory = fn(RemoteError) -> ClientException;

fn transaction_exception(remote: RemoteError) -> ClientException {
    ClientException::Transaction(TransactionException::from_remote(remote))
}

/// Per-call table of remote exceptions the caller knows how to translate.
#[derive(Clone, Default)]
pub struct ExceptionMap {
    entries: Vec<(RemoteErrorCode, ExceptionFactory)>,
}

impl ExceptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `code`, replacing any earlier registration.
    pub fn with(mut self, code: RemoteErrorCode, factory: ExceptionFactory) -> Self {
        self.entries.retain(|(existing, _)| *existing != code);
        self.entries.push((code, factory));
        self
    }

    /// Rate limiting only.
    pub fn rate_limited() -> Self {
        Self::new().with(RemoteErrorCode::RateLimitExceeded, ClientException::RateLimitExceeded)
    }

    /// Rate limiting plus transaction failures.
    pub fn transactional() -> Self {
        Self::rate_limited().with(RemoteErrorCode::Transaction, transaction_exception)
    }

    pub fn contains(&self, code: RemoteErrorCode) -> bool {
        self.entries.iter().any(|(existing, _)| *existing == code)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translate `remote` if its identifier is declared; otherwise hand it
    /// back unchanged.
    pub fn resolve(&self, remote: RemoteError) -> Result<ClientException, RemoteError> {
        let factory = remote
            .code()
            .and_then(|code| self.entries.iter().find(|(existing, _)| *existing == code))
            .map(|(_, factory)| *factory);
        match factory {
            Some(factory) => Ok(factory(remote)),
            None => Err(remote),
        }
    }
}

impl fmt::Debug for ExceptionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.iter().map(|(code, _)| code))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE_LIMIT_BODY: &str =
        r#"{"exceptionClass":"\\Kinikit\\MVC\\Exception\\RateLimitExceededException","message":"Too many requests"}"#;

    #[test]
    fn parses_exception_class_body() {
        let remote = RemoteError::from_body(429, RATE_LIMIT_BODY).unwrap();
        assert_eq!(remote.identifier, "\\Kinikit\\MVC\\Exception\\RateLimitExceededException");
        assert_eq!(remote.message, "Too many requests");
        assert_eq!(remote.code(), Some(RemoteErrorCode::RateLimitExceeded));
    }

    #[test]
    fn accepts_exception_type_key() {
        let remote = RemoteError::from_body(404, r#"{"exceptionType":"RateLimitExceeded"}"#).unwrap();
        assert_eq!(remote.code(), Some(RemoteErrorCode::RateLimitExceeded));
        assert_eq!(remote.to_string(), "RateLimitExceeded");
    }

    #[test]
    fn unstructured_bodies_are_not_remote_errors() {
        assert!(RemoteError::from_body(500, "Internal Server Error").is_none());
        assert!(RemoteError::from_body(500, r#"{"message":"no type"}"#).is_none());
        assert!(RemoteError::from_body(500, r#"["exceptionClass"]"#).is_none());
    }

    #[test]
    fn remote_class_round_trips_through_identifier() {
        for code in [RemoteErrorCode::RateLimitExceeded, RemoteErrorCode::Transaction] {
            assert_eq!(RemoteErrorCode::from_identifier(code.remote_class()), Some(code));
        }
        assert_eq!(RemoteErrorCode::from_identifier("SomethingElseException"), None);
    }

    #[test]
    fn resolve_uses_declared_factory() {
        let remote = RemoteError::from_body(429, RATE_LIMIT_BODY).unwrap();
        let exception = ExceptionMap::rate_limited().resolve(remote).unwrap();
        assert!(matches!(exception, ClientException::RateLimitExceeded(ref r) if r.status == 429));
    }

    #[test]
    fn resolve_returns_undeclared_errors() {
        let remote = RemoteError::from_body(429, RATE_LIMIT_BODY).unwrap();
        let returned = ExceptionMap::new().resolve(remote.clone()).unwrap_err();
        assert_eq!(returned, remote);
    }

    #[test]
    fn transaction_exception_exposes_first_reason() {
        let body = r#"{
            "exceptionClass": "\\Netistrar\\WebServices\\Common\\Exception\\TransactionException",
            "message": "Transaction failed",
            "transactionErrors": {
                "DOMAIN_NOT_IN_ACCOUNT": {"code": "DOMAIN_NOT_IN_ACCOUNT", "message": "The domain example.com is not in your account"},
                "OTHER": {"code": "OTHER", "message": "Other"}
            }
        }"#;
        let remote = RemoteError::from_body(400, body).unwrap();
        let exception = ExceptionMap::transactional().resolve(remote).unwrap();
        match exception {
            ClientException::Transaction(tx) => {
                assert_eq!(tx.reason(), Some("DOMAIN_NOT_IN_ACCOUNT"));
                assert_eq!(tx.message(), "The domain example.com is not in your account");
            }
            other => panic!("unexpected exception: {other:?}"),
        }
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let map = ExceptionMap::rate_limited().with(RemoteErrorCode::RateLimitExceeded, transaction_exception);
        let remote = RemoteError::from_body(429, RATE_LIMIT_BODY).unwrap();
        assert!(matches!(map.resolve(remote), Ok(ClientException::Transaction(_))));
        assert!(map.contains(RemoteErrorCode::RateLimitExceeded));
        assert!(!map.contains(RemoteErrorCode::Transaction));
    }
}
