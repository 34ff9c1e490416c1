//! Generic typed dispatcher over a `Transport`.
//!
//! # Design
//! A facade method describes its call as a `MethodCall`: relative path, verb,
//! call parameters, JSON payload, the `Expected` result shape and the
//! `ExceptionMap` of remote errors it can translate. `WebServiceProxy` turns
//! that into a `RemoteRequest`, dispatches it and interprets the outcome:
//!
//! 1. Global parameters (API key and secret) are merged under the call
//!    parameters.
//! 2. The transport is always invoked with `ignore_errors = false`.
//! 3. An error status whose body is a serialised remote exception is
//!    re-mapped through the call's `ExceptionMap`; an unstructured error body
//!    stays `HttpRequestError`. A success body carrying a serialised exception
//!    is re-mapped the same way.
//! 4. Otherwise the body is shaped by `Expected` into a `serde_json::Value`
//!    and, for typed calls, handed to serde.
//!
//! The proxy holds no mutable state; identical calls produce identical
//! requests.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::{ApiError, Result};
use crate::exception::{ExceptionMap, RemoteError};
use crate::http::{HttpMethod, ParamValue, Parameters, RemoteRequest};
use crate::transport::Transport;

/// Primitive result shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Integer,
    Float,
    String,
}

impl Primitive {
    fn name(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Integer => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
        }
    }
}

/// Describes how a response body is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// The body is discarded.
    Nothing,
    Primitive(Primitive),
    /// A named remote object, decoded from a JSON object.
    Object(String),
    ArrayOf(Box<Expected>),
    /// A string-keyed map; key order is preserved.
    MapOf(Box<Expected>),
}

impl Expected {
    pub fn boolean() -> Self {
        Expected::Primitive(Primitive::Boolean)
    }

    pub fn integer() -> Self {
        Expected::Primitive(Primitive::Integer)
    }

    pub fn float() -> Self {
        Expected::Primitive(Primitive::Float)
    }

    pub fn string() -> Self {
        Expected::Primitive(Primitive::String)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Expected::Object(name.into())
    }

    pub fn array_of(inner: Expected) -> Self {
        Expected::ArrayOf(Box::new(inner))
    }

    pub fn map_of(inner: Expected) -> Self {
        Expected::MapOf(Box::new(inner))
    }
}

impl FromStr for Expected {
    type Err = ApiError;

    /// Parses descriptors such as `boolean`, `Transaction`, `string[][]` and
    /// `DomainAvailability[string]`. Bracket groups apply right to left.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(Expected::array_of(inner.parse()?));
        }
        if let Some(open) = s.strip_suffix(']').and_then(|rest| rest.rfind('[')) {
            return Ok(Expected::map_of(s[..open].parse()?));
        }
        match s.to_ascii_lowercase().as_str() {
            "" | "void" | "null" | "none" => return Ok(Expected::Nothing),
            "bool" | "boolean" => return Ok(Expected::boolean()),
            "int" | "integer" => return Ok(Expected::integer()),
            "float" | "double" => return Ok(Expected::float()),
            "string" => return Ok(Expected::string()),
            _ => {}
        }
        let valid = s
            .trim_start_matches('\\')
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\');
        if valid {
            Ok(Expected::Object(s.rsplit('\\').next().unwrap_or(s).to_string()))
        } else {
            Err(ApiError::InvalidRequest(format!("invalid result descriptor: {s}")))
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Nothing => f.write_str("void"),
            Expected::Primitive(p) => f.write_str(p.name()),
            Expected::Object(name) => f.write_str(name),
            Expected::ArrayOf(inner) => write!(f, "{inner}[]"),
            Expected::MapOf(inner) => write!(f, "{inner}[string]"),
        }
    }
}

/// One facade call, described as data.
#[derive(Debug, Clone)]
pub struct MethodCall {
    path: String,
    method: HttpMethod,
    params: Parameters,
    payload: Option<String>,
    expected: Expected,
    exceptions: ExceptionMap,
    timeout: Option<u64>,
}

impl MethodCall {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            params: Parameters::new(),
            payload: None,
            expected: Expected::Nothing,
            exceptions: ExceptionMap::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Get)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Post)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Put)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Delete)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Serialise `payload` to JSON now, so a bad payload fails before any
    /// network activity.
    pub fn payload<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self> {
        let json = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.payload = Some(json);
        Ok(self)
    }

    pub fn returns(mut self, expected: Expected) -> Self {
        self.expected = expected;
        self
    }

    pub fn exceptions(mut self, exceptions: ExceptionMap) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn payload_json(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    pub fn exception_map(&self) -> &ExceptionMap {
        &self.exceptions
    }
}

/// Percent-encode a value for use as a single path segment.
pub fn path_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Dispatches `MethodCall`s against one base URL.
#[derive(Debug, Clone)]
pub struct WebServiceProxy {
    base_url: String,
    globals: Arc<Parameters>,
    transport: Arc<dyn Transport>,
    timeout: Option<u64>,
}

impl WebServiceProxy {
    pub fn new(base_url: impl Into<String>, globals: Arc<Parameters>, transport: Arc<dyn Transport>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            globals,
            transport,
            timeout: None,
        }
    }

    /// Default timeout for calls that do not set their own.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The request `call` is sent as.
    pub fn request_for(&self, call: &MethodCall) -> RemoteRequest {
        let path = call.path.trim_start_matches('/');
        let url = if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let mut request = RemoteRequest::new(url, call.method).with_parameters(call.params.merged_over(&self.globals));
        if let Some(payload) = &call.payload {
            request = request.with_payload(payload.clone());
        }
        if let Some(timeout) = call.timeout.or(self.timeout) {
            request = request.with_timeout(timeout);
        }
        request
    }

    /// Perform `call` and return the body shaped by its `Expected`.
    pub fn call_method(&self, call: &MethodCall) -> Result<Value> {
        let request = self.request_for(call);
        debug!(path = %call.path, method = %call.method, expected = %call.expected, "proxy_call");

        let body = match self.transport.dispatch(&request, false, None) {
            Ok(body) => body,
            Err(ApiError::HttpRequestError { url, status, body }) => {
                return Err(match RemoteError::from_body(status, &body) {
                    Some(remote) => self.remap(call, remote),
                    None => ApiError::HttpRequestError { url, status, body },
                });
            }
            Err(other) => return Err(other),
        };

        if body.contains("\"exception") {
            if let Some(remote) = RemoteError::from_body(200, &body) {
                return Err(self.remap(call, remote));
            }
        }

        decode(&call.expected, &body)
    }

    /// Perform `call` and decode the result into `T`.
    pub fn call<T: DeserializeOwned>(&self, call: &MethodCall) -> Result<T> {
        let value = self.call_method(call)?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::DeserializationError(format!("{} from {}: {e}", call.expected, call.path)))
    }

    /// Perform `call`, discarding the body.
    pub fn call_unit(&self, call: &MethodCall) -> Result<()> {
        self.call_method(call).map(|_| ())
    }

    fn remap(&self, call: &MethodCall, remote: RemoteError) -> ApiError {
        match call.exceptions.resolve(remote) {
            Ok(exception) => {
                let remote = exception.remote();
                warn!(path = %call.path, identifier = %remote.identifier, status = remote.status, "remote_exception_mapped");
                ApiError::Remote(exception)
            }
            Err(remote) => {
                warn!(path = %call.path, identifier = %remote.identifier, status = remote.status, "remote_exception_unmapped");
                ApiError::RemoteOperationFailed(remote)
            }
        }
    }
}

/// Parse a response body and shape it according to `expected`.
pub fn decode(expected: &Expected, body: &str) -> Result<Value> {
    if *expected == Expected::Nothing {
        return Ok(Value::Null);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    let parsed = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        // Primitive results may come back as bare, unquoted text.
        Err(_) if matches!(expected, Expected::Primitive(_)) => Value::String(trimmed.to_string()),
        Err(e) => return Err(ApiError::DeserializationError(format!("{expected}: {e}"))),
    };
    shape(expected, parsed)
}

fn shape(expected: &Expected, value: Value) -> Result<Value> {
    match expected {
        Expected::Nothing => Ok(Value::Null),
        Expected::Primitive(primitive) => coerce(*primitive, value),
        Expected::Object(name) => match value {
            Value::Object(_) | Value::Null => Ok(value),
            other => Err(ApiError::DeserializationError(format!(
                "expected {name} object, got {}",
                kind(&other)
            ))),
        },
        Expected::ArrayOf(inner) => {
            let items: Vec<Value> = match value {
                Value::Array(items) => items,
                // Indexed arrays sometimes arrive as objects keyed by position.
                Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                Value::Null => Vec::new(),
                other => {
                    return Err(ApiError::DeserializationError(format!(
                        "expected {expected}, got {}",
                        kind(&other)
                    )))
                }
            };
            items
                .into_iter()
                .map(|item| shape(inner, item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        Expected::MapOf(inner) => {
            let entries: Vec<(String, Value)> = match value {
                Value::Object(map) => map.into_iter().collect(),
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
                Value::Null => Vec::new(),
                other => {
                    return Err(ApiError::DeserializationError(format!(
                        "expected {expected}, got {}",
                        kind(&other)
                    )))
                }
            };
            let mut map = Map::new();
            for (key, item) in entries {
                map.insert(key, shape(inner, item)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn coerce(primitive: Primitive, value: Value) -> Result<Value> {
    let mismatch = |value: &Value| {
        ApiError::DeserializationError(format!("cannot read {} as {}", kind(value), primitive.name()))
    };
    match (primitive, value) {
        (_, Value::Null) => Ok(Value::Null),
        (Primitive::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (Primitive::Boolean, Value::Number(n)) => Ok(Value::Bool(n.as_f64().is_some_and(|n| n != 0.0))),
        (Primitive::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "" => Ok(Value::Bool(false)),
            _ => Err(mismatch(&Value::String(s))),
        },
        (Primitive::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Value::from(i)),
            None => n.as_f64().map(|f| Value::from(f as i64)).ok_or_else(|| mismatch(&Value::Number(n))),
        },
        (Primitive::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(Value::from(i)),
            Err(_) => Err(mismatch(&Value::String(s))),
        },
        (Primitive::Integer, Value::Bool(b)) => Ok(Value::from(i64::from(b))),
        (Primitive::Float, Value::Number(n)) => Ok(Value::Number(n)),
        (Primitive::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f))
            .map(Value::Number)
            .ok_or_else(|| mismatch(&Value::String(s))),
        (Primitive::String, Value::String(s)) => Ok(Value::String(s)),
        (Primitive::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (Primitive::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (_, other) => Err(mismatch(&other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
