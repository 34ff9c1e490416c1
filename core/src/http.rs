//! Plain-data HTTP types shared by the transports and the dispatcher.
//!
//! # Design
//! A `RemoteRequest` describes exactly one outbound call and is not mutated
//! after construction. `PreparedRequest::from_remote` renders it into the URL,
//! headers and body that actually go on the wire. Both transports send a
//! `PreparedRequest`, so the query-string / form-body / payload rules live in
//! one place and the transports stay interchangeable.
//!
//! All fields use owned types (`String`, `Vec`) so requests can be cloned,
//! logged and recorded by test doubles without lifetime concerns.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::form_urlencoded;

use crate::error::ApiError;

/// Timeout applied when neither the request nor the caller supplies one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Content type sent when the caller did not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(ApiError::InvalidRequest(format!("unsupported HTTP method: {other}"))),
        }
    }
}

/// A single parameter value: either a scalar or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Scalar(value.clone())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Scalar(if value { "1" } else { "0" }.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(values: &[&str]) -> Self {
        ParamValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Ordered, string-keyed request parameters.
///
/// Insertion order is kept so encoded query strings are deterministic.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay these parameters on top of `globals`. Keys present in both
    /// take the value from `self`.
    pub fn merged_over(&self, globals: &Parameters) -> Parameters {
        let mut merged = globals.clone();
        for (key, value) in &self.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Form-urlencode the parameters. List values use indexed bracket
    /// notation: `ns[0]=a&ns[1]=b`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            match value {
                ParamValue::Scalar(v) => {
                    serializer.append_pair(key, v);
                }
                ParamValue::List(items) => {
                    for (index, item) in items.iter().enumerate() {
                        serializer.append_pair(&format!("{key}[{index}]"), item);
                    }
                }
            }
        }
        serializer.finish()
    }
}

/// HTTP Basic credentials. Only sent when both parts are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One outbound call described as plain data.
///
/// Built once per call with the `with_*` methods and handed to a
/// `Transport`. Nothing reads it back after dispatch.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    url: String,
    method: HttpMethod,
    parameters: Parameters,
    payload: Option<String>,
    headers: Vec<(String, String)>,
    credentials: Option<BasicAuth>,
    timeout: Option<u64>,
}

impl RemoteRequest {
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            parameters: Parameters::new(),
            payload: None,
            headers: Vec::new(),
            credentials: None,
            timeout: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(BasicAuth::new(username, password));
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The payload, treating an empty string as absent.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref().filter(|p| !p.is_empty())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn credentials(&self) -> Option<&BasicAuth> {
        self.credentials.as_ref()
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// Resolve the timeout for a dispatch: explicit override, then the
    /// request's own value, then the default.
    pub fn effective_timeout(&self, timeout_override: Option<u64>) -> u64 {
        timeout_override
            .or(self.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// The wire rendering of a `RemoteRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Parameters go in the query string for GET requests and whenever a
    /// payload is present; otherwise they become a form-encoded body. The
    /// payload and the form body are never both sent.
    pub fn from_remote(request: &RemoteRequest) -> Self {
        let mut headers = request.headers.clone();
        if find_header(&headers, "content-type").is_none() {
            headers.push(("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string()));
        }

        if let Some(auth) = request.credentials.as_ref().filter(|a| a.is_complete()) {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push(("Authorization".to_string(), auth.header_value()));
        }

        let payload = request.payload();
        let params_as_query = payload.is_some() || request.method == HttpMethod::Get;

        let mut url = request.url.clone();
        if params_as_query && !request.parameters.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&request.parameters.to_query_string());
        }

        let body = match payload {
            Some(payload) => Some(payload.to_string()),
            None if params_as_query => None,
            None => Some(request.parameters.to_query_string()).filter(|b| !b.is_empty()),
        };

        Self {
            method: request.method,
            url,
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data (the response envelope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
