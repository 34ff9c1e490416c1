use std::time::{Duration, Instant};

use super::{finish, Exchange, Transport, MAX_RESPONSE_BYTES};
use crate::error::Result;
use crate::http::{HttpResponse, PreparedRequest, RemoteRequest};

/// Transport backed by the ureq HTTP client.
///
/// A fresh agent is built per call so the timeout can vary per request and
/// no connection state is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct AgentTransport;

impl AgentTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for AgentTransport {
    fn dispatch(&self, request: &RemoteRequest, ignore_errors: bool, timeout: Option<u64>) -> Result<String> {
        let prepared = PreparedRequest::from_remote(request);
        let timeout = Duration::from_secs(request.effective_timeout(timeout));
        let started = Instant::now();
        let exchange = execute(&prepared, timeout);
        finish("agent", &prepared, exchange, ignore_errors, started)
    }
}

fn execute(prepared: &PreparedRequest, timeout: Duration) -> Exchange {
    // Status codes are interpreted by `finish`, not by ureq. A 3xx response
    // is returned unfollowed, as the socket transport does.
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_global(Some(timeout))
        .build()
        .new_agent();

    let mut builder = ureq::http::Request::builder()
        .method(prepared.method.as_str())
        .uri(prepared.url.as_str());
    for (name, value) in &prepared.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let sent = match &prepared.body {
        Some(body) => builder
            .body(body.clone().into_bytes())
            .map_err(|e| format!("invalid request: {e}"))
            .and_then(|request| agent.run(request).map_err(|e| e.to_string())),
        None => builder
            .body(())
            .map_err(|e| format!("invalid request: {e}"))
            .and_then(|request| agent.run(request).map_err(|e| e.to_string())),
    };
    let mut response = sent?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), value.to_str().unwrap_or_default().to_string()))
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_RESPONSE_BYTES)
        .read_to_string()
        .map_err(|e| format!("failed to read response body: {e}"))?;

    Ok(HttpResponse { status, headers, body })
}
