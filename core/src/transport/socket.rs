use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use url::Url;

use super::{finish, Exchange, Transport, MAX_RESPONSE_BYTES};
use crate::error::Result;
use crate::http::{HttpMethod, HttpResponse, PreparedRequest, RemoteRequest};

/// HTTP/1.1 over a plain TCP socket.
///
/// One connection per call, closed by the server (`Connection: close`).
/// Only `http` URLs are supported; anything else is a network failure.
#[derive(Debug, Clone, Default)]
pub struct SocketTransport;

impl SocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SocketTransport {
    fn dispatch(&self, request: &RemoteRequest, ignore_errors: bool, timeout: Option<u64>) -> Result<String> {
        let prepared = PreparedRequest::from_remote(request);
        let timeout = Duration::from_secs(request.effective_timeout(timeout));
        let started = Instant::now();
        let exchange = execute(&prepared, timeout, started + timeout);
        finish("socket", &prepared, exchange, ignore_errors, started)
    }
}

fn execute(prepared: &PreparedRequest, timeout: Duration, deadline: Instant) -> Exchange {
    let url = Url::parse(&prepared.url).map_err(|e| format!("invalid URL: {e}"))?;
    if url.scheme() != "http" {
        return Err(format!("scheme '{}' is not supported by the socket transport", url.scheme()));
    }
    let addrs = url
        .socket_addrs(|| Some(80))
        .map_err(|e| format!("failed to resolve host: {e}"))?;

    let mut stream = connect(&addrs, timeout)?;
    stream
        .set_write_timeout(Some(timeout))
        .and_then(|_| stream.set_read_timeout(Some(timeout)))
        .map_err(|e| e.to_string())?;

    stream
        .write_all(&render(prepared, &url))
        .map_err(|e| format!("failed to send request: {e}"))?;

    let limit = MAX_RESPONSE_BYTES as usize;
    let raw = read_until_closed(&mut stream, deadline, limit + MAX_HEAD_BYTES)?;
    parse_response(&raw, limit)
}

/// Allowance for the status line and headers on top of the body limit.
const MAX_HEAD_BYTES: usize = 64 * 1024;

fn connect(addrs: &[SocketAddr], timeout: Duration) -> std::result::Result<TcpStream, String> {
    let mut last_error = "host resolved to no addresses".to_string();
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = format!("failed to connect to {addr}: {e}"),
        }
    }
    Err(last_error)
}

fn read_until_closed(stream: &mut TcpStream, deadline: Instant, limit: usize) -> std::result::Result<Vec<u8>, String> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        if Instant::now() >= deadline {
            return Err("timed out reading response".to_string());
        }
        match stream.read(&mut buf) {
            Ok(0) => return Ok(raw),
            Ok(n) => {
                raw.extend_from_slice(&buf[..n]);
                if raw.len() > limit {
                    return Err(format!("response exceeds {limit} bytes"));
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err("timed out reading response".to_string());
            }
            Err(e) => return Err(format!("failed to read response: {e}")),
        }
    }
}

/// Serialise the request line, headers and body.
fn render(prepared: &PreparedRequest, url: &Url) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    let host = match (url.host(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let mut head = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n",
        prepared.method, target, host
    );
    for (name, value) in &prepared.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    let body = prepared.body.as_deref().unwrap_or_default();
    if prepared.body.is_some() || prepared.method != HttpMethod::Get {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

fn parse_response(raw: &[u8], limit: usize) -> Exchange {
    let split = find(raw, b"\r\n\r\n").ok_or("malformed response: no header terminator")?;
    let head = String::from_utf8_lossy(&raw[..split]);
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| format!("malformed status line: {status_line}"))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();
    let envelope = HttpResponse {
        status,
        headers,
        body: String::new(),
    };

    let mut body = raw[split + 4..].to_vec();
    let chunked = envelope
        .header("transfer-encoding")
        .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    if chunked {
        body = decode_chunked(&body)?;
    } else if let Some(length) = envelope.header("content-length").and_then(|l| l.parse::<usize>().ok()) {
        body.truncate(length);
    }
    if body.len() > limit {
        return Err(format!("response body exceeds {limit} bytes"));
    }

    Ok(HttpResponse {
        body: String::from_utf8_lossy(&body).into_owned(),
        ..envelope
    })
}

fn decode_chunked(mut data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut decoded = Vec::new();
    loop {
        let line_end = find(data, b"\r\n").ok_or("malformed chunk: missing size line")?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| format!("malformed chunk size: {size_hex}"))?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(decoded);
        }
        if data.len() < size {
            return Err("malformed chunk: truncated data".to_string());
        }
        decoded.extend_from_slice(&data[..size]);
        data = data[size..].strip_prefix(b"\r\n").unwrap_or(&data[size..]);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
