//! Minimal HTTP/1.0 request-line and URL parsing (spec §6).

use thiserror::Error;

/// A malformed or unsupported request line (spec §7 "ProtocolError").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed request line")]
    MalformedRequestLine,
    /// Non-`GET` methods are a protocol error by this proxy's contract
    /// (spec §6: "Non-GET methods cause the connection to close with no
    /// response"), not a parse failure — kept distinct from
    /// `MalformedRequestLine` so a future caller that wants to log *why*
    /// a connection closed early can tell the two apart.
    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),
}

pub struct RequestLine {
    pub method: String,
    pub target: String,
}

/// Splits `"METHOD target HTTP/x.y"` into method and target, ignoring the
/// version token (the proxy always forces `HTTP/1.0` on the outbound
/// request regardless of what the client sent).
pub fn parse_request_line(line: &str) -> Result<RequestLine, ProtocolError> {
    let mut parts = line.split_whitespace();
    let method = parts.next().ok_or(ProtocolError::MalformedRequestLine)?;
    let target = parts.next().ok_or(ProtocolError::MalformedRequestLine)?;
    if parts.next().is_none() {
        return Err(ProtocolError::MalformedRequestLine);
    }
    Ok(RequestLine {
        method: method.to_owned(),
        target: target.to_owned(),
    })
}

pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Parses `[scheme://]host[:port][/path]`, defaulting scheme to `http`,
/// port to `80`, and path to `/` (spec §6 "URL parsing").
#[must_use]
pub fn parse_url(target: &str) -> Url {
    let without_scheme = target
        .split_once("://")
        .map_or(target, |(_, rest)| rest);

    let (host_port, path) = match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx..]),
        None => (without_scheme, "/"),
    };

    let (host, port) = match host_port.split_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(80)),
        None => (host_port, 80),
    };

    Url {
        host: host.to_owned(),
        port,
        path: if path.is_empty() {
            "/".to_owned()
        } else {
            path.to_owned()
        },
    }
}
