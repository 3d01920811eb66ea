//! Builds the outbound request with the proxy's fixed headers overriding
//! any client-supplied values (spec §6 "Rewritten request headers").

use crate::http::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_ENCODING: &str = "gzip, deflate";

/// Header names the proxy always sets itself; any client-supplied value
/// under the same name (case-insensitive) is dropped. `Host` is handled
/// separately below: it passes through unchanged when the client sent one,
/// and is synthesized only when absent, so it is not in this list.
const OVERRIDDEN_HEADERS: &[&str] = &[
    "user-agent",
    "accept",
    "accept-encoding",
    "connection",
    "proxy-connection",
];

/// Builds a `GET ... HTTP/1.0` request: the fixed headers first, then every
/// client header that isn't one of [`OVERRIDDEN_HEADERS`] passed through
/// unchanged, then a `Host` header if the client didn't send one.
#[must_use]
pub fn build_request(url: &Url, client_headers: &[(String, String)]) -> String {
    let mut request = format!("GET {} HTTP/1.0\r\n", url.path);
    request.push_str(&format!("User-Agent: {USER_AGENT}\r\n"));
    request.push_str(&format!("Accept: {ACCEPT}\r\n"));
    request.push_str(&format!("Accept-Encoding: {ACCEPT_ENCODING}\r\n"));
    request.push_str("Connection: close\r\n");
    request.push_str("Proxy-Connection: close\r\n");

    let had_host = client_headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("host"));
    if !had_host {
        request.push_str(&format!("Host: {}:{}\r\n", url.host, url.port));
    }

    for (name, value) in client_headers {
        if OVERRIDDEN_HEADERS
            .iter()
            .any(|overridden| name.eq_ignore_ascii_case(overridden))
        {
            continue;
        }
        request.push_str(&format!("{name}: {value}\r\n"));
    }

    request.push_str("\r\n");
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_fixed_headers_and_passes_through_others() {
        let url = Url {
            host: "example.com".to_owned(),
            port: 80,
            path: "/index.html".to_owned(),
        };
        let client_headers = vec![
            ("User-Agent".to_owned(), "curl/8.0".to_owned()),
            ("X-Custom".to_owned(), "keep-me".to_owned()),
        ];

        let request = build_request(&url, &client_headers);
        assert!(request.starts_with("GET /index.html HTTP/1.0\r\n"));
        assert!(request.contains("User-Agent: Mozilla/5.0"));
        assert!(!request.contains("curl/8.0"));
        assert!(request.contains("X-Custom: keep-me"));
        assert!(request.contains("Host: example.com:80"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn keeps_client_supplied_host_header() {
        let url = Url {
            host: "example.com".to_owned(),
            port: 80,
            path: "/".to_owned(),
        };
        let client_headers = vec![("Host".to_owned(), "other.example".to_owned())];
        let request = build_request(&url, &client_headers);
        assert!(request.contains("Host: other.example"));
        assert!(!request.contains("Host: example.com:80"));
    }
}
