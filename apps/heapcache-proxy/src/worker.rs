//! Per-connection worker: parses the request, serves a cache hit directly,
//! or forwards to the origin server and streams the response back while
//! deciding whether to cache it (spec §6).

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;

use heapcache_cache::Cache;

use crate::http;
use crate::rewrite;

/// Read chunk size for streaming the origin response to the client.
const STREAM_CHUNK: usize = 8192;

/// Handles one accepted connection end to end. Errors are logged by the
/// caller and never propagate past the worker thread (spec §7: "the
/// worker closes its file descriptors and returns; the server does not
/// exit").
pub fn handle_connection(mut client: TcpStream, cache: Option<&Cache>) -> io::Result<()> {
    let mut reader = BufReader::new(client.try_clone()?);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(());
    }
    let Ok(parsed) = http::parse_request_line(request_line.trim_end()) else {
        return Ok(());
    };

    // Non-GET methods close the connection with no response (spec §6).
    if parsed.method != "GET" {
        let error = http::ProtocolError::UnsupportedMethod(parsed.method.clone());
        tracing::debug!(%error, "closing connection");
        return Ok(());
    }

    let client_headers = read_headers(&mut reader)?;
    let url = http::parse_url(&parsed.target);

    tracing::debug!(host = %url.host, path = %url.path, "request received");

    if let Some(cache) = cache {
        let mut buf = Vec::new();
        if let Some(len) = cache.read(&url.host, &url.path, &mut buf) {
            tracing::info!(host = %url.host, path = %url.path, len, "cache hit");
            client.write_all(&buf)?;
            return Ok(());
        }
    }

    let mut upstream = match TcpStream::connect((url.host.as_str(), url.port)) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::warn!(host = %url.host, port = url.port, %error, "failed to connect upstream");
            return Ok(());
        }
    };

    let request = rewrite::build_request(&url, &client_headers);
    upstream.write_all(request.as_bytes())?;

    let max_object_size = cache.map_or(usize::MAX, Cache::max_object_size);
    let mut local_buf = Vec::new();
    let mut total = 0usize;
    let mut chunk = [0u8; STREAM_CHUNK];

    loop {
        let n = upstream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        client.write_all(&chunk[..n])?;
        total += n;
        // Stop appending once the object size cap is exceeded, but keep
        // counting `total`: the final cacheability decision below compares
        // the real total to the cap, not the (possibly truncated) buffer
        // length (spec §9 note on the proxy's streaming cap behavior).
        if local_buf.len() + n <= max_object_size {
            local_buf.extend_from_slice(&chunk[..n]);
        }
    }

    if let Some(cache) = cache {
        if total <= max_object_size {
            match cache.write(&url.host, &url.path, &local_buf) {
                Ok(()) => {
                    tracing::info!(host = %url.host, path = %url.path, total, "response cached");
                }
                Err(error) => {
                    tracing::warn!(host = %url.host, path = %url.path, %error, "failed to cache response");
                }
            }
        } else {
            tracing::debug!(host = %url.host, path = %url.path, total, max_object_size, "response too large to cache");
        }
    }

    Ok(())
}

fn read_headers(reader: &mut BufReader<TcpStream>) -> io::Result<Vec<(String, String)>> {
    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }
    }
    Ok(headers)
}
