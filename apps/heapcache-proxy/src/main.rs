//! Concurrent HTTP/1.0 forward proxy: accept loop, thread-per-connection
//! worker, driving a shared [`heapcache_cache::Cache`] (spec §6).

mod http;
mod rewrite;
mod worker;

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use heapcache_cache::Cache;

/// Default cache parameters (spec §6 "Default cache parameters").
const DEFAULT_MAX_CACHE_SIZE: usize = 1_049_000;
const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400;

/// `proxy <port> [<cache_status>]` (spec §6 "Command-line surface").
///
/// `clap`'s derive rejects a non-numeric `port` with its own usage-error
/// exit code (2), satisfying "invalid port or missing arguments exit
/// non-zero" without any hand-rolled validation here.
#[derive(Parser, Debug)]
#[command(name = "heapcache-proxy", about = "HTTP/1.0 forward proxy with a bounded LRU cache")]
struct Args {
    /// TCP port to listen on.
    port: u16,

    /// Pass the literal `disable` to turn off caching; any other value
    /// (or omitting this argument) enables it (spec §6).
    cache_status: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // SAFETY: `signal` is called once at startup, before any other thread
    // exists, installing the ignore-disposition for SIGPIPE so a peer
    // reset during a write surfaces as an `io::Error` (spec §6 "Signal
    // handling") instead of terminating the process.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }

    let cache_enabled = args
        .cache_status
        .as_deref()
        .is_none_or(|status| status != "disable");
    let cache = cache_enabled
        .then(|| Arc::new(Cache::init(DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_OBJECT_SIZE)));

    tracing::info!(port = args.port, cache_enabled, "starting proxy");

    let listener = TcpListener::bind(("0.0.0.0", args.port))?;
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%error, "failed to accept connection");
                continue;
            }
        };

        let cache = cache.clone();
        thread::spawn(move || {
            let peer = stream.peer_addr().ok();
            if let Err(error) = worker::handle_connection(stream, cache.as_deref()) {
                tracing::warn!(?peer, %error, "connection worker exited with an error");
            }
        });
    }

    Ok(())
}
