//! Core proxy server implementation

use crate::{
    decode::{decoder_by_name, BodyDecoder},
    sink::LogSink,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http,
    http::StatusCode,
    response::Response,
    Router,
};
use eyre::Result;
use serde_json::Value;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Builder for configuring ProxyServer with fluent API and sensible defaults
#[derive(Debug, Clone)]
pub struct ProxyServerBuilder {
    upstream_host: String,
    upstream_port: u16,
    decoder: String,
    log_file: Option<PathBuf>,
    clear_log: bool,
    console_log: bool,
}

impl Default for ProxyServerBuilder {
    fn default() -> Self {
        Self {
            // Upstream target
            upstream_host: "127.0.0.1".to_string(),
            upstream_port: 8545,

            // Traffic decoding and logging
            decoder: "eth".to_string(),
            log_file: None,
            clear_log: false,
            console_log: true,
        }
    }
}

impl ProxyServerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host the proxy forwards to
    pub fn upstream_host(mut self, host: impl Into<String>) -> Self {
        self.upstream_host = host.into();
        self
    }

    /// Set the port the proxy forwards to
    pub fn upstream_port(mut self, port: u16) -> Self {
        self.upstream_port = port;
        self
    }

    /// Select the body decoder variant by name (`eth`, `json`, `urlencoded`)
    pub fn decoder(mut self, name: impl Into<String>) -> Self {
        self.decoder = name.into();
        self
    }

    /// Also write traffic log lines to the given file
    pub fn log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Truncate the log file at startup instead of appending
    pub fn clear_log(mut self, clear: bool) -> Self {
        self.clear_log = clear;
        self
    }

    /// Echo traffic log lines to the console
    pub fn console_log(mut self, console: bool) -> Self {
        self.console_log = console;
        self
    }

    /// Build the ProxyServer with the configured settings
    ///
    /// Selecting an unknown decoder name is a configuration error. The
    /// decoder's one-time upstream initialization runs here; its failure is
    /// degraded to a warning so the proxy can start before the upstream is
    /// reachable.
    pub async fn build(self) -> Result<ProxyServer> {
        let decoder = decoder_by_name(&self.decoder)?;

        let sink = match &self.log_file {
            Some(path) => LogSink::with_file(path, self.console_log, self.clear_log)?,
            None => LogSink::console(),
        };

        let upstream = format!("http://{}:{}", self.upstream_host, self.upstream_port);

        // The forwarding client deliberately has no timeout: a proxied call
        // hangs exactly as long as the upstream hangs.
        let proxy = ProxyServer {
            decoder,
            sink: Arc::new(sink),
            client: reqwest::Client::new(),
            upstream,
        };

        if let Err(e) = proxy.decoder.init(&proxy.upstream).await {
            warn!("Decoder initialization against {} failed: {e}", proxy.upstream);
        }

        Ok(proxy)
    }
}

/// The inspecting reverse proxy.
///
/// Each inbound request of arbitrary method and path is buffered, decoded for
/// the traffic log, forwarded unmodified to the configured upstream, and the
/// upstream response is decoded for the log and relayed back unchanged.
/// Decoding failures never block the forwarding path.
#[derive(Clone)]
pub struct ProxyServer {
    decoder: Arc<dyn BodyDecoder>,
    sink: Arc<LogSink>,
    client: reqwest::Client,
    upstream: String,
}

#[derive(Clone)]
struct AppState {
    proxy: ProxyServer,
}

impl ProxyServer {
    /// Returns a builder with default settings.
    pub fn builder() -> ProxyServerBuilder {
        ProxyServerBuilder::new()
    }

    /// The upstream base URL requests are forwarded to.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Starts the proxy server listening on the specified address.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let app = Router::new()
            .fallback(forward)
            .layer(TraceLayer::new_for_http())
            .with_state(AppState { proxy: self });

        let listener = TcpListener::bind(addr).await?;
        info!("rpclens proxy listening on {addr}");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Per-connection state machine: buffer request body, decode and log it,
/// forward upstream, buffer the response body, decode and log it, relay the
/// response bytes to the original caller.
async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let proxy = &state.proxy;
    let (parts, body) = request.into_parts();

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to buffer request body: {e}");
            return proxy_error_response();
        }
    };

    let decoded = proxy.decoder.decode(&String::from_utf8_lossy(&body_bytes)).await;
    proxy.sink.write(&format!("⬇ Request: {}", pretty(&decoded)));

    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = format!("{}{path_and_query}", proxy.upstream);

    let Ok(method) = reqwest::Method::from_bytes(parts.method.as_str().as_bytes()) else {
        warn!("Unsupported request method {}", parts.method);
        return proxy_error_response();
    };

    let mut upstream_request = proxy.client.request(method, &url);
    for (name, value) in &parts.headers {
        // The host header is rewritten to the upstream target by the client.
        if name.as_str().eq_ignore_ascii_case("host") {
            continue;
        }
        upstream_request = upstream_request.header(name.as_str(), value.as_bytes());
    }

    let upstream_response = match upstream_request.body(body_bytes.to_vec()).send().await {
        Ok(response) => response,
        Err(e) => {
            proxy.sink.write(&format!("Proxy error: {e}"));
            warn!("Failed to reach upstream {}: {e}", proxy.upstream);
            return proxy_error_response();
        }
    };

    let status = upstream_response.status().as_u16();
    let headers: Vec<(String, Vec<u8>)> = upstream_response
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
        .collect();

    let response_bytes = match upstream_response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            proxy.sink.write(&format!("Proxy error: {e}"));
            warn!("Failed to read upstream response body: {e}");
            return proxy_error_response();
        }
    };

    let decoded = proxy.decoder.decode(&String::from_utf8_lossy(&response_bytes)).await;
    proxy.sink.write(&format!("⬆ Response: {}", pretty(&decoded)));

    relay_response(status, &headers, response_bytes.to_vec())
}

fn relay_response(status: u16, headers: &[(String, Vec<u8>)], body: Vec<u8>) -> Response {
    let mut builder = http::Response::builder().status(status);
    for (name, value) in headers {
        // The relayed body is re-framed locally; upstream framing headers
        // must not leak through.
        if matches!(name.as_str(), "transfer-encoding" | "content-length" | "connection") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_slice());
    }

    builder.body(Body::from(body)).unwrap_or_else(|e| {
        warn!("Failed to assemble relayed response: {e}");
        proxy_error_response()
    })
}

fn proxy_error_response() -> Response {
    let mut response = Response::new(Body::from("Proxy error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
