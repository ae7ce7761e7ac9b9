//! Integration tests for the inspecting proxy server

use reqwest::Client;
use rpclens_proxy::proxy::{ProxyServer, ProxyServerBuilder};
use serde_json::{json, Value};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use tempfile::TempDir;
use tokio::time::sleep;
use wiremock::{
    matchers::{body_string, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Helper to create a test proxy forwarding to `upstream` with a file sink
async fn create_test_proxy(upstream: &url::Url, decoder: &str) -> (ProxyServer, PathBuf, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("requests.log");

    let proxy = ProxyServerBuilder::new()
        .upstream_host(upstream.host_str().unwrap())
        .upstream_port(upstream.port().unwrap())
        .decoder(decoder)
        .log_file(&log_path)
        .console_log(false)
        .build()
        .await
        .unwrap();

    (proxy, log_path, temp_dir)
}

/// Start the proxy on a random port and return the address
async fn start_proxy_server(proxy: ProxyServer) -> SocketAddr {
    // Find an available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let actual_addr = listener.local_addr().unwrap();
    drop(listener); // Release the listener so proxy.serve can bind to it

    tokio::spawn(async move {
        proxy.serve(actual_addr).await.unwrap();
    });

    // Give the server a moment to start
    sleep(Duration::from_millis(200)).await;
    actual_addr
}

/// Mounts the eth_chainId answer the eth decoder's startup query needs
async fn mount_chain_id(mock_server: &MockServer, chain_id_hex: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": chain_id_hex
        })))
        .up_to_n_times(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_request_and_response_bytes_are_relayed_unchanged() {
    let mock_server = MockServer::start().await;
    let upstream = url::Url::parse(&mock_server.uri()).unwrap();
    let (proxy, _log_path, _temp_dir) = create_test_proxy(&upstream, "json").await;
    let proxy_addr = start_proxy_server(proxy).await;

    let response_body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": "0x10d4f"
    });

    let request_body = r#"{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}"#;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string(request_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response = client
        .post(format!("http://{proxy_addr}/"))
        .header("Content-Type", "application/json")
        .body(request_body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, response_body);
}

#[tokio::test]
async fn test_arbitrary_method_and_path_are_forwarded() {
    let mock_server = MockServer::start().await;
    let upstream = url::Url::parse(&mock_server.uri()).unwrap();
    let (proxy, _log_path, _temp_dir) = create_test_proxy(&upstream, "json").await;
    let proxy_addr = start_proxy_server(proxy).await;

    Mock::given(method("GET"))
        .and(path("/health/live"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response =
        client.get(format!("http://{proxy_addr}/health/live")).send().await.unwrap();

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_malformed_body_is_still_forwarded_and_logged() {
    let mock_server = MockServer::start().await;
    let upstream = url::Url::parse(&mock_server.uri()).unwrap();
    let (proxy, log_path, _temp_dir) = create_test_proxy(&upstream, "json").await;
    let proxy_addr = start_proxy_server(proxy).await;

    let garbled = "this is {not json";

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string(garbled))
        .respond_with(ResponseTemplate::new(200).set_body_string("neither is this"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response =
        client.post(format!("http://{proxy_addr}/")).body(garbled).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "neither is this");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("this is {not json"));
    assert!(log.contains("neither is this"));
}

#[tokio::test]
async fn test_unreachable_upstream_yields_generic_server_error() {
    // Bind and drop a listener so the port is valid but closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("requests.log");
    let proxy = ProxyServerBuilder::new()
        .upstream_host("127.0.0.1")
        .upstream_port(dead_addr.port())
        .decoder("json")
        .log_file(&log_path)
        .console_log(false)
        .build()
        .await
        .unwrap();
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .post(format!("http://{proxy_addr}/"))
        .body(r#"{"id":1,"method":"eth_blockNumber"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "Proxy error");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Proxy error"));
}

#[tokio::test]
async fn test_eth_decoder_correlates_chain_id_in_the_log() {
    let mock_server = MockServer::start().await;

    // One response for the decoder's startup query, one for the proxied call.
    mount_chain_id(&mock_server, "0x1").await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 42,
            "result": "0x82"
        })))
        .mount(&mock_server)
        .await;

    let upstream = url::Url::parse(&mock_server.uri()).unwrap();
    let (proxy, log_path, _temp_dir) = create_test_proxy(&upstream, "eth").await;
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .post(format!("http://{proxy_addr}/"))
        .json(&json!({ "jsonrpc": "2.0", "id": 42, "method": "eth_chainId", "params": [] }))
        .send()
        .await
        .unwrap();

    // Relayed bytes are the upstream's, untouched by decoding.
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"], "0x82");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("⬇ Request:"));
    assert!(log.contains("⬆ Response:"));
    // The logged response carries the decoded numeric chain id (0x82 = 130).
    assert!(log.contains("\"result\": 130"));
}

#[tokio::test]
async fn test_log_order_is_request_before_response() {
    let mock_server = MockServer::start().await;
    let upstream = url::Url::parse(&mock_server.uri()).unwrap();
    let (proxy, log_path, _temp_dir) = create_test_proxy(&upstream, "json").await;
    let proxy_addr = start_proxy_server(proxy).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pong": true })))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    client
        .post(format!("http://{proxy_addr}/"))
        .json(&json!({ "ping": true }))
        .send()
        .await
        .unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    let request_at = log.find("⬇ Request:").unwrap();
    let response_at = log.find("⬆ Response:").unwrap();
    assert!(request_at < response_at);
}
