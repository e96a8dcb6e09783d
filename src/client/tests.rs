//! Client tests against a one-shot loopback HTTP responder

use super::*;
use crate::predicate::parse;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Accept one connection, answer with `status` and `body`, return the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = header_end(&buf) {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        String::from_utf8(buf).unwrap()
    });

    (format!("http://{}", addr), handle)
}

fn request_body(raw: &str) -> Value {
    let end = header_end(raw.as_bytes()).unwrap();
    serde_json::from_str(&raw[end + 4..]).unwrap()
}

fn client_for(url: &str, token: Option<&str>) -> ApiClient {
    let mut config = ClientConfig::new(url);
    config.bearer_token = token.map(str::to_string);
    // Loopback traffic must not be routed through an ambient HTTP proxy
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ApiClient::with_http(&config, http).unwrap()
}

#[tokio::test]
async fn test_assign_predicate_posts_builder() {
    let (url, server) = serve_once("200 OK", r#"{"success": true}"#).await;
    let client = client_for(&url, Some("tok1"));
    let predicate = parse("(and (age 17) (season summer))").unwrap().unwrap();

    let response = client
        .assign_predicate_to_discount(3, 1, &predicate)
        .await
        .unwrap();
    assert_eq!(response, json!({"success": true}));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /store/assign_predicate_to_discount HTTP/1.1"));
    assert!(raw.to_lowercase().contains("authorization: bearer tok1"));
    assert_eq!(
        request_body(&raw),
        json!({
            "discount_id": 3,
            "store_id": 1,
            "predicate_builder": ["and", ["age", 17], ["season", "summer"]]
        })
    );
}

#[tokio::test]
async fn test_token_is_read_per_request() {
    let (url, server) = serve_once("200 OK", "{}").await;
    let client = client_for(&url, None);
    client.tokens().set("late-token");

    client.get_json("/market/stores").await.unwrap();

    let raw = server.await.unwrap();
    assert!(raw.starts_with("GET /market/stores HTTP/1.1"));
    assert!(raw.to_lowercase().contains("authorization: bearer late-token"));
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let (url, server) = serve_once("200 OK", "").await;
    let client = client_for(&url, Some("gone"));
    client.tokens().clear();

    let response = client.get_json("ping").await.unwrap();
    assert_eq!(response, Value::Null);

    let raw = server.await.unwrap();
    assert!(!raw.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_unauthorized_is_distinct() {
    let (url, server) = serve_once("401 Unauthorized", r#"{"message": "expired"}"#).await;
    let client = client_for(&url, Some("old"));

    let result = client.get_json("/user/profile").await;
    assert!(matches!(result, Err(TradeCenterError::Unauthorized)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_backend_error_carries_message() {
    let (url, server) =
        serve_once("500 Internal Server Error", r#"{"message": "discount not found"}"#).await;
    let client = client_for(&url, None);
    let predicate = parse("(age 18)").unwrap().unwrap();

    match client.assign_predicate_to_discount(99, 1, &predicate).await {
        Err(TradeCenterError::Backend { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "discount not found");
        }
        other => panic!("Expected backend error, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_failure_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr), None);
    let result = client.get_json("/").await;
    assert!(matches!(result, Err(TradeCenterError::Http(_))));
}

#[test]
fn test_url_joining() {
    let client = client_for("http://backend:8000/", None);
    assert_eq!(client.base_url(), "http://backend:8000");
    assert_eq!(client.url("/store/x"), "http://backend:8000/store/x");
    assert_eq!(client.url("store/x"), "http://backend:8000/store/x");
}

#[test]
fn test_backend_message_fallbacks() {
    assert_eq!(backend_message(r#"{"error": "bad id"}"#), "bad id");
    assert_eq!(backend_message("  plain failure "), "plain failure");
    assert_eq!(backend_message(&"x".repeat(2000)).len(), MAX_MESSAGE_LEN);
}

#[test]
fn test_rejects_invalid_base_url() {
    let config = ClientConfig::new("localhost:8000");
    assert!(matches!(
        ApiClient::new(&config),
        Err(TradeCenterError::Config(_))
    ));
}
