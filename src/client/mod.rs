//! Backend REST client
//!
//! Every request reads the current bearer token from a shared [`TokenStore`],
//! so a token set after the client was built applies to the next call.
//! Requests are independent: no retry, no de-duplication, no timeout.

use crate::config::ClientConfig;
use crate::error::{Result, TradeCenterError};
use crate::predicate::PredicateNode;
use parking_lot::RwLock;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Endpoint that attaches a predicate to an existing discount
pub const ASSIGN_PREDICATE_PATH: &str = "/store/assign_predicate_to_discount";

/// Longest backend message kept in a [`TradeCenterError::Backend`]
const MAX_MESSAGE_LEN: usize = 512;

/// Shared, swappable bearer token
#[derive(Debug, Clone, Default)]
pub struct TokenStore(Arc<RwLock<Option<String>>>);

impl TokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(token)))
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write() = None;
    }
}

/// Body of [`ASSIGN_PREDICATE_PATH`]
#[derive(Debug, Serialize)]
pub struct AssignPredicateRequest<'a> {
    pub discount_id: i64,
    pub store_id: i64,
    pub predicate_builder: &'a PredicateNode,
}

/// HTTP client for the marketplace backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http(config, http)
    }

    /// Use a preconfigured reqwest client (proxy, TLS roots, ...)
    pub fn with_http(config: &ClientConfig, http: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens: TokenStore::new(config.bearer_token.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(method = "GET", %url, "sending request");
        self.send(self.authorize(self.http.get(&url))).await
    }

    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(method = "POST", %url, "sending request");
        self.send(self.authorize(self.http.post(&url).json(body))).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "received response");

        if status == StatusCode::UNAUTHORIZED {
            warn!("backend rejected credentials");
            return Err(TradeCenterError::Unauthorized);
        }

        if !status.is_success() {
            let message = backend_message(&text);
            warn!(status = status.as_u16(), %message, "backend request failed");
            return Err(TradeCenterError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Submit a predicate tree as the `predicate_builder` of a discount
    pub async fn assign_predicate_to_discount(
        &self,
        discount_id: i64,
        store_id: i64,
        predicate: &PredicateNode,
    ) -> Result<Value> {
        let body = AssignPredicateRequest {
            discount_id,
            store_id,
            predicate_builder: predicate,
        };
        self.post_json(ASSIGN_PREDICATE_PATH, &body).await
    }
}

/// Prefer a "message" or "error" field, fall back to the raw body
fn backend_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    body.trim().chars().take(MAX_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests;
