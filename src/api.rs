//! HTTP client for the FinanceBot Pro backend.
//!
//! Every call goes through the retry wrapper: transport failures and 5xx
//! responses are retried on a linear backoff, anything below 500 is handed
//! back for decoding without another attempt. Body decoding happens after
//! the wrapper returns, so a malformed or unsuccessful payload never burns
//! extra attempts.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{MarketQuote, PortfolioSnapshot};
use crate::retry::fetch_with_retry;

/// Attempt budget for every backend call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// First backoff step; attempt `n` waits `n` times this.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

const DEFAULT_BASE_URL: &str = "http://localhost:8001";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error: HTTP {0}")]
    Server(u16),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Backend reported status {0:?}")]
    Backend(String),
}

impl ApiError {
    /// Transport failures and 5xx responses are worth another attempt;
    /// everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server(_))
    }
}

/// One chat-history record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// The `{status, data}` wrapper every GET endpoint uses.
#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    data: T,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

/// Client for the FinanceBot Pro backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client from `FINANCEBOT_API_URL`, defaulting to localhost.
    pub fn new() -> Self {
        let base_url =
            std::env::var("FINANCEBOT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_url(base_url)
    }

    /// Create a client with a custom base URL.
    pub fn with_url(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn market_data(&self) -> Result<HashMap<String, MarketQuote>, ApiError> {
        let url = format!("{}/api/market-data", self.base_url);
        let response = self.get_with_retry(&url).await?;
        Self::decode_envelope(response).await
    }

    pub async fn portfolio(&self, user_id: &str) -> Result<PortfolioSnapshot, ApiError> {
        let url = format!("{}/api/portfolio/{}", self.base_url, user_id);
        let response = self.get_with_retry(&url).await?;
        Self::decode_envelope(response).await
    }

    pub async fn chat_history(&self, session_id: &str) -> Result<Vec<HistoryRecord>, ApiError> {
        let url = format!("{}/api/chat-history/{}", self.base_url, session_id);
        let response = self.get_with_retry(&url).await?;
        Self::decode_envelope(response).await
    }

    /// Send one user message; the reply text comes back on success. The
    /// backend echoes a session id in its reply, but the client-held id is
    /// authoritative so it is not decoded.
    pub async fn send_chat(&self, message: &str, session_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = fetch_with_retry(
            DEFAULT_MAX_ATTEMPTS,
            BASE_DELAY,
            ApiError::is_retryable,
            || {
                // A fresh request per attempt; the builder owns its client
                // handle so the returned future borrows nothing.
                let request = self.client.post(&url).json(&ChatRequest {
                    message,
                    session_id,
                });
                async move {
                    let response = request.send().await?;
                    Self::reject_server_error(response)
                }
            },
        )
        .await?;

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(reply.response)
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        fetch_with_retry(
            DEFAULT_MAX_ATTEMPTS,
            BASE_DELAY,
            ApiError::is_retryable,
            || {
                let request = self.client.get(url);
                async move {
                    let response = request.send().await?;
                    Self::reject_server_error(response)
                }
            },
        )
        .await
    }

    /// 5xx becomes a retryable error; every completed response below 500
    /// (4xx included) is returned as-is, body uninspected.
    fn reject_server_error(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_server_error() {
            return Err(ApiError::Server(response.status().as_u16()));
        }
        Ok(response)
    }

    async fn decode_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Self::unwrap_envelope(envelope)
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
        if envelope.status != "success" {
            return Err(ApiError::Backend(envelope.status));
        }
        Ok(envelope.data)
    }
}
