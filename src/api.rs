use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{PollError, PollResult};

/// Thin client for the homework status endpoint.
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch status changes since `from_date` (Unix seconds).
    ///
    /// Returns the decoded body as-is; its shape is checked by the caller.
    pub async fn get_api_answer(&self, from_date: i64) -> PollResult<Value> {
        debug!("Requesting {} with from_date={}", self.endpoint, from_date);

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                "Endpoint {} is unavailable, API response code: {}",
                self.endpoint, status
            );
            return Err(PollError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            error!("Response is not in the expected JSON format: {}", e);
            PollError::Decode(e)
        })?;

        info!("Received JSON payload");
        Ok(payload)
    }

    fn transport_error(&self, e: reqwest::Error) -> PollError {
        if e.is_connect() {
            error!("Connection error: {}", e);
        } else if e.is_timeout() {
            error!("Request timed out: {}", e);
        } else {
            error!("Request failed: {}", e);
        }
        PollError::Transport {
            endpoint: self.endpoint.clone(),
            source: e,
        }
    }
}
