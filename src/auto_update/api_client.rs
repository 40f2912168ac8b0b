// Release History Client
// Fetches the remotely hosted release history document

use reqwest::Client;
use std::time::Duration;

use crate::auto_update::{ReleaseHistoryDocument, UpdateConfig, UpdateError};

/// HTTP client for the release history document
pub struct HistoryClient {
    http_client: Client,
    /// Total time allowed for the history request
    timeout: Duration,
}

impl HistoryClient {
    /// Create a history client with the given request timeout
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(Client::new(), timeout)
    }

    /// Create a history client from UpdateConfig
    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.request_timeout())
    }

    /// Create a history client sharing an existing HTTP client
    pub fn with_client(http_client: Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Fetch and shape-check the history document at `url`
    pub async fn fetch_history(&self, url: &str) -> Result<ReleaseHistoryDocument, UpdateError> {
        log::info!("[HistoryClient] Fetching release history from {}", url);

        let response = self
            .http_client
            .get(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    UpdateError::Network(format!("Connection failed: {}", e))
                } else if e.is_timeout() {
                    UpdateError::Network(format!("Request timed out: {}", e))
                } else {
                    UpdateError::Network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            UpdateError::MalformedHistory(format!("Failed to parse response: {}", e))
        })?;

        ReleaseHistoryDocument::from_json(body)
    }
}
