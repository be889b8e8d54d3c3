use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::model::{IngestionBatch, IngestionEvent, IngestionResponse};
use batchflush::{BatchHandler, DispatchError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest response excerpt carried in a rejection error.
const MAX_REASON_LEN: usize = 512;

/// Posts drained event batches to `/api/public/ingestion`.
pub struct IngestionHandler {
    http: reqwest::Client,
    url: Url,
    public_key: String,
    secret_key: String,
    timeout: Duration,
}

impl IngestionHandler {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            url: config.api_url(&["api", "public", "ingestion"])?,
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.clone(),
            timeout: config.ingestion_timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl BatchHandler<IngestionEvent> for IngestionHandler {
    async fn handle(&self, batch: Vec<IngestionEvent>) -> Result<(), DispatchError> {
        let events = batch.len();
        let payload = serde_json::to_vec(&IngestionBatch { batch })
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        let response = self
            .http
            .post(self.url.clone())
            .basic_auth(&self.public_key, Some(&self.secret_key))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                reason: truncate(&body, MAX_REASON_LEN).to_string(),
            });
        }

        if status == StatusCode::MULTI_STATUS {
            let report = response.json::<IngestionResponse>().await.unwrap_or_default();
            if !report.errors.is_empty() {
                warn!(
                    events,
                    rejected = report.errors.len(),
                    "ingestion partially accepted"
                );
            }
        }

        debug!(events, status = status.as_u16(), "ingestion batch accepted");
        Ok(())
    }

    fn name(&self) -> &str {
        "langfuse-ingestion"
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc");
        // 'é' is two bytes; cutting inside it backs off to the boundary
        assert_eq!(truncate("aé", 2), "a");
    }

    #[test]
    fn test_handler_targets_ingestion_path() {
        let config = ClientConfig::new("https://langfuse.example.com", "pk", "sk");
        let handler = IngestionHandler::new(reqwest::Client::new(), &config).unwrap();
        assert_eq!(
            handler.url().as_str(),
            "https://langfuse.example.com/api/public/ingestion"
        );
        assert_eq!(BatchHandler::name(&handler), "langfuse-ingestion");
    }
}
