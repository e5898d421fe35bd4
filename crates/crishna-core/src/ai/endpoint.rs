use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::error::{CompletionError, Result};

/// Error body returned by the chat endpoint on failure.
#[derive(Deserialize)]
struct EndpointError {
    error: String,
}

/// Client for the portfolio's `/api/ai-chat` route.
#[derive(Clone)]
pub struct EndpointClient {
    client: Client,
    url: String,
}

impl EndpointClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for EndpointClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<EndpointError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(CompletionError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
