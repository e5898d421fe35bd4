use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::persona::{self, Persona};
use super::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::error::{CompletionError, Result};
use crate::state::{ContextEntry, Role};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ContextEntry>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    persona: Persona,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: &str, persona: Persona) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            persona,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "claude-sonnet-4-20250514".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
        ]
    }
}

/// The messages API takes system text separately, so system-role entries
/// (persona, visitor notes) are folded into one prompt.
fn split_system(messages: Vec<ContextEntry>) -> (String, Vec<ContextEntry>) {
    let (system, conversation): (Vec<_>, Vec<_>) =
        messages.into_iter().partition(|m| m.role == Role::System);
    let system = system
        .into_iter()
        .map(|m| m.content)
        .collect::<Vec<_>>()
        .join("\n\n");
    (system, conversation)
}

#[async_trait]
impl CompletionClient for ClaudeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let (system, messages) = split_system(self.persona.messages(&request));
        let body = ClaudeRequest {
            model: &self.model,
            max_tokens: 600,
            temperature: 0.7,
            system,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, message });
        }

        let claude_response: ClaudeResponse = response.json().await?;
        let reply = claude_response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(persona::respond(request, reply))
    }
}
