use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::persona::{self, Persona};
use super::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::error::{CompletionError, Result};
use crate::state::ContextEntry;

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ContextEntry>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    persona: Persona,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, persona: Persona) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            persona,
        }
    }

    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to list models: {}", response.status()));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/api/chat", self.base_url);

        let body = OllamaChatRequest {
            model: &self.model,
            messages: self.persona.messages(&request),
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(CompletionError::Status {
                status,
                message: "Make sure Ollama is running with: ollama serve".to_string(),
            });
        }

        let ollama_response: OllamaChatResponse = response.json().await?;
        if ollama_response.message.content.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        Ok(persona::respond(request, ollama_response.message.content))
    }
}
