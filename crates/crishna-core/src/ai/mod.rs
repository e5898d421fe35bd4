pub mod claude;
pub mod endpoint;
pub mod ollama;
pub mod openai;
pub mod persona;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::ContextEntry;

pub use claude::ClaudeClient;
pub use endpoint::EndpointClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

/// Body of a completion request, as posted to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub message: String,
    pub conversation_history: Vec<ContextEntry>,
}

/// Reply plus the context to use for the next exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub response: String,
    pub conversation_history: Vec<ContextEntry>,
}

/// Anything that can answer a chat message given the prior context.
///
/// Implementations are stateless; the caller owns the context and trims it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
