use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::ai::{self, persona::Persona, ClaudeClient, CompletionClient, EndpointClient, OllamaClient, OpenAIClient};
use crate::error::CompletionError;
use crate::playback::{self, Timings};
use crate::provider::Provider;
use crate::state::ScriptedCommand;
use crate::transcript;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/ai-chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub provider: Option<String>,
    pub endpoint_url: Option<String>,
    pub default_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub script_path: Option<PathBuf>,
    pub persona_path: Option<PathBuf>,
    pub transcript_dir: Option<PathBuf>,
    #[serde(default)]
    pub timings: Timings,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Endpoint.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            self.claude_api_key = Some(key);
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            if self.provider() == Provider::OpenAI {
                self.default_model = Some(model);
            }
        }
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Endpoint)
    }

    pub fn endpoint_url(&self) -> &str {
        self.endpoint_url.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// The model name shown in the UI, if the provider has one.
    pub fn model(&self) -> Option<String> {
        let default = match self.provider() {
            Provider::Endpoint => return None,
            Provider::OpenAI => ai::openai::DEFAULT_MODEL,
            Provider::Claude => ai::claude::DEFAULT_MODEL,
            Provider::Ollama => ai::ollama::DEFAULT_MODEL,
        };
        Some(self.default_model.clone().unwrap_or_else(|| default.to_string()))
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.transcript_dir
            .clone()
            .unwrap_or_else(transcript::default_dir)
    }

    pub fn script(&self) -> Result<Vec<ScriptedCommand>> {
        match &self.script_path {
            Some(path) => playback::load_script(path),
            None => Ok(playback::default_script()),
        }
    }

    /// Build the completion client for the configured provider.
    pub fn client(&self) -> Result<Arc<dyn CompletionClient>> {
        let provider = self.provider();
        let model = self.model().unwrap_or_default();

        let client: Arc<dyn CompletionClient> = match provider {
            Provider::Endpoint => Arc::new(EndpointClient::new(self.endpoint_url())),
            Provider::OpenAI => {
                let key = self
                    .openai_api_key
                    .as_deref()
                    .ok_or(CompletionError::MissingApiKey { provider: "OpenAI" })?;
                Arc::new(OpenAIClient::new(key, &model, self.persona()?))
            }
            Provider::Claude => {
                let key = self
                    .claude_api_key
                    .as_deref()
                    .ok_or(CompletionError::MissingApiKey { provider: "Claude" })?;
                Arc::new(ClaudeClient::new(key, &model, self.persona()?))
            }
            Provider::Ollama => Arc::new(OllamaClient::new(
                self.ollama_url(),
                &model,
                self.persona()?,
            )),
        };
        Ok(client)
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(ai::ollama::DEFAULT_URL)
    }

    /// Models the configured provider offers. The endpoint picks its own,
    /// so it lists none.
    pub async fn available_models(&self) -> Result<Vec<String>> {
        let models = match self.provider() {
            Provider::Endpoint => Vec::new(),
            Provider::OpenAI => OpenAIClient::list_models(),
            Provider::Claude => ClaudeClient::list_models(),
            Provider::Ollama => {
                let model = self.model().unwrap_or_default();
                OllamaClient::new(self.ollama_url(), &model, Persona::default())
                    .list_models()
                    .await?
            }
        };
        Ok(models)
    }

    fn persona(&self) -> Result<Persona> {
        Persona::load(self.persona_path.as_deref())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.json"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("crishna"))
    }
}
