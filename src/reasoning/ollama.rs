//! Ollama-backed reasoning adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;
use crate::error::{BargainError, Result};
use crate::negotiation::{Action, NegotiationContext};
use crate::transport::codec;

use super::{prompt, ReasoningAdapter};

/// Configuration for the Ollama adapter
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl From<&ReasoningConfig> for OllamaConfig {
    fn from(config: &ReasoningConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

/// Local Ollama chat model
pub struct OllamaAdapter {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaAdapter {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ReasoningAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn propose(
        &self,
        context: &NegotiationContext,
        offer: u64,
        message: &str,
    ) -> Result<Action> {
        let prompt = prompt::build(context, offer, message);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| BargainError::AdapterFailure(format!("ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BargainError::AdapterFailure(format!(
                "ollama returned HTTP {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BargainError::AdapterFailure(format!("invalid ollama response: {}", e)))?;

        let content = body.message.map(|m| m.content).unwrap_or_default();
        tracing::debug!(model = %self.config.model, output = %content.trim(), "Model output");

        codec::decode(content.as_bytes())
            .map_err(|e| BargainError::AdapterFailure(format!("unusable model output: {}", e)))
    }
}
