use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{non_empty_text, read_body, AiProvider, ProviderKind};
use crate::config::ProviderEndpointConfig;
use crate::{Error, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Provider for OpenAI-style chat completion endpoints (DeepSeek, GLM)
///
/// Authenticates with a bearer token and reads `choices[0].message.content`.
pub struct ChatCompletionsProvider {
    kind: ProviderKind,
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsProvider {
    pub fn new(
        kind: ProviderKind,
        client: Client,
        endpoint: &ProviderEndpointConfig,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            kind,
            client,
            url: format!("{}/chat/completions", endpoint.base_url.trim_end_matches('/')),
            model: endpoint.model.clone(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(provider = %self.kind, model = %self.model, prompt_chars = prompt.chars().count(), "Sending chat completion request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_body(self.kind, response).await?;

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            Error::ProviderResponse(format!("Failed to parse {} response: {}", self.kind, e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        non_empty_text(self.kind, content)
    }
}
