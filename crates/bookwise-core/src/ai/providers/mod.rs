mod chat_completions;
mod gemini;

pub use chat_completions::ChatCompletionsProvider;
pub use gemini::GeminiProvider;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AiConfig;
use crate::{Error, Result};

/// Supported language-model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// DeepSeek chat completions
    DeepSeek,
    /// Zhipu GLM chat completions
    Glm,
    /// Google Gemini generateContent
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::DeepSeek, Self::Glm, Self::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::Glm => "glm",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    /// Provider ids are matched case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == id)
            .ok_or_else(|| Error::UnsupportedProvider(s.to_string()))
    }
}

/// A language-model backend that turns one prompt into one reply
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Send `prompt` in a single request and return the generated text, trimmed.
    ///
    /// Each call is independent: no conversation state is kept between calls.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String>;
}

/// Build the provider for `kind` from configuration
pub fn create_provider(kind: ProviderKind, config: &AiConfig) -> Result<Arc<dyn AiProvider>> {
    let client = build_http_client(config)?;
    let endpoint = config.endpoint(kind);

    let provider: Arc<dyn AiProvider> = match kind {
        ProviderKind::DeepSeek | ProviderKind::Glm => Arc::new(ChatCompletionsProvider::new(
            kind,
            client,
            endpoint,
            config.temperature,
            config.max_tokens,
        )),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client, endpoint)),
    };

    Ok(provider)
}

fn build_http_client(config: &AiConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .build()
        .map_err(Error::Http)
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Read a provider response, mapping non-success statuses and empty bodies to errors
async fn read_body(kind: ProviderKind, response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| Error::Http(e.without_url()))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());

        tracing::warn!(provider = %kind, status = status.as_u16(), "AI provider request failed: {}", message);

        return Err(Error::ProviderHttp {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Err(Error::ProviderResponse(format!("{kind} returned an empty body")));
    }

    Ok(body)
}

/// Trim generated text, rejecting replies that carry no text at all
fn non_empty_text(kind: ProviderKind, text: Option<String>) -> Result<String> {
    let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        return Err(Error::ProviderResponse(format!(
            "{kind} response contained no generated text"
        )));
    }
    Ok(text)
}
