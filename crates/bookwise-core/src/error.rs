use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("AI provider returned HTTP {status}: {message}")]
    ProviderHttp { status: u16, message: String },

    #[error("Invalid AI provider response: {0}")]
    ProviderResponse(String),

    #[error("Failed to parse recommendations: {reason}\nRaw response: {raw_text}")]
    MalformedRecommendation { reason: String, raw_text: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Corrupt chat history entry at index {index}: {reason}")]
    CorruptHistoryEntry { index: usize, reason: String },

    #[error("AI API key is not configured")]
    MissingApiKey,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>, raw_text: &str) -> Self {
        Self::MalformedRecommendation {
            reason: reason.into(),
            raw_text: raw_text.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
