use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::ProviderKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// AI provider: "deepseek", "glm", "gemini"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// API key for the selected provider
    #[serde(default)]
    pub api_key: Option<String>,
    /// Language the model should answer in (e.g., "Chinese", "English")
    #[serde(default = "default_response_language")]
    pub response_language: String,
    /// Chapter text is cut to this many chars before prompting
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Generation is slow, so the read timeout is longer than the connect timeout
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Sampling temperature for chat-completion providers
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Max tokens for chat-completion providers
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_deepseek")]
    pub deepseek: ProviderEndpointConfig,
    #[serde(default = "default_glm")]
    pub glm: ProviderEndpointConfig,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderEndpointConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            api_key: None,
            response_language: default_response_language(),
            content_char_limit: default_content_char_limit(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            deepseek: default_deepseek(),
            glm: default_glm(),
            gemini: default_gemini(),
        }
    }
}

impl AiConfig {
    /// Endpoint settings for a provider
    pub fn endpoint(&self, kind: ProviderKind) -> &ProviderEndpointConfig {
        match kind {
            ProviderKind::DeepSeek => &self.deepseek,
            ProviderKind::Glm => &self.glm,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

/// Per-provider model name and API base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpointConfig {
    pub model: String,
    pub base_url: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookwise")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ai_provider() -> String {
    "deepseek".to_string()
}

fn default_response_language() -> String {
    "Chinese".to_string()
}

fn default_content_char_limit() -> usize {
    3000
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_deepseek() -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        model: "deepseek-chat".to_string(),
        base_url: "https://api.deepseek.com/v1".to_string(),
    }
}

fn default_glm() -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        model: "glm-4-flash".to_string(),
        base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
    }
}

fn default_gemini() -> ProviderEndpointConfig {
    ProviderEndpointConfig {
        model: "gemini-1.5-flash".to_string(),
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    }
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/bookwise/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("bookwise")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("bookwise.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.ai.provider, "deepseek");
        assert_eq!(config.ai.content_char_limit, 3000);
        assert_eq!(config.ai.connect_timeout_secs, 30);
        assert_eq!(config.ai.read_timeout_secs, 60);
        assert_eq!(config.ai.gemini.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_toml(
            r#"
            [ai]
            provider = "gemini"
            read_timeout_secs = 90

            [ai.glm]
            model = "glm-4-plus"
            base_url = "http://localhost:8080"
            "#,
        )
        .unwrap();

        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.ai.read_timeout_secs, 90);
        assert_eq!(config.ai.endpoint(ProviderKind::Glm).model, "glm-4-plus");
        assert_eq!(
            config.ai.endpoint(ProviderKind::DeepSeek).base_url,
            "https://api.deepseek.com/v1"
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("[ai\nprovider =").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        let path = PathBuf::from("/var/lib/bookwise");
        assert_eq!(expand_tilde(&path), path);
    }
}
