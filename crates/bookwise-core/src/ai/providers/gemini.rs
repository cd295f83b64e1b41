use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{non_empty_text, read_body, AiProvider, ProviderKind};
use crate::config::ProviderEndpointConfig;
use crate::{Error, Result};

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

/// Gemini generateContent provider
///
/// The API key travels as the `key` query parameter rather than a header.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: Client, endpoint: &ProviderEndpointConfig) -> Self {
        Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
        }
    }

    fn endpoint_url(&self, api_key: &str) -> Result<Url> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        Url::parse_with_params(&url, &[("key", api_key)])
            .map_err(|e| Error::Config(format!("Invalid Gemini endpoint URL: {}", e)))
    }
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        tracing::debug!(provider = "gemini", model = %self.model, prompt_chars = prompt.chars().count(), "Sending generateContent request");

        // The URL carries the API key, so it is stripped from transport errors
        let response = self
            .client
            .post(self.endpoint_url(api_key)?)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let body = read_body(ProviderKind::Gemini, response).await?;

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            Error::ProviderResponse(format!("Failed to parse gemini response: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        non_empty_text(ProviderKind::Gemini, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(base_url: &str) -> GeminiProvider {
        let endpoint = ProviderEndpointConfig {
            model: "gemini-1.5-flash".to_string(),
            base_url: base_url.to_string(),
        };
        GeminiProvider::new(Client::new(), &endpoint)
    }

    #[test]
    fn test_endpoint_url_encodes_key() {
        let provider = make_provider("https://generativelanguage.googleapis.com/v1beta/");
        let url = provider.endpoint_url("a b&c").unwrap();

        assert_eq!(url.path(), "/v1beta/models/gemini-1.5-flash:generateContent");
        assert_eq!(url.query(), Some("key=a+b%26c"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Recommend books"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "\n{\"recommendations\": []}\n"}]}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let text = provider.generate("g-key", "Recommend books").await.unwrap();

        assert_eq!(text, "{\"recommendations\": []}");
    }

    #[tokio::test]
    async fn test_error_status_carries_api_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let err = provider.generate("wrong", "hi").await.unwrap_err();

        assert!(matches!(
            err,
            Error::ProviderHttp { status: 400, ref message } if message == "API key not valid."
        ));
    }

    #[tokio::test]
    async fn test_blocked_candidate_is_response_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let err = provider.generate("key", "hi").await.unwrap_err();

        assert!(matches!(err, Error::ProviderResponse(_)));
    }
}
