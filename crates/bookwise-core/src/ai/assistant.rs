use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use super::parser::{parse_recommendations, parse_summary};
use super::providers::{create_provider, AiProvider, ProviderKind};
use super::Recommendation;
use crate::config::AiConfig;
use crate::prompt::PromptBuilder;
use crate::storage::{Database, SummaryRecord, SummaryRepository};
use crate::text;
use crate::{Error, Result};

/// A chapter to summarize
#[derive(Debug, Clone)]
pub struct ChapterContent {
    pub book_id: String,
    pub chapter_id: String,
    pub book_name: String,
    pub chapter_title: String,
    /// Raw chapter text; cleaned and truncated before prompting
    pub content: String,
}

/// Entry point for the AI features: chapter summaries and book recommendations
///
/// Cheap to clone, so flows can be moved onto spawned tasks.
#[derive(Clone)]
pub struct Assistant {
    db: Database,
    providers: HashMap<ProviderKind, Arc<dyn AiProvider>>,
    prompts: PromptBuilder,
    content_char_limit: usize,
}

impl Assistant {
    /// Create an assistant with every supported provider configured
    pub fn new(db: Database, config: &AiConfig) -> Result<Self> {
        let providers = ProviderKind::ALL
            .into_iter()
            .map(|kind| Ok((kind, create_provider(kind, config)?)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self::with_providers(db, config, providers))
    }

    /// Create an assistant over explicit provider implementations
    pub fn with_providers(
        db: Database,
        config: &AiConfig,
        providers: HashMap<ProviderKind, Arc<dyn AiProvider>>,
    ) -> Self {
        Self {
            db,
            providers,
            prompts: PromptBuilder::new(config.response_language.clone()),
            content_char_limit: config.content_char_limit,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Return the cached summary for the chapter, generating one on a cache miss
    pub async fn generate_summary(
        &self,
        provider: &str,
        api_key: &str,
        chapter: &ChapterContent,
    ) -> Result<SummaryRecord> {
        let provider = self.provider(provider)?;

        let repo = SummaryRepository::new(&self.db);
        if let Some(cached) = repo.get(&chapter.book_id, &chapter.chapter_id).await? {
            tracing::debug!(book_id = %chapter.book_id, chapter_id = %chapter.chapter_id, "Summary cache hit");
            return Ok(cached);
        }

        // The key is only needed once the provider has to be called
        let api_key = require_key(api_key)?;
        self.summarize_and_store(provider, api_key, chapter).await
    }

    /// Generate a fresh summary and overwrite any cached one
    pub async fn regenerate_summary(
        &self,
        provider: &str,
        api_key: &str,
        chapter: &ChapterContent,
    ) -> Result<SummaryRecord> {
        let (provider, api_key) = self.resolve(provider, api_key)?;
        self.summarize_and_store(provider, api_key, chapter).await
    }

    /// Ask the provider for books matching the reader's request
    pub async fn recommend_books(
        &self,
        provider: &str,
        api_key: &str,
        user_query: &str,
    ) -> Result<Vec<Recommendation>> {
        let (provider, api_key) = self.resolve(provider, api_key)?;

        tracing::info!(provider = %provider.kind(), "Requesting book recommendations");

        let prompt = self.prompts.build_recommendation_prompt(user_query.trim());
        let raw = provider.generate(api_key, &prompt).await?;
        let recommendations = parse_recommendations(&raw)?;

        tracing::info!("Received {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    /// Validate provider id and key once, before any I/O
    fn resolve<'k>(&self, provider: &str, api_key: &'k str) -> Result<(&Arc<dyn AiProvider>, &'k str)> {
        let provider = self.provider(provider)?;
        Ok((provider, require_key(api_key)?))
    }

    fn provider(&self, id: &str) -> Result<&Arc<dyn AiProvider>> {
        let kind: ProviderKind = id.parse()?;
        self.providers
            .get(&kind)
            .ok_or_else(|| Error::UnsupportedProvider(id.to_string()))
    }

    async fn summarize_and_store(
        &self,
        provider: &Arc<dyn AiProvider>,
        api_key: &str,
        chapter: &ChapterContent,
    ) -> Result<SummaryRecord> {
        let prepared = text::prepare(&chapter.content, self.content_char_limit);
        let prompt = self
            .prompts
            .build_summary_prompt(&chapter.book_name, &chapter.chapter_title, &prepared);

        tracing::info!(
            provider = %provider.kind(),
            book_id = %chapter.book_id,
            chapter_id = %chapter.chapter_id,
            content_chars = prepared.chars().count(),
            "Generating chapter summary"
        );

        let raw = provider.generate(api_key, &prompt).await?;
        let record = SummaryRecord {
            book_id: chapter.book_id.clone(),
            chapter_id: chapter.chapter_id.clone(),
            text: parse_summary(&raw)?,
            provider_id: provider.kind().to_string(),
            created_at: Utc::now(),
        };

        SummaryRepository::new(&self.db).put(&record).await?;

        Ok(record)
    }
}

fn require_key(api_key: &str) -> Result<&str> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(Error::MissingApiKey);
    }
    Ok(api_key)
}


#[cfg(test)]
mod tests {
    use super::test_support::{assistant_with, ScriptedProvider};
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chapter(chapter_id: &str) -> ChapterContent {
        ChapterContent {
            book_id: "book-1".to_string(),
            chapter_id: chapter_id.to_string(),
            book_name: "The Long Road".to_string(),
            chapter_title: "Chapter 1".to_string(),
            content: "  The caravan left at dawn.\n\nMira counted the wagons.  ".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_summary_caches_result() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::DeepSeek,
            vec![Ok("  Mira leaves with the caravan.  ".to_string())],
        );
        let assistant = assistant_with(db.clone(), provider.clone());

        let record = assistant.generate_summary("deepseek", "key", &chapter("ch-1")).await.unwrap();
        assert_eq!(record.text, "Mira leaves with the caravan.");
        assert_eq!(record.provider_id, "deepseek");

        let prompt = provider.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("The caravan left at dawn. Mira counted the wagons."));
        assert!(prompt.contains("\"The Long Road\""));

        // Second call is served from the cache
        let cached = assistant.generate_summary("DeepSeek", "key", &chapter("ch-1")).await.unwrap();
        assert_eq!(cached.text, record.text);
        assert_eq!(provider.call_count(), 1);

        let stored = SummaryRepository::new(&db).get("book-1", "ch-1").await.unwrap().unwrap();
        assert_eq!(stored.text, "Mira leaves with the caravan.");
    }

    #[tokio::test]
    async fn test_regenerate_overwrites_cache() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::Glm,
            vec![Ok("first".to_string()), Ok("second".to_string())],
        );
        let assistant = assistant_with(db.clone(), provider.clone());

        assistant.generate_summary("glm", "key", &chapter("ch-1")).await.unwrap();
        let regenerated = assistant.regenerate_summary("glm", "key", &chapter("ch-1")).await.unwrap();

        assert_eq!(regenerated.text, "second");
        assert_eq!(provider.call_count(), 2);

        let repo = SummaryRepository::new(&db);
        assert_eq!(repo.get("book-1", "ch-1").await.unwrap().unwrap().text, "second");
        assert_eq!(repo.count_for_book("book-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_cache_untouched() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::Gemini,
            vec![Err(Error::ProviderHttp { status: 429, message: "quota".to_string() })],
        );
        let assistant = assistant_with(db.clone(), provider);

        let err = assistant.generate_summary("gemini", "key", &chapter("ch-1")).await.unwrap_err();
        assert!(matches!(err, Error::ProviderHttp { status: 429, .. }));
        assert!(SummaryRepository::new(&db).get("book-1", "ch-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_provider_makes_no_call() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(ProviderKind::DeepSeek, vec![Ok("unused".to_string())]);
        let assistant = assistant_with(db, provider.clone());

        let err = assistant.recommend_books("claude", "key", "fantasy").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(ref id) if id == "claude"));

        let err = assistant.regenerate_summary("claude", "key", &chapter("ch-1")).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(_)));

        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_api_key_is_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(ProviderKind::DeepSeek, vec![]);
        let assistant = assistant_with(db, provider.clone());

        let err = assistant.recommend_books("deepseek", "   ", "fantasy").await.unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cached_summary_needs_no_api_key() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(ProviderKind::DeepSeek, vec![Ok("first".to_string())]);
        let assistant = assistant_with(db, provider.clone());

        let err = assistant.generate_summary("deepseek", "", &chapter("ch-1")).await.unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));

        assistant.generate_summary("deepseek", "key", &chapter("ch-1")).await.unwrap();
        let cached = assistant.generate_summary("deepseek", " ", &chapter("ch-1")).await.unwrap();

        assert_eq!(cached.text, "first");
        assert_eq!(provider.call_count(), 1);

        let err = assistant.generate_summary("claude", "", &chapter("ch-1")).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(_)));
    }

    #[tokio::test]
    async fn test_recommend_books_parses_reply() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::DeepSeek,
            vec![Ok(r#"Here you go: {"recommendations":[{"title":"T","author":"A","reason":"R","tags":["x"]}]}"#.to_string())],
        );
        let assistant = assistant_with(db, provider.clone());

        let recommendations = assistant.recommend_books("deepseek", "key", "  cozy mystery ").await.unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].tags, vec!["x"]);

        let prompt = provider.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Reader request: cozy mystery\n"));
    }

    #[tokio::test]
    async fn test_malformed_recommendations_carry_raw_text() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::DeepSeek,
            vec![Ok("Sorry, I can't help with that.".to_string())],
        );
        let assistant = assistant_with(db, provider);

        let err = assistant.recommend_books("deepseek", "key", "anything").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecommendation { ref raw_text, .. } if raw_text == "Sorry, I can't help with that."
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_requests_for_different_chapters() {
        let db = Database::new_in_memory().await.unwrap();
        let provider = ScriptedProvider::new(
            ProviderKind::DeepSeek,
            vec![Ok("summary".to_string()), Ok("summary".to_string())],
        );
        let assistant = assistant_with(db.clone(), provider.clone());

        let handles: Vec<_> = ["ch-1", "ch-2"]
            .into_iter()
            .map(|chapter_id| {
                let assistant = assistant.clone();
                tokio::spawn(async move {
                    assistant.regenerate_summary("deepseek", "key", &chapter(chapter_id)).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provider.call_count(), 2);
        assert_eq!(SummaryRepository::new(&db).count_for_book("book-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mixed_case_provider_id_reaches_http_backend() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "A summary."}}]
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let mut config = AiConfig::default();
        config.deepseek.base_url = mock_server.uri();

        let db = Database::new_in_memory().await.unwrap();
        let assistant = Assistant::new(db, &config).unwrap();

        let lower = assistant.regenerate_summary("deepseek", "key", &chapter("ch-1")).await.unwrap();
        let mixed = assistant.regenerate_summary("DeepSeek", "key", &chapter("ch-1")).await.unwrap();
        assert_eq!(lower.text, mixed.text);
        assert_eq!(mixed.provider_id, "deepseek");

        let err = assistant.regenerate_summary("claude", "key", &chapter("ch-1")).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(_)));
        // MockServer verifies on drop that exactly two requests arrived
    }
}
