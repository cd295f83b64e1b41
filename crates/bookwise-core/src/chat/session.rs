use super::models::{ChatMessage, RequestState, StoredMessage};
use crate::ai::{Assistant, Recommendation};
use crate::storage::BlobStore;
use crate::{Error, Result};

/// Storage key of the recommendation transcript
pub const SESSION_KEY: &str = "ai_book_search_chat_history";

pub const WELCOME_MESSAGE: &str = "Hi! Tell me what kind of book you are in the mood for \
(genre, setting, a book you loved) and I will recommend a few titles.";

/// Ordered transcript of one recommendation conversation
///
/// The transcript is written back as a single JSON array under one key. Storage
/// failures are logged rather than returned so a broken store never interrupts the
/// conversation.
pub struct ChatSession<S: BlobStore> {
    store: S,
    key: String,
    messages: Vec<ChatMessage>,
    state: RequestState,
}

impl<S: BlobStore> ChatSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, SESSION_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            messages: Vec::new(),
            state: RequestState::Idle,
        }
    }

    /// Append a message at the end of the transcript
    ///
    /// Callers should not append a second `Loading` entry; `end_loading` removes all
    /// of them regardless.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn current(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Append the loading placeholder
    pub fn begin_loading(&mut self) {
        self.messages.push(ChatMessage::Loading);
        self.state = RequestState::Loading;
    }

    /// Remove every loading placeholder
    pub fn end_loading(&mut self) {
        self.messages.retain(|m| !m.is_transient_loading());
    }

    /// Drop the transcript from memory and storage
    pub async fn clear(&mut self) {
        self.messages.clear();
        self.state = RequestState::Idle;

        if let Err(e) = self.store.remove(&self.key).await {
            tracing::warn!("Failed to clear chat history: {}", e);
        }
    }

    /// Write the durable part of the transcript to storage
    pub async fn persist(&self) {
        let result = match self.encode() {
            Ok(blob) => self.store.write(&self.key, &blob).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!("Failed to save chat history: {}", e);
        }
    }

    /// Replace the in-memory transcript with the stored one
    ///
    /// Entries that fail to decode are skipped. An empty result gets a welcome message,
    /// which stays in memory only.
    pub async fn load(&mut self) {
        let blob = match self.store.read(&self.key).await {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("Failed to load chat history: {}", e);
                None
            }
        };

        self.messages = blob.map(|blob| decode(&blob)).unwrap_or_default();
        self.state = RequestState::Idle;

        tracing::debug!("Loaded {} chat messages", self.messages.len());

        if self.messages.is_empty() {
            self.messages.push(ChatMessage::welcome(WELCOME_MESSAGE));
        }
    }

    /// Run one recommendation request through the transcript.
    ///
    /// The question is appended and saved, a loading placeholder shown while the
    /// provider works, then replaced by the recommendations or by an error message.
    /// The provider error is still returned so the caller can report it.
    pub async fn request_recommendations(
        &mut self,
        assistant: &Assistant,
        provider: &str,
        api_key: &str,
        user_query: &str,
    ) -> Result<Vec<Recommendation>> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        self.append(ChatMessage::user(user_query));
        self.persist().await;

        self.begin_loading();
        let result = assistant.recommend_books(provider, api_key, user_query).await;
        self.end_loading();

        match &result {
            Ok(recommendations) => {
                self.append(ChatMessage::with_recommendations(recommendations.clone()));
                self.state = RequestState::Resolved { succeeded: true };
            }
            Err(e) => {
                tracing::warn!("Book recommendation failed: {}", e);
                self.append(ChatMessage::assistant(failure_message(e)));
                self.state = RequestState::Resolved { succeeded: false };
            }
        }

        self.persist().await;
        result
    }

    fn encode(&self) -> Result<String> {
        let stored: Vec<StoredMessage> = self
            .messages
            .iter()
            .filter_map(ChatMessage::to_stored)
            .collect();

        Ok(serde_json::to_string(&stored)?)
    }
}

fn failure_message(error: &Error) -> String {
    format!(
        "Sorry, the recommendation failed: {error}\n\n\
Please check your network connection or API settings and try again."
    )
}

/// Decode a stored transcript, skipping entries that are not valid messages
fn decode(blob: &str) -> Vec<ChatMessage> {
    if blob.trim().is_empty() {
        return Vec::new();
    }

    let entries: Vec<serde_json::Value> = match serde_json::from_str(blob) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Chat history is not a JSON array, starting fresh: {}", e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<StoredMessage>(entry) {
            Ok(stored) => Some(ChatMessage::from(stored)),
            Err(e) => {
                let skipped = Error::CorruptHistoryEntry {
                    index,
                    reason: e.to_string(),
                };
                tracing::warn!("{}", skipped);
                None
            }
        })
        .collect()
}
