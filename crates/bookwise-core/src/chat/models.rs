use serde::{Deserialize, Serialize};

use crate::ai::Recommendation;

/// One entry of a recommendation conversation
///
/// `Welcome` and `Loading` are transient: they are shown to the reader but never
/// written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        content: String,
        recommendations: Vec<Recommendation>,
    },
    Welcome {
        content: String,
    },
    /// Placeholder for an in-flight request
    Loading,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_recommendations(recommendations: Vec<Recommendation>) -> Self {
        Self::Assistant {
            content: String::new(),
            recommendations,
        }
    }

    pub fn welcome(content: impl Into<String>) -> Self {
        Self::Welcome {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::User { content } | Self::Assistant { content, .. } | Self::Welcome { content } => {
                content
            }
            Self::Loading => "",
        }
    }

    pub fn is_from_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Recommendations attached to an assistant reply, empty for everything else
    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            Self::Assistant { recommendations, .. } => recommendations,
            _ => &[],
        }
    }

    pub fn is_transient_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_transient_welcome(&self) -> bool {
        matches!(self, Self::Welcome { .. })
    }

    pub fn is_transient(&self) -> bool {
        self.is_transient_loading() || self.is_transient_welcome()
    }

    /// Storage form, or `None` for transient entries
    pub(crate) fn to_stored(&self) -> Option<StoredMessage> {
        match self {
            Self::User { content } => Some(StoredMessage {
                is_user: true,
                content: content.clone(),
                recommendations: None,
            }),
            Self::Assistant {
                content,
                recommendations,
            } => Some(StoredMessage {
                is_user: false,
                content: content.clone(),
                recommendations: (!recommendations.is_empty()).then(|| recommendations.clone()),
            }),
            Self::Welcome { .. } | Self::Loading => None,
        }
    }
}

/// Persisted transcript entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredMessage {
    pub is_user: bool,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl From<StoredMessage> for ChatMessage {
    fn from(stored: StoredMessage) -> Self {
        if stored.is_user {
            ChatMessage::user(stored.content)
        } else {
            ChatMessage::Assistant {
                content: stored.content,
                recommendations: stored.recommendations.unwrap_or_default(),
            }
        }
    }
}

/// Lifecycle of the most recent recommendation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    /// Finished; `succeeded` is false when an error message was appended instead
    Resolved { succeeded: bool },
}
