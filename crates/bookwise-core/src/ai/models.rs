use serde::{Deserialize, Serialize};

/// One book suggested by the recommendation flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    /// Why the model picked this book
    pub reason: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
