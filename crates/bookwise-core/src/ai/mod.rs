mod assistant;
mod models;
pub mod parser;
pub mod providers;

pub use assistant::{Assistant, ChapterContent};
pub use models::Recommendation;
pub use providers::{create_provider, AiProvider, ProviderKind};

#[cfg(test)]
pub(crate) use assistant::test_support;
