mod database;
mod preference_store;
mod summary_repo;

pub use database::Database;
pub use preference_store::{BlobStore, MemoryBlobStore, PreferenceStore};
pub use summary_repo::{SummaryRecord, SummaryRepository};
