use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::Database;
use crate::Result;

/// Keyed string storage used for opaque blobs such as the chat transcript
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;

    async fn write(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Blob store backed by the `preferences` table
#[derive(Clone)]
pub struct PreferenceStore {
    db: Database,
}

impl PreferenceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl BlobStore for PreferenceStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Process-local blob store; clones share the same map
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}
