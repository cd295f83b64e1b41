use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::AppConfig;
use crate::Result;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let db_path = config.database_path();

        // Ensure the data directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}", db_path.display());

        tracing::info!("Connecting to database: {}", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        // Create chapter summaries table
        sqlx::query(MIGRATION_001_CHAPTER_SUMMARIES)
            .execute(&self.pool)
            .await?;

        // Create preferences table (string blobs such as the chat transcript)
        sqlx::query(MIGRATION_002_PREFERENCES)
            .execute(&self.pool)
            .await?;

        sqlx::query(MIGRATION_INDEXES)
            .execute(&self.pool)
            .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

const MIGRATION_001_CHAPTER_SUMMARIES: &str = r#"
CREATE TABLE IF NOT EXISTS chapter_summaries (
    book_id TEXT NOT NULL,
    chapter_id TEXT NOT NULL,
    summary TEXT NOT NULL,
    provider TEXT NOT NULL,
    created_at DATETIME NOT NULL,
    PRIMARY KEY (book_id, chapter_id)
)
"#;

const MIGRATION_002_PREFERENCES: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const MIGRATION_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_chapter_summaries_book_id ON chapter_summaries(book_id)
"#;
