use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Database;
use crate::Result;

/// Cached AI summary of one chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub book_id: String,
    pub chapter_id: String,
    pub text: String,
    /// Provider id that generated the summary (e.g. "deepseek")
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SummaryRow {
    book_id: String,
    chapter_id: String,
    summary: String,
    provider: String,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for SummaryRecord {
    fn from(row: SummaryRow) -> Self {
        SummaryRecord {
            book_id: row.book_id,
            chapter_id: row.chapter_id,
            text: row.summary,
            provider_id: row.provider,
            created_at: row.created_at,
        }
    }
}

/// Repository for chapter summaries keyed by (book_id, chapter_id)
///
/// Entries never expire; they live until the chapter or book is purged.
pub struct SummaryRepository<'a> {
    db: &'a Database,
}

impl<'a> SummaryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find the summary for a chapter
    pub async fn get(&self, book_id: &str, chapter_id: &str) -> Result<Option<SummaryRecord>> {
        let row: Option<SummaryRow> = sqlx::query_as(
            r#"
            SELECT book_id, chapter_id, summary, provider, created_at
            FROM chapter_summaries
            WHERE book_id = ? AND chapter_id = ?
            "#,
        )
        .bind(book_id)
        .bind(chapter_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(SummaryRecord::from))
    }

    /// Insert a summary, replacing every field of an existing one for the same chapter
    pub async fn put(&self, record: &SummaryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chapter_summaries (book_id, chapter_id, summary, provider, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(book_id, chapter_id) DO UPDATE SET
                summary = excluded.summary,
                provider = excluded.provider,
                created_at = excluded.created_at
            "#,
        )
        .bind(&record.book_id)
        .bind(&record.chapter_id)
        .bind(&record.text)
        .bind(&record.provider_id)
        .bind(record.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// All summaries of a book, ordered by chapter id
    pub async fn list_for_book(&self, book_id: &str) -> Result<Vec<SummaryRecord>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT book_id, chapter_id, summary, provider, created_at
            FROM chapter_summaries
            WHERE book_id = ?
            ORDER BY chapter_id
            "#,
        )
        .bind(book_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(SummaryRecord::from).collect())
    }

    /// Delete every summary of a book, returning how many were removed
    pub async fn delete_for_book(&self, book_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chapter_summaries WHERE book_id = ?")
            .bind(book_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete the summary of one chapter, returning whether it existed
    pub async fn delete_one(&self, book_id: &str, chapter_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM chapter_summaries WHERE book_id = ? AND chapter_id = ?",
        )
        .bind(book_id)
        .bind(chapter_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of cached summaries for a book
    pub async fn count_for_book(&self, book_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chapter_summaries WHERE book_id = ?",
        )
        .bind(book_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }
}
