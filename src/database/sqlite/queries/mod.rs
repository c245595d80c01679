
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

const DOCUMENT_COLUMNS: &str = "id, name, index_key, source_path, source_bytes, text_chars, \
     chunk_count, embedding_model, embedding_dimension, indexed_date";

pub struct DocumentQueries;

impl DocumentQueries {
    /// Record a document, replacing the entry that shares its index key
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new_document: NewDocument) -> Result<Document> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r"
            INSERT INTO documents (name, index_key, source_path, source_bytes, text_chars,
                                   chunk_count, embedding_model, embedding_dimension, indexed_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(index_key) DO UPDATE SET
                name = excluded.name,
                source_path = excluded.source_path,
                source_bytes = excluded.source_bytes,
                text_chars = excluded.text_chars,
                chunk_count = excluded.chunk_count,
                embedding_model = excluded.embedding_model,
                embedding_dimension = excluded.embedding_dimension,
                indexed_date = excluded.indexed_date
            ",
        )
        .bind(&new_document.name)
        .bind(&new_document.index_key)
        .bind(&new_document.source_path)
        .bind(new_document.source_bytes)
        .bind(new_document.text_chars)
        .bind(new_document.chunk_count)
        .bind(&new_document.embedding_model)
        .bind(new_document.embedding_dimension)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to record document {}", new_document.name))?;

        debug!("Recorded document {} as {}", new_document.name, new_document.index_key);

        Self::get_by_index_key(pool, &new_document.index_key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve recorded document"))
    }

    #[inline]
    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by name")
    }

    #[inline]
    pub async fn get_by_index_key(pool: &SqlitePool, index_key: &str) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE index_key = ?"
        ))
        .bind(index_key)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by index key")
    }

    /// Look a document up by its name, falling back to its index key
    #[inline]
    pub async fn find(pool: &SqlitePool, name_or_key: &str) -> Result<Option<Document>> {
        match Self::get_by_name(pool, name_or_key).await? {
            Some(document) => Ok(Some(document)),
            None => Self::get_by_index_key(pool, name_or_key).await,
        }
    }

    /// All documents, most recently indexed first
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY indexed_date DESC, name"
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list documents")
    }

    /// Delete the entry for `index_key`, returning whether one existed
    #[inline]
    pub async fn delete_by_index_key(pool: &SqlitePool, index_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE index_key = ?")
            .bind(index_key)
            .execute(pool)
            .await
            .context("Failed to delete document")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .context("Failed to count documents")
    }
}
