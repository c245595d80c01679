#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog entry for an ingested document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub index_key: String,
    pub source_path: String,
    pub source_bytes: i64,
    pub text_chars: i64,
    pub chunk_count: i64,
    pub embedding_model: String,
    pub embedding_dimension: i64,
    pub indexed_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub index_key: String,
    pub source_path: String,
    pub source_bytes: i64,
    pub text_chars: i64,
    pub chunk_count: i64,
    pub embedding_model: String,
    pub embedding_dimension: i64,
}

impl Document {
    /// Source file size in kilobytes, as shown in listings
    #[inline]
    pub fn source_kilobytes(&self) -> f64 {
        self.source_bytes as f64 / 1024.0
    }

    /// Whether the document matches a user-supplied name or index key
    #[inline]
    pub fn matches(&self, name_or_key: &str) -> bool {
        self.name == name_or_key || self.index_key == name_or_key
    }
}
