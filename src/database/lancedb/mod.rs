// LanceDB vector index storage
// One table per document index, keyed by the document's index key


pub mod index_store;

pub use index_store::IndexStore;

use arrow::datatypes::{DataType, Field, Schema};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::{AnalystError, Result};

/// Suffix appended to a document's stem to form its index key
pub const INDEX_KEY_SUFFIX: &str = "_index";

/// Schema metadata entry naming the model that produced an index's vectors
pub(crate) const EMBEDDING_MODEL_METADATA_KEY: &str = "embedding_model";

const MAX_KEY_LENGTH: usize = 200;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Derive the index key for a document name or path.
///
/// The extension is dropped, any character outside `[A-Za-z0-9_.-]` becomes
/// `_`, and `_index` is appended: `"Case Study.pdf"` becomes `"Case_Study_index"`.
#[inline]
pub fn index_key_for(document_name: &str) -> String {
    let path = Path::new(document_name);
    let stem = path
        .file_stem()
        .or_else(|| path.file_name())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sanitized: String = stem
        .chars()
        .map(|c| if is_key_char(c) { c } else { '_' })
        .collect();

    format!("{sanitized}{INDEX_KEY_SUFFIX}")
}

/// Check that `key` can be used as a table name
#[inline]
pub fn validate_index_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AnalystError::InvalidIndexKey(
            "index key cannot be empty".to_string(),
        ));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(AnalystError::InvalidIndexKey(format!(
            "index key is longer than {MAX_KEY_LENGTH} characters"
        )));
    }

    if let Some(c) = key.chars().find(|&c| !is_key_char(c)) {
        return Err(AnalystError::InvalidIndexKey(format!(
            "'{key}' contains '{c}' (allowed: letters, digits, '_', '-', '.')"
        )));
    }

    Ok(())
}

/// Table schema for an index with vectors of `vector_dim` dimensions.
///
/// The embedding model is recorded in the schema metadata as well as per row,
/// so an index with no rows still knows which model built it.
pub(crate) fn index_schema(vector_dim: i32, embedding_model: &str) -> Arc<Schema> {
    let metadata = HashMap::from([(
        EMBEDDING_MODEL_METADATA_KEY.to_string(),
        embedding_model.to_string(),
    )]);

    Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim,
                ),
                false,
            ),
            Field::new("ordinal", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("embedding_model", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ],
        metadata,
    ))
}
