use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generative service error: {0}")]
    GenerativeService(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Invalid index key: {0}")]
    InvalidIndexKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answer;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod extractor;
pub mod generation;
pub mod indexer;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod test_support;
