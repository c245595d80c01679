// Indexer module
// Turns extracted document text into a persisted vector index

pub mod vector_index;


use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::database::{IndexStore, validate_index_key};
use crate::embeddings::{Chunk, ChunkingConfig, Embedder, OllamaClient, chunk_text};
use crate::{AnalystError, Result};

pub use vector_index::{IndexedChunk, ScoredChunk, VectorIndex, VectorIndexBuilder};

/// Statistics about a freshly persisted index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub index_key: String,
    pub chunk_count: usize,
    pub text_chars: usize,
    pub dimension: usize,
    pub embedding_model: String,
}

/// Progress reported while an index is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingStage {
    Chunked { chunk_count: usize },
    Embedded { dimension: usize },
    Persisted,
}

/// Chunks, embeds and stores documents
#[derive(Clone)]
pub struct Indexer {
    chunking: ChunkingConfig,
    builder: VectorIndexBuilder,
    store: IndexStore,
}

impl Indexer {
    #[inline]
    pub fn new(chunking: ChunkingConfig, builder: VectorIndexBuilder, store: IndexStore) -> Self {
        Self {
            chunking,
            builder,
            store,
        }
    }

    /// Create an indexer backed by the configured embedding service and index directory
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaClient::new(&config.ollama)?);
        let store = IndexStore::new(config).await?;

        Ok(Self::new(
            config.chunking.clone(),
            VectorIndexBuilder::new(embedder),
            store,
        ))
    }

    #[inline]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Chunk `text`, embed the chunks and save the index under `key`
    ///
    /// # Errors
    /// Fails with [`AnalystError::InvalidIndexKey`] before any work is done
    /// for a malformed key, with [`AnalystError::Extraction`] when the text
    /// yields no chunks, and with embedding or storage errors otherwise.
    #[inline]
    pub async fn build_and_persist(&self, text: &str, key: &str) -> Result<IndexSummary> {
        self.build_and_persist_with_progress(text, key, |_| {}).await
    }

    /// [`Self::build_and_persist`], calling `on_stage` as each step completes
    #[inline]
    pub async fn build_and_persist_with_progress<F>(
        &self,
        text: &str,
        key: &str,
        mut on_stage: F,
    ) -> Result<IndexSummary>
    where
        F: FnMut(IndexingStage) + Send,
    {
        validate_index_key(key)?;

        let chunks = self.chunk(text)?;
        let chunk_count = chunks.len();
        on_stage(IndexingStage::Chunked { chunk_count });

        let index = self.builder.build(chunks)?;
        on_stage(IndexingStage::Embedded {
            dimension: index.dimension(),
        });

        self.store.save(&index, key).await?;
        on_stage(IndexingStage::Persisted);

        let summary = IndexSummary {
            index_key: key.to_string(),
            chunk_count,
            text_chars: text.chars().count(),
            dimension: index.dimension(),
            embedding_model: index.embedding_model().to_string(),
        };
        info!(
            "Indexed {} chunks into {} ({} dimensions, {})",
            summary.chunk_count, summary.index_key, summary.dimension, summary.embedding_model
        );
        Ok(summary)
    }

    /// Split `text` into chunks, rejecting text with nothing to index
    ///
    /// # Errors
    /// Returns [`AnalystError::Extraction`] for blank text and
    /// [`AnalystError::Config`] for invalid chunking settings.
    #[inline]
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let chunks = chunk_text(text, &self.chunking)?;
        if chunks.is_empty() {
            return Err(AnalystError::Extraction(
                "Document contains no text to index".to_string(),
            ));
        }

        debug!(
            "Split {} characters into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Remove the index stored under `key`; a missing index is not an error
    #[inline]
    pub async fn delete_index(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }
}

impl std::fmt::Debug for Indexer {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("chunking", &self.chunking)
            .field("builder", &self.builder)
            .field("index_root", &self.store.root())
            .finish()
    }
}
