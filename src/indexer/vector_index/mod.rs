
use std::sync::Arc;
use tracing::{debug, info};

use crate::embeddings::{Chunk, Embedder};
use crate::{AnalystError, Result};

/// A chunk paired with its embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A search hit with its squared L2 distance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Immutable collection of embedded chunks supporting nearest-neighbour search.
///
/// All vectors share one dimension and were produced by `embedding_model`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Assemble an index, checking that every vector has the same non-zero dimension
    #[inline]
    pub fn new(embedding_model: impl Into<String>, entries: Vec<IndexedChunk>) -> Result<Self> {
        let dimension = entries.first().map_or(0, |entry| entry.vector.len());

        if let Some(entry) = entries.first().filter(|entry| entry.vector.is_empty()) {
            return Err(AnalystError::EmbeddingService(format!(
                "Chunk {} has an empty embedding",
                entry.chunk.ordinal
            )));
        }

        if let Some(entry) = entries.iter().find(|entry| entry.vector.len() != dimension) {
            return Err(AnalystError::EmbeddingService(format!(
                "Inconsistent embedding dimension for chunk {}: expected {}, got {}",
                entry.chunk.ordinal,
                dimension,
                entry.vector.len()
            )));
        }

        Ok(Self {
            embedding_model: embedding_model.into(),
            dimension,
            entries,
        })
    }

    #[inline]
    pub fn empty(embedding_model: impl Into<String>) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension: 0,
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Vector dimension, zero for an empty index
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    #[inline]
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }

    /// Return up to `k` chunks nearest to `query`, closest first.
    ///
    /// Distance is squared Euclidean; equal distances keep document order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(AnalystError::EmbeddingService(format!(
                "Query embedding has {} dimensions but the index uses {} ({})",
                query.len(),
                self.dimension,
                self.embedding_model
            )));
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|entry| (squared_l2(query, &entry.vector), entry))
            .collect();

        scored.sort_by(|(a_distance, a), (b_distance, b)| {
            a_distance
                .total_cmp(b_distance)
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                distance,
            })
            .collect())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Embeds chunks and assembles them into a [`VectorIndex`]
#[derive(Clone)]
pub struct VectorIndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl VectorIndexBuilder {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embed every chunk and build a new index. Embedding failures are not retried.
    #[inline]
    pub fn build(&self, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        let model = self.embedder.model_name().to_string();
        if chunks.is_empty() {
            debug!("No chunks to embed, building empty index");
            return Ok(VectorIndex::empty(model));
        }

        debug!("Embedding {} chunks with {}", chunks.len(), model);

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        if vectors.len() != chunks.len() {
            return Err(AnalystError::EmbeddingService(format!(
                "Expected {} embeddings, received {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect();

        let index = VectorIndex::new(model, entries)?;
        info!(
            "Built vector index with {} chunks ({} dimensions)",
            index.len(),
            index.dimension()
        );
        Ok(index)
    }
}

impl std::fmt::Debug for VectorIndexBuilder {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndexBuilder")
            .field("embedding_model", &self.embedder.model_name())
            .finish()
    }
}
