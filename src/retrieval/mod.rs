//! Query-time chunk retrieval
//!
//! Retrieval runs a nearest-neighbour search for the whole question first.
//! When that search comes back with too few chunks, it searches again with
//! only the first word of the question and keeps whichever result holds
//! more chunks.


use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::Result;
use crate::config::RetrievalConfig;
use crate::embeddings::{Chunk, Embedder};
use crate::indexer::vector_index::{ScoredChunk, VectorIndex};

/// How a [`RetrievalResult`] was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Search with the full query
    Vector,
    /// Search with the first word of the query, after the full query under-returned
    Fallback,
}

impl fmt::Display for RetrievalMode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Retrieved chunks, most relevant first
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
    pub mode: RetrievalMode,
}

impl RetrievalResult {
    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[inline]
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.hits.iter().map(|hit| &hit.chunk)
    }

    #[inline]
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.hits.into_iter().map(|hit| hit.chunk).collect()
    }
}

/// Finds the chunks of a [`VectorIndex`] most relevant to a question
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    fallback_min_results: usize,
    max_distance: Option<f32>,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, config: &RetrievalConfig) -> Self {
        Self {
            embedder,
            top_k: config.top_k,
            fallback_min_results: config.fallback_min_results,
            max_distance: config.max_distance,
        }
    }

    /// Configured number of chunks to retrieve per question
    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve up to `k` chunks for `query`
    ///
    /// An empty index yields an empty vector-mode result without calling the
    /// embedding service.
    ///
    /// # Errors
    /// Returns [`crate::AnalystError::EmbeddingService`] when the query cannot be
    /// embedded or its dimension does not match the index.
    #[inline]
    pub fn retrieve(&self, index: &VectorIndex, query: &str, k: usize) -> Result<RetrievalResult> {
        if index.is_empty() {
            debug!("Index is empty, nothing to retrieve");
            return Ok(RetrievalResult {
                hits: Vec::new(),
                mode: RetrievalMode::Vector,
            });
        }

        if index.embedding_model() != self.embedder.model_name() {
            warn!(
                "Index was built with {} but queries are embedded with {}",
                index.embedding_model(),
                self.embedder.model_name()
            );
        }

        let primary = self.search(index, query, k)?;
        debug!("Vector search returned {} chunks", primary.len());

        if primary.len() >= self.fallback_min_results {
            return Ok(RetrievalResult {
                hits: primary,
                mode: RetrievalMode::Vector,
            });
        }

        let Some(keyword) = query.split_whitespace().next() else {
            return Ok(RetrievalResult {
                hits: primary,
                mode: RetrievalMode::Vector,
            });
        };

        // A one-word query would repeat the primary search exactly
        if keyword == query.trim() {
            return Ok(RetrievalResult {
                hits: primary,
                mode: RetrievalMode::Vector,
            });
        }

        let fallback = self.search(index, keyword, k)?;
        if fallback.len() > primary.len() {
            warn!(
                "Vector search returned {} chunks, using {} from keyword fallback on {:?}",
                primary.len(),
                fallback.len(),
                keyword
            );
            Ok(RetrievalResult {
                hits: fallback,
                mode: RetrievalMode::Fallback,
            })
        } else {
            debug!(
                "Keyword fallback on {:?} returned {} chunks, keeping vector results",
                keyword,
                fallback.len()
            );
            Ok(RetrievalResult {
                hits: primary,
                mode: RetrievalMode::Vector,
            })
        }
    }

    fn search(&self, index: &VectorIndex, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self.embedder.embed(text)?;
        let mut hits = index.search(&vector, k)?;
        if let Some(max_distance) = self.max_distance {
            hits.retain(|hit| hit.distance <= max_distance);
        }
        Ok(hits)
    }
}

impl fmt::Debug for Retriever {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("embedding_model", &self.embedder.model_name())
            .field("top_k", &self.top_k)
            .field("fallback_min_results", &self.fallback_min_results)
            .field("max_distance", &self.max_distance)
            .finish()
    }
}
