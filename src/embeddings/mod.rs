// Embeddings module
// Text chunking and the embedding service client

pub mod chunking;
pub mod ollama;

pub use chunking::{Chunk, ChunkingConfig, chunk_text};
pub use ollama::{ModelInfo, OllamaClient};

use crate::Result;

/// A service that turns text into fixed-dimension embedding vectors.
///
/// The same model must be used when building an index and when embedding
/// queries against it.
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Identifier of the embedding model, recorded alongside built indexes
    fn model_name(&self) -> &str;
}
