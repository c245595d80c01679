
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AnswerOutcome, AnswerRecord, ContextCondenser, NO_CHUNKS_RETRIEVED, build_prompt};
use crate::Result;
use crate::config::{Config, GenerationConfig};
use crate::database::IndexStore;
use crate::embeddings::{Embedder, OllamaClient};
use crate::generation::{Completion, GenerationRequest, Generator, build_generator, complete};
use crate::indexer::vector_index::VectorIndex;
use crate::retrieval::Retriever;

/// Answers questions about one persisted index at a time
///
/// Holds no per-question state; the index key is passed to every call.
#[derive(Clone)]
pub struct AnswerPipeline {
    store: IndexStore,
    retriever: Retriever,
    condenser: ContextCondenser,
    generator: Arc<dyn Generator>,
    max_output_tokens: u32,
    temperature: f32,
}

impl AnswerPipeline {
    #[inline]
    pub fn new(
        store: IndexStore,
        retriever: Retriever,
        generator: Arc<dyn Generator>,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            condenser: ContextCondenser::new(Arc::clone(&generator), config),
            generator,
            max_output_tokens: config.answer_max_tokens,
            temperature: config.temperature,
        }
    }

    /// Wire up the configured embedding service, generator and index store
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaClient::new(&config.ollama)?);
        let generator = build_generator(&config.generation, &config.ollama)?;
        let store = IndexStore::new(config).await?;
        let retriever = Retriever::new(embedder, &config.retrieval);

        Ok(Self::new(store, retriever, generator, &config.generation))
    }

    /// Answer `query` from the index stored under `index_key`
    ///
    /// # Errors
    /// Returns [`crate::AnalystError::IndexNotFound`] when nothing is stored
    /// under `index_key`, and embedding or storage errors from retrieval.
    /// Generation failures are reported in the record instead.
    #[inline]
    pub async fn answer(&self, index_key: &str, query: &str) -> Result<AnswerRecord> {
        let index = self.store.load(index_key).await?;
        debug!("Loaded {} with {} chunks", index_key, index.len());
        self.answer_from_index(&index, query)
    }

    /// Answer `query` from an index that is already loaded
    ///
    /// A failed summary call ends the question with
    /// [`AnswerOutcome::GenerationFailed`] and no answer call.
    ///
    /// # Errors
    /// Returns embedding errors raised while retrieving chunks.
    #[inline]
    pub fn answer_from_index(&self, index: &VectorIndex, query: &str) -> Result<AnswerRecord> {
        let retrieval = self
            .retriever
            .retrieve(index, query, self.retriever.top_k())?;
        let mode = retrieval.mode;

        if retrieval.is_empty() {
            info!("No chunks retrieved for query");
            return Ok(AnswerRecord {
                query: query.to_string(),
                answer: NO_CHUNKS_RETRIEVED.to_string(),
                outcome: AnswerOutcome::NoChunksRetrieved,
                mode,
                supporting_chunks: Vec::new(),
            });
        }

        let chunks = retrieval.into_chunks();
        let condensed = self.condenser.condense(&chunks);

        if condensed.summary_failed {
            warn!("Skipping answer generation: {}", condensed.summary);
            return Ok(AnswerRecord {
                query: query.to_string(),
                answer: condensed.summary,
                outcome: AnswerOutcome::GenerationFailed,
                mode,
                supporting_chunks: chunks,
            });
        }

        let request = GenerationRequest {
            prompt: build_prompt(query, &condensed.summary, &condensed.raw_context),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        };

        let completion = complete(self.generator.as_ref(), &request);
        let outcome = match &completion {
            Completion::Text(text) => AnswerOutcome::from_answer_text(text),
            Completion::Empty => AnswerOutcome::EmptyOutput,
            Completion::Failed(_) => AnswerOutcome::GenerationFailed,
        };

        info!(
            "Answered from {} chunks ({} retrieval): {}",
            chunks.len(),
            mode,
            outcome
        );

        Ok(AnswerRecord {
            query: query.to_string(),
            answer: completion.into_display(),
            outcome,
            mode,
            supporting_chunks: chunks,
        })
    }
}

impl fmt::Debug for AnswerPipeline {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerPipeline")
            .field("index_root", &self.store.root())
            .field("retriever", &self.retriever)
            .field("condenser", &self.condenser)
            .field("model", &self.generator.model_name())
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}
