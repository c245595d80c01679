
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, warn};

use super::INSUFFICIENT_SUMMARY;
use crate::config::GenerationConfig;
use crate::embeddings::Chunk;
use crate::generation::{Completion, GenerationRequest, Generator, complete};

/// Retrieved chunks reduced to a summary, plus the numbered text they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedContext {
    pub summary: String,
    pub raw_context: String,
    /// Set when the summary call failed; `summary` then holds the error message
    pub summary_failed: bool,
}

/// Number the chunks as `[DOC i]` blocks separated by blank lines
#[inline]
pub fn raw_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[DOC {}]\n{}", i + 1, chunk.content))
        .join("\n\n")
}

fn summary_prompt(raw_context: &str) -> String {
    format!(
        "You are a STRICT RAG system. Summarize ONLY using the text below.\n\n\
         CONTEXT:\n{raw_context}\n\n\
         TASK:\n\
         Write a short factual summary (3–4 sentences) ONLY using what appears in the context.\n\
         If the context does not contain enough information, answer exactly:\n\
         \"{INSUFFICIENT_SUMMARY}\"\n\n\
         RULES:\n\
         - No assumptions.\n\
         - No external knowledge.\n\
         - No invented facts."
    )
}

/// Compresses retrieved chunks into a short summary grounded in their text
#[derive(Clone)]
pub struct ContextCondenser {
    generator: Arc<dyn Generator>,
    max_output_tokens: u32,
    temperature: f32,
}

impl ContextCondenser {
    #[inline]
    pub fn new(generator: Arc<dyn Generator>, config: &GenerationConfig) -> Self {
        Self {
            generator,
            max_output_tokens: config.condense_max_tokens,
            temperature: config.temperature,
        }
    }

    /// Summarise `chunks`
    ///
    /// With no chunks the insufficient-context summary is returned without a
    /// generation call. A failed or empty generation leaves its display
    /// message in the summary, and a failure also sets `summary_failed`.
    #[inline]
    pub fn condense(&self, chunks: &[Chunk]) -> CondensedContext {
        if chunks.is_empty() {
            debug!("No chunks to condense");
            return CondensedContext {
                summary: INSUFFICIENT_SUMMARY.to_string(),
                raw_context: String::new(),
                summary_failed: false,
            };
        }

        let raw_context = raw_context(chunks);
        let request = GenerationRequest {
            prompt: summary_prompt(&raw_context),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        };

        let completion = complete(self.generator.as_ref(), &request);
        if !matches!(completion, Completion::Text(_)) {
            warn!("Context summary unavailable: {}", completion);
        }
        let summary_failed = matches!(completion, Completion::Failed(_));
        debug!(
            "Condensed {} chunks ({} characters of context)",
            chunks.len(),
            raw_context.chars().count()
        );

        CondensedContext {
            summary: completion.into_display(),
            raw_context,
            summary_failed,
        }
    }
}

impl fmt::Debug for ContextCondenser {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCondenser")
            .field("model", &self.generator.model_name())
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}
