//! Grounded answering over a persisted index
//!
//! Answers are built in three steps: the retrieved chunks are condensed into
//! a short summary, a prompt restricting the model to the retrieved text is
//! assembled, and a single generation call produces the answer.

pub mod condenser;
pub mod pipeline;
pub mod prompt;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::embeddings::Chunk;
use crate::retrieval::RetrievalMode;

pub use condenser::{CondensedContext, ContextCondenser, raw_context};
pub use pipeline::AnswerPipeline;
pub use prompt::build_prompt;

/// Summary emitted when the retrieved chunks cannot support a summary
pub const INSUFFICIENT_SUMMARY: &str = "The retrieved context is insufficient to summarize.";

/// Answer the model is told to give when the context lacks the information
pub const INSUFFICIENT_ANSWER: &str =
    "The retrieved context is insufficient to answer this question.";

/// Answer reported when retrieval returned no chunks
pub const NO_CHUNKS_RETRIEVED: &str = "⚠️ No chunks retrieved.";

/// How an answer came about, so callers need not match on answer text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The model answered from the retrieved context
    Answered,
    /// The model reported that the context does not hold the answer
    InsufficientContext,
    /// Retrieval produced nothing, so no generation call was made
    NoChunksRetrieved,
    /// The model returned empty output
    EmptyOutput,
    /// The generation call failed
    GenerationFailed,
}

impl AnswerOutcome {
    /// Classify answer text produced by the model
    #[inline]
    pub fn from_answer_text(text: &str) -> Self {
        if text.contains(INSUFFICIENT_ANSWER) {
            Self::InsufficientContext
        } else {
            Self::Answered
        }
    }
}

impl fmt::Display for AnswerOutcome {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Answered => "answered",
            Self::InsufficientContext => "insufficient context",
            Self::NoChunksRetrieved => "no chunks retrieved",
            Self::EmptyOutput => "empty output",
            Self::GenerationFailed => "generation failed",
        };
        write!(f, "{label}")
    }
}

/// The answer to one question together with the chunks it was drawn from
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub query: String,
    pub answer: String,
    pub outcome: AnswerOutcome,
    pub mode: RetrievalMode,
    pub supporting_chunks: Vec<Chunk>,
}
