// Generation module
// Generative model clients used to condense context and write answers


pub mod gemini;
pub mod ollama;

pub use gemini::GeminiGenerator;
pub use ollama::OllamaGenerator;

use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::config::{GenerationConfig, GenerationProvider, OllamaConfig};
use crate::{AnalystError, Result};

/// Displayed when the model returns no text
pub const EMPTY_OUTPUT: &str = "⚠️ Empty output.";

/// Prefix of the displayed message when a generation call fails
pub const GENERATION_ERROR_PREFIX: &str = "⚠️ Generation error:";

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// A generative language model service
pub trait Generator: Send + Sync {
    /// Generate text for the request, returning the raw model output
    fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Outcome of a generation call with failures degraded to values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Non-empty, trimmed model output
    Text(String),
    /// The model returned nothing
    Empty,
    /// The call failed; holds the error detail
    Failed(String),
}

impl Completion {
    /// Text suitable for display, with the fixed sentinels for empty or failed calls
    #[inline]
    pub fn into_display(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Empty => EMPTY_OUTPUT.to_string(),
            Self::Failed(detail) => format!("{GENERATION_ERROR_PREFIX} {detail}"),
        }
    }
}

impl fmt::Display for Completion {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Empty => write!(f, "{EMPTY_OUTPUT}"),
            Self::Failed(detail) => write!(f, "{GENERATION_ERROR_PREFIX} {detail}"),
        }
    }
}

/// Run one generation call, catching failures at the call site
#[inline]
pub fn complete(generator: &dyn Generator, request: &GenerationRequest) -> Completion {
    match generator.generate(request) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                warn!("Model {} returned empty output", generator.model_name());
                Completion::Empty
            } else {
                Completion::Text(trimmed.to_string())
            }
        }
        Err(AnalystError::GenerativeService(detail)) => {
            warn!("Generation with {} failed: {}", generator.model_name(), detail);
            Completion::Failed(detail)
        }
        Err(other) => {
            warn!("Generation with {} failed: {}", generator.model_name(), other);
            Completion::Failed(other.to_string())
        }
    }
}

/// Construct the configured generator backend.
///
/// The Ollama backend shares the embedding service's host settings. The
/// Gemini API key is resolved here, once.
#[inline]
pub fn build_generator(
    generation: &GenerationConfig,
    ollama: &OllamaConfig,
) -> Result<Arc<dyn Generator>> {
    match generation.provider {
        GenerationProvider::Ollama => Ok(Arc::new(OllamaGenerator::new(ollama, generation)?)),
        GenerationProvider::Gemini => {
            let api_key = generation
                .resolve_api_key()
                .map_err(|e| AnalystError::Config(e.to_string()))?;
            Ok(Arc::new(GeminiGenerator::new(generation, api_key)?))
        }
    }
}

pub(crate) fn classify_ureq_error(error: &ureq::Error) -> String {
    match error {
        ureq::Error::StatusCode(status) if *status >= 500 => {
            format!("server error: HTTP {status}")
        }
        ureq::Error::StatusCode(status) => format!("request rejected: HTTP {status}"),
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            "could not connect to the generation service".to_string()
        }
        ureq::Error::Timeout(_) => "request timed out".to_string(),
        _ => format!("request failed: {error}"),
    }
}
