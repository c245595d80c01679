
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::embeddings::Embedder;
use crate::{AnalystError, Result};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    batch_size: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
    pub details: Option<ModelDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ModelDetails {
    pub format: Option<String>,
    pub family: Option<String>,
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .map_err(|e| AnalystError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
        })
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping()?;
        self.validate_model()?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint("/api/version")?;
        debug!("Pinging Ollama server at {}", url);

        send(self.agent.get(url.as_str()).call(), &url)?;

        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that the configured model is available
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        debug!("Validating model: {}", self.model);

        let models = self.list_models()?;

        if models.iter().any(|m| m.name == self.model) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(AnalystError::EmbeddingService(format!(
                "Model '{}' is not available. Available models: {:?}",
                self.model, available_models
            )))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("/api/tags")?;
        debug!("Fetching available models from {}", url);

        let response_text = send(self.agent.get(url.as_str()).call(), &url)?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                AnalystError::EmbeddingService(format!("Failed to parse models response: {e}"))
            })?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Generate the embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut embeddings = self.request_embeddings(&[text.to_string()])?;
        embeddings.pop().ok_or_else(|| {
            AnalystError::EmbeddingService("Embedding response contained no vectors".to_string())
        })
    }

    /// Generate embeddings for multiple text inputs, `batch_size` texts per request
    #[inline]
    pub fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            results.extend(self.request_embeddings(batch)?);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.endpoint("/api/embed")?;
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let request_json = serde_json::to_string(&request).map_err(|e| {
            AnalystError::EmbeddingService(format!("Failed to serialize embedding request: {e}"))
        })?;

        let response_text = send(
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json),
            &url,
        )?;

        let response: EmbedResponse = serde_json::from_str(&response_text).map_err(|e| {
            AnalystError::EmbeddingService(format!("Failed to parse embedding response: {e}"))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(AnalystError::EmbeddingService(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        if response.embeddings.iter().any(Vec::is_empty) {
            return Err(AnalystError::EmbeddingService(
                "Embedding response contained an empty vector".to_string(),
            ));
        }

        Ok(response.embeddings)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AnalystError::Config(format!("Failed to build URL for {path}: {e}")))
    }
}

impl Embedder for OllamaClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_embeddings_batch(texts)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Read the response body, classifying failures as embedding service errors.
/// Requests are not retried.
fn send(
    response: std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    url: &Url,
) -> Result<String> {
    let outcome = response.and_then(|mut resp| resp.body_mut().read_to_string());

    outcome.map_err(|error| {
        let message = match &error {
            ureq::Error::StatusCode(status) if *status >= 500 => {
                format!("Server error: HTTP {status}")
            }
            ureq::Error::StatusCode(status) => format!("Client error: HTTP {status}"),
            ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
                format!("Could not connect to {}", url.origin().ascii_serialization())
            }
            ureq::Error::Timeout(_) => "Request timed out".to_string(),
            _ => format!("Request failed: {error}"),
        };
        warn!("Embedding request to {} failed: {}", url, message);
        AnalystError::EmbeddingService(message)
    })
}
