
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GenerationRequest, Generator, classify_ureq_error};
use crate::config::{GenerationConfig, OllamaConfig};
use crate::{AnalystError, Result};

/// Generator backed by a local Ollama server's `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    endpoint: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(ollama: &OllamaConfig, generation: &GenerationConfig) -> Result<Self> {
        let endpoint = ollama
            .ollama_url()
            .map_err(|e| AnalystError::Config(e.to_string()))?
            .join("/api/generate")
            .map_err(|e| AnalystError::Config(format!("Failed to build generate URL: {e}")))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(generation.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            model: generation.model.clone(),
            agent,
        })
    }
}

impl Generator for OllamaGenerator {
    #[inline]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            "Requesting up to {} tokens from {} (prompt length: {})",
            request.max_output_tokens,
            self.model,
            request.prompt.len()
        );

        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            },
        };

        let request_json = serde_json::to_string(&body).map_err(|e| {
            AnalystError::GenerativeService(format!("failed to serialize request: {e}"))
        })?;

        let response_text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| AnalystError::GenerativeService(classify_ureq_error(&e)))?;

        let response: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
            AnalystError::GenerativeService(format!("malformed response: {e}"))
        })?;

        debug!("Received {} characters from {}", response.response.len(), self.model);
        Ok(response.response)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
