
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GenerationRequest, Generator, classify_ureq_error};
use crate::config::GenerationConfig;
use crate::{AnalystError, Result};

/// Generator backed by the Google Generative Language `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    base_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiGenerator {
    /// Create a client with an already resolved API key
    #[inline]
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&config.gemini_base_url)
            .map_err(|e| AnalystError::Config(format!("Invalid Gemini base URL: {e}")))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            api_key,
            agent,
        })
    }

    fn endpoint(&self) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| AnalystError::Config(format!("Failed to build Gemini URL: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl Generator for GeminiGenerator {
    #[inline]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            "Requesting up to {} tokens from {} (prompt length: {})",
            request.max_output_tokens,
            self.model,
            request.prompt.len()
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationSettings {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        };

        let request_json = serde_json::to_string(&body).map_err(|e| {
            AnalystError::GenerativeService(format!("failed to serialize request: {e}"))
        })?;

        let url = self.endpoint()?;
        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| AnalystError::GenerativeService(classify_ureq_error(&e)))?;

        let response: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| AnalystError::GenerativeService(format!("malformed response: {e}")))?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            debug!("{} returned no candidates", self.model);
            return Ok(String::new());
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        debug!("Received {} characters from {}", text.len(), self.model);
        Ok(text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
