// Deterministic stand-ins for the embedding and generation services

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::Embedder;
use crate::generation::{GenerationRequest, Generator};
use crate::{AnalystError, Result};

pub(crate) const FAKE_DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase token is hashed into a bucket and
/// the counts are normalised to unit length.
#[derive(Debug, Default)]
pub(crate) struct FakeEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; FAKE_DIMENSION];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let hash = token
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            });
        vector[(hash % FAKE_DIMENSION as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

impl Embedder for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AnalystError::EmbeddingService(
                "Could not connect to http://localhost:11434".to_string(),
            ));
        }
        Ok(bag_of_words(text))
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }
}

/// Embedder over a fixed vocabulary: one dimension per known word plus one
/// shared bucket for everything else, normalised to unit length. Distances
/// between texts are exact, which keeps retrieval assertions precise.
#[derive(Debug)]
pub(crate) struct KeywordEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|word| word.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0_f32; self.vocabulary.len() + 1];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let slot = self
                .vocabulary
                .iter()
                .position(|word| *word == token)
                .unwrap_or(self.vocabulary.len());
            vector[slot] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword-embed"
    }
}

/// Generator that replays scripted replies and records every request.
/// Once the script runs out it answers deterministically from the prompt.
#[derive(Debug, Default)]
pub(crate) struct ScriptedGenerator {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: Vec<std::result::Result<&str, &str>>) -> Self {
        let script = script
            .into_iter()
            .map(|step| step.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        match self.script.lock().expect("script lock").pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(detail)) => Err(AnalystError::GenerativeService(detail)),
            None => Ok(format!(
                "Generated from a {}-character prompt.",
                request.prompt.chars().count()
            )),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
