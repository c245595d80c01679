
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AnalystError, Result};

/// Boundaries tried in order: paragraph, line, word, character
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A bounded segment of document text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text, never empty
    pub content: String,
    /// Position of this chunk within the source document
    pub ordinal: usize,
}

/// Configuration for text chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters of context shared between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 250,
        }
    }
}

/// Split document text into overlapping chunks.
///
/// The text is split along the coarsest boundary it contains. Pieces that
/// still exceed `chunk_size` are split again along the next finer boundary,
/// and small pieces are merged back together up to `chunk_size`, carrying up
/// to `chunk_overlap` characters of trailing context into the next chunk.
/// Lengths are measured in characters.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    if config.chunk_overlap >= config.chunk_size {
        return Err(AnalystError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            config.chunk_overlap, config.chunk_size
        )));
    }

    let mut pieces = Vec::new();
    split_recursive(text, &SEPARATORS, config, &mut pieces);

    let chunks: Vec<Chunk> = pieces
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(ordinal, content)| Chunk { content, ordinal })
        .collect();

    debug!(
        "Split {} characters into {} chunks (size {}, overlap {})",
        char_len(text),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    Ok(chunks)
}

fn split_recursive(
    text: &str,
    separators: &[&str],
    config: &ChunkingConfig,
    output: &mut Vec<String>,
) {
    let position = separators
        .iter()
        .position(|separator| separator.is_empty() || text.contains(separator))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let mut small: Vec<&str> = Vec::new();
    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            small.push(piece);
            continue;
        }

        if !small.is_empty() {
            merge_pieces(&small, config, output);
            small.clear();
        }

        if finer.is_empty() {
            output.push(piece.to_string());
        } else {
            split_recursive(piece, finer, config, output);
        }
    }

    if !small.is_empty() {
        merge_pieces(&small, config, output);
    }
}

/// Split on `separator`, keeping it at the start of the following piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let boundaries: Vec<usize> = if separator.is_empty() {
        text.char_indices().map(|(index, _)| index).collect()
    } else {
        text.match_indices(separator).map(|(index, _)| index).collect()
    };

    std::iter::once(0)
        .chain(boundaries)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<_>>()
        .windows(2)
        .filter_map(|bounds| text.get(bounds[0]..bounds[1]))
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn merge_pieces(pieces: &[&str], config: &ChunkingConfig, output: &mut Vec<String>) {
    let mut window: Vec<(&str, usize)> = Vec::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            push_joined(&window, output);

            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                let (_, dropped) = window.remove(0);
                total -= dropped;
            }
        }

        window.push((piece, len));
        total += len;
    }

    push_joined(&window, output);
}

fn push_joined(window: &[(&str, usize)], output: &mut Vec<String>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        output.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
