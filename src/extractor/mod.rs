//! Source document text extraction
//!
//! Extraction turns a file on disk into the plain text that gets chunked and
//! indexed. Whatever the source format, the text goes through [`clean_text`]
//! so stray page numbers and layout whitespace never reach the index.


use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::debug;

use crate::{AnalystError, Result};

/// File extensions handled by [`PlainTextExtractor`], compared case-insensitively
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// File extensions handled by [`PdfExtractor`], compared case-insensitively
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

static HORIZONTAL_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

static PAGE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*$").expect("valid regex"));

static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Turns a source file into plain text
pub trait TextExtractor: Send + Sync {
    /// Read `path` and return its cleaned text
    ///
    /// # Errors
    /// Returns [`AnalystError::Extraction`] when the file cannot be read, has
    /// an unsupported format or holds no text once cleaned.
    fn extract(&self, path: &Path) -> Result<String>;

    /// Whether this extractor understands the file at `path`
    fn supports(&self, path: &Path) -> bool;
}

/// Pick the extractor for `path` by its extension
///
/// # Errors
/// Returns [`AnalystError::Extraction`] when no extractor handles the extension.
#[inline]
pub fn extractor_for(path: &Path) -> Result<Box<dyn TextExtractor>> {
    if PdfExtractor.supports(path) {
        return Ok(Box::new(PdfExtractor::new()));
    }
    if PlainTextExtractor.supports(path) {
        return Ok(Box::new(PlainTextExtractor::new()));
    }

    Err(AnalystError::Extraction(format!(
        "Unsupported file type: {} (expected one of: {}, {})",
        path.display(),
        PLAIN_TEXT_EXTENSIONS.join(", "),
        PDF_EXTENSIONS.join(", ")
    )))
}

/// Extractor for UTF-8 text and markdown files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        if !self.supports(path) {
            return Err(unsupported(path, PLAIN_TEXT_EXTENSIONS));
        }

        let raw = fs::read_to_string(path).map_err(|e| {
            AnalystError::Extraction(format!("Failed to read {}: {e}", path.display()))
        })?;

        finish(path, &raw)
    }

    #[inline]
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, PLAIN_TEXT_EXTENSIONS)
    }
}

/// Extractor for the text layer of PDF documents
///
/// Scanned pages without a text layer produce no text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        if !self.supports(path) {
            return Err(unsupported(path, PDF_EXTENSIONS));
        }

        let bytes = fs::read(path).map_err(|e| {
            AnalystError::Extraction(format!("Failed to read {}: {e}", path.display()))
        })?;
        let raw = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            AnalystError::Extraction(format!(
                "Failed to extract PDF text from {}: {e}",
                path.display()
            ))
        })?;

        finish(path, &raw)
    }

    #[inline]
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, PDF_EXTENSIONS)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

fn unsupported(path: &Path, extensions: &[&str]) -> AnalystError {
    AnalystError::Extraction(format!(
        "Unsupported file type: {} (expected one of: {})",
        path.display(),
        extensions.join(", ")
    ))
}

/// Clean `raw` and reject documents left with no text
fn finish(path: &Path, raw: &str) -> Result<String> {
    let cleaned = clean_text(raw)?;
    if cleaned.is_empty() {
        return Err(AnalystError::Extraction(format!(
            "No text found in {}",
            path.display()
        )));
    }

    debug!(
        "Extracted {} characters from {} ({} before cleanup)",
        cleaned.chars().count(),
        path.display(),
        raw.chars().count()
    );
    Ok(cleaned)
}

fn replace_all<'t>(regex: &Regex, text: &'t str, replacement: &str) -> Result<Cow<'t, str>> {
    regex
        .try_replacen(text, 0, replacement)
        .map_err(|e| AnalystError::Extraction(format!("Text cleanup failed: {e}")))
}

/// Normalise extracted text before chunking
///
/// Non-ASCII characters are dropped, runs of spaces and tabs collapse to a
/// single space, lines holding nothing but a page number are removed, every
/// line is trimmed and runs of blank lines collapse to one blank line.
///
/// # Errors
/// Returns [`AnalystError::Extraction`] if a cleanup pattern fails to run.
#[inline]
pub fn clean_text(text: &str) -> Result<String> {
    let ascii: String = text.chars().filter(char::is_ascii).collect();
    let collapsed = replace_all(&HORIZONTAL_SPACE_REGEX, &ascii, " ")?;

    let mut lines = Vec::new();
    for line in collapsed.lines() {
        let trimmed = line.trim();
        let is_page_number = PAGE_NUMBER_REGEX
            .is_match(trimmed)
            .map_err(|e| AnalystError::Extraction(format!("Text cleanup failed: {e}")))?;
        if !is_page_number {
            lines.push(trimmed);
        }
    }
    let joined = lines.join("\n");

    Ok(replace_all(&BLANK_LINES_REGEX, &joined, "\n\n")?.trim().to_string())
}
