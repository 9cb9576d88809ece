//! Text chunker.
//!
//! Splits cleaned page/document text into overlapping fixed-size windows
//! suitable for embedding and retrieval. Window geometry is char-based so
//! multi-byte input never splits inside a code point.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows, in characters.
    pub overlap: usize,
    /// Windows at or below this length are dropped.
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_chars: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid chunking configuration: {0}")]
    InvalidConfiguration(String),
}

/// Where a passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Document,
    Web,
}

/// A unit of retrievable text. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageChunk {
    /// Cleaned text, whitespace-collapsed.
    pub content: String,
    /// Originating document path or URL.
    pub source: String,
    /// Character offset of the chunk start in the cleaned source text.
    pub chunk_index: usize,
    pub kind: SourceKind,
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self, ChunkError> {
        if config.overlap >= config.chunk_size {
            return Err(ChunkError::InvalidConfiguration(format!(
                "overlap ({}) must be strictly less than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Splits `text` into overlapping windows, dropping windows at or below
    /// the substantiality threshold.
    pub fn chunk(&self, text: &str, source: &str, kind: SourceKind) -> Vec<PassageChunk> {
        let normalized = normalize_whitespace(text);
        let chars: Vec<char> = normalized.chars().collect();
        let total = chars.len();

        let chunk_size = self.config.chunk_size;

        self.offsets(total)
            .filter_map(|start| {
                let end = (start + chunk_size).min(total);
                if end - start <= self.config.min_chunk_chars {
                    return None;
                }
                Some(PassageChunk {
                    content: chars[start..end].iter().collect(),
                    source: source.to_string(),
                    chunk_index: start,
                    kind,
                })
            })
            .collect()
    }

    /// Lazy, restartable sequence of window start offsets.
    fn offsets(&self, total: usize) -> impl Iterator<Item = usize> {
        let step = self.config.chunk_size - self.config.overlap;
        (0..).map(move |i| i * step).take_while(move |&s| s < total)
    }
}

/// Collapses any whitespace run to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    ws.replace_all(text.trim(), " ").into_owned()
}
