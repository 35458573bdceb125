//! Recursive character splitter producing overlapping chunks.
//!
//! The splitter walks an ordered list of separators from coarsest to finest
//! (paragraph break, line break, word space, empty string). Text is split on
//! the coarsest separator that occurs in it; pieces still larger than the
//! chunk size are split again with the finer separators. Pieces are then
//! merged back into chunks of at most `chunk_size` characters, seeding each
//! new chunk with the tail of the previous one so consecutive chunks share
//! `chunk_overlap` characters of text.
//!
//! Separators stay attached to the piece they terminate, so every produced
//! chunk is a contiguous substring of the input and the chunk sequence covers
//! the input with no gaps other than the configured overlaps.

use tracing::debug;

use crate::types::{Chunk, Document, RagError};

/// Configuration for [`TextSplitter`].
///
/// `chunk_overlap` must be strictly less than `chunk_size`; the splitter
/// rejects anything else before processing begins.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitterConfig {
    /// Maximum chunk length, counted in characters.
    pub chunk_size: usize,
    /// Number of characters repeated between consecutive chunks.
    pub chunk_overlap: usize,
    /// Candidate separators, coarsest first. An empty string means
    /// "split anywhere" and should come last if present.
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: default_separators(),
        }
    }
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(RagError::InvalidConfig(
                "at least one separator is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default separator ladder: paragraph break, line break, word space, and
/// finally any character position.
pub fn default_separators() -> Vec<String> {
    vec![
        "\n\n".to_string(),
        "\n".to_string(),
        " ".to_string(),
        String::new(),
    ]
}

/// Splits documents into overlapping chunks.
///
/// Output is fully deterministic for a fixed input and configuration.
#[derive(Clone, Debug)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// Creates a splitter, rejecting invalid configurations up front.
    pub fn new(config: SplitterConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Splits raw text into chunk strings of at most `chunk_size` characters.
    ///
    /// A piece that still exceeds `chunk_size` once the separator list is
    /// exhausted (an atomic token nothing can break) is emitted as its own
    /// oversized chunk.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.collect_pieces(text, &self.config.separators, &mut pieces);
        self.merge_pieces(pieces)
    }

    /// Splits each document, assigning chunk indexes and inheriting the
    /// parent document's metadata.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            let splits = self.split_text(&document.text);
            debug!(
                chunk_count = splits.len(),
                source_chars = document.text.chars().count(),
                "split document"
            );
            for (index, text) in splits.into_iter().enumerate() {
                chunks.push(Chunk::new(text, index, document.metadata.clone()));
            }
        }
        chunks
    }

    fn collect_pieces(&self, text: &str, separators: &[String], out: &mut Vec<String>) {
        let Some(position) = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
        else {
            // No separator applies: the text is atomic, oversized or not.
            out.push(text.to_string());
            return;
        };
        let separator = &separators[position];
        let finer = &separators[position + 1..];

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) > self.config.chunk_size && !finer.is_empty() {
                self.collect_pieces(&piece, finer, out);
            } else {
                out.push(piece);
            }
        }
    }

    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for piece in pieces {
            let piece_chars = char_len(&piece);
            if current_chars > 0 && current_chars + piece_chars > size {
                // Close the chunk and seed the next one with its tail. The
                // seed shrinks when needed so seed + piece still fits.
                let seed_len = overlap.min(size.saturating_sub(piece_chars));
                let seed = tail_chars(&current, seed_len);
                chunks.push(std::mem::replace(&mut current, seed));
                current_chars = char_len(&current);
            }
            current.push_str(&piece);
            current_chars += piece_chars;
        }
        if current_chars > 0 {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits on `separator`, keeping the separator attached to the piece it
/// terminates. An empty separator yields one piece per character.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, matched) in text.match_indices(separator) {
        let end = index + matched.len();
        pieces.push(text[start..end].to_string());
        start = end;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces
}

fn tail_chars(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = char_len(text);
    text.chars().skip(total.saturating_sub(n)).collect()
}
