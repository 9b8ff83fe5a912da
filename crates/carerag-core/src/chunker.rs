//! Recursive character chunker.
//!
//! Text is split on the first separator (in priority order) that occurs in it;
//! pieces that are still too long are split again with the remaining
//! separators. Small pieces are then merged back into chunks of at most
//! `chunk_size` characters, carrying up to `chunk_overlap` characters of the
//! previous chunk forward. Lengths are counted in `char`s.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Separators tried in order: paragraph, line, sentence end, clause, word, character.
pub const DEFAULT_SEPARATORS: [&str; 8] = ["\n\n", "\n", ".", "!", "?", ",", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { config: ChunkingConfig::default() }
    }
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".into()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split `content` into trimmed, non-empty chunks.
    pub fn split(&self, content: &str) -> Vec<String> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(content, &DEFAULT_SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short));
                short.clear();
            }
            if remaining.is_empty() {
                if let Some(chunk) = join_trimmed(&[piece]) {
                    chunks.push(chunk);
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, keeping a tail of at most
    /// `chunk_overlap` characters when a chunk is emitted.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let ChunkingConfig { chunk_size, chunk_overlap } = self.config;
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > chunk_size && !window.is_empty() {
                if let Some(chunk) = join_trimmed(window.make_contiguous()) {
                    chunks.push(chunk);
                }
                while total > chunk_overlap || (total > 0 && total + len > chunk_size) {
                    match window.pop_front() {
                        Some(front) => total = total.saturating_sub(char_len(front)),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        if let Some(chunk) = join_trimmed(window.make_contiguous()) {
            chunks.push(chunk);
        }
        chunks
    }
}

/// Split `text` before every occurrence of `separator`, so each separator
/// stays at the start of the piece that follows it. An empty separator splits
/// into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut starts: Vec<usize> = vec![0];
    starts.extend(text.match_indices(separator).map(|(i, _)| i));
    starts.push(text.len());
    starts
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn join_trimmed(pieces: &[&str]) -> Option<String> {
    let joined: String = pieces.concat();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
