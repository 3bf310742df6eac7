use crate::error::IngestError;
use crate::models::{Chunk, Page};
use std::collections::VecDeque;

pub const DEFAULT_SEPARATOR: &str = "\n";
pub const DEFAULT_CHUNK_SIZE: usize = 1_200;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Sizes are measured in characters (Unicode scalar values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn new(
        separator: impl Into<String>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, IngestError> {
        let config = Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits every page independently; no chunk spans two pages.
pub fn chunk_pages(pages: &[Page], config: &ChunkingConfig) -> Vec<Chunk> {
    pages
        .iter()
        .flat_map(|page| {
            split_text(&page.text, config)
                .into_iter()
                .map(move |text| Chunk {
                    source_page: page.page_number,
                    text,
                })
        })
        .collect()
}

pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let pieces: Vec<&str> = if config.separator.is_empty() {
        text.char_indices()
            .map(|(start, ch)| &text[start..start + ch.len_utf8()])
            .collect()
    } else {
        text.split(config.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect()
    };

    merge_pieces(&pieces, config)
        .into_iter()
        .flat_map(|chunk| window_oversized(chunk, config))
        .collect()
}

/// Greedily packs separator-delimited pieces into chunks of at most
/// `chunk_size`, seeding each new chunk with trailing pieces of the previous
/// one that fit within `chunk_overlap`.
fn merge_pieces(pieces: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let separator_len = char_len(&config.separator);
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let piece_len = char_len(piece);
        let joiner = if current.is_empty() { 0 } else { separator_len };

        if total + piece_len + joiner > config.chunk_size && !current.is_empty() {
            if let Some(chunk) = join_pieces(&current, &config.separator) {
                chunks.push(chunk);
            }

            while total > config.chunk_overlap
                || (total > 0
                    && total
                        + piece_len
                        + if current.is_empty() { 0 } else { separator_len }
                        > config.chunk_size)
            {
                let Some(removed) = current.pop_front() else {
                    break;
                };
                let removed_joiner = if current.is_empty() { 0 } else { separator_len };
                total = total.saturating_sub(char_len(removed) + removed_joiner);
            }
        }

        current.push_back(piece);
        total += piece_len + if current.len() > 1 { separator_len } else { 0 };
    }

    if let Some(chunk) = join_pieces(&current, &config.separator) {
        chunks.push(chunk);
    }

    chunks
}

fn join_pieces(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A single piece longer than `chunk_size` is cut into fixed windows with
/// stride `chunk_size - chunk_overlap`.
fn window_oversized(chunk: String, config: &ChunkingConfig) -> Vec<String> {
    if char_len(&chunk) <= config.chunk_size {
        return vec![chunk];
    }

    let chars: Vec<char> = chunk.chars().collect();
    let stride = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    windows
}
