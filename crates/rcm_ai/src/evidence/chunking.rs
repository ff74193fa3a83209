use rcm_core::config::RagSettings;
use rcm_core::domain::{Chunk, ChunkMeta, CorpusTag, DocumentUnit};
use rcm_core::error::AppError;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Window length, in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    pub fn from_settings(settings: &RagSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(AppError::new(
                "AI_CHUNKING_CONFIG_INVALID",
                "chunk_size must be positive and larger than chunk_overlap",
            )
            .with_details(format!(
                "chunk_size={}; chunk_overlap={}",
                self.chunk_size, self.chunk_overlap
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Character ranges `[start, end)` of the sliding windows over a text of `char_len` chars.
/// The last window always ends at `char_len`.
pub fn window_spans(char_len: usize, cfg: &ChunkingConfig) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    while start < char_len {
        let end = (start + cfg.chunk_size).min(char_len);
        spans.push((start, end));
        if end == char_len {
            break;
        }
        start += cfg.stride();
    }
    spans
}

/// Split page units into overlapping chunks, preserving unit order. Blank units yield nothing.
pub fn chunk_units(
    units: &[DocumentUnit],
    corpus_tag: CorpusTag,
    cfg: &ChunkingConfig,
) -> Result<Vec<Chunk>, AppError> {
    cfg.validate()?;

    let mut out = Vec::new();
    for unit in units {
        if unit.raw_text.trim().is_empty() {
            continue;
        }
        let chars: Vec<char> = unit.raw_text.chars().collect();
        for (ordinal, (start, end)) in window_spans(chars.len(), cfg).into_iter().enumerate() {
            let text: String = chars[start..end].iter().collect();
            let meta = ChunkMeta {
                source_id: unit.source_id.clone(),
                page_number: unit.page_number,
                corpus_tag,
                ordinal: ordinal as u32,
            };
            out.push(Chunk {
                chunk_id: chunk_id(&meta, &text),
                text,
                meta,
            });
        }
    }
    Ok(out)
}

fn chunk_id(meta: &ChunkMeta, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(meta.corpus_tag.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(meta.source_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(meta.page_number.to_le_bytes());
    hasher.update(meta.ordinal.to_le_bytes());
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
