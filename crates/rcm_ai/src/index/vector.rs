use rcm_core::domain::{Chunk, CorpusTag};
use rcm_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::similarity::{cosine_similarity, l2_norm};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// In-memory similarity index over one corpus. Entries keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    corpus_tag: CorpusTag,
    embedding_model: String,
    dims: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Start an index from its first embedded batch; the batch fixes the dimension.
    pub fn from_batch(
        corpus_tag: CorpusTag,
        embedding_model: impl Into<String>,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, AppError> {
        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        if dims == 0 {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "Cannot start an index from an empty batch",
            )
            .with_details(format!("corpus={corpus_tag}")));
        }
        let mut index = Self {
            corpus_tag,
            embedding_model: embedding_model.into(),
            dims,
            entries: Vec::with_capacity(chunks.len()),
        };
        index.add_batch(chunks, vectors)?;
        Ok(index)
    }

    pub(crate) fn from_entries(
        corpus_tag: CorpusTag,
        embedding_model: String,
        dims: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, AppError> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dims) {
            return Err(AppError::new("AI_INDEX_LOAD_FAILED", "Index vector dims mismatch")
                .with_details(format!(
                    "chunk_id={}; expected={dims}; got={}",
                    bad.chunk.chunk_id,
                    bad.vector.len()
                )));
        }
        Ok(Self {
            corpus_tag,
            embedding_model,
            dims,
            entries,
        })
    }

    pub fn add_batch(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<(), AppError> {
        if chunks.len() != vectors.len() {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "Chunk and vector counts differ",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), vectors.len())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dims) {
            return Err(AppError::new("AI_INDEX_BUILD_FAILED", "Embedding dims mismatch")
                .with_details(format!("expected={}; got={}", self.dims, bad.len())));
        }
        self.entries.extend(
            chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| IndexEntry { chunk, vector }),
        );
        Ok(())
    }

    pub fn corpus_tag(&self) -> CorpusTag {
        self.corpus_tag
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Top `k` entries by descending cosine similarity; equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, AppError> {
        if query.len() != self.dims {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!(
                "corpus={}; index_dims={}; query_dims={}",
                self.corpus_tag,
                self.dims,
                query.len()
            )));
        }
        let qnorm = l2_norm(query);
        if qnorm == 0.0 {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query embedding norm is zero"));
        }

        let mut hits: Vec<(usize, f32)> = Vec::new();
        for (pos, entry) in self.entries.iter().enumerate() {
            let vnorm = l2_norm(&entry.vector);
            if vnorm == 0.0 {
                continue;
            }
            hits.push((pos, cosine_similarity(query, &entry.vector, qnorm, vnorm)));
        }
        // sort_by is stable, so ties stay in insertion order.
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(pos, score)| ScoredChunk {
                chunk: self.entries[pos].chunk.clone(),
                score,
            })
            .collect())
    }
}
