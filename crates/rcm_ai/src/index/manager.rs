use std::path::Path;
use std::time::Duration;

use rcm_core::config::RagSettings;
use rcm_core::domain::{Chunk, CorpusTag};
use rcm_core::error::AppError;

use super::store::{IndexStatus, IndexStore};
use super::vector::VectorIndex;
use crate::corpus::load_corpus;
use crate::embeddings::Embedder;
use crate::evidence::chunking::{chunk_units, ChunkingConfig};
use crate::invoker::ModelInvoker;

/// Builds, persists and reloads the per-corpus vector indexes.
#[derive(Debug, Clone)]
pub struct IndexManager {
    store: IndexStore,
    chunking: ChunkingConfig,
    batch_size: usize,
    batch_delay: Duration,
    invoker: ModelInvoker,
}

impl IndexManager {
    pub fn new(store: IndexStore, settings: &RagSettings, invoker: ModelInvoker) -> Self {
        Self {
            store,
            chunking: ChunkingConfig::from_settings(settings),
            batch_size: settings.ingest_batch_size.max(1),
            batch_delay: settings.ingest_batch_delay(),
            invoker,
        }
    }

    /// Reuse the persisted index for `tag` when it was built with the embedder's model;
    /// otherwise load `folder`, chunk it and ingest. An unreadable persisted index is rebuilt.
    pub fn build_or_load(
        &self,
        tag: CorpusTag,
        folder: &Path,
        embedder: &dyn Embedder,
    ) -> Result<Option<VectorIndex>, AppError> {
        match self.store.load(tag) {
            Ok(Some(index)) if index.embedding_model() == embedder.model() => {
                tracing::info!(corpus = %tag, chunks = index.len(), "loaded persisted index");
                return Ok(Some(index));
            }
            Ok(Some(index)) => tracing::warn!(
                corpus = %tag,
                persisted_model = index.embedding_model(),
                model = embedder.model(),
                "persisted index was built with another model; rebuilding"
            ),
            Ok(None) => tracing::info!(corpus = %tag, "no persisted index; building"),
            Err(e) => tracing::warn!(
                corpus = %tag,
                err = %e.describe(),
                "failed to load persisted index; rebuilding"
            ),
        }

        let units = load_corpus(folder)?;
        let chunks = chunk_units(&units, tag, &self.chunking)?;
        tracing::info!(corpus = %tag, pages = units.len(), chunks = chunks.len(), "corpus chunked");
        self.ingest(tag, chunks, embedder)
    }

    /// Embed `chunks` in fixed-size batches, pausing between batches (not after the last),
    /// then persist. No chunks means no index.
    pub fn ingest(
        &self,
        tag: CorpusTag,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Option<VectorIndex>, AppError> {
        if chunks.is_empty() {
            tracing::warn!(corpus = %tag, "no chunks to index");
            return Ok(None);
        }

        let total = chunks.len().div_ceil(self.batch_size);
        let mut index: Option<VectorIndex> = None;
        let mut rest = chunks;
        for batch_no in 1..=total {
            let tail = rest.split_off(self.batch_size.min(rest.len()));
            let batch = std::mem::replace(&mut rest, tail);

            tracing::info!(corpus = %tag, batch = batch_no, total, size = batch.len(), "embedding batch");
            let vectors = {
                let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
                self.invoker.invoke("embed_batch", || embedder.embed(&texts))?
            };

            index = Some(match index.take() {
                None => VectorIndex::from_batch(tag, embedder.model(), batch, vectors)?,
                Some(mut existing) => {
                    existing.add_batch(batch, vectors)?;
                    existing
                }
            });

            if batch_no < total {
                self.invoker.pace(self.batch_delay);
            }
        }

        if let Some(index) = index.as_ref() {
            self.store.save(index)?;
        }
        Ok(index)
    }

    pub fn status(&self, tag: CorpusTag) -> Result<Option<IndexStatus>, AppError> {
        self.store.status(tag)
    }
}
