use rcm_core::domain::{RetrievedEvidence, SourceType};
use rcm_core::error::AppError;

use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::invoker::ModelInvoker;

/// Similarity search over the indexed corpora.
pub trait Retriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedEvidence>, AppError>;
}

/// Client-first fusion over the client and regulations indexes. Either may be absent.
pub struct CorpusRetriever<'a> {
    client: Option<VectorIndex>,
    regulations: Option<VectorIndex>,
    embedder: &'a dyn Embedder,
    invoker: ModelInvoker,
}

impl<'a> CorpusRetriever<'a> {
    pub fn new(
        client: Option<VectorIndex>,
        regulations: Option<VectorIndex>,
        embedder: &'a dyn Embedder,
        invoker: ModelInvoker,
    ) -> Self {
        Self {
            client,
            regulations,
            embedder,
            invoker,
        }
    }
}

impl Retriever for CorpusRetriever<'_> {
    /// Up to `k` hits per corpus; client hits come first, then regulation hits.
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedEvidence>, AppError> {
        let sources = [
            (self.client.as_ref(), SourceType::Client),
            (self.regulations.as_ref(), SourceType::Regulation),
        ];
        if sources.iter().all(|(idx, _)| idx.is_none()) {
            tracing::warn!("no corpus indexes loaded; retrieval returns nothing");
            return Ok(Vec::new());
        }

        let vector = embed_one(&self.invoker, self.embedder, query)?;
        let mut out = Vec::new();
        for (index, source_type) in sources {
            let Some(index) = index else { continue };
            let hits = index.search(&vector, k)?;
            tracing::debug!(corpus = %index.corpus_tag(), hits = hits.len(), "corpus searched");
            out.extend(hits.into_iter().enumerate().map(|(i, hit)| RetrievedEvidence {
                chunk: hit.chunk,
                rank: i + 1,
                score: hit.score,
                source_type,
            }));
        }
        Ok(out)
    }
}

fn embed_one(invoker: &ModelInvoker, embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, AppError> {
    invoker
        .invoke("embed_query", || embedder.embed(&[text]))?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::new("AI_EMBEDDINGS_FAILED", "Embedder returned no vector"))
}
