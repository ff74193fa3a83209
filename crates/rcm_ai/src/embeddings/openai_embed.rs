use rcm_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{check_batch, Embedder};
use crate::http::{ApiClient, AuthStyle};

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: ApiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let req = EmbeddingsRequest {
            model: &self.model,
            input: inputs,
        };
        let mut resp: EmbeddingsResponse = self.client.post_json(
            "embeddings",
            AuthStyle::Bearer,
            &req,
            "AI_EMBEDDINGS_FAILED",
            "embeddings",
        )?;
        resp.data.sort_by_key(|d| d.index);
        check_batch(
            &self.model,
            inputs.len(),
            resp.data.into_iter().map(|d| d.embedding).collect(),
        )
    }
}
