use rcm_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{check_batch, Embedder};
use crate::http::{ApiClient, AuthStyle};
use crate::llm::gemini_llm::resource_name;

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: ApiClient,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: resource_name(&model.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Debug, Clone, Deserialize)]
struct Values {
    values: Vec<f32>,
}

impl Embedder for GeminiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let req = BatchRequest {
            requests: inputs
                .iter()
                .copied()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: Content {
                        parts: [Part { text }],
                    },
                })
                .collect(),
        };
        let path = format!("{}:batchEmbedContents", self.model);
        let resp: BatchResponse = self.client.post_json(
            &path,
            AuthStyle::GoogApiKey,
            &req,
            "AI_EMBEDDINGS_FAILED",
            "batch embeddings",
        )?;
        check_batch(
            &self.model,
            inputs.len(),
            resp.embeddings.into_iter().map(|e| e.values).collect(),
        )
    }
}
