use rcm_core::error::AppError;

pub mod gemini_embed;
pub mod openai_embed;

/// Text-embedding capability. Returns one vector per input, in input order.
pub trait Embedder {
    /// Identifier recorded in persisted indexes; a different model forces a rebuild.
    fn model(&self) -> &str;
    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError>;
}

/// Shared response check: one non-empty vector per input, all of the same width.
pub(crate) fn check_batch(
    model: &str,
    inputs: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Vec<Vec<f32>>, AppError> {
    if vectors.len() != inputs {
        return Err(AppError::new(
            "AI_EMBEDDINGS_FAILED",
            "Embeddings response size does not match request",
        )
        .with_details(format!("model={model}; expected={inputs}; got={}", vectors.len())));
    }
    let dims = vectors.first().map(Vec::len).unwrap_or(0);
    if inputs > 0 && dims == 0 {
        return Err(AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings response was empty")
            .with_details(format!("model={model}")));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(AppError::new(
            "AI_EMBEDDINGS_FAILED",
            "Embedding dimension mismatch within a batch",
        )
        .with_details(format!("model={model}; expected={dims}; got={}", bad.len())));
    }
    Ok(vectors)
}
