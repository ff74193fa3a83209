use std::env;

use rcm_core::config::{LlmSettings, ProviderKind};
use rcm_core::error::AppError;

use crate::embeddings::gemini_embed::GeminiEmbedder;
use crate::embeddings::openai_embed::OpenAiEmbedder;
use crate::embeddings::Embedder;
use crate::http::ApiClient;
use crate::llm::gemini_llm::GeminiLlm;
use crate::llm::openai_llm::OpenAiLlm;
use crate::llm::Llm;

/// Environment variables checked, in order, for the provider's API key.
pub fn key_vars(provider: ProviderKind) -> &'static [&'static str] {
    match provider {
        ProviderKind::OpenAi => &["OPENAI_API_KEY"],
        ProviderKind::Google => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
    }
}

fn api_key(provider: ProviderKind) -> Result<String, AppError> {
    let vars = key_vars(provider);
    vars.iter()
        .filter_map(|v| env::var(v).ok())
        .find(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            AppError::new("AI_PROVIDER_KEY_MISSING", "No API key found for the configured provider")
                .with_details(format!("checked={}", vars.join(",")))
        })
}

fn client(settings: &LlmSettings) -> Result<ApiClient, AppError> {
    ApiClient::new(&settings.active().base_url, &api_key(settings.provider)?)
}

pub fn build_llm(settings: &LlmSettings) -> Result<Box<dyn Llm>, AppError> {
    let client = client(settings)?;
    let model = settings.active().model.clone();
    tracing::info!(provider = ?settings.provider, model = %model, "chat model selected");
    Ok(match settings.provider {
        ProviderKind::OpenAi => Box::new(OpenAiLlm::new(client, model, settings.temperature)),
        ProviderKind::Google => Box::new(GeminiLlm::new(client, model, settings.temperature)),
    })
}

pub fn build_embedder(settings: &LlmSettings) -> Result<Box<dyn Embedder>, AppError> {
    let client = client(settings)?;
    let model = settings.active().embedding_model.clone();
    tracing::info!(provider = ?settings.provider, model = %model, "embedding model selected");
    Ok(match settings.provider {
        ProviderKind::OpenAi => Box::new(OpenAiEmbedder::new(client, model)),
        ProviderKind::Google => Box::new(GeminiEmbedder::new(client, model)),
    })
}
