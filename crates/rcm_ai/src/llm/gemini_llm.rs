use rcm_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Llm, Role};
use crate::http::{ApiClient, AuthStyle};

#[derive(Debug, Clone)]
pub struct GeminiLlm {
    client: ApiClient,
    model: String,
    temperature: f32,
}

impl GeminiLlm {
    pub fn new(client: ApiClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

/// `gemini-1.5-flash` and `models/gemini-1.5-flash` address the same resource.
pub(crate) fn resource_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl Llm for GeminiLlm {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        // Gemini takes system text separately from the conversation turns.
        let system_parts = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part { text: &m.content })
            .collect::<Vec<_>>();
        let contents = messages
            .iter()
            .filter(|m| m.role == Role::Human)
            .map(|m| Content {
                role: Some("user"),
                parts: vec![Part { text: &m.content }],
            })
            .collect::<Vec<_>>();

        let req = GenerateRequest {
            system_instruction: (!system_parts.is_empty()).then_some(Content {
                role: None,
                parts: system_parts,
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let path = format!("{}:generateContent", resource_name(&self.model));
        let resp: GenerateResponse =
            self.client
                .post_json(&path, AuthStyle::GoogApiKey, &req, "AI_LLM_FAILED", "generate content")?;

        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            AppError::new("AI_LLM_FAILED", "Generate content returned no candidates")
                .with_details(format!("model={}", self.model))
        })?;
        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}
