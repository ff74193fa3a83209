use rcm_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Llm, Role};
use crate::http::{ApiClient, AuthStyle};

#[derive(Debug, Clone)]
pub struct OpenAiLlm {
    client: ApiClient,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(client: ApiClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Llm for OpenAiLlm {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let req = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::Human => "user",
                    },
                    content: &m.content,
                })
                .collect(),
        };

        let resp: ChatResponse = self.client.post_json(
            "chat/completions",
            AuthStyle::Bearer,
            &req,
            "AI_LLM_FAILED",
            "chat completion",
        )?;

        let choice = resp.choices.into_iter().next().ok_or_else(|| {
            AppError::new("AI_LLM_FAILED", "Chat completion returned no choices")
                .with_details(format!("model={}", self.model))
        })?;
        Ok(choice.message.content.unwrap_or_default())
    }
}
