use rcm_core::error::AppError;

pub mod gemini_llm;
pub mod openai_llm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    Human,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }
}

/// Text-generation capability. Output is returned as produced, including empty text.
pub trait Llm {
    fn model(&self) -> &str;
    fn generate(&self, messages: &[ChatMessage]) -> Result<String, AppError>;
}
