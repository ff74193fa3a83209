use rcm_core::config::RagSettings;
use rcm_core::error::AppError;

use crate::invoker::ModelInvoker;
use crate::llm::{ChatMessage, Llm};

/// Rewrites an audit question into a hypothetical answer passage (HyDE) in the documents'
/// language; that passage, not the question, is embedded for retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFormulator {
    language: String,
    domain: String,
}

impl QueryFormulator {
    pub fn new(language: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            domain: domain.into(),
        }
    }

    pub fn from_settings(settings: &RagSettings) -> Self {
        Self::new(&settings.document_language, &settings.vocabulary_domain)
    }

    pub fn messages(&self, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::human(format!(
                "You are an expert Auditor. The user is asking: '{query}'.\n\
                 Your task: Write a HYPOTHETICAL text snippet in {} that answers this question \
                 using technical {} vocabulary.\n\
                 Output ONLY the hypothetical statement.",
                self.language, self.domain
            )),
        ]
    }

    /// Model output is returned verbatim, even when empty.
    pub fn formulate(
        &self,
        llm: &dyn Llm,
        invoker: &ModelInvoker,
        query: &str,
    ) -> Result<String, AppError> {
        let messages = self.messages(query);
        let passage = invoker.invoke("hyde", || llm.generate(&messages))?;
        tracing::debug!(
            preview = %passage.chars().take(100).collect::<String>(),
            "hypothetical passage generated"
        );
        Ok(passage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn builds_system_and_human_messages() {
        let msgs = QueryFormulator::new("Spanish", "banking").messages("Is there a policy?");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, "You are a helpful assistant.");
        assert_eq!(
            msgs[1].content,
            "You are an expert Auditor. The user is asking: 'Is there a policy?'.\n\
             Your task: Write a HYPOTHETICAL text snippet in Spanish that answers this question \
             using technical banking vocabulary.\nOutput ONLY the hypothetical statement."
        );
    }
}
