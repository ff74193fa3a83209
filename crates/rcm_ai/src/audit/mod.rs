use std::time::Duration;

use rcm_core::config::RagSettings;
use rcm_core::domain::{
    AuditQuery, AuditRecord, AuditResult, Critique, RcmRow, RetrievedEvidence,
};
use rcm_core::error::AppError;

use crate::hyde::QueryFormulator;
use crate::invoker::{is_rate_limited, ModelInvoker};
use crate::llm::{ChatMessage, Llm};
use crate::retrieve::Retriever;

pub mod critique;
pub mod prompts;
pub mod verdict;

use critique::parse_critique;
use prompts::{answer_prompt, context_block, critique_prompt};
use verdict::extract_verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Hits requested from each corpus.
    pub top_k: usize,
    /// Page labels kept in `Evidence_Sources`.
    pub evidence_citations: usize,
    pub row_delay: Duration,
}

impl PipelineSettings {
    pub fn from_settings(settings: &RagSettings) -> Self {
        Self {
            top_k: settings.top_k,
            evidence_citations: settings.evidence_citations,
            row_delay: settings.row_delay(),
        }
    }
}

/// Per-row audit: HyDE retrieval, grounded answer, verdict extraction, critique.
pub struct AuditPipeline<'a> {
    llm: &'a dyn Llm,
    retriever: &'a dyn Retriever,
    invoker: ModelInvoker,
    formulator: QueryFormulator,
    settings: PipelineSettings,
}

impl<'a> AuditPipeline<'a> {
    pub fn new(
        llm: &'a dyn Llm,
        retriever: &'a dyn Retriever,
        invoker: ModelInvoker,
        formulator: QueryFormulator,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm,
            retriever,
            invoker,
            formulator,
            settings,
        }
    }

    /// Expand `query` into a hypothetical passage and retrieve evidence for it.
    pub fn gather_evidence(&self, query: &str) -> Result<Vec<RetrievedEvidence>, AppError> {
        let passage = self.formulator.formulate(self.llm, &self.invoker, query)?;
        self.retriever.retrieve(&passage, self.settings.top_k)
    }

    /// Single human-message generation through the invoker.
    pub fn generate(&self, label: &str, prompt: &str) -> Result<String, AppError> {
        let messages = [ChatMessage::human(prompt)];
        self.invoker.invoke(label, || self.llm.generate(&messages))
    }

    /// Assess one row. Retrieval and answer failures are returned; critique failures are
    /// folded into a zero score.
    pub fn process_row(&self, row: &RcmRow) -> Result<AuditResult, AppError> {
        let query = AuditQuery::from_row(row).compose();
        tracing::debug!(query = %query, "processing row");

        let evidence = self.gather_evidence(&query)?;
        let context = context_block(&evidence);
        let evidence_sources = evidence
            .iter()
            .take(self.settings.evidence_citations)
            .map(RetrievedEvidence::page_label)
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = answer_prompt(&context, &query);
        let raw_answer = self.generate("answer", &prompt)?;
        let (ai_answer, compliance_verdict) = extract_verdict(&raw_answer);

        let critique = self.critique(&context, &query, &ai_answer);

        Ok(AuditResult {
            row: row.clone(),
            ai_answer,
            critique,
            compliance_verdict,
            evidence_sources,
        })
    }

    fn critique(&self, context: &str, query: &str, answer: &str) -> Critique {
        let prompt = critique_prompt(context, query, answer);
        match self.generate("critique", &prompt) {
            Ok(raw) => {
                let critique = parse_critique(&raw);
                if critique.reasoning.starts_with("Parse Error:") {
                    tracing::warn!(reason = %critique.reasoning, "critique output was not valid JSON");
                }
                critique
            }
            Err(e) if is_rate_limited(&e) => {
                tracing::warn!(err = %e.describe(), "critique rate limited; scoring zero");
                Critique::zero(format!("Rate Limit Error: {}", e.describe()))
            }
            Err(e) => {
                tracing::warn!(err = %e.describe(), "critique failed; scoring zero");
                Critique::zero(format!("Error: {}", e.describe()))
            }
        }
    }

    /// Assess every row in order. A failed row becomes an error record and the batch continues;
    /// the configured pause follows every row.
    pub fn run(&self, rows: &[RcmRow]) -> Vec<AuditRecord> {
        let total = rows.len();
        let mut out = Vec::with_capacity(total);
        for (i, row) in rows.iter().enumerate() {
            let control = row.get(AuditQuery::CONTROL_REFERENCE).unwrap_or("Unknown");
            tracing::info!(row = i + 1, total, control = control, "auditing row");
            let record = match self.process_row(row) {
                Ok(result) => {
                    tracing::info!(
                        row = i + 1,
                        score = result.critique.score,
                        verdict = %result.compliance_verdict,
                        "row assessed"
                    );
                    AuditRecord::Assessed(result)
                }
                Err(e) => {
                    tracing::error!(row = i + 1, control = control, err = %e.describe(), "row failed");
                    AuditRecord::Failed {
                        row: row.clone(),
                        error: e.describe(),
                    }
                }
            };
            out.push(record);
            self.invoker.pace(self.settings.row_delay);
        }
        out
    }
}
