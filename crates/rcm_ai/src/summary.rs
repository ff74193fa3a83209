use std::path::Path;

use rcm_core::error::AppError;
use rcm_core::report::write_atomic;

use crate::audit::prompts::client_summary_prompt;
use crate::audit::AuditPipeline;

pub const CLIENT_SUMMARY_QUERY: &str =
    "Summarize the Provisioning Policy and key credit risk methodologies.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The summary file was already present and left untouched.
    AlreadyExists,
    Written { chunks: usize },
    /// Retrieval or generation failed; nothing was written.
    Failed { error: String },
}

/// Write an executive summary of the client corpus to `path`, once.
///
/// Model failures are reported in the outcome; only filesystem errors are returned.
pub fn generate_client_summary(
    pipeline: &AuditPipeline<'_>,
    path: &Path,
) -> Result<SummaryOutcome, AppError> {
    if path.exists() {
        tracing::info!(path = %path.display(), "client summary already exists");
        return Ok(SummaryOutcome::AlreadyExists);
    }

    let summary = pipeline
        .gather_evidence(CLIENT_SUMMARY_QUERY)
        .and_then(|evidence| {
            let context = evidence
                .iter()
                .map(|e| e.chunk.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let text = pipeline.generate("client_summary", &client_summary_prompt(&context))?;
            Ok((text, evidence.len()))
        });

    match summary {
        Ok((text, chunks)) => {
            write_atomic(path, text.as_bytes())?;
            tracing::info!(path = %path.display(), chunks, "client summary written");
            Ok(SummaryOutcome::Written { chunks })
        }
        Err(e) => {
            tracing::error!(err = %e.describe(), "client summary generation failed");
            Ok(SummaryOutcome::Failed { error: e.describe() })
        }
    }
}
