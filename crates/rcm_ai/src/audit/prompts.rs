use rcm_core::domain::{RetrievedEvidence, SourceType};

use super::verdict::VERDICT_MARKER;

/// Evidence block shared by the answer and critique prompts, one paragraph per chunk.
pub fn context_block(evidence: &[RetrievedEvidence]) -> String {
    evidence
        .iter()
        .map(|e| match e.source_type {
            SourceType::Client => format!("[{}] {}", e.page_label(), e.chunk.text),
            SourceType::Regulation => format!("[Regulation, {}] {}", e.page_label(), e.chunk.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(context: &str, query: &str) -> String {
    // Contract:
    // - Answer ONLY from the context.
    // - Cite pages as [Page N].
    // - Absent evidence is answered with "Not Documented in provided context".
    // - The verdict section is parsed downstream; keep the marker verbatim.
    format!(
        r#"You are an expert IT and banking Auditor reviewing client documentation against a Risk Control Matrix.

Rules (non-negotiable):
1) Answer ONLY from the context below. Do not use outside knowledge.
2) Cite the supporting pages inline, e.g. [Page 4]. Regulation excerpts are marked [Regulation, Page N]; use them only to judge the client evidence, never as client evidence.
3) If the context does not contain the requested evidence, answer exactly: "Not Documented in provided context".
4) Be concise and factual.

Context:
{context}

Audit question:
{query}

Output:
- Your answer, with citations.
- Then a final section starting with the line {VERDICT_MARKER} followed by one of: Compliant, Non-Compliant, Partial, Insufficient Info.
"#
    )
}

pub fn critique_prompt(context: &str, query: &str, answer: &str) -> String {
    format!(
        r#"You are a strict audit quality reviewer. Judge whether the answer below is fully supported by the context.

Context:
{context}

Audit question:
{query}

Answer under review:
{answer}

Scoring:
- 10: every statement is supported by the context and correctly cited.
- 0: the answer is unsupported, contradicts the context, or the context holds no evidence.

Return ONLY a JSON object, with no Markdown, in exactly this shape:
{{"score": <integer 0-10>, "reasoning": "<one or two sentences>"}}
"#
    )
}

pub fn client_summary_prompt(context: &str) -> String {
    format!(
        "You are an expert Auditor. Summarize the following client policy documents representing their \
         Provisioning and Credit Risk methodology.\n\nContext:\n{context}\n\n\
         Output a professional executive summary."
    )
}
