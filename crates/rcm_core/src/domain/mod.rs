use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Named collection of documents indexed together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CorpusTag {
    Client,
    Regulations,
}

impl CorpusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusTag::Client => "client",
            CorpusTag::Regulations => "regulations",
        }
    }
}

impl fmt::Display for CorpusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a retrieved chunk, assigned after retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Client,
    Regulation,
}

/// One page (or page-like unit) of extracted document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentUnit {
    pub source_id: String,
    /// 1-based.
    pub page_number: u32,
    pub raw_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMeta {
    pub source_id: String,
    pub page_number: u32,
    pub corpus_tag: CorpusTag,
    /// Position of the chunk within its unit.
    pub ordinal: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub meta: ChunkMeta,
}

/// One search hit, tagged with the corpus it came from. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedEvidence {
    pub chunk: Chunk,
    /// 1-based position within the corpus it was retrieved from.
    pub rank: usize,
    pub score: f32,
    pub source_type: SourceType,
}

impl RetrievedEvidence {
    pub fn page_label(&self) -> String {
        format!("Page {}", self.chunk.meta.page_number)
    }
}

/// A control/test-procedure question ready to be sent through retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub control_reference: String,
    pub assessment_text: String,
    pub procedure_text: String,
}

impl AuditQuery {
    pub const CONTROL_REFERENCE: &'static str = "Control Reference";
    pub const ASSESSMENT: &'static str = "Design Effectiveness Assessment";
    /// Procedure headers in precedence order.
    pub const PROCEDURE_HEADERS: [&'static str; 2] = ["Test Procedures", "Test Procedure"];

    pub fn from_row(row: &RcmRow) -> Self {
        let control_reference = row
            .get(Self::CONTROL_REFERENCE)
            .unwrap_or("Unknown")
            .to_string();
        let assessment_text = row.get(Self::ASSESSMENT).unwrap_or("").to_string();
        let procedure_text = Self::PROCEDURE_HEADERS
            .iter()
            .find_map(|h| row.get(h))
            .unwrap_or("")
            .to_string();
        Self {
            control_reference,
            assessment_text,
            procedure_text,
        }
    }

    /// The exact text used for retrieval and prompting.
    pub fn compose(&self) -> String {
        format!(
            "Control Ref: {}. Question: {} (Procedure: {})",
            self.control_reference, self.assessment_text, self.procedure_text
        )
    }
}

/// One input checklist row, with fields kept in header order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RcmRow {
    pub fields: Vec<(String, String)>,
}

impl RcmRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Trimmed, non-empty value of a column.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl Serialize for RcmRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceVerdict {
    Compliant,
    NonCompliant,
    Partial,
    InsufficientInfo,
}

impl ComplianceVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceVerdict::Compliant => "Compliant",
            ComplianceVerdict::NonCompliant => "Non-Compliant",
            ComplianceVerdict::Partial => "Partial",
            ComplianceVerdict::InsufficientInfo => "Insufficient Info",
        }
    }
}

impl fmt::Display for ComplianceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ComplianceVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Faithfulness score produced by the critique step (0..=10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Critique {
    pub score: i64,
    pub reasoning: String,
}

impl Critique {
    pub fn zero(reasoning: impl Into<String>) -> Self {
        Self {
            score: 0,
            reasoning: reasoning.into(),
        }
    }
}

/// Fully assessed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditResult {
    pub row: RcmRow,
    pub ai_answer: String,
    pub critique: Critique,
    pub compliance_verdict: ComplianceVerdict,
    pub evidence_sources: String,
}

/// Terminal output unit: an assessed row, or a row whose answer step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditRecord {
    Assessed(AuditResult),
    Failed { row: RcmRow, error: String },
}

impl AuditRecord {
    pub fn ai_answer(&self) -> String {
        match self {
            AuditRecord::Assessed(r) => r.ai_answer.clone(),
            AuditRecord::Failed { error, .. } => format!("Error: {error}"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AuditRecord::Failed { .. })
    }
}

const AI_ANSWER: &str = "AI_Answer";

impl Serialize for AuditRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = match self {
            AuditRecord::Assessed(r) => &r.row,
            AuditRecord::Failed { row, .. } => row,
        };
        let mut map = serializer.serialize_map(None)?;
        // Row fields first, in header order. Generated columns replace same-named inputs.
        for (k, v) in &row.fields {
            if !is_generated_column(k, self.is_failed()) {
                map.serialize_entry(k, v)?;
            }
        }
        map.serialize_entry(AI_ANSWER, &self.ai_answer())?;
        if let AuditRecord::Assessed(r) = self {
            map.serialize_entry("Validation_Score", &r.critique.score)?;
            map.serialize_entry("Validation_Reasoning", &r.critique.reasoning)?;
            map.serialize_entry("Compliance_Verdict", &r.compliance_verdict)?;
            map.serialize_entry("Evidence_Sources", &r.evidence_sources)?;
        }
        map.end()
    }
}

fn is_generated_column(header: &str, failed: bool) -> bool {
    if failed {
        return header == AI_ANSWER;
    }
    matches!(
        header,
        "AI_Answer"
            | "Validation_Score"
            | "Validation_Reasoning"
            | "Compliance_Verdict"
            | "Evidence_Sources"
    )
}
