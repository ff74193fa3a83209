use std::collections::BTreeSet;
use std::sync::OnceLock;

use rcm_core::domain::AuditQuery;
use rcm_core::ingest::expert_csv::{ExpertAnswer, EXPERT_ANSWER};
use rcm_core::report::ReportRow;
use regex::Regex;
use serde_json::{Map, Value};

use crate::embeddings::Embedder;
use crate::index::similarity::cosine;
use crate::invoker::ModelInvoker;

const SEMANTIC_WEIGHT: f64 = 0.8;
const LEXICAL_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonScores {
    /// Cosine similarity mapped from [-1, 1] to [0, 100].
    pub semantic: f64,
    /// Jaccard overlap of word tokens, in [0, 100].
    pub lexical: f64,
    pub combined: f64,
}

impl ComparisonScores {
    pub fn new(semantic: f64, lexical: f64) -> Self {
        Self {
            semantic,
            lexical,
            combined: semantic * SEMANTIC_WEIGHT + lexical * LEXICAL_WEIGHT,
        }
    }
}

fn tokens(text: &str) -> BTreeSet<String> {
    static WORD: OnceLock<Option<Regex>> = OnceLock::new();
    let lower = text.to_lowercase();
    match WORD.get_or_init(|| Regex::new(r"\w+").ok()) {
        Some(re) => re.find_iter(&lower).map(|m| m.as_str().to_string()).collect(),
        None => BTreeSet::new(),
    }
}

/// Shared word tokens over all distinct tokens; 0 when either side has none.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let (ta, tb) = (tokens(a), tokens(b));
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    inter as f64 / union as f64
}

pub fn semantic_score(cosine: f32) -> f64 {
    (f64::from(cosine) + 1.0) / 2.0 * 100.0
}

/// Score one AI answer against the expert answer. Embedding failure scores semantic 0.
pub fn score_pair(
    embedder: &dyn Embedder,
    invoker: &ModelInvoker,
    ai_answer: &str,
    expert_answer: &str,
) -> ComparisonScores {
    let semantic = match invoker.invoke("embed_comparison", || {
        embedder.embed(&[ai_answer, expert_answer])
    }) {
        Ok(v) if v.len() == 2 => cosine(&v[0], &v[1]).map(semantic_score).unwrap_or(0.0),
        Ok(_) => 0.0,
        Err(e) => {
            tracing::warn!(err = %e.describe(), "comparison embedding failed; semantic score 0");
            0.0
        }
    };
    let lexical = jaccard_similarity(ai_answer, expert_answer) * 100.0;
    ComparisonScores::new(semantic, lexical)
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Inner-join audit output with expert answers on the trimmed control reference, in audit
/// order, and score each pair.
pub fn compare_with_experts(
    audit_rows: &[Map<String, Value>],
    experts: &[ExpertAnswer],
    embedder: &dyn Embedder,
    invoker: &ModelInvoker,
) -> Vec<ReportRow> {
    let mut out = Vec::new();
    for row in audit_rows {
        let Some(control) = row.get(AuditQuery::CONTROL_REFERENCE).map(cell) else {
            continue;
        };
        let control = control.trim();
        let ai_answer = row.get("AI_Answer").map(cell).unwrap_or_default();

        for expert in experts.iter().filter(|e| e.control_reference == control) {
            let scores = score_pair(embedder, invoker, &ai_answer, &expert.answer);
            let mut report: ReportRow = row
                .iter()
                .map(|(k, v)| {
                    let v = if k == AuditQuery::CONTROL_REFERENCE {
                        control.to_string()
                    } else {
                        cell(v)
                    };
                    (k.clone(), v)
                })
                .collect();
            report.push((EXPERT_ANSWER.to_string(), expert.answer.clone()));
            report.push(("Semantic_Score".to_string(), format!("{:.2}", scores.semantic)));
            report.push(("Lexical_Score".to_string(), format!("{:.2}", scores.lexical)));
            report.push(("Comparison_Score".to_string(), format!("{:.2}", scores.combined)));
            out.push(report);
        }
    }
    tracing::info!(pairs = out.len(), "expert comparison scored");
    out
}
