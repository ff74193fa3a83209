use std::fs;
use std::path::Path;

use crate::error::AppError;

use super::rcm_csv::read_records;
use super::text::decode_legacy_text;

pub const EXPERT_ANSWER: &str = "Answers based on Clients data";
const CONTROL_REFERENCE: &str = "Control Reference";

/// Reviewer-written reference answer for one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertAnswer {
    pub control_reference: String,
    pub answer: String,
}

pub fn read_expert_csv(path: &Path) -> Result<Vec<ExpertAnswer>, AppError> {
    if !path.exists() {
        return Err(AppError::new("COMPARE_EXPERT_CSV_NOT_FOUND", "Expert answers file not found")
            .with_details(format!("path={}", path.display())));
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::io("COMPARE_EXPERT_CSV_READ_FAILED", "Failed to read expert answers", path, e)
    })?;
    let (text, _) = decode_legacy_text(&bytes);
    parse_expert_csv(&text)
}

/// Rows with an empty answer are dropped; control references are trimmed.
pub fn parse_expert_csv(csv_text: &str) -> Result<Vec<ExpertAnswer>, AppError> {
    let (headers, records) = read_records(csv_text, "COMPARE_EXPERT_CSV_PARSE_FAILED")?;
    let col = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            AppError::new("COMPARE_EXPERT_CSV_COLUMNS_MISSING", "Expert answers column missing")
                .with_details(format!("column={name}"))
        })
    };
    let ref_idx = col(CONTROL_REFERENCE)?;
    let answer_idx = col(EXPERT_ANSWER)?;

    Ok(records
        .into_iter()
        .filter_map(|values| {
            let answer = values[answer_idx].trim();
            if answer.is_empty() {
                return None;
            }
            Some(ExpertAnswer {
                control_reference: values[ref_idx].trim().to_string(),
                answer: answer.to_string(),
            })
        })
        .collect())
}
