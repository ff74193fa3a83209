use std::fs;
use std::path::Path;

use crate::domain::{AuditQuery, RcmRow};
use crate::error::AppError;

use super::text::decode_legacy_text;

pub const RCM_DELIMITER: u8 = b';';

/// Read the audit checklist from disk (UTF-8, falling back to Windows-1252).
pub fn read_rcm_csv(path: &Path) -> Result<Vec<RcmRow>, AppError> {
    if !path.exists() {
        return Err(AppError::new("INGEST_RCM_CSV_NOT_FOUND", "Input file not found")
            .with_details(format!("path={}", path.display())));
    }
    let bytes = fs::read(path)
        .map_err(|e| AppError::io("INGEST_RCM_CSV_READ_FAILED", "Failed to read input file", path, e))?;
    let (text, encoding) = decode_legacy_text(&bytes);
    tracing::debug!(path = %path.display(), ?encoding, "decoded input file");
    parse_rcm_csv(&text)
}

/// Parse `;`-separated checklist text into rows that keep every column in header order.
pub fn parse_rcm_csv(csv_text: &str) -> Result<Vec<RcmRow>, AppError> {
    let (headers, records) = read_records(csv_text, "INGEST_RCM_CSV_PARSE_FAILED")?;

    if !headers.iter().any(|h| h == AuditQuery::CONTROL_REFERENCE) {
        return Err(AppError::new(
            "INGEST_RCM_CSV_COLUMNS_MISSING",
            "Input is missing the Control Reference column",
        )
        .with_details(format!("headers={}", headers.join("|"))));
    }
    let has_question = headers.iter().any(|h| {
        h == AuditQuery::ASSESSMENT || AuditQuery::PROCEDURE_HEADERS.contains(&h.as_str())
    });
    if !has_question {
        return Err(AppError::new(
            "INGEST_RCM_CSV_COLUMNS_MISSING",
            "Input needs a Test Procedures, Test Procedure or Design Effectiveness Assessment column",
        )
        .with_details(format!("headers={}", headers.join("|"))));
    }

    Ok(records
        .into_iter()
        .map(|values| RcmRow::new(headers.iter().cloned().zip(values).collect()))
        .collect())
}

/// Headers plus one value vector per non-blank record, padded to the header width.
pub(crate) fn read_records(
    csv_text: &str,
    parse_code: &str,
) -> Result<(Vec<String>, Vec<Vec<String>>), AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(RCM_DELIMITER)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| AppError::new(parse_code, "Failed to read CSV headers").with_details(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut out = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::new(parse_code, "Failed to parse CSV row")
                .with_details(format!("row={}; err={}", idx + 1, e))
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let values = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect::<Vec<_>>();
        out.push(values);
    }
    Ok((headers, out))
}
