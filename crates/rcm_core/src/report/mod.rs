use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::AuditRecord;
use crate::error::AppError;

/// Write the audit output as a JSON array (4-space indent, non-ASCII kept verbatim).
pub fn write_audit_results(path: &Path, records: &[AuditRecord]) -> Result<(), AppError> {
    let json = to_indented_json(records)?;
    write_atomic(path, json.as_bytes())
}

pub fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(|e| {
        AppError::new("REPORT_ENCODE_FAILED", "Failed to encode audit results").with_details(e.to_string())
    })?;
    String::from_utf8(buf).map_err(|e| {
        AppError::new("REPORT_ENCODE_FAILED", "Encoded audit results are not UTF-8").with_details(e.to_string())
    })
}

/// Load a previously written audit output as generic records (field order preserved).
pub fn read_audit_results(path: &Path) -> Result<Vec<Map<String, Value>>, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::io("REPORT_READ_FAILED", "Failed to read audit results", path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::io("REPORT_DECODE_FAILED", "Failed to decode audit results", path, e)
    })
}

/// One flat row of the expert comparison report.
pub type ReportRow = Vec<(String, String)>;

/// Write `;`-separated rows as UTF-8 with a BOM so spreadsheet tools pick the encoding.
/// Columns are the union of all row keys in first-seen order.
pub fn write_semicolon_csv(path: &Path, rows: &[ReportRow]) -> Result<(), AppError> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for (k, _) in row {
            if !headers.contains(k) {
                headers.push(k.clone());
            }
        }
    }

    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    let encode_err = |e: csv::Error| {
        AppError::new("REPORT_ENCODE_FAILED", "Failed to encode CSV report").with_details(e.to_string())
    };
    wtr.write_record(&headers).map_err(encode_err)?;
    for row in rows {
        let record = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            })
            .collect::<Vec<_>>();
        wtr.write_record(&record).map_err(encode_err)?;
    }
    let body = wtr.into_inner().map_err(|e| {
        AppError::new("REPORT_ENCODE_FAILED", "Failed to flush CSV report").with_details(e.to_string())
    })?;

    let mut bytes = Vec::with_capacity(body.len() + 3);
    bytes.extend_from_slice(b"\xEF\xBB\xBF");
    bytes.extend_from_slice(&body);
    write_atomic(path, &bytes)
}

/// tmp -> rename, creating parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::io("REPORT_WRITE_FAILED", "Failed to create output directory", parent, e)
        })?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| AppError::io("REPORT_WRITE_FAILED", "Failed to write output", &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("REPORT_WRITE_FAILED", "Failed to finalize output write").with_details(format!(
            "tmp={}; dest={}; err={}",
            tmp.display(),
            path.display(),
            e
        ))
    })
}
