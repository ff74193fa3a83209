use rcm_core::domain::ComplianceVerdict;

pub const VERDICT_MARKER: &str = "**COMPLIANCE VERDICT:**";

/// Split a model answer into its body and compliance verdict.
///
/// Without the marker the whole text is the body and the verdict is `InsufficientInfo`.
/// Otherwise the body is the trimmed text before the marker, and the first line after it
/// that names a verdict decides (`non-compliant` is checked before `compliant`).
pub fn extract_verdict(answer: &str) -> (String, ComplianceVerdict) {
    let Some((body, tail)) = answer.split_once(VERDICT_MARKER) else {
        return (answer.to_string(), ComplianceVerdict::InsufficientInfo);
    };

    let verdict = tail
        .lines()
        .map(|l| l.trim().to_lowercase())
        .find_map(|line| {
            if line.contains("non-compliant") {
                Some(ComplianceVerdict::NonCompliant)
            } else if line.contains("compliant") {
                Some(ComplianceVerdict::Compliant)
            } else if line.contains("partial") {
                Some(ComplianceVerdict::Partial)
            } else if line.contains("insufficient") {
                Some(ComplianceVerdict::InsufficientInfo)
            } else {
                None
            }
        })
        .unwrap_or(ComplianceVerdict::InsufficientInfo);

    (body.trim().to_string(), verdict)
}
