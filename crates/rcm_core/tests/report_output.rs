use std::fs;

use pretty_assertions::assert_eq;
use rcm_core::domain::{AuditRecord, AuditResult, ComplianceVerdict, Critique, RcmRow};
use rcm_core::report::{read_audit_results, write_audit_results, write_semicolon_csv};

fn row(pairs: &[(&str, &str)]) -> RcmRow {
    RcmRow::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn audit_results_keep_row_order_indent_and_unicode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("outputs").join("audit_results.json");
    let records = vec![
        AuditRecord::Assessed(AuditResult {
            row: row(&[("Control Reference", "1.1"), ("Test Procedure", "Revisión")]),
            ai_answer: "Política documentada [Page 3]".to_string(),
            critique: Critique {
                score: 8,
                reasoning: "supported".to_string(),
            },
            compliance_verdict: ComplianceVerdict::Partial,
            evidence_sources: "Page 3".to_string(),
        }),
        AuditRecord::Failed {
            row: row(&[("Control Reference", "1.2")]),
            error: "[AI_RATE_LIMITED] limited".to_string(),
        },
    ];

    write_audit_results(&path, &records).expect("write");
    let text = fs::read_to_string(&path).expect("read");
    assert!(text.contains("Revisión"));
    assert!(text.contains("\n        \"Control Reference\": \"1.1\""));

    let back = read_audit_results(&path).expect("read back");
    let keys: Vec<&str> = back[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "Control Reference",
            "Test Procedure",
            "AI_Answer",
            "Validation_Score",
            "Validation_Reasoning",
            "Compliance_Verdict",
            "Evidence_Sources",
        ]
    );
    assert_eq!(back[0]["Compliance_Verdict"], "Partial");
    assert_eq!(back[1]["AI_Answer"], "Error: [AI_RATE_LIMITED] limited");
}

#[test]
fn semicolon_report_has_bom_and_union_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.csv");
    let rows = vec![
        vec![("A".to_string(), "1".to_string()), ("B".to_string(), "x;y".to_string())],
        vec![("A".to_string(), "2".to_string()), ("C".to_string(), "z".to_string())],
    ];
    write_semicolon_csv(&path, &rows).expect("write");

    let bytes = fs::read(&path).expect("read");
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).expect("utf8");
    assert_eq!(text, "A;B;C\n1;\"x;y\";\n2;;z\n");
}
