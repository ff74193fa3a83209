mod common;

use std::time::Duration;

use common::{evidence, invoker, rate_limited, FixedRetriever, ScriptedLlm};
use pretty_assertions::assert_eq;
use rcm_ai::audit::{AuditPipeline, PipelineSettings};
use rcm_ai::hyde::QueryFormulator;
use rcm_ai::llm::Role;
use rcm_core::domain::{AuditRecord, ComplianceVerdict, RcmRow};
use rcm_core::error::AppError;

fn row(pairs: &[(&str, &str)]) -> RcmRow {
    RcmRow::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        top_k: 10,
        evidence_citations: 5,
        row_delay: Duration::from_secs(1),
    }
}

fn formulator() -> QueryFormulator {
    QueryFormulator::new("English", "banking")
}

#[test]
fn one_row_end_to_end() {
    let llm = ScriptedLlm::new(vec![
        Ok("The bank maintains a provisioning policy.".to_string()),
        Ok("Not Documented in provided context".to_string()),
        Ok(r#"{"score":0,"reasoning":"no evidence"}"#.to_string()),
    ]);
    let retriever = FixedRetriever::new(vec![evidence(7, "Loan loss reserves are reviewed.")]);
    let (invoker, sleeper) = invoker(5, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let input = row(&[
        ("Control Reference", "1.1"),
        ("Test Procedure", "Verify provisioning policy exists"),
    ]);
    let records = pipeline.run(std::slice::from_ref(&input));

    assert_eq!(records.len(), 1);
    let AuditRecord::Assessed(result) = &records[0] else {
        panic!("row should be assessed: {:?}", records[0]);
    };
    assert!(result.ai_answer.contains("Not Documented"));
    assert_eq!(result.critique.score, 0);
    assert_eq!(result.critique.reasoning, "no evidence");
    assert_eq!(result.evidence_sources, "Page 7");
    assert_eq!(result.compliance_verdict, ComplianceVerdict::InsufficientInfo);
    assert_eq!(result.row, input);

    // The HyDE passage, not the raw question, drives retrieval.
    assert_eq!(
        *retriever.queries.lock().expect("lock"),
        vec!["The bank maintains a provisioning policy.".to_string()]
    );
    let hyde = llm.prompt(0);
    assert_eq!(hyde[0].role, Role::System);
    assert!(hyde[1]
        .content
        .contains("'Control Ref: 1.1. Question:  (Procedure: Verify provisioning policy exists)'"));
    let answer_prompt = &llm.prompt(1)[0].content;
    assert!(answer_prompt.contains("[Page 7] Loan loss reserves are reviewed."));
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);

    let json = serde_json::to_value(&records[0]).expect("json");
    assert_eq!(json["AI_Answer"], "Not Documented in provided context");
    assert_eq!(json["Validation_Score"], 0);
    assert_eq!(json["Evidence_Sources"], "Page 7");
    assert_eq!(json["Compliance_Verdict"], "Insufficient Info");
}

#[test]
fn verdict_is_split_from_answer_and_critique_sees_the_body() {
    let llm = ScriptedLlm::new(vec![
        Ok("hyde".to_string()),
        Ok("Policy approved by the board [Page 2].\n\n**COMPLIANCE VERDICT:**\nCompliant".to_string()),
        Ok("```json\n{\"score\": 9, \"reasoning\": \"supported\"}\n```".to_string()),
    ]);
    let retriever = FixedRetriever::new((1..=7).map(|p| evidence(p, "text")).collect());
    let (invoker, _) = invoker(5, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let result = pipeline
        .process_row(&row(&[("Control Reference", "2.4")]))
        .expect("process");
    assert_eq!(result.ai_answer, "Policy approved by the board [Page 2].");
    assert_eq!(result.compliance_verdict, ComplianceVerdict::Compliant);
    assert_eq!(result.critique.score, 9);
    assert_eq!(result.evidence_sources, "Page 1, Page 2, Page 3, Page 4, Page 5");

    let critique_prompt = &llm.prompt(2)[0].content;
    assert!(critique_prompt.contains("Policy approved by the board [Page 2]."));
    assert!(!critique_prompt.contains("**COMPLIANCE VERDICT:**\nCompliant"));
}

#[test]
fn answer_rate_limit_exhaustion_fails_the_row_and_the_batch_continues() {
    let mut replies = vec![Ok("hyde".to_string())];
    replies.extend((0..3).map(|_| Err(rate_limited())));
    replies.extend([
        Ok("hyde".to_string()),
        Ok("answer".to_string()),
        Ok(r#"{"score": 6, "reasoning": "partly"}"#.to_string()),
    ]);
    let llm = ScriptedLlm::new(replies);
    let retriever = FixedRetriever::new(vec![evidence(1, "text")]);
    let (invoker, sleeper) = invoker(3, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let records = pipeline.run(&[
        row(&[("Control Reference", "1.1")]),
        row(&[("Control Reference", "1.2")]),
    ]);

    assert!(records[0].is_failed());
    assert!(records[0].ai_answer().starts_with("Error: [AI_RATE_LIMITED]"));
    assert!(!records[1].is_failed());
    assert_eq!(
        sleeper.waits(),
        vec![
            Duration::from_secs(20),
            Duration::from_secs(40),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ]
    );
    let json = serde_json::to_value(&records[0]).expect("json");
    assert_eq!(json["Control Reference"], "1.1");
    assert!(json.get("Validation_Score").is_none());
}

#[test]
fn critique_rate_limit_exhaustion_scores_zero() {
    let llm = ScriptedLlm::new(vec![
        Ok("hyde".to_string()),
        Ok("answer".to_string()),
        Err(rate_limited()),
        Err(rate_limited()),
    ]);
    let retriever = FixedRetriever::new(vec![evidence(1, "text")]);
    let (invoker, _) = invoker(2, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let result = pipeline
        .process_row(&row(&[("Control Reference", "3.1")]))
        .expect("critique failure is not row-fatal");
    assert_eq!(result.ai_answer, "answer");
    assert_eq!(result.critique.score, 0);
    assert!(result.critique.reasoning.starts_with("Rate Limit Error: "));
}

#[test]
fn critique_other_error_and_malformed_json_score_zero() {
    let llm = ScriptedLlm::new(vec![
        Ok("hyde".to_string()),
        Ok("answer".to_string()),
        Err(AppError::new("AI_LLM_FAILED", "bad request")),
        Ok("hyde".to_string()),
        Ok("answer".to_string()),
        Ok("Score: 8".to_string()),
    ]);
    let retriever = FixedRetriever::new(vec![evidence(1, "text")]);
    let (invoker, _) = invoker(5, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let first = pipeline.process_row(&row(&[("Control Reference", "4.1")])).expect("row");
    assert_eq!(first.critique.score, 0);
    assert_eq!(first.critique.reasoning, "Error: [AI_LLM_FAILED] bad request");

    let second = pipeline.process_row(&row(&[("Control Reference", "4.2")])).expect("row");
    assert_eq!(second.critique.score, 0);
    assert!(second.critique.reasoning.starts_with("Parse Error: "));
}

#[test]
fn empty_hyde_output_is_used_as_is() {
    let llm = ScriptedLlm::new(vec![
        Ok(String::new()),
        Ok("Not Documented in provided context".to_string()),
        Ok(r#"{"score": 0, "reasoning": "none"}"#.to_string()),
    ]);
    let retriever = FixedRetriever::new(Vec::new());
    let (invoker, _) = invoker(5, 20);
    let pipeline = AuditPipeline::new(&llm, &retriever, invoker, formulator(), settings());

    let result = pipeline.process_row(&row(&[("Control Reference", "5.1")])).expect("row");
    assert_eq!(*retriever.queries.lock().expect("lock"), vec![String::new()]);
    assert_eq!(result.evidence_sources, "");
}
