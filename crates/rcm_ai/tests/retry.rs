mod common;

use std::cell::Cell;
use std::time::Duration;

use common::{invoker, rate_limited};
use rcm_core::error::AppError;

#[test]
fn rate_limited_failures_are_retried_with_doubling_waits() {
    let (invoker, sleeper) = invoker(5, 20);
    let calls = Cell::new(0u32);

    let out = invoker
        .invoke("answer", || {
            calls.set(calls.get() + 1);
            if calls.get() <= 3 {
                Err(rate_limited())
            } else {
                Ok("done".to_string())
            }
        })
        .expect("should succeed on the fourth call");

    assert_eq!(out, "done");
    assert_eq!(calls.get(), 4);
    let waits = sleeper.waits();
    assert_eq!(
        waits,
        vec![Duration::from_secs(20), Duration::from_secs(40), Duration::from_secs(80)]
    );
    assert_eq!(waits.iter().sum::<Duration>(), Duration::from_secs(140));
}

#[test]
fn exhaustion_returns_the_last_rate_limit_error() {
    let (invoker, sleeper) = invoker(5, 20);
    let calls = Cell::new(0u32);

    let err = invoker
        .invoke::<String, _>("answer", || {
            calls.set(calls.get() + 1);
            Err(rate_limited())
        })
        .expect_err("should exhaust");

    assert_eq!(err.code, "AI_RATE_LIMITED");
    assert_eq!(calls.get(), 5);
    assert_eq!(sleeper.waits().len(), 4);
    assert_eq!(sleeper.waits().last(), Some(&Duration::from_secs(160)));
}

#[test]
fn other_errors_are_not_retried() {
    let (invoker, sleeper) = invoker(5, 20);
    let calls = Cell::new(0u32);

    let err = invoker
        .invoke::<String, _>("answer", || {
            calls.set(calls.get() + 1);
            Err(AppError::new("AI_LLM_FAILED", "bad request").with_details("status=400"))
        })
        .expect_err("should fail");

    assert_eq!(err.code, "AI_LLM_FAILED");
    assert_eq!(calls.get(), 1);
    assert!(sleeper.waits().is_empty());
}

#[test]
fn resource_exhausted_text_counts_as_rate_limit() {
    let (invoker, sleeper) = invoker(2, 1);
    let calls = Cell::new(0u32);

    let out = invoker
        .invoke("embed_query", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(AppError::new("AI_EMBEDDINGS_FAILED", "RESOURCE_EXHAUSTED: quota"))
            } else {
                Ok(1)
            }
        })
        .expect("retry succeeds");
    assert_eq!(out, 1);
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);
}
