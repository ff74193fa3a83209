#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rcm_ai::embeddings::Embedder;
use rcm_ai::invoker::{ModelInvoker, RetryPolicy, Sleeper};
use rcm_ai::llm::{ChatMessage, Llm};
use rcm_ai::retrieve::Retriever;
use rcm_core::domain::{Chunk, ChunkMeta, CorpusTag, RetrievedEvidence, SourceType};
use rcm_core::error::AppError;

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("lock").clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().expect("lock").push(duration);
    }
}

pub fn invoker(max_retries: u32, base_secs: u64) -> (ModelInvoker, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let invoker = ModelInvoker::new(
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(base_secs),
        },
        sleeper.clone(),
    );
    (invoker, sleeper)
}

pub fn rate_limited() -> AppError {
    AppError::new("AI_RATE_LIMITED", "chat request was rate limited")
        .with_details("status=429; body=RESOURCE_EXHAUSTED")
        .with_retryable(true)
}

/// Embeds text as (count of 'a', count of 'b').
#[derive(Default)]
pub struct CountABEmbedder {
    pub model: String,
    pub calls: Mutex<Vec<usize>>,
}

impl CountABEmbedder {
    pub fn named(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Batch sizes of every embed call so far.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Embedder for CountABEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        self.calls.lock().expect("lock").push(inputs.len());
        Ok(inputs
            .iter()
            .map(|s| {
                let a = s.chars().filter(|c| *c == 'a').count() as f32;
                let b = s.chars().filter(|c| *c == 'b').count() as f32;
                vec![a, b]
            })
            .collect())
    }
}

/// Replays scripted replies in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, AppError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("lock").len()
    }

    pub fn prompt(&self, call: usize) -> Vec<ChatMessage> {
        self.prompts.lock().expect("lock")[call].clone()
    }
}

impl Llm for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    fn generate(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        self.prompts.lock().expect("lock").push(messages.to_vec());
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(AppError::new("TEST_SCRIPT_EXHAUSTED", "no scripted reply left")))
    }
}

/// Returns the same evidence for every query.
pub struct FixedRetriever {
    pub evidence: Vec<RetrievedEvidence>,
    pub queries: Mutex<Vec<String>>,
}

impl FixedRetriever {
    pub fn new(evidence: Vec<RetrievedEvidence>) -> Self {
        Self {
            evidence,
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl Retriever for FixedRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedEvidence>, AppError> {
        self.queries.lock().expect("lock").push(query.to_string());
        Ok(self.evidence.iter().take(k).cloned().collect())
    }
}

pub fn chunk(tag: CorpusTag, page: u32, text: &str) -> Chunk {
    Chunk {
        chunk_id: format!("{tag}-{page}-{text}"),
        text: text.to_string(),
        meta: ChunkMeta {
            source_id: "policy.pdf".to_string(),
            page_number: page,
            corpus_tag: tag,
            ordinal: 0,
        },
    }
}

pub fn evidence(page: u32, text: &str) -> RetrievedEvidence {
    RetrievedEvidence {
        chunk: chunk(CorpusTag::Client, page, text),
        rank: 1,
        score: 0.9,
        source_type: SourceType::Client,
    }
}
