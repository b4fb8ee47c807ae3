//! Scripted `LlmExecutor` doubles and canned model outputs shared by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm_client::{LlmError, LlmExecutor, LlmResponse, PromptPayload, TokenUsage};

/// Replays a fixed list of outcomes, one per call. Calls past the end of the
/// script fail with a 500.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    prompts: Mutex<Vec<PromptPayload>>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<Result<LlmResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<PromptPayload> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmExecutor for ScriptedExecutor {
    async fn complete(&self, prompt: &PromptPayload) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(LlmError::Unexpected {
                status: 500,
                message: "script exhausted".to_string(),
            })
        })
    }
}

/// Never completes. Flags `dropped` when the in-flight call is cancelled.
#[derive(Default)]
pub struct StallingExecutor {
    calls: AtomicUsize,
    pub dropped: Arc<AtomicBool>,
}

impl StallingExecutor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmExecutor for StallingExecutor {
    async fn complete(&self, _prompt: &PromptPayload) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = DropFlag(self.dropped.clone());
        std::future::pending::<()>().await;
        unreachable!()
    }
}

pub fn ok_json(value: Value) -> Result<LlmResponse, LlmError> {
    Ok(LlmResponse {
        content: Some(value.to_string()),
        usage: Some(TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        }),
        model: Some("gpt-4o-mini".to_string()),
    })
}

pub fn ok_text(content: &str) -> Result<LlmResponse, LlmError> {
    Ok(LlmResponse {
        content: Some(content.to_string()),
        usage: None,
        model: None,
    })
}

pub fn extraction_json() -> Value {
    json!({
        "name": "Ana Souza",
        "job_title": "Backend Engineer",
        "summary": "Backend engineer with eight years of experience in payment platforms.",
        "experiences": [{
            "company": "PayFlow",
            "role": "Senior Backend Engineer",
            "start_date": "2020-03",
            "end_date": "Atual",
            "achievements": ["Cut settlement latency by 40%"],
            "technologies": ["Rust", "PostgreSQL"]
        }],
        "skills": ["Rust", "Kafka", ""],
        "certifications": null
    })
}

pub fn resume_json() -> Value {
    json!({
        "name": "Ana Souza",
        "job_title": "Senior Backend Engineer",
        "candidate_introduction": "Backend engineer with eight years building payment platforms in Rust.",
        "contact_information": {
            "email": "ana.souza@example.com",
            "phone": "",
            "location": "São Paulo"
        },
        "experiences": [{
            "company": "PayFlow",
            "role": "Senior Backend Engineer",
            "start_date": "2020-03",
            "end_date": "Atual",
            "location": "São Paulo, Brasil",
            "bullets": ["Cut settlement latency by 40% by rewriting the ledger in Rust"],
            "tech_stack": ["Rust", "rust", "PostgreSQL"]
        }],
        "education": [{
            "institution": "Universidade de São Paulo",
            "degree": "BSc Computer Science",
            "start_date": "2011-02",
            "end_date": "2015-12"
        }],
        "languages": [{"name": "English", "level": "c1"}],
        "external_links": [
            {"label": "GitHub", "url": "https://github.com/anasouza"},
            {"label": "Blog", "url": ""}
        ]
    })
}

/// A cover letter body of `words` words.
pub fn cover_letter_json(words: usize) -> Value {
    let body = std::iter::repeat("experience")
        .take(words)
        .collect::<Vec<_>>()
        .join(" ");
    json!({
        "greeting": "Dear Hiring Manager,",
        "body": body,
        "signature": "Sincerely,\nAna Souza"
    })
}
