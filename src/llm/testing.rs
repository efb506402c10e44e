//! Scripted in-process LLM for unit tests. No network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// A provider that pops pre-scripted replies in order and records every
/// request it receives. An exhausted script behaves like an outage.
pub(crate) struct MockLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub(crate) fn push_reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queue a failed call.
    pub(crate) fn push_failure(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err("scripted outage".to_string()));
    }

    /// Number of `complete` calls made so far.
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded requests, in call order.
    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
            }),
            Some(Err(reason)) => Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason,
            }),
            None => Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason: "unscripted call".to_string(),
            }),
        }
    }
}
