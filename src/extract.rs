//! Field extraction — structured values out of free-text answers.
//!
//! The oracle is instructed to answer with the bare value or the sentinel
//! token `null`. Models do not always comply, so every response goes
//! through `normalize` (trim, quote-strip, sentinel case-fold) and age
//! additionally through an integer guard.

use std::sync::Arc;

use tracing::warn;

use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Sentinel the oracle is told to return when the field is absent.
const NOT_FOUND_SENTINEL: &str = "null";

/// Extraction calls are single-token answers; keep them cheap and cold.
const EXTRACT_MAX_TOKENS: u32 = 64;

/// A profile field the extractor can pull out of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Country,
    Age,
    Gender,
}

impl FieldKind {
    fn instruction(&self) -> &'static str {
        match self {
            FieldKind::Country => {
                "From the user's message, identify ONLY the country name. \
                 Respond with the country name and nothing else. \
                 If the message does not name a country, respond with exactly: null"
            }
            FieldKind::Age => {
                "From the user's message, identify ONLY the age as an integer. \
                 Respond with the number and nothing else. \
                 If the message does not state an age, respond with exactly: null"
            }
            FieldKind::Gender => {
                "From the user's message, identify ONLY the gender. \
                 Respond with the gender and nothing else. \
                 If the message does not state a gender, respond with exactly: null"
            }
        }
    }
}

/// Strip oracle decoration and map the sentinel to `None`.
fn normalize(raw: &str) -> Option<String> {
    let mut token = raw.trim();
    for quote in ['"', '\''] {
        token = token
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
            .unwrap_or(token);
    }
    let token = token.trim().trim_end_matches('.').trim();
    if token.is_empty() || token.eq_ignore_ascii_case(NOT_FOUND_SENTINEL) {
        None
    } else {
        Some(token.to_string())
    }
}

/// Pulls structured onboarding values out of raw inbound text.
pub struct FieldExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl FieldExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    async fn ask(&self, instruction: &str, text: &str) -> Option<String> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(text),
        ])
        .with_max_tokens(EXTRACT_MAX_TOKENS)
        .with_temperature(0.0);

        match self.llm.complete(request).await {
            Ok(response) => normalize(&response.content),
            Err(e) => {
                // An oracle outage reads as "nothing extracted"; the caller
                // re-asks the same question next turn.
                warn!(error = %e, "Extraction call failed");
                None
            }
        }
    }

    /// Extract the named field from one free-text message.
    ///
    /// Returns the normalized value, or `None` when the field is absent,
    /// ambiguous, or the oracle is unavailable.
    pub async fn extract(&self, text: &str, kind: FieldKind) -> Option<String> {
        self.ask(kind.instruction(), text).await
    }

    /// Extract an age and guard the integer parse. The oracle is told to
    /// answer with a bare integer but is not trusted to.
    pub async fn extract_age(&self, text: &str) -> Option<u32> {
        let token = self.extract(text, FieldKind::Age).await?;
        match token.parse::<u32>() {
            Ok(age) => Some(age),
            Err(_) => {
                warn!(token = %token, "Age extraction returned a non-integer");
                None
            }
        }
    }

    /// Detect the language of one free-text message.
    ///
    /// This is a dedicated detection call, not field extraction: it runs on
    /// the first message from any user whose language is unknown.
    pub async fn detect_language(&self, text: &str) -> Option<String> {
        self.ask(
            "Detect the language of the user's message. \
             Respond with ONLY the name of the language, nothing else.",
            text,
        )
        .await
    }
}
