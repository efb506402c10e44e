//! Prompt translation into the user's preferred language.

use std::sync::Arc;

use tracing::warn;

use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// The language prompts are authored in. Translation into it is a no-op.
pub const CANONICAL_LANGUAGE: &str = "English";

const TRANSLATE_MAX_TOKENS: u32 = 256;

/// Rewrites canonical-language prompts into a target language.
pub struct Translator {
    llm: Arc<dyn LlmProvider>,
}

impl Translator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Translate `text` into `target_language`.
    ///
    /// Identity when the target is the canonical language: no oracle call,
    /// no translation drift on the base language. On oracle failure the
    /// canonical text is returned so the user still gets the prompt.
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        if target_language.trim().eq_ignore_ascii_case(CANONICAL_LANGUAGE) {
            return text.to_string();
        }

        let instruction = format!(
            "Translate the user's text into {target_language}. \
             Respond with ONLY the translation, no surrounding text."
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(text),
        ])
        .with_max_tokens(TRANSLATE_MAX_TOKENS)
        .with_temperature(0.0);

        match self.llm.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                response.content.trim().to_string()
            }
            Ok(_) => {
                warn!(target_language, "Translation returned empty text");
                text.to_string()
            }
            Err(e) => {
                warn!(error = %e, target_language, "Translation call failed");
                text.to_string()
            }
        }
    }
}
