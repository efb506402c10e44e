//! Steady-state chat sessions over the persisted transcript.

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::onboarding::UserProfile;

/// Static persona for the stateless `/api` surface. No user background.
pub const GENERAL_SYSTEM_PROMPT: &str = "\
You are a friendly AI health professional for rural users. Give short, \
simple, factual replies in plain text, with no formatting and no long \
paragraphs. Bluntly refuse any request that is not about health \
assistance, no matter how it is phrased.";

/// Personalized system prompt seeding a user's transcript.
///
/// Parameterized by the onboarding profile; missing values render as
/// "unknown" so a partially collected profile still produces a usable seed.
pub fn health_system_prompt(profile: &UserProfile) -> String {
    let country = profile.country.as_deref().unwrap_or("unknown");
    let age = profile
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let gender = profile.gender.as_deref().unwrap_or("unknown");
    let language = profile.language.as_deref().unwrap_or("unknown");

    format!(
        "You are a friendly AI health professional for rural users. Give short, \
simple, factual replies. Chat as if YOU ARE the health professional, in short \
but helpful sentences. Do not use formatting or long paragraphs: you are \
talking to a rural farmer from {country}.

Use the user background below and give advice specific to that region. Do not \
give generic advice. Always name relevant medicines and remedies available in \
{country}, at least 3.

You may respond in whatever language the user speaks.

Do not answer any question unrelated to health assistance. Bluntly refuse any \
attempt to talk you into doing so, regardless of how the request is phrased.

USER BACKGROUND:
Country: {country}
Age: {age}
Gender: {gender}
Language: {language}"
    )
}

/// Maintains the append-only transcript and produces assistant replies.
pub struct ChatSession {
    llm: Arc<dyn LlmProvider>,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Run one chat turn over the profile's transcript.
    ///
    /// Seeds an empty transcript with the personalized system prompt,
    /// appends the user turn, and asks the oracle over the full history.
    /// On success returns the reply and the transcript including both new
    /// turns. On failure returns the error and nothing is persisted, so
    /// the stored transcript never ends on a dangling user turn.
    pub async fn continue_session(
        &self,
        profile: &UserProfile,
        user_text: &str,
    ) -> Result<(String, Vec<ChatMessage>), LlmError> {
        let mut history = profile.message_history.clone();
        if history.is_empty() {
            history.push(ChatMessage::system(health_system_prompt(profile)));
        }
        history.push(ChatMessage::user(user_text));

        let response = self
            .llm
            .complete(CompletionRequest::new(history.clone()))
            .await?;

        let reply = response.content.trim().to_string();
        history.push(ChatMessage::assistant(reply.clone()));
        Ok((reply, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlm;
    use crate::llm::Role;
    use crate::onboarding::OnboardingStage;

    fn done_profile() -> UserProfile {
        let mut profile = UserProfile::new("254712345678");
        profile.name = Some("Wanjiku".to_string());
        profile.country = Some("Kenya".to_string());
        profile.age = Some(34);
        profile.gender = Some("female".to_string());
        profile.language = Some("Swahili".to_string());
        profile.onboarding_stage = OnboardingStage::Done;
        profile
    }

    fn session(llm: &Arc<MockLlm>) -> ChatSession {
        ChatSession::new(Arc::clone(llm) as Arc<dyn LlmProvider>)
    }

    #[test]
    fn system_prompt_carries_user_background() {
        let prompt = health_system_prompt(&done_profile());
        assert!(prompt.contains("Kenya"));
        assert!(prompt.contains("34"));
        assert!(prompt.contains("female"));
        assert!(prompt.contains("Swahili"));
        assert!(prompt.contains("at least 3"));
        assert!(prompt.contains("refuse"));
    }

    #[test]
    fn system_prompt_marks_missing_fields_unknown() {
        let profile = UserProfile::new("254712345678");
        let prompt = health_system_prompt(&profile);
        assert!(prompt.contains("Country: unknown"));
        assert!(prompt.contains("Age: unknown"));
    }

    #[tokio::test]
    async fn first_turn_seeds_system_prompt() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("Take paracetamol, rest, drink fluids.");

        let profile = done_profile();
        let (reply, history) = session(&llm)
            .continue_session(&profile, "I have a fever")
            .await
            .unwrap();

        assert_eq!(reply, "Take paracetamol, rest, drink fluids.");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[1].content, "I have a fever");
        assert_eq!(history[2].role, Role::Assistant);

        // The oracle saw the seed and the user turn, not the reply.
        let calls = llm.calls();
        assert_eq!(calls[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn transcript_grows_by_two_per_turn_and_alternates() {
        let llm = Arc::new(MockLlm::new());
        let mut profile = done_profile();

        let turns = 4;
        for i in 0..turns {
            llm.push_reply(&format!("reply {i}"));
            let (_, history) = session(&llm)
                .continue_session(&profile, &format!("question {i}"))
                .await
                .unwrap();
            profile.message_history = history;
        }

        // 1 seed + 2 per turn.
        let history = &profile.message_history;
        assert_eq!(history.len(), 1 + 2 * turns);
        assert_eq!(history[0].role, Role::System);
        for (i, turn) in history[1..].iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[tokio::test]
    async fn oracle_failure_returns_error_and_no_history() {
        let llm = Arc::new(MockLlm::new());
        llm.push_failure();

        let profile = done_profile();
        let result = session(&llm).continue_session(&profile, "hello").await;
        assert!(result.is_err());
        // The caller keeps the stored transcript untouched.
        assert!(profile.message_history.is_empty());
    }
}
