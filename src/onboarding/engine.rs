//! Onboarding decision engine.
//!
//! One inbound message produces exactly one `Decision`: the partial profile
//! update to apply and the reply to send. The caller applies the update in
//! a single store operation; nothing here touches persistence.

use std::sync::Arc;

use tracing::warn;

use crate::chat::ChatSession;
use crate::extract::{FieldExtractor, FieldKind};
use crate::llm::LlmProvider;
use crate::translate::Translator;

use super::model::{ProfileField, ProfileUpdate, UserProfile};
use super::prompts::{
    AGE_QUESTION, COUNTRY_QUESTION, FALLBACK_REPLY, GENDER_QUESTION, ONBOARDING_DONE_REPLY,
};
use super::stage::OnboardingStage;

/// The outcome of one inbound message: what to persist and what to say.
#[derive(Debug)]
pub struct Decision {
    pub update: ProfileUpdate,
    pub reply: String,
}

/// Drives field collection and the handover into steady-state chat.
pub struct OnboardingEngine {
    extractor: FieldExtractor,
    translator: Translator,
    chat: ChatSession,
}

impl OnboardingEngine {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            extractor: FieldExtractor::new(Arc::clone(&llm)),
            translator: Translator::new(Arc::clone(&llm)),
            chat: ChatSession::new(llm),
        }
    }

    /// Decide the turn for one inbound message against the loaded profile.
    ///
    /// The profile snapshot is read-only here; every mutation is collected
    /// into the returned update and applied by the caller in one store
    /// operation.
    pub async fn decide(
        &self,
        profile: &UserProfile,
        text: &str,
        display_name: Option<&str>,
    ) -> Decision {
        // Language is a prerequisite for every translated prompt, so
        // detection owns the whole turn whenever the field is missing. It
        // moves the stage to `Country` no matter what was stored; stage
        // dispatch never runs on such a turn.
        let Some(language) = profile.language.clone() else {
            return match self.extractor.detect_language(text).await {
                Some(language) => {
                    let update = ProfileUpdate {
                        language: Some(language.clone()),
                        name: display_name.map(str::to_string),
                        onboarding_stage: Some(OnboardingStage::Country),
                        ..Default::default()
                    };
                    let reply = self.translator.translate(COUNTRY_QUESTION, &language).await;
                    Decision { update, reply }
                }
                // Detection failed; ask untranslated this turn and retry
                // detection on the next message, language is still null.
                None => Decision {
                    update: ProfileUpdate::default(),
                    reply: COUNTRY_QUESTION.to_string(),
                },
            };
        };

        let mut update = ProfileUpdate::default();
        // Canonical-language prompt chosen so far; translated once at the end.
        let mut prompt: Option<&'static str> = None;
        // A chat reply, when produced, wins over any prompt.
        let mut chat_reply: Option<String> = None;

        // Default prompt: the first missing field in collection order,
        // recomputed fresh from the loaded snapshot.
        if profile.is_missing(ProfileField::Country) {
            prompt = Some(COUNTRY_QUESTION);
        } else if profile.is_missing(ProfileField::Age) {
            prompt = Some(AGE_QUESTION);
        } else if profile.is_missing(ProfileField::Gender) {
            prompt = Some(GENDER_QUESTION);
        }

        // Stage dispatch, keyed on the stage the profile was loaded with.
        // On a user's first message the stored stage is still `NotStarted`,
        // so no extraction runs: that turn is consumed by language
        // detection above.
        match profile.onboarding_stage {
            OnboardingStage::Country => {
                if let Some(country) = self.extractor.extract(text, FieldKind::Country).await {
                    update.country = Some(country);
                    update.onboarding_stage = profile.onboarding_stage.next();
                    prompt = Some(AGE_QUESTION);
                }
            }
            OnboardingStage::Age => {
                if let Some(age) = self.extractor.extract_age(text).await {
                    update.age = Some(age);
                    update.onboarding_stage = profile.onboarding_stage.next();
                    prompt = Some(GENDER_QUESTION);
                }
            }
            OnboardingStage::Gender => {
                if let Some(gender) = self.extractor.extract(text, FieldKind::Gender).await {
                    update.gender = Some(gender);
                    update.onboarding_stage = profile.onboarding_stage.next();
                    prompt = Some(ONBOARDING_DONE_REPLY);
                }
            }
            OnboardingStage::Done => {
                match self.chat.continue_session(profile, text).await {
                    Ok((reply, history)) => {
                        update.message_history = Some(history);
                        chat_reply = Some(reply);
                    }
                    Err(e) => {
                        // The transcript stays untouched; whatever prompt
                        // was computed above (or the fixed fallback) stands.
                        warn!(error = %e, "Chat completion failed, keeping fallback reply");
                    }
                }
            }
            OnboardingStage::NotStarted => {}
        }

        let reply = match chat_reply {
            Some(reply) => reply,
            None => match prompt {
                Some(prompt) => self.translator.translate(prompt, &language).await,
                None => FALLBACK_REPLY.to_string(),
            },
        };

        Decision { update, reply }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlm;
    use crate::llm::Role;

    fn engine(llm: &Arc<MockLlm>) -> OnboardingEngine {
        OnboardingEngine::new(Arc::clone(llm) as Arc<dyn LlmProvider>)
    }

    fn profile_at(stage: OnboardingStage) -> UserProfile {
        let mut profile = UserProfile::new("254712345678");
        profile.name = Some("Wanjiku".to_string());
        profile.language = Some("English".to_string());
        profile.onboarding_stage = stage;
        if stage == OnboardingStage::Age
            || stage == OnboardingStage::Gender
            || stage == OnboardingStage::Done
        {
            profile.country = Some("Kenya".to_string());
        }
        if stage == OnboardingStage::Gender || stage == OnboardingStage::Done {
            profile.age = Some(34);
        }
        if stage == OnboardingStage::Done {
            profile.gender = Some("female".to_string());
        }
        profile
    }

    // New sender, first message: language detected, stage jumps to Country,
    // display name captured, reply asks for the country in the detected
    // language.
    #[tokio::test]
    async fn first_message_detects_language_and_asks_country() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("Swahili"); // detection
        llm.push_reply("Nchi yako ni ipi?"); // translated country question

        let profile = UserProfile::new("254712345678");
        let decision = engine(&llm).decide(&profile, "Habari", Some("Wanjiku")).await;

        assert_eq!(decision.update.language.as_deref(), Some("Swahili"));
        assert_eq!(decision.update.name.as_deref(), Some("Wanjiku"));
        assert_eq!(
            decision.update.onboarding_stage,
            Some(OnboardingStage::Country)
        );
        // No extraction on message one: detection consumed it.
        assert!(decision.update.country.is_none());
        assert_eq!(decision.reply, "Nchi yako ni ipi?");
        assert_eq!(llm.call_count(), 2);
    }

    // English speakers skip the translation call entirely.
    #[tokio::test]
    async fn first_message_in_canonical_language_skips_translation() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("English"); // detection only

        let profile = UserProfile::new("254712345678");
        let decision = engine(&llm).decide(&profile, "Hello", Some("Ada")).await;

        assert_eq!(decision.reply, COUNTRY_QUESTION);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn detection_failure_asks_untranslated_and_persists_nothing() {
        let llm = Arc::new(MockLlm::new());
        llm.push_failure(); // detection outage

        let profile = UserProfile::new("254712345678");
        let decision = engine(&llm).decide(&profile, "Hello", Some("Ada")).await;

        assert!(decision.update.is_empty());
        assert_eq!(decision.reply, COUNTRY_QUESTION);
    }

    // Language missing always forces the next stage to Country, whatever
    // the stored stage was.
    #[tokio::test]
    async fn missing_language_overrides_any_stage() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("French"); // detection
        llm.push_reply("Quel est votre pays ?"); // translated country question

        let mut profile = profile_at(OnboardingStage::Gender);
        profile.language = None;
        let decision = engine(&llm).decide(&profile, "Bonjour", None).await;

        assert_eq!(
            decision.update.onboarding_stage,
            Some(OnboardingStage::Country)
        );
        // The detection turn owns the message: no extraction runs on it.
        assert!(decision.update.gender.is_none());
        assert_eq!(decision.reply, "Quel est votre pays ?");
        assert_eq!(llm.call_count(), 2);
    }

    // Stage Country, answer names a country: field lands, stage advances,
    // reply moves on to the age question.
    #[tokio::test]
    async fn country_answer_advances_to_age() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("Kenya"); // extraction

        let mut profile = profile_at(OnboardingStage::Country);
        profile.country = None;
        let decision = engine(&llm).decide(&profile, "I live in Kenya", None).await;

        assert_eq!(decision.update.country.as_deref(), Some("Kenya"));
        assert_eq!(decision.update.onboarding_stage, Some(OnboardingStage::Age));
        assert_eq!(decision.reply, AGE_QUESTION);
    }

    // Stage Age, unparseable answer: no mutation, the age question repeats.
    // Twice in a row for idempotence.
    #[tokio::test]
    async fn unparseable_age_repeats_question_without_churn() {
        let llm = Arc::new(MockLlm::new());

        let mut profile = profile_at(OnboardingStage::Age);
        profile.age = None;

        for _ in 0..2 {
            llm.push_reply("null");
            let decision = engine(&llm).decide(&profile, "banana", None).await;
            assert!(decision.update.is_empty());
            assert_eq!(decision.reply, AGE_QUESTION);
        }
    }

    #[tokio::test]
    async fn age_answer_advances_to_gender() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("34");

        let mut profile = profile_at(OnboardingStage::Age);
        profile.age = None;
        let decision = engine(&llm).decide(&profile, "I am 34", None).await;

        assert_eq!(decision.update.age, Some(34));
        assert_eq!(
            decision.update.onboarding_stage,
            Some(OnboardingStage::Gender)
        );
        assert_eq!(decision.reply, GENDER_QUESTION);
    }

    #[tokio::test]
    async fn gender_answer_completes_onboarding() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("female");

        let mut profile = profile_at(OnboardingStage::Gender);
        profile.gender = None;
        let decision = engine(&llm).decide(&profile, "female", None).await;

        assert_eq!(decision.update.gender.as_deref(), Some("female"));
        assert_eq!(decision.update.onboarding_stage, Some(OnboardingStage::Done));
        assert_eq!(decision.reply, ONBOARDING_DONE_REPLY);
    }

    // Stage Done with an empty transcript: seed + user + assistant land in
    // the update, the chat reply wins.
    #[tokio::test]
    async fn done_stage_delegates_to_chat() {
        let llm = Arc::new(MockLlm::new());
        llm.push_reply("Take paracetamol, rest, drink fluids.");

        let profile = profile_at(OnboardingStage::Done);
        let decision = engine(&llm).decide(&profile, "I have a fever", None).await;

        assert_eq!(decision.reply, "Take paracetamol, rest, drink fluids.");
        let history = decision.update.message_history.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::System);
        assert!(history[0].content.contains("Kenya"));
    }

    // Chat outage: nothing persisted, the fixed fallback goes out.
    #[tokio::test]
    async fn chat_failure_degrades_to_fallback_without_mutation() {
        let llm = Arc::new(MockLlm::new());
        llm.push_failure();

        let profile = profile_at(OnboardingStage::Done);
        let decision = engine(&llm).decide(&profile, "I have a fever", None).await;

        assert!(decision.update.is_empty());
        assert_eq!(decision.reply, FALLBACK_REPLY);
    }

    // A profile with no stage-specific action and nothing missing produces
    // the safe no-op: empty update, fixed fallback.
    #[tokio::test]
    async fn complete_profile_without_stage_action_is_a_noop() {
        let llm = Arc::new(MockLlm::new());

        let mut profile = profile_at(OnboardingStage::Done);
        profile.onboarding_stage = OnboardingStage::NotStarted;
        let decision = engine(&llm).decide(&profile, "hello", None).await;

        assert!(decision.update.is_empty());
        assert_eq!(decision.reply, FALLBACK_REPLY);
        assert_eq!(llm.call_count(), 0);
    }
}
