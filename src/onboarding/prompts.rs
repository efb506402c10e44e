//! Canonical-language onboarding prompts and fixed replies.
//!
//! Everything here is written in the canonical language (English) and
//! translated per turn into the user's detected language.

/// Asked while `country` is missing.
pub const COUNTRY_QUESTION: &str = "May I know your country?";

/// Asked while `age` is missing.
pub const AGE_QUESTION: &str = "May I know your age?";

/// Asked while `gender` is missing.
pub const GENDER_QUESTION: &str = "May I know your gender?";

/// Sent once the last onboarding field lands.
pub const ONBOARDING_DONE_REPLY: &str = "Thanks for the information! How can I help?";

/// Fixed reply for unsupported message types and for turns where no other
/// reply could be produced. Never expose a technical error string.
pub const FALLBACK_REPLY: &str = "Sorry, I can't reply to that";

/// Fallback for the stateless `/api` surface.
pub const API_FALLBACK_REPLY: &str = "Sorry, I could not generate a response right now.";
