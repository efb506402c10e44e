//! User profile and partial-update models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

use super::stage::OnboardingStage;

/// A profile attribute collected during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Country,
    Age,
    Gender,
    Language,
}

/// The fixed set of attributes a complete profile carries.
pub const REQUIRED_FIELDS: [ProfileField; 5] = [
    ProfileField::Name,
    ProfileField::Country,
    ProfileField::Age,
    ProfileField::Gender,
    ProfileField::Language,
];

/// One profile row per sender identity.
///
/// All collected attributes are nullable until onboarding fills them in.
/// `message_history` is the steady-state chat transcript: empty until the
/// first chat turn, append-only afterwards, never truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub phone: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub language: Option<String>,
    pub onboarding_stage: OnboardingStage,
    #[serde(default)]
    pub message_history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A freshly created profile for an unseen sender.
    pub fn new(phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            phone: phone.into(),
            name: None,
            country: None,
            age: None,
            gender: None,
            language: None,
            onboarding_stage: OnboardingStage::default(),
            message_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a single required field is still null.
    pub fn is_missing(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Name => self.name.is_none(),
            ProfileField::Country => self.country.is_none(),
            ProfileField::Age => self.age.is_none(),
            ProfileField::Gender => self.gender.is_none(),
            ProfileField::Language => self.language.is_none(),
        }
    }

    /// Required fields currently null, computed fresh on every call.
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|f| self.is_missing(*f))
            .collect()
    }
}

/// A partial profile update, applied as one atomic operation at the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub language: Option<String>,
    pub onboarding_stage: Option<OnboardingStage>,
    pub message_history: Option<Vec<ChatMessage>>,
}

impl ProfileUpdate {
    /// True when no field is set; callers skip the store round-trip.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.country.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.language.is_none()
            && self.onboarding_stage.is_none()
            && self.message_history.is_none()
    }

    /// Apply the set fields to a profile in place.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(country) = &self.country {
            profile.country = Some(country.clone());
        }
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(gender) = &self.gender {
            profile.gender = Some(gender.clone());
        }
        if let Some(language) = &self.language {
            profile.language = Some(language.clone());
        }
        if let Some(stage) = self.onboarding_stage {
            profile.onboarding_stage = stage;
        }
        if let Some(history) = &self.message_history {
            profile.message_history = history.clone();
        }
        profile.updated_at = Utc::now();
    }
}
