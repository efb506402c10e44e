//! Onboarding stage marker — which profile field is being collected.

use serde::{Deserialize, Serialize};

/// Progress marker for the onboarding conversation.
///
/// Progresses linearly: NotStarted → Country → Age → Gender → Done.
/// `NotStarted` is the created-row default; the first inbound message is
/// consumed by language detection and moves the stage to `Country`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    #[default]
    #[serde(rename = "none")]
    NotStarted,
    Country,
    Age,
    Gender,
    Done,
}

impl OnboardingStage {
    /// The next stage in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStage> {
        use OnboardingStage::*;
        match self {
            NotStarted => Some(Country),
            Country => Some(Age),
            Age => Some(Gender),
            Gender => Some(Done),
            Done => None,
        }
    }

    /// Parse a persisted stage string.
    ///
    /// Unknown values map to `NotStarted`: the dispatch takes no
    /// stage-specific action there, so a bad row degrades to a re-ask
    /// instead of an error.
    pub fn parse(s: &str) -> OnboardingStage {
        match s {
            "country" => Self::Country,
            "age" => Self::Age,
            "gender" => Self::Gender,
            "done" => Self::Done,
            _ => Self::NotStarted,
        }
    }
}

impl std::fmt::Display for OnboardingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "none",
            Self::Country => "country",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}
