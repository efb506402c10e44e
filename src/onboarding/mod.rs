//! Onboarding flow: profile model, stage tracking, and the decision engine.

pub mod engine;
pub mod model;
pub mod prompts;
pub mod stage;

pub use engine::{Decision, OnboardingEngine};
pub use model::{ProfileField, ProfileUpdate, UserProfile};
pub use stage::OnboardingStage;
