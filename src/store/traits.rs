//! The `ProfileStore` trait — the persistence boundary for user profiles.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::onboarding::{ProfileUpdate, UserProfile};

/// Backend-agnostic profile persistence.
///
/// `id` uniqueness is the store's job. A missing record is `Ok(None)` from
/// `get`, never an error; callers create the row and move on.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up a profile by sender identity.
    async fn get(&self, phone: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Create a profile row with defaults for an unseen sender.
    async fn insert(&self, phone: &str) -> Result<UserProfile, StoreError>;

    /// Apply a partial update as one atomic operation and return the
    /// updated record.
    async fn update(&self, phone: &str, update: &ProfileUpdate) -> Result<UserProfile, StoreError>;

    /// Load the profile for a sender, creating it on first contact.
    async fn get_or_create(&self, phone: &str) -> Result<UserProfile, StoreError> {
        match self.get(phone).await? {
            Some(profile) => Ok(profile),
            None => self.insert(phone).await,
        }
    }
}
