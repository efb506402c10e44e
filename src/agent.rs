//! Agent — one linear handling sequence per inbound message.
//!
//! Load (or create) the profile, take one decision, apply the decision's
//! update in a single store call, hand back the reply. Turns for the same
//! sender are serialized: the store does read-modify-write per turn, and
//! two concurrent turns against the same stale snapshot lose updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::channels::CanonicalMessage;
use crate::error::Error;
use crate::llm::LlmProvider;
use crate::onboarding::OnboardingEngine;
use crate::store::ProfileStore;

/// Per-sender serialization: one async mutex per sender id.
///
/// The map only ever grows; entries are tiny and senders are bounded by
/// the user base.
#[derive(Default)]
struct SenderLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SenderLocks {
    async fn acquire(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Coordinates the store, the decision engine, and the reply.
pub struct Agent {
    store: Arc<dyn ProfileStore>,
    engine: OnboardingEngine,
    locks: SenderLocks,
}

impl Agent {
    pub fn new(store: Arc<dyn ProfileStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            store,
            engine: OnboardingEngine::new(llm),
            locks: SenderLocks::default(),
        }
    }

    /// Handle one canonical inbound message and return the reply text.
    ///
    /// Oracle failures degrade inside the engine and never surface here;
    /// only store failures escape, and the transport layer turns those
    /// into a request-level error.
    pub async fn handle_message(&self, msg: &CanonicalMessage) -> Result<String, Error> {
        let _turn = self.locks.acquire(&msg.user_id).await;

        let profile = self.store.get_or_create(&msg.user_id).await?;
        let decision = self
            .engine
            .decide(&profile, &msg.text, msg.display_name.as_deref())
            .await;

        if !decision.update.is_empty() {
            self.store.update(&msg.user_id, &decision.update).await?;
        }
        Ok(decision.reply)
    }
}
