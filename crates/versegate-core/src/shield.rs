//! Blocking capability provider.
//!
//! The provider is what actually hides or blanks targeted apps. Both
//! operations are idempotent: applying an active block or clearing a clear
//! one succeeds without effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ShieldError;
use crate::selection::Selection;
use crate::storage::{get_json, keys, put_json, KvStore};

/// Every blocking backend implements this trait.
///
/// A provider is scoped to one named policy store so that this app's block
/// never collides with another feature's policy on the same device.
pub trait ShieldProvider {
    fn policy_store(&self) -> &str;

    /// Block everything in `selection`, replacing any previous block.
    fn apply_block(&self, selection: &Selection) -> Result<(), ShieldError>;

    /// Remove the block.
    fn clear_block(&self) -> Result<(), ShieldError>;
}

impl<T: ShieldProvider + ?Sized> ShieldProvider for &T {
    fn policy_store(&self) -> &str {
        (**self).policy_store()
    }

    fn apply_block(&self, selection: &Selection) -> Result<(), ShieldError> {
        (**self).apply_block(selection)
    }

    fn clear_block(&self) -> Result<(), ShieldError> {
        (**self).clear_block()
    }
}

/// Shield state as recorded by [`StoreShield`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldState {
    pub selection: Selection,
    pub applied_at: DateTime<Utc>,
}

/// Shield provider that records the active block in the shared store under
/// `shield.<policy_store>`.
///
/// Consumers that enforce blocking (a launcher, a DNS filter) read this key.
pub struct StoreShield<'a, S: KvStore + ?Sized> {
    store: &'a S,
    policy_store: String,
}

impl<'a, S: KvStore + ?Sized> StoreShield<'a, S> {
    pub fn new(store: &'a S, policy_store: impl Into<String>) -> Self {
        Self {
            store,
            policy_store: policy_store.into(),
        }
    }

    fn key(&self) -> String {
        keys::shield(&self.policy_store)
    }

    /// The active block, if any.
    pub fn active(&self) -> Option<ShieldState> {
        get_json(self.store, &self.key())
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }
}

impl<S: KvStore + ?Sized> ShieldProvider for StoreShield<'_, S> {
    fn policy_store(&self) -> &str {
        &self.policy_store
    }

    fn apply_block(&self, selection: &Selection) -> Result<(), ShieldError> {
        if let Some(current) = self.active() {
            if &current.selection == selection {
                return Ok(());
            }
        }
        let state = ShieldState {
            selection: selection.clone(),
            applied_at: Utc::now(),
        };
        put_json(self.store, &self.key(), &state)?;
        tracing::info!(policy_store = %self.policy_store, targets = selection.len(), "shield applied");
        Ok(())
    }

    fn clear_block(&self) -> Result<(), ShieldError> {
        if self.store.get(&self.key()).is_none() {
            return Ok(());
        }
        self.store.remove(&self.key())?;
        tracing::info!(policy_store = %self.policy_store, "shield cleared");
        Ok(())
    }
}
