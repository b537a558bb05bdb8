//! The set of block targets and its persisted round-trip.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::storage::{get_json, keys, put_json, KvStore};

/// Opaque block targets, partitioned into three disjoint kinds.
///
/// Tokens are whatever the blocking provider hands out; they are never
/// interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub applications: BTreeSet<String>,
    /// Each category expands to every app in it.
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub domains: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_application(mut self, token: impl Into<String>) -> Self {
        self.applications.insert(token.into());
        self
    }

    pub fn with_category(mut self, token: impl Into<String>) -> Self {
        self.categories.insert(token.into());
        self
    }

    pub fn with_domain(mut self, token: impl Into<String>) -> Self {
        self.domains.insert(token.into());
        self
    }

    /// A selection is effective iff at least one kind is non-empty.
    pub fn is_effective(&self) -> bool {
        !self.applications.is_empty() || !self.categories.is_empty() || !self.domains.is_empty()
    }

    /// Total number of targets across all kinds.
    pub fn len(&self) -> usize {
        self.applications.len() + self.categories.len() + self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the persisted [`Selection`].
///
/// The primary copy under [`keys::SELECTION`] is authoritative. When a
/// secondary scope is attached, `save` also writes a best-effort copy there
/// for diagnostics.
pub struct SelectionRepository<'a, S: KvStore + ?Sized> {
    store: &'a S,
    secondary: Option<&'a dyn KvStore>,
}

impl<'a, S: KvStore + ?Sized> SelectionRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: &'a dyn KvStore) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Persist `selection`, overwriting any previous one.
    ///
    /// # Errors
    /// Returns an error if the primary copy cannot be encoded or written.
    /// Secondary copy failures are only logged.
    pub fn save(&self, selection: &Selection) -> Result<(), StoreError> {
        put_json(self.store, keys::SELECTION, selection)?;
        tracing::info!(
            applications = selection.applications.len(),
            categories = selection.categories.len(),
            domains = selection.domains.len(),
            "selection saved"
        );

        if let Some(secondary) = self.secondary {
            if let Err(e) = put_json(secondary, keys::SELECTION, selection) {
                tracing::warn!(error = %e, "secondary selection copy not written");
            }
        }
        Ok(())
    }

    /// Load the saved selection. Absent and corrupt payloads are both `None`.
    pub fn load(&self) -> Option<Selection> {
        get_json(self.store, keys::SELECTION)
    }

    /// Load the diagnostic secondary copy, if a secondary scope is attached.
    pub fn load_secondary(&self) -> Option<Selection> {
        self.secondary.and_then(|s| get_json(s, keys::SELECTION))
    }

    /// Remove the saved selection.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(keys::SELECTION)?;
        if let Some(secondary) = self.secondary {
            if let Err(e) = secondary.remove(keys::SELECTION) {
                tracing::warn!(error = %e, "secondary selection copy not removed");
            }
        }
        Ok(())
    }
}
