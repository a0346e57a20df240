use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

/// Per-principal synchronization root subscriptions.
///
/// Unregistering flips the entry to disabled rather than dropping it, so a
/// later re-registration is a state change and the feed can report it.
#[derive(Debug, Default)]
pub struct SyncRootRegistry {
    // principal -> repository -> native id -> enabled
    inner: RwLock<HashMap<String, HashMap<String, BTreeMap<String, bool>>>>,
}

impl SyncRootRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a document as an active root for the principal.
    ///
    /// Returns `true` when this changed the subscription state, `false`
    /// when the root was already active.
    pub fn register(&self, principal: &str, repository: &str, native_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        let entry = inner
            .entry(principal.to_owned())
            .or_default()
            .entry(repository.to_owned())
            .or_default()
            .entry(native_id.to_owned())
            .or_insert(false);
        let changed = !*entry;
        *entry = true;
        if changed {
            tracing::debug!(principal, repository, native_id, "Registered sync root");
        }
        changed
    }

    /// Disable a root subscription.
    ///
    /// Returns `true` when the root was active, `false` when it was
    /// already inactive or never registered.
    pub fn unregister(&self, principal: &str, repository: &str, native_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        let Some(entry) = inner
            .get_mut(principal)
            .and_then(|repos| repos.get_mut(repository))
            .and_then(|roots| roots.get_mut(native_id))
        else {
            return false;
        };
        let changed = *entry;
        *entry = false;
        if changed {
            tracing::debug!(principal, repository, native_id, "Unregistered sync root");
        }
        changed
    }

    pub fn is_active_root(&self, principal: &str, repository: &str, native_id: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .get(principal)
            .and_then(|repos| repos.get(repository))
            .and_then(|roots| roots.get(native_id))
            .copied()
            .unwrap_or(false)
    }

    /// Active roots for a principal, keyed by repository, in stable order.
    pub fn active_roots(&self, principal: &str) -> BTreeMap<String, BTreeSet<String>> {
        let inner = self.inner.read().unwrap();
        let mut out = BTreeMap::new();
        let Some(repos) = inner.get(principal) else {
            return out;
        };
        for (repository, roots) in repos {
            let active: BTreeSet<String> = roots
                .iter()
                .filter(|(_, enabled)| **enabled)
                .map(|(id, _)| id.clone())
                .collect();
            if !active.is_empty() {
                out.insert(repository.clone(), active);
            }
        }
        out
    }
}
