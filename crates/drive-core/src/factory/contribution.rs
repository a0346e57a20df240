//! Factory contribution descriptors
//!
//! Contributions are the typed configuration entries from which the
//! registry builds its ordered factory chain. Contributing twice under the
//! same name merges the entries, last writer wins for every overridable
//! field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_order() -> i32 {
    100
}

fn default_enabled() -> bool {
    true
}

/// Which built-in adaptation logic a contribution binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactoryKind {
    /// Exclusively the synthetic root of the projected tree
    TopLevel,
    /// Enabled, active synchronization root subscriptions
    SyncRoot,
    /// Ordinary documents (folderish or blob-carrying)
    Default,
}

/// One named, ordered factory contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryContribution {
    pub name: String,
    pub kind: FactoryKind,
    /// Ascending priority; ties broken by registration sequence
    #[serde(default = "default_order")]
    pub order: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Restrict matching to documents of this type
    #[serde(default)]
    pub doc_type: Option<String>,
    /// Restrict matching to documents carrying this facet
    #[serde(default)]
    pub facet: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl FactoryContribution {
    pub fn new(name: impl Into<String>, kind: FactoryKind, order: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            order,
            enabled: true,
            doc_type: None,
            facet: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Merge a later contribution with the same name into this one.
    ///
    /// `enabled`, `order` and `kind` always take the later value;
    /// `doc_type` and `facet` are overridden only when the later
    /// contribution sets them; parameters are merged key by key.
    pub fn merge_from(&mut self, other: &FactoryContribution) {
        tracing::debug!(name = %self.name, "Merging factory contribution");
        self.enabled = other.enabled;
        self.order = other.order;
        self.kind = other.kind;
        if other.doc_type.is_some() {
            self.doc_type = other.doc_type.clone();
        }
        if other.facet.is_some() {
            self.facet = other.facet.clone();
        }
        for (key, value) in &other.parameters {
            self.parameters.insert(key.clone(), value.clone());
        }
    }
}
