//! Repository document value types
//!
//! A [`Document`] is the repository-side view of an item: typed, faceted,
//! lifecycle-tracked and permission-checked. The projection layer turns
//! these into file/folder-shaped items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facet carried by documents that are folder-shaped.
pub const FOLDERISH_FACET: &str = "Folderish";

/// Facet carried by documents hidden from client-facing trees.
pub const HIDDEN_FACET: &str = "HiddenInNavigation";

/// Facet marking a document as a designated synchronization root.
///
/// Whether the subscription is enabled for a given user is tracked by the
/// root registry, not on the document.
pub const SYNC_ROOT_FACET: &str = "SyncRoot";

/// Lifecycle state of trashed documents.
pub const DELETED_STATE: &str = "deleted";

/// Default lifecycle state of live documents.
pub const DEFAULT_STATE: &str = "project";

/// Permissions of the current principal on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub write_properties: bool,
    pub remove: bool,
    pub remove_children: bool,
    pub add_children: bool,
}

impl Permissions {
    /// All permissions granted.
    pub fn all() -> Self {
        Self {
            write_properties: true,
            remove: true,
            remove_children: true,
            add_children: true,
        }
    }

    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            write_properties: false,
            remove: false,
            remove_children: false,
            add_children: false,
        }
    }
}

/// Content blob attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub filename: String,
    pub digest: String,
    pub digest_algorithm: String,
    pub length: u64,
}

/// A document as seen from the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Native repository reference, unique within one repository
    pub native_id: String,
    pub doc_type: String,
    pub facets: Vec<String>,
    /// Absolute repository path, `/` separated
    pub path: String,
    pub title: String,
    pub lifecycle_state: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Native id of the parent document, `None` for the repository root
    pub parent_id: Option<String>,
    pub blob: Option<BlobInfo>,
    pub permissions: Permissions,
    pub is_version: bool,
    pub is_proxy: bool,
}

impl Document {
    pub fn has_facet(&self, facet: &str) -> bool {
        self.facets.iter().any(|f| f == facet)
    }

    pub fn is_folderish(&self) -> bool {
        self.has_facet(FOLDERISH_FACET)
    }

    pub fn is_trashed(&self) -> bool {
        self.lifecycle_state == DELETED_STATE
    }
}
