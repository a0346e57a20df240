//! Repository collaborator interface
//!
//! The projection and change-feed engine never talks to a concrete backend
//! directly; everything goes through this object-safe trait so deployments
//! can plug in their document store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::audit::{AuditEntry, EventKind};
use crate::document::Document;
use crate::error::Result;

/// Shared handle to a repository backend.
pub type SharedRepository = Arc<dyn Repository>;

/// Read access to documents plus the audit trail query, and the two
/// mutation hooks the synchronization core needs (subscription marking and
/// audit touch).
pub trait Repository: Send + Sync {
    /// Name of this repository, used as the middle segment of item ids.
    fn name(&self) -> &str;

    /// Fetch a document by native id. `Ok(None)` when it no longer exists.
    fn get_document(&self, native_id: &str) -> Result<Option<Document>>;

    /// Fetch the parent of a document. `Ok(None)` for the repository root.
    fn get_parent(&self, native_id: &str) -> Result<Option<Document>>;

    /// List the direct children of a folderish document.
    fn get_children(&self, native_id: &str) -> Result<Vec<Document>>;

    /// Audit entries under any of the given path prefixes with a timestamp
    /// in the half-open window `(since, until]`, newest first, at most
    /// `limit` rows. Callers detect saturation by `rows.len() >= limit`.
    fn query_modified(
        &self,
        root_path_prefixes: &[String],
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<AuditEntry>>;

    /// Append an audit entry of the given kind for an existing document.
    fn touch(&self, native_id: &str, event_kind: EventKind) -> Result<()>;

    /// Record a synchronization-root subscription change on a document:
    /// ensures the sync-root facet is present and appends a `Modified`
    /// audit entry. The facet is never removed on unregistration, matching
    /// the subscription model where only the enabled flag changes.
    fn record_subscription_change(&self, native_id: &str) -> Result<()>;
}
