//! Document repository interface for drive-sync
//!
//! Defines the collaborator seam between the synchronization core and the
//! underlying document store: document and audit value types, the
//! object-safe [`Repository`] trait, and [`MemoryRepository`], an
//! in-memory backend used by tests and standalone deployments.

pub mod audit;
pub mod document;
pub mod error;
pub mod memory;
pub mod repository;

pub use audit::{AuditEntry, EventKind};
pub use document::{
    BlobInfo, DEFAULT_STATE, DELETED_STATE, Document, FOLDERISH_FACET, HIDDEN_FACET, Permissions,
    SYNC_ROOT_FACET,
};
pub use error::{Error, Result};
pub use memory::{MemoryRepository, ROOT_ID};
pub use repository::{Repository, SharedRepository};
