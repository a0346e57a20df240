//! Audit trail row types
//!
//! Every repository mutation leaves an audit entry; the change finder
//! replays these within a time window to compute the incremental delta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of repository event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "documentCreated")]
    Created,
    #[serde(rename = "documentModified")]
    Modified,
    #[serde(rename = "documentMoved")]
    Moved,
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "lifecycle_transition_event")]
    LifecycleTransition,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Created => "documentCreated",
            EventKind::Modified => "documentModified",
            EventKind::Moved => "documentMoved",
            EventKind::Deleted => "deleted",
            EventKind::LifecycleTransition => "lifecycle_transition_event",
        };
        write!(f, "{name}")
    }
}

/// One row of the repository audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Name of the repository the event happened in
    pub repository_id: String,
    pub event_kind: EventKind,
    /// Lifecycle state after the event, when the event is a transition
    pub lifecycle_state: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Repository path of the document at event time
    pub path: String,
    pub native_id: String,
}
