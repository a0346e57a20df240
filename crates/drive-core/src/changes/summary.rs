use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::changes::ChangeRecord;

/// Opaque-to-the-client cursor into the change feed.
///
/// Carries the upper bound of the last served window plus the serialized
/// root set at that time, so the next poll can diff subscriptions without
/// any server-side per-client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub root_definitions: String,
}

impl Checkpoint {
    pub fn new(timestamp: DateTime<Utc>, root_definitions: impl Into<String>) -> Self {
        Self {
            timestamp,
            root_definitions: root_definitions.into(),
        }
    }

    /// Checkpoint for a client that has never polled: epoch timestamp and
    /// an empty root set, so the first poll reports every active root as
    /// newly registered.
    pub fn initial() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, "")
    }
}

/// One poll's worth of the change feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    /// Newest first. Empty when `too_many_changes` is set.
    pub changes: Vec<ChangeRecord>,
    /// Cursor to hand back on the next poll
    pub checkpoint: Checkpoint,
    /// The window held at least the configured limit of events; the
    /// client must fall back to a full scan of its roots.
    pub too_many_changes: bool,
}
