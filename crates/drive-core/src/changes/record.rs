use chrono::{DateTime, Utc};
use drive_model::{ItemId, ProjectedItem};
use drive_repo::{AuditEntry, EventKind};
use serde::Serialize;

/// Which source produced a change record. Root-diff records sort before
/// audit records at equal timestamps so subscription changes are applied
/// first by clients replaying the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrigin {
    RootDiff,
    #[default]
    Audit,
}

/// One entry of the change feed.
///
/// `item` is the resolved projected item when resolution succeeded;
/// deleted or no-longer-resolvable documents carry only `item_id` so
/// clients can still match the record against their local state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub repository_id: String,
    pub event_kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<String>,
    pub event_timestamp: DateTime<Utc>,
    pub path: String,
    pub native_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ProjectedItem>,
    #[serde(skip)]
    pub origin: RecordOrigin,
}

impl ChangeRecord {
    /// Record for an audit row, before item resolution.
    pub fn from_audit(entry: AuditEntry) -> Self {
        Self {
            repository_id: entry.repository_id,
            event_kind: entry.event_kind,
            lifecycle_state: entry.lifecycle_state,
            event_timestamp: entry.timestamp,
            path: entry.path,
            native_id: entry.native_id,
            item_id: None,
            item: None,
            origin: RecordOrigin::Audit,
        }
    }
}
