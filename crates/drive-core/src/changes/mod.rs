//! Incremental change feed
//!
//! Turns audit trail rows and root-set diffs into the ordered change list
//! clients poll for, together with the checkpoint to hand back on the next
//! poll.

mod finder;
mod record;
mod summary;

pub use finder::AuditChangeFinder;
pub use record::{ChangeRecord, RecordOrigin};
pub use summary::{ChangeSummary, Checkpoint};
