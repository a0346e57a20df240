use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use drive_repo::SharedRepository;

use crate::changes::ChangeRecord;
use crate::error::{Error, Result};

/// Queries repository audit trails for a change window.
pub struct AuditChangeFinder {
    limit: usize,
}

impl AuditChangeFinder {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Audit rows across all repositories with active roots, for the
    /// half-open window `(since, until]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyChanges`] as soon as the combined row count
    /// reaches the configured limit. No partial list is ever returned:
    /// callers fold this into an empty summary with the flag set.
    pub fn find_changes(
        &self,
        repositories: &BTreeMap<String, SharedRepository>,
        roots_by_repository: &BTreeMap<String, BTreeSet<String>>,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ChangeRecord>> {
        let mut records: Vec<ChangeRecord> = Vec::new();
        for (repository_name, native_ids) in roots_by_repository {
            let Some(repository) = repositories.get(repository_name) else {
                tracing::warn!(
                    repository = repository_name,
                    "Skipping roots of unknown repository"
                );
                continue;
            };
            let prefixes = root_path_prefixes(repository, native_ids)?;
            if prefixes.is_empty() {
                continue;
            }
            let rows = repository.query_modified(&prefixes, since, until, self.limit)?;
            tracing::debug!(
                repository = repository_name,
                rows = rows.len(),
                "Queried audit window"
            );
            records.extend(rows.into_iter().map(ChangeRecord::from_audit));
            if records.len() >= self.limit {
                return Err(Error::TooManyChanges { limit: self.limit });
            }
        }
        // Newest first; repository then document id break timestamp ties
        // deterministically.
        records.sort_by(|a, b| {
            b.event_timestamp
                .cmp(&a.event_timestamp)
                .then_with(|| a.repository_id.cmp(&b.repository_id))
                .then_with(|| a.native_id.cmp(&b.native_id))
        });
        Ok(records)
    }
}

/// Current paths of the given root documents. Roots whose document no
/// longer exists contribute no prefix.
fn root_path_prefixes(
    repository: &SharedRepository,
    native_ids: &BTreeSet<String>,
) -> Result<Vec<String>> {
    let mut prefixes = Vec::new();
    for native_id in native_ids {
        if let Some(doc) = repository.get_document(native_id)? {
            prefixes.push(doc.path);
        }
    }
    Ok(prefixes)
}
