//! In-memory repository backend
//!
//! Reference implementation of [`Repository`] holding documents and the
//! audit trail in process memory. It backs the integration test suite and
//! small deployments without an external document store.
//!
//! Event timestamps are forced strictly monotonic so the audit trail has a
//! total order even when mutations land within the clock granularity.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::audit::{AuditEntry, EventKind};
use crate::document::{
    BlobInfo, DEFAULT_STATE, DELETED_STATE, Document, FOLDERISH_FACET, Permissions,
    SYNC_ROOT_FACET,
};
use crate::error::{Error, Result};
use crate::repository::Repository;

/// Native id of the repository root document.
pub const ROOT_ID: &str = "root";

struct AuditRow {
    seq: u64,
    entry: AuditEntry,
}

struct Inner {
    docs: HashMap<String, Document>,
    audit: Vec<AuditRow>,
    next_seq: u64,
    next_doc: u64,
    last_timestamp: DateTime<Utc>,
}

/// In-memory [`Repository`] with a mutation API that mirrors a document
/// store: every mutation appends the matching audit entry.
pub struct MemoryRepository {
    name: String,
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    /// Create an empty repository containing only the root document.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        let root = Document {
            native_id: ROOT_ID.to_string(),
            doc_type: "Root".to_string(),
            facets: vec![FOLDERISH_FACET.to_string()],
            path: "/".to_string(),
            title: "/".to_string(),
            lifecycle_state: DEFAULT_STATE.to_string(),
            creator: "system".to_string(),
            created_at: now,
            modified_at: now,
            parent_id: None,
            blob: None,
            permissions: Permissions::all(),
            is_version: false,
            is_proxy: false,
        };
        let mut docs = HashMap::new();
        docs.insert(ROOT_ID.to_string(), root);
        Self {
            name: name.into(),
            inner: RwLock::new(Inner {
                docs,
                audit: Vec::new(),
                next_seq: 0,
                next_doc: 0,
                last_timestamp: now,
            }),
        }
    }

    /// Create a folderish document under the given parent.
    pub fn create_folder(&self, parent_id: &str, name: &str) -> Result<Document> {
        self.create_document(parent_id, name, "Folder", vec![FOLDERISH_FACET.to_string()], None)
    }

    /// Create a file document with blob content under the given parent.
    pub fn create_file(&self, parent_id: &str, name: &str, content: &str) -> Result<Document> {
        let blob = BlobInfo {
            filename: name.to_string(),
            digest: sha256_hex(content),
            digest_algorithm: "sha256".to_string(),
            length: content.len() as u64,
        };
        self.create_document(parent_id, name, "File", Vec::new(), Some(blob))
    }

    /// Replace a file's blob content, logging a `Modified` event.
    pub fn update_content(&self, native_id: &str, content: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let doc = inner
            .docs
            .get_mut(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        let filename = doc
            .blob
            .as_ref()
            .map(|b| b.filename.clone())
            .unwrap_or_else(|| doc.title.clone());
        doc.blob = Some(BlobInfo {
            filename,
            digest: sha256_hex(content),
            digest_algorithm: "sha256".to_string(),
            length: content.len() as u64,
        });
        doc.modified_at = ts;
        let (path, id) = (doc.path.clone(), doc.native_id.clone());
        inner.log(self.name.clone(), EventKind::Modified, None, ts, path, id);
        Ok(())
    }

    /// Move a document (and its subtree) under a new parent, logging a
    /// `Moved` event with the new path.
    pub fn move_document(&self, native_id: &str, new_parent_id: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let parent_path = inner
            .docs
            .get(new_parent_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: new_parent_id.to_string(),
            })?
            .path
            .clone();
        let doc = inner
            .docs
            .get(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        let old_path = doc.path.clone();
        let leaf = doc.title.clone();
        let new_path = join_path(&parent_path, &leaf);

        // Re-root the moved document and every descendant path.
        let old_prefix = format!("{old_path}/");
        for other in inner.docs.values_mut() {
            if other.native_id == native_id {
                other.path = new_path.clone();
                other.parent_id = Some(new_parent_id.to_string());
                other.modified_at = ts;
            } else if other.path.starts_with(&old_prefix) {
                other.path = format!("{}/{}", new_path, &other.path[old_prefix.len()..]);
            }
        }
        inner.log(
            self.name.clone(),
            EventKind::Moved,
            None,
            ts,
            new_path,
            native_id.to_string(),
        );
        Ok(())
    }

    /// Physically remove a document and its subtree, logging a single
    /// `Deleted` event for the removed document.
    pub fn remove_document(&self, native_id: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let doc = inner
            .docs
            .remove(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        let prefix = format!("{}/", doc.path);
        inner.docs.retain(|_, d| !d.path.starts_with(&prefix));
        inner.log(
            self.name.clone(),
            EventKind::Deleted,
            None,
            ts,
            doc.path,
            doc.native_id,
        );
        Ok(())
    }

    /// Follow a lifecycle transition (`delete` trashes, `undelete`
    /// restores), logging a `LifecycleTransition` event.
    pub fn follow_transition(&self, native_id: &str, transition: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let doc = inner
            .docs
            .get_mut(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        let new_state = match (transition, doc.lifecycle_state.as_str()) {
            ("delete", s) if s != DELETED_STATE => DELETED_STATE,
            ("undelete", DELETED_STATE) => DEFAULT_STATE,
            (_, state) => {
                return Err(Error::InvalidTransition {
                    transition: transition.to_string(),
                    state: state.to_string(),
                });
            }
        };
        doc.lifecycle_state = new_state.to_string();
        doc.modified_at = ts;
        let (path, id) = (doc.path.clone(), doc.native_id.clone());
        inner.log(
            self.name.clone(),
            EventKind::LifecycleTransition,
            Some(new_state.to_string()),
            ts,
            path,
            id,
        );
        Ok(())
    }

    /// Override the principal's permissions on a document.
    pub fn set_permissions(&self, native_id: &str, permissions: Permissions) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let doc = inner
            .docs
            .get_mut(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        doc.permissions = permissions;
        Ok(())
    }

    /// Append an audit entry with an explicit timestamp. Test hook for
    /// timestamp-collision scenarios; does not advance the monotonic clock.
    pub fn record_at(
        &self,
        native_id: &str,
        event_kind: EventKind,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let path = inner
            .docs
            .get(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?
            .path
            .clone();
        inner.log(
            self.name.clone(),
            event_kind,
            None,
            timestamp,
            path,
            native_id.to_string(),
        );
        Ok(())
    }

    fn create_document(
        &self,
        parent_id: &str,
        name: &str,
        doc_type: &str,
        facets: Vec<String>,
        blob: Option<BlobInfo>,
    ) -> Result<Document> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let parent = inner
            .docs
            .get(parent_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: parent_id.to_string(),
            })?;
        if !parent.is_folderish() {
            return Err(Error::NotFolderish {
                native_id: parent_id.to_string(),
            });
        }
        let path = join_path(&parent.path, name);
        inner.next_doc += 1;
        let doc = Document {
            native_id: format!("doc-{}", inner.next_doc),
            doc_type: doc_type.to_string(),
            facets,
            path: path.clone(),
            title: name.to_string(),
            lifecycle_state: DEFAULT_STATE.to_string(),
            creator: "system".to_string(),
            created_at: ts,
            modified_at: ts,
            parent_id: Some(parent_id.to_string()),
            blob,
            permissions: Permissions::all(),
            is_version: false,
            is_proxy: false,
        };
        inner.docs.insert(doc.native_id.clone(), doc.clone());
        inner.log(
            self.name.clone(),
            EventKind::Created,
            None,
            ts,
            path,
            doc.native_id.clone(),
        );
        Ok(doc)
    }
}

impl Inner {
    /// Next event timestamp, strictly after every previously issued one.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = if now <= self.last_timestamp {
            self.last_timestamp + Duration::microseconds(1)
        } else {
            now
        };
        self.last_timestamp = ts;
        ts
    }

    fn log(
        &mut self,
        repository_id: String,
        event_kind: EventKind,
        lifecycle_state: Option<String>,
        timestamp: DateTime<Utc>,
        path: String,
        native_id: String,
    ) {
        self.next_seq += 1;
        self.audit.push(AuditRow {
            seq: self.next_seq,
            entry: AuditEntry {
                repository_id,
                event_kind,
                lifecycle_state,
                timestamp,
                path,
                native_id,
            },
        });
    }
}

impl Repository for MemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_document(&self, native_id: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.docs.get(native_id).cloned())
    }

    fn get_parent(&self, native_id: &str) -> Result<Option<Document>> {
        let inner = self.inner.read().unwrap();
        let doc = inner
            .docs
            .get(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        Ok(doc
            .parent_id
            .as_ref()
            .and_then(|pid| inner.docs.get(pid))
            .cloned())
    }

    fn get_children(&self, native_id: &str) -> Result<Vec<Document>> {
        let inner = self.inner.read().unwrap();
        let doc = inner
            .docs
            .get(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        if !doc.is_folderish() {
            return Err(Error::NotFolderish {
                native_id: native_id.to_string(),
            });
        }
        let mut children: Vec<Document> = inner
            .docs
            .values()
            .filter(|d| d.parent_id.as_deref() == Some(native_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children)
    }

    fn query_modified(
        &self,
        root_path_prefixes: &[String],
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<&AuditRow> = inner
            .audit
            .iter()
            .filter(|row| {
                row.entry.timestamp > since
                    && row.entry.timestamp <= until
                    && root_path_prefixes
                        .iter()
                        .any(|prefix| path_under(&row.entry.path, prefix))
            })
            .collect();
        rows.sort_by(|a, b| {
            b.entry
                .timestamp
                .cmp(&a.entry.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        rows.truncate(limit);
        Ok(rows.into_iter().map(|row| row.entry.clone()).collect())
    }

    fn touch(&self, native_id: &str, event_kind: EventKind) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let path = inner
            .docs
            .get(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?
            .path
            .clone();
        inner.log(
            self.name.clone(),
            event_kind,
            None,
            ts,
            path,
            native_id.to_string(),
        );
        Ok(())
    }

    fn record_subscription_change(&self, native_id: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let ts = inner.tick();
        let doc = inner
            .docs
            .get_mut(native_id)
            .ok_or_else(|| Error::DocumentNotFound {
                native_id: native_id.to_string(),
            })?;
        if !doc.has_facet(SYNC_ROOT_FACET) {
            doc.facets.push(SYNC_ROOT_FACET.to_string());
        }
        doc.modified_at = ts;
        let (path, id) = (doc.path.clone(), doc.native_id.clone());
        inner.log(self.name.clone(), EventKind::Modified, None, ts, path, id);
        Ok(())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// True when `path` equals `prefix` or lies inside the subtree below it.
fn path_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
