//! Synchronization engine
//!
//! Ties the repositories, the factory chain, the root registry and the
//! audit change finder together behind the operations clients call:
//! browsing the projected tree, managing root subscriptions, and polling
//! the incremental change feed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use drive_model::{ItemId, ProjectedItem};
use drive_repo::{EventKind, SharedRepository};

use crate::changes::{AuditChangeFinder, ChangeRecord, ChangeSummary, Checkpoint, RecordOrigin};
use crate::config::ProjectionConfig;
use crate::error::{Error, Result};
use crate::factory::{ActiveSet, FactoryContext, FactoryRegistry, ItemFactory};
use crate::resolver::ItemResolver;
use crate::roots::{SyncRootRegistry, parse_root_definitions, serialize_root_definitions};

pub struct SyncEngine {
    repositories: BTreeMap<String, SharedRepository>,
    roots: Arc<SyncRootRegistry>,
    registry: Arc<FactoryRegistry>,
    finder: AuditChangeFinder,
}

impl SyncEngine {
    pub fn new(config: &ProjectionConfig) -> Result<Self> {
        Ok(Self {
            repositories: BTreeMap::new(),
            roots: Arc::new(SyncRootRegistry::new()),
            registry: Arc::new(FactoryRegistry::from_config(config)?),
            finder: AuditChangeFinder::new(config.change_limit),
        })
    }

    pub fn add_repository(&mut self, repository: SharedRepository) {
        tracing::debug!(repository = repository.name(), "Attached repository");
        self.repositories
            .insert(repository.name().to_string(), repository);
    }

    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    pub fn roots(&self) -> &SyncRootRegistry {
        &self.roots
    }

    fn repository(&self, name: &str) -> Result<&SharedRepository> {
        self.repositories
            .get(name)
            .ok_or_else(|| Error::UnknownRepository {
                name: name.to_string(),
            })
    }

    /// The synthetic root of the principal's projected tree.
    pub fn top_level_folder(&self, principal: &str) -> ProjectedItem {
        ProjectedItem::Folder(self.registry.active().top_level.top_level_item(principal))
    }

    /// Resolve an item id for a principal. `Ok(None)` when the document
    /// behind a well-formed id no longer exists or is filtered out.
    pub fn resolve_item(&self, principal: &str, id: &str) -> Result<Option<ProjectedItem>> {
        let active = self.registry.active();
        let resolver = ItemResolver::new(&active, &self.roots);
        resolver.resolve_id(&self.repositories, principal, id)
    }

    /// Children of a folder item. For the top-level folder these are the
    /// principal's active roots; for any other folder, its resolvable
    /// child documents.
    pub fn list_children(&self, principal: &str, id: &str) -> Result<Vec<ProjectedItem>> {
        let active = self.registry.active();
        let resolver = ItemResolver::new(&active, &self.roots);

        if active.top_level.can_handle_id(id) {
            return self.resolve_active_roots(&resolver, principal);
        }

        let decoded = ItemId::decode(id)?;
        let repository = self.repository(&decoded.repository_name)?;
        let doc = repository
            .get_document(&decoded.native_id)?
            .ok_or_else(|| drive_repo::Error::DocumentNotFound {
                native_id: decoded.native_id.clone(),
            })?;
        if !doc.is_folderish() {
            return Err(Error::NotAFolder { id: id.to_string() });
        }

        let ctx = FactoryContext {
            repository,
            roots: &self.roots,
            principal,
            include_deleted: false,
        };
        let mut children = Vec::new();
        for child in repository.get_children(&decoded.native_id)? {
            match resolver.resolve_document(&ctx, &child) {
                Ok(Some(item)) => children.push(item),
                Ok(None) => {}
                Err(Error::RootlessItem { native_id, .. }) => {
                    tracing::warn!(native_id, "Skipping rootless child");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(children)
    }

    fn resolve_active_roots(
        &self,
        resolver: &ItemResolver<'_>,
        principal: &str,
    ) -> Result<Vec<ProjectedItem>> {
        let mut items = Vec::new();
        for (repository_name, native_ids) in self.roots.active_roots(principal) {
            let Some(repository) = self.repositories.get(&repository_name) else {
                tracing::warn!(
                    repository = repository_name,
                    "Skipping roots of unknown repository"
                );
                continue;
            };
            let ctx = FactoryContext {
                repository,
                roots: &self.roots,
                principal,
                include_deleted: false,
            };
            for native_id in native_ids {
                let Some(doc) = repository.get_document(&native_id)? else {
                    continue;
                };
                if let Some(item) = resolver.resolve_document(&ctx, &doc)? {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }

    /// Subscribe a principal to a folder as a synchronization root.
    ///
    /// Returns `true` when the subscription state changed. A state change
    /// marks the document and leaves an audit entry, so the feed reports
    /// the new root both through the audit window and the root diff.
    pub fn register_root(
        &self,
        principal: &str,
        repository_name: &str,
        native_id: &str,
    ) -> Result<bool> {
        let repository = self.repository(repository_name)?;
        let doc = repository.get_document(native_id)?.ok_or_else(|| {
            drive_repo::Error::DocumentNotFound {
                native_id: native_id.to_string(),
            }
        })?;
        if !doc.is_folderish() {
            return Err(Error::NotAFolder {
                id: native_id.to_string(),
            });
        }
        let changed = self.roots.register(principal, repository_name, native_id);
        if changed {
            repository.record_subscription_change(native_id)?;
        }
        Ok(changed)
    }

    /// Drop a principal's root subscription.
    ///
    /// The document itself is untouched; the next poll reports the root as
    /// deleted through the root diff.
    pub fn unregister_root(
        &self,
        principal: &str,
        repository_name: &str,
        native_id: &str,
    ) -> Result<bool> {
        let repository = self.repository(repository_name)?;
        let changed = self.roots.unregister(principal, repository_name, native_id);
        if changed && repository.get_document(native_id)?.is_some() {
            repository.touch(native_id, EventKind::Modified)?;
        }
        Ok(changed)
    }

    /// Poll the incremental change feed.
    ///
    /// Computes the root diff against the checkpoint's serialized root
    /// set, replays the audit window `(checkpoint, now]` under the current
    /// roots, resolves every surviving record, and returns the merged list
    /// newest first together with the next checkpoint.
    pub fn get_change_summary(
        &self,
        principal: &str,
        checkpoint: &Checkpoint,
    ) -> Result<ChangeSummary> {
        let now = Utc::now();
        let active = self.registry.active();
        let resolver = ItemResolver::new(&active, &self.roots);

        let current_roots = self.roots.active_roots(principal);
        let root_definitions = serialize_root_definitions(&current_roots);
        let previous_roots = parse_root_definitions(&checkpoint.root_definitions);
        let next_checkpoint = Checkpoint::new(now, root_definitions);

        // Root diff against the final state of the window: a root both
        // registered and unregistered since the last poll nets to nothing.
        let mut records = Vec::new();
        for (repository_name, native_ids) in &current_roots {
            let previously = previous_roots.get(repository_name);
            for native_id in native_ids {
                if previously.is_none_or(|ids| !ids.contains(native_id)) {
                    records.extend(self.new_root_record(
                        &active,
                        &resolver,
                        principal,
                        repository_name,
                        native_id,
                        now,
                    )?);
                }
            }
        }
        for (repository_name, native_ids) in &previous_roots {
            let currently = current_roots.get(repository_name);
            for native_id in native_ids {
                if currently.is_none_or(|ids| !ids.contains(native_id)) {
                    records.push(self.removed_root_record(
                        &active,
                        repository_name,
                        native_id,
                        now,
                    )?);
                }
            }
        }

        // Audit window under the current roots.
        let audit_records = match self.finder.find_changes(
            &self.repositories,
            &current_roots,
            checkpoint.timestamp,
            now,
        ) {
            Ok(rows) => rows,
            Err(Error::TooManyChanges { limit }) => {
                tracing::warn!(principal, limit, "Change window saturated");
                return Ok(ChangeSummary {
                    changes: Vec::new(),
                    checkpoint: next_checkpoint,
                    too_many_changes: true,
                });
            }
            Err(e) => return Err(e),
        };
        for mut record in audit_records {
            self.resolve_record(&resolver, principal, &active, &mut record)?;
            records.push(record);
        }

        // Newest first; root-diff records win timestamp ties so clients
        // apply subscription changes before ordinary edits.
        records.sort_by(|a, b| {
            b.event_timestamp
                .cmp(&a.event_timestamp)
                .then_with(|| origin_rank(a.origin).cmp(&origin_rank(b.origin)))
                .then_with(|| a.repository_id.cmp(&b.repository_id))
                .then_with(|| a.native_id.cmp(&b.native_id))
        });

        Ok(ChangeSummary {
            changes: records,
            checkpoint: next_checkpoint,
            too_many_changes: false,
        })
    }

    /// Synthesized record for a newly registered root. A root whose
    /// document vanished before the poll produces nothing; the audit
    /// window already carries its deletion.
    fn new_root_record(
        &self,
        active: &ActiveSet,
        resolver: &ItemResolver<'_>,
        principal: &str,
        repository_name: &str,
        native_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<Option<ChangeRecord>> {
        let repository = self.repository(repository_name)?;
        let Some(doc) = repository.get_document(native_id)? else {
            return Ok(None);
        };
        let ctx = FactoryContext {
            repository,
            roots: &self.roots,
            principal,
            include_deleted: false,
        };
        let item = resolver.resolve_document(&ctx, &doc)?;
        let item_id = item
            .as_ref()
            .map(|i| i.id().clone())
            .or_else(|| encode_with(active.sync_root_factory_name(), repository_name, native_id));
        Ok(Some(ChangeRecord {
            repository_id: repository_name.to_string(),
            event_kind: EventKind::Modified,
            lifecycle_state: None,
            event_timestamp: now,
            path: doc.path,
            native_id: native_id.to_string(),
            item_id,
            item,
            origin: RecordOrigin::RootDiff,
        }))
    }

    /// Synthesized deletion record for an unregistered root. Shaped like a
    /// document deletion so clients drop the subtree the same way.
    fn removed_root_record(
        &self,
        active: &ActiveSet,
        repository_name: &str,
        native_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<ChangeRecord> {
        let path = match self.repositories.get(repository_name) {
            Some(repository) => repository
                .get_document(native_id)?
                .map(|doc| doc.path)
                .unwrap_or_default(),
            None => String::new(),
        };
        Ok(ChangeRecord {
            repository_id: repository_name.to_string(),
            event_kind: EventKind::Deleted,
            lifecycle_state: None,
            event_timestamp: now,
            path,
            native_id: native_id.to_string(),
            item_id: encode_with(active.sync_root_factory_name(), repository_name, native_id),
            item: None,
            origin: RecordOrigin::RootDiff,
        })
    }

    /// Attach the resolved item to an audit record, or reshape it as a
    /// deletion when the document is gone, filtered out, or rootless now.
    /// Trashed documents land here too: the trash transition surfaces to
    /// clients as a deletion.
    fn resolve_record(
        &self,
        resolver: &ItemResolver<'_>,
        principal: &str,
        active: &ActiveSet,
        record: &mut ChangeRecord,
    ) -> Result<()> {
        let repository = self.repository(&record.repository_id)?;
        let ctx = FactoryContext {
            repository,
            roots: &self.roots,
            principal,
            include_deleted: false,
        };
        let resolved = match repository.get_document(&record.native_id)? {
            Some(doc) => match resolver.resolve_document(&ctx, &doc) {
                Ok(resolved) => resolved,
                Err(Error::RootlessItem { native_id, .. }) => {
                    tracing::warn!(native_id, "Audit record no longer under any root");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };
        match resolved {
            Some(item) => {
                record.item_id = Some(item.id().clone());
                record.item = Some(item);
            }
            None => {
                record.event_kind = EventKind::Deleted;
                record.item = None;
                record.item_id = encode_with(
                    active.default_factory_name(),
                    &record.repository_id,
                    &record.native_id,
                );
            }
        }
        Ok(())
    }
}

fn origin_rank(origin: RecordOrigin) -> u8 {
    match origin {
        RecordOrigin::RootDiff => 0,
        RecordOrigin::Audit => 1,
    }
}

fn encode_with(factory_name: Option<&str>, repository: &str, native_id: &str) -> Option<ItemId> {
    factory_name.map(|name| ItemId::encode(name, repository, native_id))
}
