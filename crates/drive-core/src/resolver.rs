//! Item resolution
//!
//! Runs documents and item ids through the ordered factory chain. Parent
//! ids are resolved in a separate ancestry pass before the target item is
//! constructed, so an item is only ever produced once its attachment point
//! in the projected tree is known.

use std::collections::BTreeMap;

use drive_model::{ItemId, ProjectedItem};
use drive_repo::{Document, SYNC_ROOT_FACET, SharedRepository};

use crate::error::{Error, Result};
use crate::factory::{ActiveFactory, ActiveSet, FactoryContext, ItemFactory};
use crate::roots::SyncRootRegistry;

/// Where a document attaches in the projected tree.
enum Anchor {
    /// The document is itself an active root; its parent is the top-level
    /// folder.
    TopLevel,
    /// The document sits below an active root; its parent is an ordinary
    /// projected item.
    Parent(ItemId),
}

/// Resolves documents and item ids against one factory-chain snapshot.
pub struct ItemResolver<'a> {
    set: &'a ActiveSet,
    roots: &'a SyncRootRegistry,
}

impl<'a> ItemResolver<'a> {
    pub fn new(set: &'a ActiveSet, roots: &'a SyncRootRegistry) -> Self {
        Self { set, roots }
    }

    /// Whether a chain entry's predicate accepts the document.
    ///
    /// An entry with neither docType nor facet filter is general and
    /// accepts everything. The sync-root facet additionally requires an
    /// enabled subscription for the requesting principal, since the facet
    /// alone only records that the document was a root at some point.
    fn matches(&self, entry: &ActiveFactory, ctx: &FactoryContext<'_>, doc: &Document) -> bool {
        if entry.doc_type.is_none() && entry.facet.is_none() {
            return true;
        }
        if let Some(doc_type) = &entry.doc_type {
            if doc.doc_type == *doc_type {
                return true;
            }
        }
        if let Some(facet) = &entry.facet {
            if doc.has_facet(facet) {
                if facet == SYNC_ROOT_FACET {
                    return ctx.is_active_root(doc);
                }
                return true;
            }
        }
        false
    }

    /// Resolve a document into a projected item.
    ///
    /// `Ok(None)` means every matching factory filtered the document out,
    /// a normal outcome for versions, proxies, hidden or trashed
    /// documents. [`Error::RootlessItem`] means the document's ancestry
    /// never reaches one of the principal's active roots.
    pub fn resolve_document(
        &self,
        ctx: &FactoryContext<'_>,
        doc: &Document,
    ) -> Result<Option<ProjectedItem>> {
        let anchor = self.resolve_anchor(ctx, doc)?;
        let parent_id = match anchor {
            Anchor::TopLevel => self.set.top_level.top_level_id(),
            Anchor::Parent(id) => id,
        };
        self.resolve_in_chain(ctx, doc, &parent_id)
    }

    /// First matching factory that produces an item wins; factories that
    /// match but filter the document out pass resolution along the chain.
    fn resolve_in_chain(
        &self,
        ctx: &FactoryContext<'_>,
        doc: &Document,
        parent_id: &ItemId,
    ) -> Result<Option<ProjectedItem>> {
        for entry in &self.set.chain {
            if !self.matches(entry, ctx, doc) {
                continue;
            }
            if let Some(item) = entry.factory.item_for_document(ctx, doc, Some(parent_id))? {
                return Ok(Some(item));
            }
            tracing::debug!(
                factory = entry.name,
                native_id = doc.native_id,
                "Factory matched but filtered out document, continuing chain"
            );
        }
        Ok(None)
    }

    /// Ancestry pass: find where the document attaches.
    ///
    /// Walks native parent references up to the nearest enabled active
    /// root. Only the immediate parent's item id is materialized; the
    /// ancestors above it are existence-checked, never constructed.
    fn resolve_anchor(&self, ctx: &FactoryContext<'_>, doc: &Document) -> Result<Anchor> {
        if ctx.is_active_root(doc) {
            return Ok(Anchor::TopLevel);
        }
        let rootless = || Error::RootlessItem {
            native_id: doc.native_id.clone(),
            path: doc.path.clone(),
        };
        let parent = ctx
            .repository
            .get_parent(&doc.native_id)?
            .ok_or_else(rootless)?;

        let mut cursor = parent.clone();
        while !ctx.is_active_root(&cursor) {
            cursor = ctx
                .repository
                .get_parent(&cursor.native_id)?
                .ok_or_else(rootless)?;
        }

        let factory_name = if ctx.is_active_root(&parent) {
            self.set.sync_root_factory_name()
        } else {
            self.set
                .chain
                .iter()
                .find(|entry| self.matches(entry, ctx, &parent))
                .map(|entry| entry.name.as_str())
        };
        let factory_name = factory_name.ok_or_else(rootless)?;
        Ok(Anchor::Parent(ItemId::encode(
            factory_name,
            ctx.repository.name(),
            &parent.native_id,
        )))
    }

    /// Chain entry owning the given item id, `None` for the top-level
    /// folder's id.
    pub fn factory_for_id(&self, id: &str) -> Result<Option<&ActiveFactory>> {
        if self.set.top_level.can_handle_id(id) {
            return Ok(None);
        }
        let entry = self
            .set
            .chain
            .iter()
            .find(|entry| entry.factory.can_handle_id(id));
        match entry {
            Some(entry) => Ok(Some(entry)),
            None => {
                let decoded = ItemId::decode(id)?;
                Err(Error::UnknownFactory {
                    name: decoded.factory_name,
                })
            }
        }
    }

    /// Resolve an item id back into its projected item.
    ///
    /// `Ok(None)` means the id is well-formed and owned by a known factory
    /// but its document no longer exists or is filtered out now.
    pub fn resolve_id(
        &self,
        repositories: &BTreeMap<String, SharedRepository>,
        principal: &str,
        id: &str,
    ) -> Result<Option<ProjectedItem>> {
        let Some(entry) = self.factory_for_id(id)? else {
            let item = self.set.top_level.top_level_item(principal);
            return Ok(Some(ProjectedItem::Folder(item)));
        };

        let decoded = ItemId::decode(id)?;
        let repository = repositories
            .get(&decoded.repository_name)
            .ok_or_else(|| Error::UnknownRepository {
                name: decoded.repository_name.clone(),
            })?;

        let Some(doc) = repository.get_document(&decoded.native_id)? else {
            return Ok(None);
        };
        let ctx = FactoryContext {
            repository,
            roots: self.roots,
            principal,
            include_deleted: false,
        };
        let anchor = self.resolve_anchor(&ctx, &doc)?;
        let parent_id = match anchor {
            Anchor::TopLevel => self.set.top_level.top_level_id(),
            Anchor::Parent(id) => id,
        };
        entry.factory.item_for_document(&ctx, &doc, Some(&parent_id))
    }
}
