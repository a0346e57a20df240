//! Default document-backed factory
//!
//! Adapts ordinary repository documents: folderish documents become
//! folders, blob-carrying documents become files. Everything else is
//! filtered out.

use drive_model::{FileItem, FolderItem, ItemId, ItemInfo, ProjectedItem, download_url};
use drive_repo::{Document, HIDDEN_FACET};

use crate::error::Result;
use crate::factory::{FactoryContext, ItemFactory};

pub struct DefaultItemFactory {
    name: String,
}

impl DefaultItemFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn base_info(
        &self,
        ctx: &FactoryContext<'_>,
        doc: &Document,
        name: String,
        parent_id: Option<&ItemId>,
    ) -> Result<ItemInfo> {
        let can_rename = doc.permissions.write_properties;
        // Deleting needs Remove on the document and RemoveChildren on its
        // parent.
        let can_delete = doc.permissions.remove
            && ctx
                .repository
                .get_parent(&doc.native_id)?
                .map(|parent| parent.permissions.remove_children)
                .unwrap_or(doc.permissions.remove);
        Ok(ItemInfo {
            id: ItemId::encode(&self.name, ctx.repository.name(), &doc.native_id),
            parent_id: parent_id.cloned(),
            name,
            creator: doc.creator.clone(),
            created_at: doc.created_at,
            modified_at: doc.modified_at,
            can_rename,
            can_delete,
            can_move: can_delete,
        })
    }
}

impl ItemFactory for DefaultItemFactory {
    fn name(&self) -> &str {
        &self.name
    }

    /// A document is adaptable if it is not a version nor a proxy, not
    /// hidden in navigation, not trashed (unless `include_deleted`), is
    /// folderish or carries a blob, and is not itself an active
    /// synchronization root for the principal (those belong to the
    /// sync-root factory).
    fn adaptable(&self, ctx: &FactoryContext<'_>, doc: &Document) -> Result<bool> {
        if doc.is_version {
            tracing::debug!(native_id = %doc.native_id, "Document is a version, not adaptable");
            return Ok(false);
        }
        if doc.is_proxy {
            tracing::debug!(native_id = %doc.native_id, "Document is a proxy, not adaptable");
            return Ok(false);
        }
        if doc.has_facet(HIDDEN_FACET) {
            tracing::debug!(native_id = %doc.native_id, "Document is hidden in navigation, not adaptable");
            return Ok(false);
        }
        if !ctx.include_deleted && doc.is_trashed() {
            tracing::debug!(native_id = %doc.native_id, "Document is trashed, not adaptable");
            return Ok(false);
        }
        if !doc.is_folderish() && doc.blob.is_none() {
            tracing::debug!(
                native_id = %doc.native_id,
                "Document is neither folderish nor a blob holder, not adaptable"
            );
            return Ok(false);
        }
        if ctx.is_active_root(doc) {
            tracing::debug!(
                native_id = %doc.native_id,
                principal = ctx.principal,
                "Document is a registered synchronization root, left to the sync-root factory"
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn item_for_document(
        &self,
        ctx: &FactoryContext<'_>,
        doc: &Document,
        parent_id: Option<&ItemId>,
    ) -> Result<Option<ProjectedItem>> {
        if !self.adaptable(ctx, doc)? {
            return Ok(None);
        }
        let item = if doc.is_folderish() {
            let info = self.base_info(ctx, doc, doc.title.clone(), parent_id)?;
            ProjectedItem::Folder(FolderItem {
                can_create_child: doc.permissions.add_children,
                info,
            })
        } else {
            // adaptable() guarantees the blob is present here
            let Some(blob) = doc.blob.as_ref() else {
                return Ok(None);
            };
            let name = if blob.filename.is_empty() {
                doc.title.clone()
            } else {
                blob.filename.clone()
            };
            let info = self.base_info(ctx, doc, name.clone(), parent_id)?;
            let can_update = info.can_rename;
            ProjectedItem::File(FileItem {
                download_url: download_url(ctx.repository.name(), &doc.native_id, &name),
                digest_algorithm: Some(blob.digest_algorithm.clone()),
                digest: Some(blob.digest.clone()),
                can_update,
                info,
            })
        };
        Ok(Some(item))
    }
}
