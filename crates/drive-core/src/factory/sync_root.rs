//! Synchronization-root factory
//!
//! Adapts the folders a user has registered as synchronization roots.
//! Roots sit directly under the top-level folder, can never be moved, and
//! are "deleted" by unregistering the subscription rather than trashing
//! the document.

use drive_model::{FolderItem, ItemId, ItemInfo, ProjectedItem};
use drive_repo::Document;

use crate::error::Result;
use crate::factory::{FactoryContext, ItemFactory};

pub struct SyncRootItemFactory {
    name: String,
}

impl SyncRootItemFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ItemFactory for SyncRootItemFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn adaptable(&self, ctx: &FactoryContext<'_>, doc: &Document) -> Result<bool> {
        if !doc.is_folderish() {
            return Ok(false);
        }
        if !ctx.include_deleted && doc.is_trashed() {
            return Ok(false);
        }
        Ok(ctx.is_active_root(doc))
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
        Ok(Some(ProjectedItem::Folder(FolderItem {
            info: ItemInfo {
                id: ItemId::encode(&self.name, ctx.repository.name(), &doc.native_id),
                parent_id: parent_id.cloned(),
                name: doc.title.clone(),
                creator: doc.creator.clone(),
                created_at: doc.created_at,
                modified_at: doc.modified_at,
                can_rename: doc.permissions.write_properties,
                // Deletion is implemented as unregistration, always allowed
                can_delete: true,
                can_move: false,
            },
            can_create_child: doc.permissions.add_children,
        })))
    }
}
