//! Top-level folder factory
//!
//! Produces the synthetic root of every user's projected tree. Its items
//! are not backed by any document, so its id uses the special
//! `"<name>/"` shape instead of the three-segment codec pattern.

use chrono::{DateTime, Utc};
use drive_model::{FolderItem, ItemId, ItemInfo, ProjectedItem};
use drive_repo::Document;

use crate::error::Result;
use crate::factory::{FactoryContext, ItemFactory};

/// Display name of the synthetic top-level folder.
pub const TOP_LEVEL_FOLDER_NAME: &str = "Synchronized folders";

pub struct TopLevelItemFactory {
    name: String,
}

impl TopLevelItemFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Id of the synthetic top-level folder.
    pub fn top_level_id(&self) -> ItemId {
        ItemId::top_level(&self.name)
    }

    /// The synthetic top-level folder for a user. Read-only: its children
    /// are the user's active synchronization roots.
    pub fn top_level_item(&self, principal: &str) -> FolderItem {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        FolderItem {
            info: ItemInfo {
                id: self.top_level_id(),
                parent_id: None,
                name: TOP_LEVEL_FOLDER_NAME.to_string(),
                creator: principal.to_string(),
                created_at: epoch,
                modified_at: epoch,
                can_rename: false,
                can_delete: false,
                can_move: false,
            },
            can_create_child: false,
        }
    }
}

impl ItemFactory for TopLevelItemFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle_id(&self, id: &str) -> bool {
        id == format!("{}/", self.name)
    }

    fn adaptable(&self, _ctx: &FactoryContext<'_>, _doc: &Document) -> Result<bool> {
        // Never matches ordinary repository documents.
        Ok(false)
    }

    fn item_for_document(
        &self,
        _ctx: &FactoryContext<'_>,
        _doc: &Document,
        _parent_id: Option<&ItemId>,
    ) -> Result<Option<ProjectedItem>> {
        Ok(None)
    }
}
