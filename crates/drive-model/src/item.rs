//! File/folder-shaped projection of repository documents
//!
//! These are the value types handed to synchronization clients. They carry
//! no live repository handle: children listing and content transfer are
//! operations on the engine, keyed by the item id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// Attributes common to every projected item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Composite id, see [`ItemId`]
    pub id: ItemId,
    /// Id of the parent item, `None` only for the top-level folder
    pub parent_id: Option<ItemId>,
    /// Display name, for files the blob filename
    pub name: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub can_rename: bool,
    pub can_delete: bool,
    pub can_move: bool,
}

/// A repository document projected as a downloadable file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    #[serde(flatten)]
    pub info: ItemInfo,
    /// Digest algorithm, `None` when the blob has no digest
    pub digest_algorithm: Option<String>,
    pub digest: Option<String>,
    /// Relative locator used by clients to fetch the blob content
    pub download_url: String,
    pub can_update: bool,
}

/// A repository document projected as a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderItem {
    #[serde(flatten)]
    pub info: ItemInfo,
    pub can_create_child: bool,
}

/// A projected item exposed to synchronization clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProjectedItem {
    File(FileItem),
    Folder(FolderItem),
}

impl ProjectedItem {
    pub fn info(&self) -> &ItemInfo {
        match self {
            ProjectedItem::File(file) => &file.info,
            ProjectedItem::Folder(folder) => &folder.info,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.info().id
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ProjectedItem::Folder(_))
    }

    /// The folder variant, if this item is one.
    pub fn as_folder(&self) -> Option<&FolderItem> {
        match self {
            ProjectedItem::Folder(folder) => Some(folder),
            ProjectedItem::File(_) => None,
        }
    }

    /// The file variant, if this item is one.
    pub fn as_file(&self) -> Option<&FileItem> {
        match self {
            ProjectedItem::File(file) => Some(file),
            ProjectedItem::Folder(_) => None,
        }
    }
}

/// Build the relative download locator for a file projection.
///
/// Format: `nxbigfile/<repository>/<nativeId>/blobholder:0/<encoded name>`.
pub fn download_url(repository_name: &str, native_id: &str, name: &str) -> String {
    format!(
        "nxbigfile/{}/{}/blobholder:0/{}",
        repository_name,
        native_id,
        urlencoding::encode(name)
    )
}
