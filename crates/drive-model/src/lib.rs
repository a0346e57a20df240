//! Projected item model and identifier codec for drive-sync
//!
//! This crate is the leaf of the workspace: the file/folder value types
//! exposed to synchronization clients and the composite id codec that ties
//! an item back to the factory and repository that produced it.

pub mod error;
pub mod id;
pub mod item;

pub use error::{Error, Result};
pub use id::{DecodedId, ItemId};
pub use item::{FileItem, FolderItem, ItemInfo, ProjectedItem, download_url};
