//! Item factories
//!
//! A factory turns repository documents into projected items. Factories
//! are contributed through ordered, named configuration entries and
//! resolved through the chain in [`crate::resolver`].

mod contribution;
mod default_item;
mod registry;
mod sync_root;
mod top_level;

pub use contribution::{FactoryContribution, FactoryKind};
pub use default_item::DefaultItemFactory;
pub use registry::{ActiveFactory, ActiveSet, FactoryRegistry};
pub use sync_root::SyncRootItemFactory;
pub use top_level::{TOP_LEVEL_FOLDER_NAME, TopLevelItemFactory};

use drive_model::{ItemId, ProjectedItem};
use drive_repo::{Document, SharedRepository};

use crate::error::Result;
use crate::roots::SyncRootRegistry;

/// Explicit dependencies handed to a factory for one resolution call.
///
/// Factories never look up services ambiently; everything they need is
/// carried here.
pub struct FactoryContext<'a> {
    /// Repository the document being resolved lives in
    pub repository: &'a SharedRepository,
    pub roots: &'a SyncRootRegistry,
    /// Name of the requesting user
    pub principal: &'a str,
    /// Adapt documents in the trashed lifecycle state too
    pub include_deleted: bool,
}

impl FactoryContext<'_> {
    /// Whether the document is an enabled, active synchronization root
    /// subscription for the requesting principal.
    pub fn is_active_root(&self, doc: &Document) -> bool {
        self.roots
            .is_active_root(self.principal, self.repository.name(), &doc.native_id)
    }
}

/// A named predicate+constructor pair turning documents into projected
/// items.
pub trait ItemFactory: Send + Sync {
    /// Contributed name; becomes the first segment of produced item ids.
    fn name(&self) -> &str;

    /// Whether this factory produced the given item id.
    fn can_handle_id(&self, id: &str) -> bool {
        ItemId::decode(id).is_ok_and(|decoded| decoded.factory_name == self.name())
    }

    /// Factory-specific predicate: can this document be adapted at all?
    /// A `false` here is a normal filtering outcome, never an error.
    fn adaptable(&self, ctx: &FactoryContext<'_>, doc: &Document) -> Result<bool>;

    /// Construct the projected item for a document whose parent item id
    /// has already been resolved. Returns `Ok(None)` when [`Self::adaptable`]
    /// rejects the document.
    fn item_for_document(
        &self,
        ctx: &FactoryContext<'_>,
        doc: &Document,
        parent_id: Option<&ItemId>,
    ) -> Result<Option<ProjectedItem>>;
}
