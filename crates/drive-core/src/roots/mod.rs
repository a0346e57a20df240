//! Synchronization root tracking.
//!
//! A sync root is a folderish document a principal has subscribed to. The
//! registry keeps the per-principal subscription state; the definitions
//! codec serializes the active set into the compact checkpoint form.

mod definitions;
mod registry;

pub use definitions::{parse_root_definitions, serialize_root_definitions};
pub use registry::SyncRootRegistry;
