//! Projection and change-feed engine for drive-sync
//!
//! This crate turns repository documents into the virtual filesystem view
//! desktop clients synchronize against, and computes the incremental
//! change feed they poll:
//!
//! - **Factory chain**: ordered, configurable document-to-item adaptation
//! - **Resolver**: id and document resolution with explicit ancestry
//! - **Root registry**: per-principal synchronization root subscriptions
//! - **Change feed**: audit-window replay plus root-set diffing
//!
//! # Architecture
//!
//! `drive-core` sits above the model and repository crates:
//!
//! ```text
//!        clients / transport
//!                |
//!           drive-core
//!            |       |
//!      drive-model drive-repo
//! ```
//!
//! # Example
//!
//! ```ignore
//! use drive_core::{Checkpoint, ProjectionConfig, SyncEngine};
//!
//! let mut engine = SyncEngine::new(&ProjectionConfig::default())?;
//! engine.add_repository(repository);
//! engine.register_root("alice", "default", "folder-id")?;
//! let summary = engine.get_change_summary("alice", &Checkpoint::initial())?;
//! ```

pub mod changes;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod resolver;
pub mod roots;

pub use changes::{AuditChangeFinder, ChangeRecord, ChangeSummary, Checkpoint, RecordOrigin};
pub use config::ProjectionConfig;
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use factory::{FactoryContribution, FactoryKind, FactoryRegistry, ItemFactory};
pub use resolver::ItemResolver;
pub use roots::SyncRootRegistry;
