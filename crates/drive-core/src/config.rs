//! Projection configuration
//!
//! TOML-backed settings for the engine: the change-feed limit and the
//! factory contribution list. A file that lists no `[[factory]]` tables
//! gets the built-in top-level, sync-root and default contributions.

use std::path::Path;

use drive_repo::SYNC_ROOT_FACET;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::factory::{FactoryContribution, FactoryKind};

fn default_change_limit() -> usize {
    1000
}

/// Built-in factory contributions, in chain order.
pub fn default_contributions() -> Vec<FactoryContribution> {
    vec![
        FactoryContribution::new("topLevelFolderFactory", FactoryKind::TopLevel, 0),
        FactoryContribution::new("syncRootFolderFactory", FactoryKind::SyncRoot, 10)
            .with_facet(SYNC_ROOT_FACET),
        FactoryContribution::new("defaultItemFactory", FactoryKind::Default, 50),
    ]
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Audit rows at which a poll reports `too_many_changes` instead of a
    /// change list.
    #[serde(default = "default_change_limit")]
    pub change_limit: usize,

    /// Factory contributions, replacing the built-in list when present.
    #[serde(default = "default_contributions", rename = "factory")]
    pub factories: Vec<FactoryContribution>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            change_limit: default_change_limit(),
            factories: default_contributions(),
        }
    }
}

impl ProjectionConfig {
    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        tracing::debug!(
            change_limit = config.change_limit,
            factories = config.factories.len(),
            "Parsed projection configuration"
        );
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
