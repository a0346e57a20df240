//! Factory registry
//!
//! Collects named factory contributions, merges duplicates, and builds the
//! ordered factory chain used for resolution. The built chain is an
//! immutable snapshot swapped in as a unit: requests holding the previous
//! snapshot keep a consistent rule set for their whole duration.

use std::sync::{Arc, RwLock};

use super::contribution::{FactoryContribution, FactoryKind};
use super::default_item::DefaultItemFactory;
use super::sync_root::SyncRootItemFactory;
use super::top_level::TopLevelItemFactory;
use super::ItemFactory;
use crate::config::ProjectionConfig;
use crate::error::{Error, Result};

/// One entry of the built factory chain.
pub struct ActiveFactory {
    pub name: String,
    pub kind: FactoryKind,
    pub doc_type: Option<String>,
    pub facet: Option<String>,
    pub factory: Arc<dyn ItemFactory>,
}

/// Immutable snapshot of the ordered factory chain plus the distinguished
/// top-level factory.
pub struct ActiveSet {
    pub top_level: Arc<TopLevelItemFactory>,
    /// Ascending contribution order, registration sequence as tiebreak
    pub chain: Vec<ActiveFactory>,
}

impl ActiveSet {
    pub fn factory_named(&self, name: &str) -> Option<&ActiveFactory> {
        self.chain.iter().find(|f| f.name == name)
    }

    /// Name of the highest-priority sync-root factory, used to build item
    /// ids for synthesized root events.
    pub fn sync_root_factory_name(&self) -> Option<&str> {
        self.chain
            .iter()
            .find(|f| f.kind == FactoryKind::SyncRoot)
            .map(|f| f.name.as_str())
    }

    /// Name of the highest-priority general factory (no docType/facet
    /// filter), used to build item ids for records whose document is gone.
    pub fn default_factory_name(&self) -> Option<&str> {
        self.chain
            .iter()
            .find(|f| {
                f.kind == FactoryKind::Default && f.doc_type.is_none() && f.facet.is_none()
            })
            .map(|f| f.name.as_str())
    }
}

struct Sequenced {
    seq: u64,
    contribution: FactoryContribution,
}

/// Registry of factory contributions.
pub struct FactoryRegistry {
    contributions: RwLock<Vec<Sequenced>>,
    active: RwLock<Arc<ActiveSet>>,
}

impl FactoryRegistry {
    /// Build a registry from an explicit contribution list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTopLevelFactory`] when no enabled top-level
    /// contribution is present.
    pub fn from_contributions(
        contributions: impl IntoIterator<Item = FactoryContribution>,
    ) -> Result<Self> {
        let mut merged: Vec<Sequenced> = Vec::new();
        for (seq, contribution) in contributions.into_iter().enumerate() {
            merge_into(&mut merged, seq as u64, contribution);
        }
        let active = build_active_set(&merged)?;
        Ok(Self {
            contributions: RwLock::new(merged),
            active: RwLock::new(Arc::new(active)),
        })
    }

    /// Build a registry from a projection configuration.
    pub fn from_config(config: &ProjectionConfig) -> Result<Self> {
        Self::from_contributions(config.factories.iter().cloned())
    }

    /// Registry with the standard top-level, sync-root and default
    /// contributions.
    pub fn with_defaults() -> Self {
        Self::from_config(&ProjectionConfig::default())
            .expect("built-in contributions include a top-level factory")
    }

    /// Add or merge a contribution. Takes effect at the next [`Self::rebuild`].
    pub fn contribute(&self, contribution: FactoryContribution) {
        let mut contributions = self.contributions.write().unwrap();
        let seq = contributions.len() as u64;
        merge_into(&mut contributions, seq, contribution);
    }

    /// Rebuild the ordered chain and swap it in atomically.
    ///
    /// On error the previously active chain stays in place, so in-flight
    /// and subsequent requests never observe a partial rule set.
    pub fn rebuild(&self) -> Result<()> {
        let contributions = self.contributions.read().unwrap();
        let set = build_active_set(&contributions)?;
        *self.active.write().unwrap() = Arc::new(set);
        Ok(())
    }

    /// Current chain snapshot. The snapshot stays valid for the caller
    /// even across a concurrent rebuild.
    pub fn active(&self) -> Arc<ActiveSet> {
        self.active.read().unwrap().clone()
    }
}

fn merge_into(contributions: &mut Vec<Sequenced>, seq: u64, contribution: FactoryContribution) {
    if let Some(existing) = contributions
        .iter_mut()
        .find(|s| s.contribution.name == contribution.name)
    {
        existing.contribution.merge_from(&contribution);
    } else {
        contributions.push(Sequenced { seq, contribution });
    }
}

fn build_active_set(contributions: &[Sequenced]) -> Result<ActiveSet> {
    let mut enabled: Vec<&Sequenced> = contributions
        .iter()
        .filter(|s| s.contribution.enabled)
        .collect();
    enabled.sort_by_key(|s| (s.contribution.order, s.seq));

    let top_level = enabled
        .iter()
        .find(|s| s.contribution.kind == FactoryKind::TopLevel)
        .map(|s| Arc::new(TopLevelItemFactory::new(s.contribution.name.clone())))
        .ok_or(Error::NoTopLevelFactory)?;

    let chain = enabled
        .iter()
        .filter(|s| s.contribution.kind != FactoryKind::TopLevel)
        .map(|s| {
            let c = &s.contribution;
            let factory: Arc<dyn ItemFactory> = match c.kind {
                FactoryKind::SyncRoot => Arc::new(SyncRootItemFactory::new(c.name.clone())),
                FactoryKind::Default => Arc::new(DefaultItemFactory::new(c.name.clone())),
                FactoryKind::TopLevel => unreachable!("filtered above"),
            };
            ActiveFactory {
                name: c.name.clone(),
                kind: c.kind,
                doc_type: c.doc_type.clone(),
                facet: c.facet.clone(),
                factory,
            }
        })
        .collect();

    Ok(ActiveSet { top_level, chain })
}
