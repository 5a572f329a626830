//! Lookup service contracts
//!
//! The parser asks these collaborators what a span of chat text refers to.
//! Implementations may be backed by static data, a database or a web API;
//! the parser treats every `Err` as "unknown" and carries on.
//!
//! `memory` provides an in-memory implementation of every contract.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use intel_types::{
    CharacterDetails, CharacterId, CharacterStatus, ShipType, SolarSystem, SystemEntity,
};

pub mod memory;

pub use memory::StaticUniverse;

/// Fuzzy solar system name matching
pub trait SystemMatcher: Send + Sync {
    /// Resolve `text` to a system, preferring systems in `region_hints`
    fn fuzzy_system(&self, text: &str, region_hints: &[String]) -> Option<SolarSystem>;
}

/// Fuzzy ship type name matching
pub trait ShipMatcher: Send + Sync {
    fn fuzzy_ship(&self, text: &str) -> Option<ShipType>;
}

/// English words and in-game type names
pub trait WordDictionary: Send + Sync {
    fn is_english_word(&self, text: &str) -> bool;

    /// Any item type name, not only ships
    fn is_type_name(&self, text: &str) -> bool;
}

/// Character existence and detail lookups
#[async_trait]
pub trait CharacterDirectory: Send + Sync {
    /// Check a batch of names. Names that do not exist are absent from the map.
    async fn character_names_status(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, CharacterStatus>>;

    async fn character_details(&self, character_id: CharacterId)
        -> Result<Option<CharacterDetails>>;
}

/// Resolves scan-sharing links into the entities they list
#[async_trait]
pub trait ScanResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<Vec<SystemEntity>>;
}

/// The full set of collaborators the parser consults
#[derive(Clone)]
pub struct Lookups {
    pub systems: Arc<dyn SystemMatcher>,
    pub ships: Arc<dyn ShipMatcher>,
    pub words: Arc<dyn WordDictionary>,
    pub characters: Arc<dyn CharacterDirectory>,
    pub scans: Option<Arc<dyn ScanResolver>>,
}

impl Lookups {
    /// Use one object for every contract (scan resolution disabled)
    pub fn from_universe(universe: Arc<StaticUniverse>) -> Self {
        Self {
            systems: universe.clone(),
            ships: universe.clone(),
            words: universe.clone(),
            characters: universe,
            scans: None,
        }
    }

    pub fn with_scans(mut self, scans: Arc<dyn ScanResolver>) -> Self {
        self.scans = Some(scans);
        self
    }
}
