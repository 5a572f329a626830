//! In-memory reference universe
//!
//! Implements every lookup contract from static tables. Matching follows a
//! two-stage approach:
//! 1. Exact (case-insensitive) name or alias lookup
//! 2. strsim (Jaro-Winkler) ranking over all names for longer queries
//!
//! System names additionally accept a unique prefix when the query contains
//! a digit ("1dq" -> "1DQ1-A"), the usual shorthand for null-sec names.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use intel_types::{
    CharacterActivity, CharacterDetails, CharacterId, CharacterStatus, ShipType, SolarSystem,
    Standing, SystemId, TypeId,
};
use serde::{Deserialize, Serialize};

use super::{CharacterDirectory, ShipMatcher, SystemMatcher, WordDictionary};
use crate::config::{DEFAULT_FUZZY_MIN_LEN, DEFAULT_FUZZY_THRESHOLD};
use crate::error::UniverseError;

/// Shortest query eligible for digit-prefix system matching
const SYSTEM_PREFIX_MIN_LEN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemRow {
    pub id: SystemId,
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipRow {
    pub id: TypeId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub activity: CharacterActivity,
    #[serde(default)]
    pub corporation: Option<String>,
    #[serde(default)]
    pub alliance: Option<String>,
    #[serde(default)]
    pub standing: Option<Standing>,
}

/// Raw universe tables, as stored in YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniverseData {
    #[serde(default)]
    pub systems: Vec<SystemRow>,
    #[serde(default)]
    pub ships: Vec<ShipRow>,
    #[serde(default)]
    pub characters: Vec<CharacterRow>,
    #[serde(default)]
    pub words: Vec<String>,
    /// Non-ship item type names
    #[serde(default)]
    pub type_names: Vec<String>,
}

/// Indexed in-memory universe
#[derive(Debug)]
pub struct StaticUniverse {
    systems: Vec<SolarSystem>,
    system_index: HashMap<String, usize>,
    ships: Vec<ShipType>,
    ship_index: HashMap<String, usize>,
    characters: Vec<CharacterRow>,
    character_index: HashMap<String, usize>,
    words: HashSet<String>,
    type_names: HashSet<String>,
    fuzzy_threshold: f64,
    fuzzy_min_len: usize,
}

impl StaticUniverse {
    pub fn new(data: UniverseData) -> std::result::Result<Self, UniverseError> {
        let mut universe = StaticUniverse {
            systems: Vec::with_capacity(data.systems.len()),
            system_index: HashMap::new(),
            ships: Vec::with_capacity(data.ships.len()),
            ship_index: HashMap::new(),
            characters: Vec::with_capacity(data.characters.len()),
            character_index: HashMap::new(),
            words: data.words.iter().map(|w| w.to_lowercase()).collect(),
            type_names: data.type_names.iter().map(|t| t.to_lowercase()).collect(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_min_len: DEFAULT_FUZZY_MIN_LEN,
        };

        for row in data.systems {
            let key = row.name.to_lowercase();
            if universe.system_index.contains_key(&key) {
                return Err(UniverseError::Duplicate {
                    kind: "system",
                    name: row.name,
                });
            }
            universe.system_index.insert(key, universe.systems.len());
            universe
                .systems
                .push(SolarSystem::new(row.id, row.name, row.region));
        }

        for row in data.ships {
            let position = universe.ships.len();
            for name in std::iter::once(&row.name).chain(row.aliases.iter()) {
                let key = name.to_lowercase();
                if universe.ship_index.insert(key, position).is_some() {
                    return Err(UniverseError::Duplicate {
                        kind: "ship",
                        name: name.clone(),
                    });
                }
            }
            universe.type_names.insert(row.name.to_lowercase());
            universe.ships.push(ShipType::new(row.id, row.name));
        }

        for row in data.characters {
            let key = row.name.to_lowercase();
            if universe.character_index.contains_key(&key) {
                return Err(UniverseError::Duplicate {
                    kind: "character",
                    name: row.name,
                });
            }
            universe
                .character_index
                .insert(key, universe.characters.len());
            universe.characters.push(row);
        }

        Ok(universe)
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, UniverseError> {
        let data: UniverseData = serde_yaml::from_str(content)?;
        Self::new(data)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> std::result::Result<Self, UniverseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Override the Jaro-Winkler acceptance settings
    pub fn with_fuzzy(mut self, threshold: f64, min_len: usize) -> Self {
        self.fuzzy_threshold = threshold;
        self.fuzzy_min_len = min_len;
        self
    }

    fn best_fuzzy<'a, T>(
        &self,
        query: &str,
        candidates: impl Iterator<Item = (&'a str, T)>,
        preferred: impl Fn(&T) -> bool,
    ) -> Option<T> {
        if query.chars().count() < self.fuzzy_min_len {
            return None;
        }
        let mut best: Option<(bool, f64, T)> = None;
        for (name, item) in candidates {
            let score = strsim::jaro_winkler(query, &name.to_lowercase());
            if score < self.fuzzy_threshold {
                continue;
            }
            let is_preferred = preferred(&item);
            let better = match &best {
                None => true,
                Some((best_preferred, best_score, _)) => {
                    (is_preferred, score) > (*best_preferred, *best_score)
                }
            };
            if better {
                best = Some((is_preferred, score, item));
            }
        }
        best.map(|(_, _, item)| item)
    }
}

impl SystemMatcher for StaticUniverse {
    fn fuzzy_system(&self, text: &str, region_hints: &[String]) -> Option<SolarSystem> {
        let query = text.to_lowercase();
        if let Some(&index) = self.system_index.get(&query) {
            return Some(self.systems[index].clone());
        }

        let in_hints =
            |system: &&SolarSystem| region_hints.iter().any(|r| r.eq_ignore_ascii_case(&system.region));

        if query.len() >= SYSTEM_PREFIX_MIN_LEN
            && query.chars().any(|c| c.is_ascii_digit())
            && !query.contains(' ')
        {
            let matches: Vec<&SolarSystem> = self
                .systems
                .iter()
                .filter(|s| s.name.to_lowercase().starts_with(&query))
                .collect();
            if matches.len() == 1 {
                return Some(matches[0].clone());
            }
        }

        self.best_fuzzy(
            &query,
            self.systems.iter().map(|s| (s.name.as_str(), s)),
            in_hints,
        )
        .cloned()
    }
}

impl ShipMatcher for StaticUniverse {
    fn fuzzy_ship(&self, text: &str) -> Option<ShipType> {
        let query = text.to_lowercase();
        if let Some(&index) = self.ship_index.get(&query) {
            return Some(self.ships[index].clone());
        }
        self.best_fuzzy(
            &query,
            self.ships.iter().map(|s| (s.name.as_str(), s)),
            |_| false,
        )
        .cloned()
    }
}

impl WordDictionary for StaticUniverse {
    fn is_english_word(&self, text: &str) -> bool {
        self.words.contains(&text.to_lowercase())
    }

    fn is_type_name(&self, text: &str) -> bool {
        self.type_names.contains(&text.to_lowercase())
    }
}

#[async_trait]
impl CharacterDirectory for StaticUniverse {
    async fn character_names_status(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, CharacterStatus>> {
        Ok(names
            .iter()
            .filter_map(|name| {
                let index = *self.character_index.get(&name.to_lowercase())?;
                let row = &self.characters[index];
                Some((
                    name.clone(),
                    CharacterStatus {
                        character_id: row.id,
                        activity: row.activity,
                    },
                ))
            })
            .collect())
    }

    async fn character_details(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterDetails>> {
        Ok(self
            .characters
            .iter()
            .find(|row| row.id == character_id)
            .map(|row| CharacterDetails {
                character_id: row.id,
                name: row.name.clone(),
                corporation_name: row.corporation.clone(),
                alliance_name: row.alliance.clone(),
                standing: row.standing,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIVERSE: &str = r#"
systems:
  - { id: 30000142, name: Jita, region: The Forge }
  - { id: 30004759, name: 1DQ1-A, region: Delve }
  - { id: 30001000, name: Amamake, region: Heimatar }
  - { id: 30001001, name: Amamaka, region: Metropolis }
ships:
  - { id: 29990, name: Loki }
  - { id: 17634, name: Caracal Navy Issue, aliases: [cni] }
characters:
  - { id: 90000001, name: Cosmo Fox, activity: Active, corporation: Fox Den, standing: Hostile }
words: [the, fox]
type_names: [Tritanium]
"#;

    fn universe() -> StaticUniverse {
        StaticUniverse::from_yaml_str(UNIVERSE).unwrap()
    }

    #[test]
    fn test_exact_and_prefix_system() {
        let universe = universe();
        assert_eq!(universe.fuzzy_system("jita", &[]).unwrap().id, 30000142);
        assert_eq!(universe.fuzzy_system("1dq", &[]).unwrap().name, "1DQ1-A");
        assert!(universe.fuzzy_system("gate", &[]).is_none());
    }

    #[test]
    fn test_fuzzy_system_prefers_hinted_region() {
        let universe = universe().with_fuzzy(0.9, 5);
        let hinted = universe
            .fuzzy_system("amamakk", &["Metropolis".to_string()])
            .unwrap();
        assert_eq!(hinted.name, "Amamaka");
    }

    #[test]
    fn test_ship_alias_and_type_names() {
        let universe = universe();
        assert_eq!(universe.fuzzy_ship("CNI").unwrap().id, 17634);
        assert!(universe.fuzzy_ship("Lok").is_none());
        assert!(universe.is_type_name("loki"));
        assert!(universe.is_type_name("Tritanium"));
        assert!(universe.is_english_word("The"));
    }

    #[test]
    fn test_duplicate_system_rejected() {
        let data = UniverseData {
            systems: vec![
                SystemRow {
                    id: 1,
                    name: "Jita".to_string(),
                    region: "The Forge".to_string(),
                },
                SystemRow {
                    id: 2,
                    name: "JITA".to_string(),
                    region: "The Forge".to_string(),
                },
            ],
            ..Default::default()
        };
        assert!(matches!(
            StaticUniverse::new(data),
            Err(UniverseError::Duplicate { kind: "system", .. })
        ));
    }

    #[tokio::test]
    async fn test_character_lookups() {
        let universe = universe();
        let statuses = universe
            .character_names_status(&["cosmo fox".to_string(), "Nobody".to_string()])
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses["cosmo fox"].character_id, 90000001);

        let details = universe.character_details(90000001).await.unwrap().unwrap();
        assert_eq!(details.name, "Cosmo Fox");
        assert_eq!(details.standing, Some(Standing::Hostile));
        assert!(universe.character_details(1).await.unwrap().is_none());
    }
}
