//! Semantic extraction
//!
//! Folds the chosen token sequence into an [`IntelUnderstanding`]. Two
//! lookup phases run before the fold, each fanned out with `join_all`:
//! - character details for every `Character` token, deduplicated by id
//! - scan links resolved into the entities they list
//!
//! A failed lookup is logged and treated as "unknown". Extraction itself
//! never fails.

use std::collections::HashMap;

use futures::future::join_all;
use intel_types::{
    CharacterDetails, CharacterId, IntelUnderstanding, KeywordType, SystemEntity, Token,
    TokenType,
};

use crate::lookup::Lookups;

/// Builds understandings from token sequences
#[derive(Clone)]
pub struct Extractor {
    lookups: Lookups,
}

impl Extractor {
    pub fn new(lookups: Lookups) -> Self {
        Self { lookups }
    }

    pub async fn extract(&self, tokens: &[Token]) -> IntelUnderstanding {
        let (details, scanned) = futures::join!(
            self.character_details(tokens),
            self.scan_entities(tokens)
        );

        let mut understanding = IntelUnderstanding::default();
        for entity in scanned {
            upsert_entity(&mut understanding.entities, entity);
        }

        let mut reported_total: Option<u32> = None;
        for token in tokens {
            let Some(token_type) = &token.token_type else {
                continue;
            };
            match token_type {
                TokenType::System(system) => {
                    if !understanding.systems.contains(system) {
                        understanding.systems.push(system.clone());
                    }
                }
                TokenType::Character(id) => {
                    let character = details
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| CharacterDetails::bare(*id, token.text()));
                    upsert_entity(&mut understanding.entities, SystemEntity::Character(character));
                }
                TokenType::Ship { ship, count, .. } => upsert_entity(
                    &mut understanding.entities,
                    SystemEntity::Ship {
                        ship: ship.clone(),
                        count: *count,
                        standing: None,
                    },
                ),
                TokenType::Gate {
                    system,
                    is_ansiblex,
                } => upsert_entity(
                    &mut understanding.entities,
                    SystemEntity::Gate {
                        system: system.clone(),
                        is_ansiblex: *is_ansiblex,
                    },
                ),
                TokenType::Keyword(keyword) => apply_keyword(&mut understanding, *keyword),
                TokenType::Kill(kill) => {
                    if !understanding.kills.contains(kill) {
                        understanding.kills.push(kill.clone());
                    }
                }
                TokenType::Question(question) => understanding.questions.push(question.clone()),
                TokenType::Movement(movement) => understanding.movement = Some(movement.clone()),
                TokenType::Count { count, is_plus, .. } => {
                    if *is_plus {
                        add_unspecified(&mut understanding.entities, *count);
                    } else {
                        reported_total = Some(*count);
                    }
                }
                TokenType::Link | TokenType::Url => {}
            }
        }

        if let Some(total) = reported_total {
            let existing = character_count(&understanding.entities);
            let additional = total.saturating_sub(existing);
            if additional > 0 {
                add_unspecified(&mut understanding.entities, additional);
            }
        }

        understanding
    }

    async fn character_details(&self, tokens: &[Token]) -> HashMap<CharacterId, CharacterDetails> {
        let mut ids: Vec<CharacterId> = Vec::new();
        for token in tokens {
            if let Some(TokenType::Character(id)) = token.token_type {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return HashMap::new();
        }

        let directory = &self.lookups.characters;
        let lookups = ids
            .iter()
            .map(|&id| async move { (id, directory.character_details(id).await) });

        let mut details = HashMap::new();
        for (id, result) in join_all(lookups).await {
            match result {
                Ok(Some(found)) => {
                    details.insert(id, found);
                }
                Ok(None) => tracing::debug!("No details for character {}", id),
                Err(e) => tracing::warn!("Character detail lookup failed for {}: {}", id, e),
            }
        }
        details
    }

    async fn scan_entities(&self, tokens: &[Token]) -> Vec<SystemEntity> {
        let Some(scans) = &self.lookups.scans else {
            return Vec::new();
        };
        let urls: Vec<String> = tokens
            .iter()
            .filter(|t| matches!(t.token_type, Some(TokenType::Url)))
            .map(Token::text)
            .collect();

        let mut entities = Vec::new();
        for (url, result) in urls
            .iter()
            .zip(join_all(urls.iter().map(|url| scans.resolve(url))).await)
        {
            match result {
                Ok(found) => entities.extend(found),
                Err(e) => tracing::warn!("Scan resolution failed for {}: {}", url, e),
            }
        }
        entities
    }
}

fn apply_keyword(understanding: &mut IntelUnderstanding, keyword: KeywordType) {
    let entity = match keyword {
        KeywordType::Clear => {
            understanding.reported_clear = true;
            return;
        }
        KeywordType::NoVisual => {
            understanding.reported_no_visual = true;
            SystemEntity::NoVisual
        }
        KeywordType::Wormhole => SystemEntity::Wormhole,
        KeywordType::Spike => SystemEntity::Spike,
        KeywordType::Ess => SystemEntity::Ess,
        KeywordType::Skyhook => SystemEntity::Skyhook,
        KeywordType::GateCamp => SystemEntity::GateCamp,
        KeywordType::CombatProbes => SystemEntity::CombatProbes,
        KeywordType::Bubbles => SystemEntity::Bubbles,
    };
    upsert_entity(&mut understanding.entities, entity);
}

/// Characters reported, named or by number. Saturates on absurd counts.
fn character_count(entities: &[SystemEntity]) -> u32 {
    entities
        .iter()
        .map(|e| match e {
            SystemEntity::Character(_) => 1,
            SystemEntity::UnspecifiedCharacter(count) => *count,
            _ => 0,
        })
        .fold(0u32, u32::saturating_add)
}

/// Add to the single unspecified-character slot, creating it if needed
fn add_unspecified(entities: &mut Vec<SystemEntity>, count: u32) {
    for entity in entities.iter_mut() {
        if let SystemEntity::UnspecifiedCharacter(existing) = entity {
            *existing = existing.saturating_add(count);
            return;
        }
    }
    entities.push(SystemEntity::UnspecifiedCharacter(count));
}

/// Insert keeping the entity list set-like:
/// - `UnspecifiedCharacter` replaces the existing slot
/// - `Ship` replaces a ship of the same type id
/// - anything else is added only if not already present
pub(crate) fn upsert_entity(entities: &mut Vec<SystemEntity>, entity: SystemEntity) {
    let existing = match &entity {
        SystemEntity::UnspecifiedCharacter(_) => entities
            .iter()
            .position(|e| matches!(e, SystemEntity::UnspecifiedCharacter(_))),
        SystemEntity::Ship { ship, .. } => entities.iter().position(|e| match e {
            SystemEntity::Ship { ship: other, .. } => other.id == ship.id,
            _ => false,
        }),
        _ => {
            if entities.contains(&entity) {
                return;
            }
            None
        }
    };
    match existing {
        Some(index) => entities[index] = entity,
        None => entities.push(entity),
    }
}
