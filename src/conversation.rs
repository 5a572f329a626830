//! Question/answer merging across a channel's recent messages
//!
//! Intel often arrives in pieces: one pilot reports "Jita gate", another
//! asks "loc?", a third answers. A new message is merged with the question
//! it answers, found by:
//! 1. The latest message from an author the new message names, when that
//!    message asked a question the new message satisfies
//! 2. Otherwise the latest question asked within the question window
//!
//! In both cases the systems involved must be compatible. Merges produce
//! new values; prior understandings are never modified.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use intel_types::{IntelUnderstanding, QuestionType, SystemEntity};
use serde::{Deserialize, Serialize};

use crate::extract::upsert_entity;

/// A chat message together with what was understood from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub understanding: IntelUnderstanding,
}

/// Final understanding of `new`, given the earlier messages of its channel
/// in chronological order.
pub fn merge(new: &ParsedMessage, history: &[ParsedMessage], window: Duration) -> IntelUnderstanding {
    let names = character_names(&new.understanding);

    let referenced = history
        .iter()
        .rev()
        .find(|m| names.contains(&m.author.to_lowercase()));

    let answered_reference = referenced.filter(|m| {
        m.understanding
            .questions
            .iter()
            .any(|q| satisfies(q.kind, &new.understanding))
            && systems_compatible(&m.understanding, &new.understanding)
    });

    let question = answered_reference.or_else(|| {
        history.iter().rev().find(|m| {
            !m.understanding.questions.is_empty()
                && within_window(m, new, window)
                && systems_compatible(&m.understanding, &new.understanding)
        })
    });

    let Some(question) = question else {
        return new.understanding.clone();
    };

    let mut authors: HashSet<String> = HashSet::new();
    authors.insert(question.author.to_lowercase());
    authors.insert(new.author.to_lowercase());
    if let Some(referenced) = referenced {
        authors.insert(referenced.author.to_lowercase());
    }

    tracing::debug!(
        "Merging message from {} with question from {}",
        new.author,
        question.author
    );
    let merged = merge_understandings(&question.understanding, &new.understanding, &authors);

    match referenced {
        Some(referenced) if !std::ptr::eq(referenced, question) => {
            merge_understandings(&referenced.understanding, &merged, &authors)
        }
        _ => merged,
    }
}

/// Whether `understanding` answers a question of the given kind
pub fn satisfies(kind: QuestionType, understanding: &IntelUnderstanding) -> bool {
    let entities = &understanding.entities;
    match kind {
        QuestionType::Location => entities.iter().any(|e| {
            matches!(
                e,
                SystemEntity::Gate { .. }
                    | SystemEntity::Wormhole
                    | SystemEntity::Ess
                    | SystemEntity::Skyhook
                    | SystemEntity::NoVisual
            )
        }),
        QuestionType::ShipTypes => entities
            .iter()
            .any(|e| matches!(e, SystemEntity::Ship { .. })),
        QuestionType::Number => entities.iter().any(|e| match e {
            SystemEntity::UnspecifiedCharacter(_) => true,
            SystemEntity::Ship { count, .. } => *count > 1,
            _ => false,
        }),
        QuestionType::Status => true,
    }
}

/// No systems on either side is compatible with anything, otherwise both
/// must name the same systems.
pub fn systems_compatible(a: &IntelUnderstanding, b: &IntelUnderstanding) -> bool {
    if a.systems.is_empty() || b.systems.is_empty() {
        return true;
    }
    let a_ids: HashSet<_> = a.systems.iter().map(|s| s.id).collect();
    let b_ids: HashSet<_> = b.systems.iter().map(|s| s.id).collect();
    a_ids == b_ids
}

/// Combine an earlier understanding with a later one. `authors` are the
/// participants of the exchange (lowercased); they are not reported as
/// characters in their own intel.
pub fn merge_understandings(
    old: &IntelUnderstanding,
    new: &IntelUnderstanding,
    authors: &HashSet<String>,
) -> IntelUnderstanding {
    let mut systems = old.systems.clone();
    for system in &new.systems {
        if !systems.contains(system) {
            systems.push(system.clone());
        }
    }

    let mut entities: Vec<SystemEntity> = old
        .entities
        .iter()
        .filter(|e| !is_author(e, authors))
        .cloned()
        .collect();
    for entity in &new.entities {
        if !is_author(entity, authors) {
            upsert_entity(&mut entities, entity.clone());
        }
    }

    let mut kills = old.kills.clone();
    for kill in &new.kills {
        if !kills.contains(kill) {
            kills.push(kill.clone());
        }
    }

    IntelUnderstanding {
        systems,
        entities,
        kills,
        questions: new.questions.clone(),
        movement: new.movement.clone().or_else(|| old.movement.clone()),
        reported_no_visual: new.reported_no_visual,
        reported_clear: new.reported_clear,
    }
}

fn character_names(understanding: &IntelUnderstanding) -> HashSet<String> {
    understanding
        .entities
        .iter()
        .filter_map(|e| match e {
            SystemEntity::Character(details) => Some(details.name.to_lowercase()),
            _ => None,
        })
        .collect()
}

fn is_author(entity: &SystemEntity, authors: &HashSet<String>) -> bool {
    matches!(entity, SystemEntity::Character(details) if authors.contains(&details.name.to_lowercase()))
}

/// `earlier` was posted no more than `window` before `later`
fn within_window(earlier: &ParsedMessage, later: &ParsedMessage, window: Duration) -> bool {
    (later.timestamp - earlier.timestamp)
        .to_std()
        .is_ok_and(|elapsed| elapsed <= window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use intel_types::{CharacterDetails, Movement, Question, ShipType, SolarSystem};

    const WINDOW: Duration = Duration::from_secs(15);

    fn at(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap() + chrono::Duration::seconds(i64::from(seconds))
    }

    fn jita() -> SolarSystem {
        SolarSystem::new(30000142, "Jita", "The Forge")
    }

    fn message(author: &str, seconds: u32, understanding: IntelUnderstanding) -> ParsedMessage {
        ParsedMessage {
            author: author.to_string(),
            timestamp: at(seconds),
            text: String::new(),
            understanding,
        }
    }

    fn question(kind: QuestionType, text: &str) -> IntelUnderstanding {
        IntelUnderstanding {
            questions: vec![Question {
                kind,
                text: text.to_string(),
            }],
            ..Default::default()
        }
    }

    fn gate_report() -> IntelUnderstanding {
        IntelUnderstanding {
            systems: vec![jita()],
            entities: vec![SystemEntity::Gate {
                system: jita(),
                is_ansiblex: false,
            }],
            ..Default::default()
        }
    }

    fn fox() -> SystemEntity {
        SystemEntity::Character(CharacterDetails::bare(90000001, "Cosmo Fox"))
    }

    #[test]
    fn test_no_question_returns_new() {
        let new = message("Carol", 10, gate_report());
        let history = vec![message("Alice", 5, gate_report())];
        assert_eq!(merge(&new, &history, WINDOW), gate_report());
    }

    #[test]
    fn test_answer_chain_merges_all_reports() {
        let history = vec![
            message("Cosmo Fox", 0, gate_report()),
            message("Bob", 5, question(QuestionType::Location, "loc?")),
        ];
        let reply = message(
            "Carol",
            12,
            IntelUnderstanding {
                systems: vec![jita()],
                entities: vec![fox(), SystemEntity::Ess],
                ..Default::default()
            },
        );

        let merged = merge(&reply, &history, WINDOW);
        assert_eq!(merged.systems, vec![jita()]);
        assert_eq!(
            merged.entities,
            vec![
                SystemEntity::Gate {
                    system: jita(),
                    is_ansiblex: false,
                },
                SystemEntity::Ess,
            ]
        );
        assert!(merged.questions.is_empty());
    }

    #[test]
    fn test_referenced_author_question_answered() {
        let history = vec![
            message("Cosmo Fox", 0, question(QuestionType::ShipTypes, "ships?")),
            message("Bob", 100, question(QuestionType::Status, "status?")),
        ];
        let reply = message(
            "Carol",
            101,
            IntelUnderstanding {
                entities: vec![
                    fox(),
                    SystemEntity::Ship {
                        ship: ShipType::new(29990, "Loki"),
                        count: 2,
                        standing: None,
                    },
                ],
                ..Default::default()
            },
        );
        let merged = merge(&reply, &history, WINDOW);
        // Bob's question is newer but the reply names the asker of "ships?"
        assert_eq!(merged.entities.len(), 1);
        assert!(matches!(merged.entities[0], SystemEntity::Ship { count: 2, .. }));
    }

    #[test]
    fn test_expired_question_ignored() {
        let history = vec![message("Bob", 0, question(QuestionType::Status, "status?"))];
        let reply = message("Carol", 30, gate_report());
        assert_eq!(merge(&reply, &history, WINDOW), gate_report());
    }

    #[test]
    fn test_incompatible_systems_not_merged() {
        let mut asked = question(QuestionType::Status, "status?");
        asked.systems = vec![SolarSystem::new(30002187, "Amarr", "Domain")];
        let history = vec![message("Bob", 0, asked)];
        let reply = message("Carol", 5, gate_report());
        assert_eq!(merge(&reply, &history, WINDOW), gate_report());
    }

    #[test]
    fn test_satisfaction_rules() {
        let ships = |count| IntelUnderstanding {
            entities: vec![SystemEntity::Ship {
                ship: ShipType::new(29990, "Loki"),
                count,
                standing: None,
            }],
            ..Default::default()
        };
        assert!(satisfies(QuestionType::Location, &gate_report()));
        assert!(!satisfies(QuestionType::Location, &ships(1)));
        assert!(satisfies(QuestionType::ShipTypes, &ships(1)));
        assert!(!satisfies(QuestionType::Number, &ships(1)));
        assert!(satisfies(QuestionType::Number, &ships(2)));
        assert!(satisfies(QuestionType::Status, &IntelUnderstanding::default()));
    }

    #[test]
    fn test_merge_understandings_prefers_new_values() {
        let old = IntelUnderstanding {
            entities: vec![fox(), SystemEntity::UnspecifiedCharacter(2)],
            questions: vec![Question {
                kind: QuestionType::Status,
                text: "status?".into(),
            }],
            movement: Some(Movement {
                verb: "jumped".into(),
                to_system: jita(),
                is_gate: false,
            }),
            reported_no_visual: true,
            ..Default::default()
        };
        let new = IntelUnderstanding {
            entities: vec![SystemEntity::UnspecifiedCharacter(5)],
            ..Default::default()
        };
        let authors: HashSet<String> = ["cosmo fox".to_string()].into();

        let merged = merge_understandings(&old, &new, &authors);
        assert_eq!(merged.entities, vec![SystemEntity::UnspecifiedCharacter(5)]);
        assert!(merged.questions.is_empty());
        assert!(merged.movement.is_some());
        assert!(!merged.reported_no_visual);
    }
}
