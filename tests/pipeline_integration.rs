//! End-to-end tests over a small YAML universe

use chrono::{DateTime, TimeZone, Utc};
use chat_intel::{IntelParser, ParsedMessage, ParserConfig, StaticUniverse};
use intel_types::{Kill, QuestionType, ShipType, SystemEntity, TokenType};
use proptest::prelude::*;

const UNIVERSE: &str = r#"
systems:
  - { id: 30000142, name: Jita, region: The Forge }
  - { id: 30002187, name: Amarr, region: Domain }
  - { id: 30004759, name: 1DQ1-A, region: Delve }
  - { id: 30002537, name: Amamake, region: Heimatar }
ships:
  - { id: 29990, name: Loki }
  - { id: 17634, name: Caracal Navy Issue, aliases: [cni] }
  - { id: 587, name: Rifter }
  - { id: 900001, name: Rifter Rifter }
  - { id: 900002, name: Rifter Rifter Rifter }
characters:
  - { id: 90000001, name: Cosmo Fox, activity: Active, corporation: Fox Den, standing: Hostile }
  - { id: 90000002, name: Loki, activity: Active }
words: [hello, there, the]
"#;

fn config() -> ParserConfig {
    ParserConfig {
        max_frontier: 1000,
        max_span_words: 3,
        question_window_secs: 15,
        character_batch_size: 100,
        fuzzy_threshold: 0.97,
        fuzzy_min_len: 5,
    }
}

fn parser_with(config: ParserConfig) -> IntelParser {
    let universe = StaticUniverse::from_yaml_str(UNIVERSE).unwrap();
    IntelParser::from_universe(universe, config)
}

fn parser() -> IntelParser {
    parser_with(config())
}

fn at(seconds: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, seconds).unwrap()
}

// ============================================================================
// Single messages
// ============================================================================

#[tokio::test]
async fn test_counted_ship() {
    let parser = parser();
    let candidates = parser.tokenize("2x Loki", &[]).await;
    let best = parser.choose_best(&candidates);

    assert_eq!(best.len(), 1);
    assert_eq!(
        best[0].token_type,
        Some(TokenType::Ship {
            ship: ShipType::new(29990, "Loki"),
            count: 2,
            is_plural: false,
        })
    );
}

#[tokio::test]
async fn test_kill_report() {
    let parser = parser();
    let understanding = parser.understand("Kill: John Doe (Capsule)", &[]).await;

    assert_eq!(
        understanding.kills,
        vec![Kill {
            name: "John Doe".to_string(),
            character_id: None,
            target: "Capsule".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_gate() {
    let parser = parser();
    let best = parser.choose_best(&parser.tokenize("Jita gate", &[]).await);

    assert_eq!(best.len(), 1);
    assert!(matches!(
        &best[0].token_type,
        Some(TokenType::Gate { system, is_ansiblex: false }) if system.name == "Jita"
    ));
}

#[tokio::test]
async fn test_movement_through_gate() {
    let understanding = parser().understand("jumped Jita gate", &[]).await;
    let movement = understanding.movement.expect("movement");
    assert_eq!(movement.verb, "jumped");
    assert_eq!(movement.to_system.name, "Jita");
    assert!(movement.is_gate);
}

#[tokio::test]
async fn test_ship_name_beats_character_name() {
    let understanding = parser().understand("Loki", &[]).await;
    assert_eq!(
        understanding.entities,
        vec![SystemEntity::Ship {
            ship: ShipType::new(29990, "Loki"),
            count: 1,
            standing: None,
        }]
    );
}

#[tokio::test]
async fn test_repeated_ship_keeps_latest_count() {
    let understanding = parser().understand("Loki 3x Loki", &[]).await;
    assert_eq!(
        understanding.entities,
        vec![SystemEntity::Ship {
            ship: ShipType::new(29990, "Loki"),
            count: 3,
            standing: None,
        }]
    );
}

#[tokio::test]
async fn test_full_report() {
    let understanding = parser().understand("Cosmo Fox Jita ess nv", &[]).await;

    assert_eq!(understanding.systems.len(), 1);
    assert!(understanding.reported_no_visual);
    assert!(understanding.entities.contains(&SystemEntity::Ess));
    assert!(understanding.entities.iter().any(|e| matches!(
        e,
        SystemEntity::Character(details) if details.corporation_name.as_deref() == Some("Fox Den")
    )));
}

#[tokio::test]
async fn test_question() {
    let understanding = parser().understand("loc?", &[]).await;
    assert_eq!(understanding.questions.len(), 1);
    assert_eq!(understanding.questions[0].kind, QuestionType::Location);
}

// ============================================================================
// Search limits
// ============================================================================

#[tokio::test]
async fn test_explosive_input_falls_back() {
    let message = vec!["Rifter"; 30].join(" ");
    let candidates = parser().tokenize(&message, &[]).await;

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].len(), 1);
    assert!(candidates[0][0].token_type.is_none());
    assert_eq!(candidates[0][0].text(), message);
}

#[tokio::test]
async fn test_configured_frontier_limit() {
    let parser = parser_with(ParserConfig {
        max_frontier: 1,
        ..config()
    });
    let candidates = parser.tokenize("Jita gate 2x Loki", &[]).await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0][0].text(), "Jita gate 2x Loki");
    assert!(parser.understand("Jita gate 2x Loki", &[]).await.is_empty());
}

#[tokio::test]
async fn test_configured_fuzzy_matching() {
    let strict = parser().understand("Amamakk", &[]).await;
    assert!(strict.systems.is_empty());

    let loose = parser_with(ParserConfig {
        fuzzy_threshold: 0.9,
        ..config()
    })
    .understand("Amamakk", &[])
    .await;
    assert_eq!(loose.systems.len(), 1);
    assert_eq!(loose.systems[0].name, "Amamake");
}

#[tokio::test]
async fn test_huge_counts_do_not_overflow() {
    let understanding = parser().understand("+4000000000 Jita +4000000000", &[]).await;
    assert_eq!(understanding.systems.len(), 1);
    assert!(understanding
        .entities
        .contains(&SystemEntity::UnspecifiedCharacter(u32::MAX)));
}

#[tokio::test]
async fn test_empty_message() {
    let parser = parser();
    assert_eq!(parser.tokenize("", &[]).await, vec![Vec::new()]);
    assert!(parser.understand("", &[]).await.is_empty());
}

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_answer_merges_earlier_reports() {
    let parser = parser();
    let mut history: Vec<ParsedMessage> = Vec::new();

    for (author, seconds, text) in [
        ("Cosmo Fox", 0, "Jita gate"),
        ("Bob", 5, "loc?"),
        ("Carol", 10, "Cosmo Fox Jita ess"),
    ] {
        let parsed = parser
            .understand_in_channel(author, at(seconds), text, &[], &history)
            .await;
        history.push(parsed);
    }

    let answer = &history[2].understanding;
    assert_eq!(answer.systems.len(), 1);
    assert_eq!(answer.entities.len(), 2);
    assert!(matches!(&answer.entities[0], SystemEntity::Gate { system, .. } if system.name == "Jita"));
    assert_eq!(answer.entities[1], SystemEntity::Ess);
    assert!(answer.questions.is_empty());
}

#[tokio::test]
async fn test_late_answer_stands_alone() {
    let parser = parser();
    let question = parser
        .understand_in_channel("Bob", at(0), "status?", &[], &[])
        .await;
    let reply = parser
        .understand_in_channel("Carol", at(40), "Jita ess", &[], &[question])
        .await;
    assert_eq!(reply.understanding.entities, vec![SystemEntity::Ess]);
}

// ============================================================================
// Properties
// ============================================================================

const VOCABULARY: &[&str] = &[
    "Jita", "gate", "2x", "Loki", "nv", "loc?", "Kill:", "(Capsule)", "Cosmo", "Fox", "hello",
    "+3", "jumped", "wh", "Caracal", "Navy", "Issue", "x4", "=5", "Amarr",
];

proptest! {
    #[test]
    fn test_segmentations_reconstruct_input(
        picks in proptest::collection::vec(0..VOCABULARY.len(), 0..8)
    ) {
        let message = picks.iter().map(|&i| VOCABULARY[i]).collect::<Vec<_>>().join(" ");
        let parser = parser();
        let candidates = futures::executor::block_on(parser.tokenize(&message, &[]));

        prop_assert!(!candidates.is_empty());
        for candidate in &candidates {
            let rebuilt = candidate
                .iter()
                .flat_map(|t| t.words.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ");
            prop_assert_eq!(&rebuilt, &message);
        }

        let best = parser.choose_best(&candidates);
        prop_assert!(candidates.contains(&best));
    }
}
