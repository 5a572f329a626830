//! Candidate types for a single word span

use std::collections::HashMap;
use std::sync::LazyLock;

use intel_types::{CharacterStatus, TokenType};
use regex::Regex;
use smallvec::{smallvec, SmallVec};

use super::vocabulary;
use crate::lookup::Lookups;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://|www\.)[^\s]+$|^[a-z0-9-]+(\.[a-z0-9-]+)*\.(com|net|org|info|io|space|tools)(/[^\s]*)?$")
        .unwrap()
});

/// Characters allowed in an in-game character name
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '\'' | '.' | '_')
}

/// Whether a span could be a character name and is worth a directory lookup
pub fn is_plausible_character_name(text: &str) -> bool {
    let length = text.chars().count();
    (3..=37).contains(&length)
        && text.chars().all(is_name_char)
        && text.chars().any(char::is_alphabetic)
        && !URL_RE.is_match(text)
}

pub type Candidates = SmallVec<[TokenType; 2]>;

/// Classifies spans for one message
pub struct SpanClassifier<'a> {
    lookups: &'a Lookups,
    region_hints: &'a [String],
    character_statuses: &'a HashMap<String, CharacterStatus>,
}

impl<'a> SpanClassifier<'a> {
    pub fn new(
        lookups: &'a Lookups,
        region_hints: &'a [String],
        character_statuses: &'a HashMap<String, CharacterStatus>,
    ) -> Self {
        Self {
            lookups,
            region_hints,
            character_statuses,
        }
    }

    pub fn character_status(&self, text: &str) -> Option<&CharacterStatus> {
        self.character_statuses.get(text)
    }

    pub fn region_hints(&self) -> &[String] {
        self.region_hints
    }

    pub fn lookups(&self) -> &Lookups {
        self.lookups
    }

    /// All candidate types of a span. Empty means plain text.
    pub fn classify(&self, words: &[String]) -> Candidates {
        let text = words.join(" ");
        if URL_RE.is_match(&text) {
            return smallvec![TokenType::Url];
        }

        let mut candidates = Candidates::new();

        if let Some(system) = self.lookups.systems.fuzzy_system(&text, self.region_hints) {
            candidates.push(TokenType::System(system));
        }

        let ship = self
            .lookups
            .ships
            .fuzzy_ship(&text)
            .map(|ship| (ship, false))
            .or_else(|| {
                let singular = text.strip_suffix('s').or_else(|| text.strip_suffix('S'))?;
                if singular.is_empty() {
                    return None;
                }
                self.lookups.ships.fuzzy_ship(singular).map(|ship| (ship, true))
            });

        match ship {
            Some((ship, is_plural)) => candidates.push(TokenType::Ship {
                ship,
                count: 1,
                is_plural,
            }),
            // Ship names are assumed to be ships, never characters
            None => {
                if let Some(status) = self.character_statuses.get(&text) {
                    candidates.push(TokenType::Character(status.character_id));
                }
            }
        }

        if let Some(keyword) = vocabulary::keyword(&text) {
            candidates.clear();
            candidates.push(TokenType::Keyword(keyword));
        }

        candidates
    }
}
