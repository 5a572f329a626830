//! Intel Types - Foundation Types
//!
//! Pure data structures shared by the chat intel parser and the code that
//! consumes its output (alerting, map overlays, history views).
//!
//! ## Contents
//!
//! - Universe references (solar systems, ship types, characters)
//! - Tokens produced by the chat tokenizer
//! - Entities and the per-message `IntelUnderstanding`
//!
//! ## Rules
//!
//! 1. **NO PARSING LOGIC** - only data structures, constructors and accessors
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - every type supports serde
//! 4. **HASHABLE** - tokens take part in the tokenizer's de-duplicating search

use serde::{Deserialize, Serialize};

pub type CharacterId = i64;
pub type TypeId = i32;
pub type SystemId = i32;

// ============================================================================
// UNIVERSE REFERENCES
// ============================================================================

/// A solar system resolved from chat text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolarSystem {
    pub id: SystemId,
    pub name: String,
    /// Region the system belongs to, matched against channel region hints
    pub region: String,
}

impl SolarSystem {
    pub fn new(id: SystemId, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            region: region.into(),
        }
    }
}

/// A ship type resolved from chat text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipType {
    pub id: TypeId,
    pub name: String,
}

impl ShipType {
    pub fn new(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// How recently a character has been seen in game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterActivity {
    Active,
    Inactive,
    /// Long abandoned; names like this are almost always ordinary words
    Dormant,
}

/// Result of the character-name existence check for one name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterStatus {
    pub character_id: CharacterId,
    pub activity: CharacterActivity,
}

/// Diplomatic relationship from an external reputation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Standing {
    Hostile,
    Neutral,
    Friendly,
}

/// Character details fetched for recognized character tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterDetails {
    pub character_id: CharacterId,
    pub name: String,
    pub corporation_name: Option<String>,
    pub alliance_name: Option<String>,
    pub standing: Option<Standing>,
}

impl CharacterDetails {
    /// Details known only by id and name, used when the detail lookup fails
    pub fn bare(character_id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            character_id,
            name: name.into(),
            corporation_name: None,
            alliance_name: None,
            standing: None,
        }
    }
}

// ============================================================================
// TOKENS
// ============================================================================

/// Intel keywords recognized verbatim in chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeywordType {
    NoVisual,
    Clear,
    Wormhole,
    Spike,
    Ess,
    Skyhook,
    GateCamp,
    CombatProbes,
    Bubbles,
}

/// What a question in chat is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// "loc?", "where?"
    Location,
    /// "ships?", "shiptypes?"
    ShipTypes,
    /// "how many?", "count?"
    Number,
    /// "status?"
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub kind: QuestionType,
    /// The question as written, e.g. "loc?"
    pub text: String,
}

/// A kill report, usually pasted from a killboard link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kill {
    /// Victim name
    pub name: String,
    pub character_id: Option<CharacterId>,
    /// Destroyed ship or structure, e.g. "Capsule"
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Movement {
    /// "going", "jumped", "jumping"
    pub verb: String,
    pub to_system: SolarSystem,
    /// Whether the destination was written as a gate ("jumped Jita gate")
    pub is_gate: bool,
}

/// Semantic type of a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    System(SolarSystem),
    Character(CharacterId),
    Ship {
        ship: ShipType,
        count: u32,
        is_plural: bool,
    },
    /// A linked item that is not otherwise recognized
    Link,
    Keyword(KeywordType),
    Count {
        count: u32,
        is_plus: bool,
        is_equals: bool,
    },
    Question(Question),
    Kill(Kill),
    Url,
    Gate {
        system: SolarSystem,
        is_ansiblex: bool,
    },
    Movement(Movement),
}

/// A contiguous span of words with at most one resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub words: Vec<String>,
    pub token_type: Option<TokenType>,
    /// The span was a chat link (followed by the double-space link marker)
    pub is_link: bool,
}

impl Token {
    pub fn new(words: Vec<String>, token_type: Option<TokenType>) -> Self {
        Self {
            words,
            token_type,
            is_link: false,
        }
    }

    /// Untyped token covering the given words
    pub fn plain(words: Vec<String>) -> Self {
        Self::new(words, None)
    }

    /// Words joined with single spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Number of characters covered by the token's text
    pub fn text_len(&self) -> usize {
        let letters: usize = self.words.iter().map(|w| w.chars().count()).sum();
        letters + self.words.len().saturating_sub(1)
    }

    pub fn is_typed(&self) -> bool {
        self.token_type.is_some()
    }
}

// ============================================================================
// ENTITIES AND UNDERSTANDING
// ============================================================================

/// Something reported present in a solar system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemEntity {
    Character(CharacterDetails),
    /// Characters reported only by number ("+3", "5 neuts")
    UnspecifiedCharacter(u32),
    Ship {
        ship: ShipType,
        count: u32,
        standing: Option<Standing>,
    },
    Gate {
        system: SolarSystem,
        is_ansiblex: bool,
    },
    Celestial(String),
    Killmail(Kill),
    Wormhole,
    Spike,
    Ess,
    Skyhook,
    GateCamp,
    CombatProbes,
    NoVisual,
    Bubbles,
}

impl SystemEntity {
    /// Entities that describe what the reporting character currently sees.
    /// They stop being valid once that character's situation changes.
    pub fn is_character_bound(&self) -> bool {
        matches!(
            self,
            SystemEntity::Character(_)
                | SystemEntity::UnspecifiedCharacter(_)
                | SystemEntity::Ship { .. }
                | SystemEntity::NoVisual
        )
    }

    /// Entities removed by an explicit "clear" report
    pub fn is_clearable(&self) -> bool {
        matches!(
            self,
            SystemEntity::Character(_)
                | SystemEntity::UnspecifiedCharacter(_)
                | SystemEntity::Ship { .. }
                | SystemEntity::GateCamp
                | SystemEntity::CombatProbes
                | SystemEntity::Bubbles
                | SystemEntity::Spike
                | SystemEntity::NoVisual
        )
    }
}

/// Everything understood from one chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelUnderstanding {
    pub systems: Vec<SolarSystem>,
    pub entities: Vec<SystemEntity>,
    pub kills: Vec<Kill>,
    pub questions: Vec<Question>,
    pub movement: Option<Movement>,
    pub reported_no_visual: bool,
    pub reported_clear: bool,
}

impl IntelUnderstanding {
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
            && self.entities.is_empty()
            && self.kills.is_empty()
            && self.questions.is_empty()
            && self.movement.is_none()
            && !self.reported_no_visual
            && !self.reported_clear
    }
}
