//! Fixed phrase tables used by the tokenizer
//!
//! Lookups are exact: the first entry whose phrase equals the normalized
//! text wins. Keep phrases lowercase.

use intel_types::{KeywordType, QuestionType};

/// Keyword phrases, matched against lowercased, punctuation-stripped spans
const KEYWORDS: &[(&str, KeywordType)] = &[
    ("nv", KeywordType::NoVisual),
    ("novis", KeywordType::NoVisual),
    ("novisual", KeywordType::NoVisual),
    ("no vis", KeywordType::NoVisual),
    ("no visual", KeywordType::NoVisual),
    ("no eyes", KeywordType::NoVisual),
    ("clr", KeywordType::Clear),
    ("clear", KeywordType::Clear),
    ("all clear", KeywordType::Clear),
    ("is clear", KeywordType::Clear),
    ("wh", KeywordType::Wormhole),
    ("whs", KeywordType::Wormhole),
    ("wormhole", KeywordType::Wormhole),
    ("wormholes", KeywordType::Wormhole),
    ("spike", KeywordType::Spike),
    ("local spike", KeywordType::Spike),
    ("spike in local", KeywordType::Spike),
    ("ess", KeywordType::Ess),
    ("skyhook", KeywordType::Skyhook),
    ("skyhooks", KeywordType::Skyhook),
    ("sky hook", KeywordType::Skyhook),
    ("camp", KeywordType::GateCamp),
    ("camped", KeywordType::GateCamp),
    ("camping", KeywordType::GateCamp),
    ("gatecamp", KeywordType::GateCamp),
    ("gate camp", KeywordType::GateCamp),
    ("probes", KeywordType::CombatProbes),
    ("combats", KeywordType::CombatProbes),
    ("combat probes", KeywordType::CombatProbes),
    ("probes out", KeywordType::CombatProbes),
    ("bubble", KeywordType::Bubbles),
    ("bubbles", KeywordType::Bubbles),
    ("bubbled", KeywordType::Bubbles),
    ("bubs", KeywordType::Bubbles),
    ("bubbles up", KeywordType::Bubbles),
];

/// Question phrases, matched against the lowercased token text
const QUESTIONS: &[(&str, QuestionType)] = &[
    ("status?", QuestionType::Status),
    ("status", QuestionType::Status),
    ("stat?", QuestionType::Status),
    ("status pls", QuestionType::Status),
    ("status please", QuestionType::Status),
    ("any status?", QuestionType::Status),
    ("loc?", QuestionType::Location),
    ("loc", QuestionType::Location),
    ("location?", QuestionType::Location),
    ("where?", QuestionType::Location),
    ("where", QuestionType::Location),
    ("pos?", QuestionType::Location),
    ("where now?", QuestionType::Location),
    ("where is he?", QuestionType::Location),
    ("where are they?", QuestionType::Location),
    ("ships?", QuestionType::ShipTypes),
    ("ship?", QuestionType::ShipTypes),
    ("type?", QuestionType::ShipTypes),
    ("types?", QuestionType::ShipTypes),
    ("shiptype?", QuestionType::ShipTypes),
    ("shiptypes?", QuestionType::ShipTypes),
    ("ship type?", QuestionType::ShipTypes),
    ("ship types?", QuestionType::ShipTypes),
    ("what ship?", QuestionType::ShipTypes),
    ("what ships?", QuestionType::ShipTypes),
    ("how many?", QuestionType::Number),
    ("how many", QuestionType::Number),
    ("count?", QuestionType::Number),
    ("number?", QuestionType::Number),
    ("numbers?", QuestionType::Number),
    ("nums?", QuestionType::Number),
    ("amount?", QuestionType::Number),
];

/// Words counting the ship that follows them
const COUNT_WORDS: &[(&str, u32)] = &[("one", 1), ("two", 2), ("three", 3), ("both", 2)];

/// Kill report prefixes pasted from killboard links
pub const KILL_PREFIXES: &[&str] = &["kill:", "abschuss:"];

/// Words following (or preceding) a system name to make it a gate
pub const GATE_WORDS: &[&str] = &["gate", "ansiblex", "ansi"];

pub const MOVEMENT_VERBS: &[&str] = &["going", "jumped", "jumping"];

pub fn keyword(text: &str) -> Option<KeywordType> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    KEYWORDS
        .iter()
        .find(|(phrase, _)| *phrase == stripped)
        .map(|(_, kind)| *kind)
}

pub fn question(text: &str) -> Option<QuestionType> {
    let lower = text.to_lowercase();
    QUESTIONS
        .iter()
        .find(|(phrase, _)| *phrase == lower)
        .map(|(_, kind)| *kind)
}

pub fn count_word(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    COUNT_WORDS
        .iter()
        .find(|(word, _)| *word == lower)
        .map(|(_, count)| *count)
}

pub fn is_one_of(text: &str, table: &[&str]) -> bool {
    table.iter().any(|entry| entry.eq_ignore_ascii_case(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_strips_punctuation() {
        assert_eq!(keyword("NV."), Some(KeywordType::NoVisual));
        assert_eq!(keyword("gate camp!"), Some(KeywordType::GateCamp));
        assert_eq!(keyword("Jita"), None);
    }

    #[test]
    fn test_question_is_exact() {
        assert_eq!(question("Loc?"), Some(QuestionType::Location));
        assert_eq!(question("how many?"), Some(QuestionType::Number));
        assert_eq!(question("loc??"), None);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_word("Both"), Some(2));
        assert_eq!(count_word("four"), None);
        assert!(is_one_of("Ansiblex", GATE_WORDS));
    }
}
