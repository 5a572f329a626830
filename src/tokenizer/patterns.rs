//! Composite pattern detectors
//!
//! Each detector inspects the tail of the token list built so far and may
//! collapse the last few tokens into one composite token. They run after
//! every append, in a fixed order: kill, gate, movement, ship count,
//! standalone count, question, plain-text merge.

use std::ops::Range;
use std::sync::LazyLock;

use intel_types::{Kill, Movement, Question, TokenType};
use regex::Regex;
use smallvec::smallvec;

use super::vocabulary::{self, GATE_WORDS, KILL_PREFIXES, MOVEMENT_VERBS};
use super::MultiTypeToken;

/// "2", "2x", "2*" before a ship
static COUNT_BEFORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)[x*]?$").unwrap());

/// "x2" after a ship
static COUNT_AFTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^x(\d+)$").unwrap());

static PLAIN_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:x(\d+)|(\d+)x|(\d+)\*)$").unwrap());

static PLUS_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+ ?(\d+)|(\d+) ?\+)$").unwrap());

static EQUALS_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:= ?(\d+)|(\d+) neuts?)$").unwrap());

/// Run every detector over the tail of `tokens`.
/// `is_last` is true when no words remain after the newest token.
pub(crate) fn apply_detectors(tokens: &mut Vec<MultiTypeToken>, is_last: bool) {
    detect_kill(tokens);
    detect_gate(tokens);
    detect_movement(tokens, is_last);
    detect_ship_count(tokens);
    detect_standalone_count(tokens);
    detect_question(tokens);
    merge_plain_text(tokens);
}

/// Replace `tokens[range]` with one token of the given type
fn collapse(tokens: &mut Vec<MultiTypeToken>, range: Range<usize>, token_type: TokenType) {
    let removed: Vec<MultiTypeToken> = tokens.splice(range.clone(), std::iter::empty()).collect();
    let is_link = removed.iter().any(|t| t.is_link);
    let words = removed.into_iter().flat_map(|t| t.words).collect();
    tokens.insert(
        range.start,
        MultiTypeToken {
            words,
            types: smallvec![token_type],
            is_link,
        },
    );
}

/// First capture group that matched, as a positive count
fn captured_count(re: &Regex, text: &str) -> Option<u32> {
    let captures = re.captures(text)?;
    let count: u32 = captures
        .iter()
        .skip(1)
        .flatten()
        .next()?
        .as_str()
        .parse()
        .ok()?;
    (count > 0).then_some(count)
}

fn detect_kill(tokens: &mut Vec<MultiTypeToken>) {
    let n = tokens.len();
    if n < 3 {
        return;
    }
    if !vocabulary::is_one_of(&tokens[n - 3].text(), KILL_PREFIXES) {
        return;
    }
    let target_text = tokens[n - 1].text();
    let Some(target) = target_text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .filter(|t| !t.is_empty())
    else {
        return;
    };
    let name = &tokens[n - 2];
    let kill = Kill {
        name: name.text(),
        character_id: name.character_id(),
        target: target.to_string(),
    };
    collapse(tokens, n - 3..n, TokenType::Kill(kill));
}

fn detect_gate(tokens: &mut Vec<MultiTypeToken>) {
    let n = tokens.len();
    if n < 2 {
        return;
    }
    let (first, second) = (&tokens[n - 2], &tokens[n - 1]);
    let found = match (first.system(), second.system()) {
        (Some(system), _) if vocabulary::is_one_of(&second.text(), GATE_WORDS) => {
            Some((system.clone(), second.text()))
        }
        (_, Some(system)) if vocabulary::is_one_of(&first.text(), GATE_WORDS) => {
            Some((system.clone(), first.text()))
        }
        _ => None,
    };
    if let Some((system, word)) = found {
        let is_ansiblex = !word.eq_ignore_ascii_case("gate");
        collapse(tokens, n - 2..n, TokenType::Gate { system, is_ansiblex });
    }
}

fn detect_movement(tokens: &mut Vec<MultiTypeToken>, is_last: bool) {
    let n = tokens.len();
    // Mid-message the destination is confirmed only once the token after it
    // exists, since that token could still turn a system into a gate.
    if n >= 3 && collapse_movement(tokens, n - 3) {
        return;
    }
    if is_last && n >= 2 {
        collapse_movement(tokens, n - 2);
    }
}

fn collapse_movement(tokens: &mut Vec<MultiTypeToken>, start: usize) -> bool {
    let verb = tokens[start].text();
    if !vocabulary::is_one_of(&verb, MOVEMENT_VERBS) {
        return false;
    }
    let destination = &tokens[start + 1];
    let (to_system, is_gate) = match (destination.gate(), destination.system()) {
        (Some(system), _) => (system.clone(), true),
        (None, Some(system)) => (system.clone(), false),
        (None, None) => return false,
    };
    let movement = Movement {
        verb: verb.to_lowercase(),
        to_system,
        is_gate,
    };
    collapse(tokens, start..start + 2, TokenType::Movement(movement));
    true
}

fn detect_ship_count(tokens: &mut Vec<MultiTypeToken>) {
    let n = tokens.len();
    if n < 2 {
        return;
    }

    if let Some((ship, is_plural)) = tokens[n - 1].ship().map(|(s, _, p)| (s.clone(), p)) {
        let before = tokens[n - 2].text();
        let count = captured_count(&COUNT_BEFORE_RE, &before).or_else(|| vocabulary::count_word(&before));
        if let Some(count) = count {
            collapse(
                tokens,
                n - 2..n,
                TokenType::Ship {
                    ship,
                    count,
                    is_plural,
                },
            );
            return;
        }
    }

    if let Some((ship, is_plural)) = tokens[n - 2].ship().map(|(s, _, p)| (s.clone(), p)) {
        if let Some(count) = captured_count(&COUNT_AFTER_RE, &tokens[n - 1].text()) {
            collapse(
                tokens,
                n - 2..n,
                TokenType::Ship {
                    ship,
                    count,
                    is_plural,
                },
            );
        }
    }
}

fn detect_standalone_count(tokens: &mut [MultiTypeToken]) {
    let Some(last) = tokens.last_mut() else {
        return;
    };
    if !last.types.is_empty() {
        return;
    }
    let text = last.text();
    let count = if let Some(count) = captured_count(&PLAIN_COUNT_RE, &text) {
        Some((count, false, false))
    } else if let Some(count) = captured_count(&PLUS_COUNT_RE, &text) {
        Some((count, true, false))
    } else {
        captured_count(&EQUALS_COUNT_RE, &text).map(|count| (count, false, true))
    };
    if let Some((count, is_plus, is_equals)) = count {
        last.types = smallvec![TokenType::Count {
            count,
            is_plus,
            is_equals,
        }];
    }
}

fn detect_question(tokens: &mut [MultiTypeToken]) {
    let Some(last) = tokens.last_mut() else {
        return;
    };
    if !last
        .types
        .iter()
        .all(|t| matches!(t, TokenType::Character(_)))
    {
        return;
    }
    let text = last.text();
    if let Some(kind) = vocabulary::question(&text) {
        last.types = smallvec![TokenType::Question(Question { kind, text })];
    }
}

/// Merge adjacent plain tokens, leaving the final two for later lookahead
fn merge_plain_text(tokens: &mut Vec<MultiTypeToken>) {
    if tokens.len() < 4 {
        return;
    }
    let tail = tokens.split_off(tokens.len() - 2);
    let mut head: Vec<MultiTypeToken> = Vec::with_capacity(tokens.len() + 2);
    for token in tokens.drain(..) {
        match head.last_mut() {
            Some(previous) if previous.is_mergeable() && token.is_mergeable() => {
                previous.words.extend(token.words);
            }
            _ => head.push(token),
        }
    }
    head.extend(tail);
    *tokens = head;
}
