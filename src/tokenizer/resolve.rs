//! Post-search passes over each finished segmentation
//!
//! 1. Character filtering, repeated until nothing changes, then the same
//!    verdict applied to kill victims
//! 2. Per-token resolution of remaining multi-type ambiguity
//! 3. Coalescing of adjacent plain-text tokens

use intel_types::{CharacterActivity, Token, TokenType};

use super::classify::SpanClassifier;
use super::MultiTypeToken;

/// Drop implausible character candidates until a fixed point is reached.
/// Removing one candidate turns its token into plain text, which can change
/// the verdict for its neighbors.
pub(crate) fn filter_characters(
    mut tokens: Vec<MultiTypeToken>,
    classifier: &SpanClassifier<'_>,
) -> Vec<MultiTypeToken> {
    loop {
        let dropped: Vec<usize> = (0..tokens.len())
            .filter(|&i| tokens[i].character_id().is_some())
            .filter(|&i| is_implausible_character(&tokens, i, classifier))
            .collect();
        if dropped.is_empty() {
            scrub_kill_victims(&mut tokens, classifier);
            return tokens;
        }
        for i in dropped {
            tokens[i]
                .types
                .retain(|t| !matches!(t, TokenType::Character(_)));
        }
    }
}

/// Kills capture the victim's id before filtering runs. Dormant or
/// item-named victims lose it here.
fn scrub_kill_victims(tokens: &mut [MultiTypeToken], classifier: &SpanClassifier<'_>) {
    let words = &classifier.lookups().words;
    for token_type in tokens.iter_mut().flat_map(|t| t.types.iter_mut()) {
        let TokenType::Kill(kill) = token_type else {
            continue;
        };
        if kill.character_id.is_none() {
            continue;
        }
        let dormant = classifier
            .character_status(&kill.name)
            .is_some_and(|s| s.activity == CharacterActivity::Dormant);
        if dormant || words.is_type_name(&kill.name) {
            kill.character_id = None;
        }
    }
}

fn is_implausible_character(
    tokens: &[MultiTypeToken],
    index: usize,
    classifier: &SpanClassifier<'_>,
) -> bool {
    let token = &tokens[index];
    let text = token.text();
    let Some(status) = classifier.character_status(&text) else {
        return false;
    };
    if status.activity == CharacterActivity::Dormant {
        return true;
    }

    let words = &classifier.lookups().words;
    if words.is_type_name(&text) {
        return true;
    }
    if status.activity == CharacterActivity::Active
        || !token.words.iter().all(|w| words.is_english_word(w))
    {
        return false;
    }

    let previous = index.checked_sub(1).and_then(|i| tokens.get(i));
    let next = tokens.get(index + 1);

    if is_lowercase_text(&text) {
        let touches_lowercase = [previous, next]
            .into_iter()
            .flatten()
            .any(|n| is_textual(n) && is_lowercase_text(&n.text()));
        if touches_lowercase {
            return true;
        }
    }

    is_capitalized(&text)
        && next.is_some_and(|n| n.types.is_empty() && is_lowercase_text(&n.text()))
}

/// Plain text, a question or a link
fn is_textual(token: &MultiTypeToken) -> bool {
    token.types.is_empty()
        || token.is_link
        || token
            .types
            .iter()
            .any(|t| matches!(t, TokenType::Question(_)))
}

fn is_lowercase_text(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_uppercase)
}

/// Only the first letter is uppercase
fn is_capitalized(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(char::is_uppercase) && !chars.any(char::is_uppercase)
}

/// Pick one type per token.
///
/// - Ship vs system: ship only when another token already names a system
/// - System vs character: system only when it lies in a hinted region
/// - An untyped link becomes a `Link`
pub(crate) fn resolve_types(tokens: Vec<MultiTypeToken>, region_hints: &[String]) -> Vec<Token> {
    let has_system: Vec<bool> = tokens.iter().map(|t| t.system().is_some()).collect();

    tokens
        .into_iter()
        .enumerate()
        .map(|(index, token)| {
            let mut types = token.types;

            let is_ship = |t: &TokenType| matches!(t, TokenType::Ship { .. });
            let is_system = |t: &TokenType| matches!(t, TokenType::System(_));
            let is_character = |t: &TokenType| matches!(t, TokenType::Character(_));

            if types.iter().any(is_ship) && types.iter().any(is_system) {
                let other_system = has_system
                    .iter()
                    .enumerate()
                    .any(|(other, found)| other != index && *found);
                if other_system {
                    types.retain(|t| !is_system(&*t));
                } else {
                    types.retain(|t| !is_ship(&*t));
                }
            }

            if types.iter().any(is_character) {
                let hinted_system = types.iter().any(|t| match t {
                    TokenType::System(system) => region_hints
                        .iter()
                        .any(|r| r.eq_ignore_ascii_case(&system.region)),
                    _ => false,
                });
                if hinted_system {
                    types.retain(|t| !is_character(&*t));
                } else {
                    types.retain(|t| !is_system(&*t));
                }
            }

            let mut token_type = types.into_iter().next();
            if token_type.is_none() && token.is_link {
                token_type = Some(TokenType::Link);
            }
            Token {
                words: token.words,
                token_type,
                is_link: token.is_link,
            }
        })
        .collect()
}

/// Merge adjacent untyped tokens into single plain-text runs
pub(crate) fn coalesce_plain(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match result.last_mut() {
            Some(previous)
                if !previous.is_typed()
                    && !previous.is_link
                    && !token.is_typed()
                    && !token.is_link =>
            {
                previous.words.extend(token.words);
            }
            _ => result.push(token),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_types::{ShipType, SolarSystem};

    fn multi(text: &str, types: Vec<TokenType>) -> MultiTypeToken {
        MultiTypeToken::new(
            text.split(' ').map(str::to_string).collect(),
            types.into_iter().collect(),
        )
    }

    fn jita() -> TokenType {
        TokenType::System(SolarSystem::new(30000142, "Jita", "The Forge"))
    }

    #[test]
    fn test_ship_system_prefers_system_when_alone() {
        let rifter = TokenType::Ship {
            ship: ShipType::new(587, "Rifter"),
            count: 1,
            is_plural: false,
        };
        let rifter_system = TokenType::System(SolarSystem::new(1, "Rifter", "Nowhere"));

        let alone = resolve_types(
            vec![multi("Rifter", vec![rifter_system.clone(), rifter.clone()])],
            &[],
        );
        assert_eq!(alone[0].token_type, Some(rifter_system.clone()));

        let with_jita = resolve_types(
            vec![
                multi("Jita", vec![jita()]),
                multi("Rifter", vec![rifter_system, rifter.clone()]),
            ],
            &[],
        );
        assert_eq!(with_jita[1].token_type, Some(rifter));
    }

    #[test]
    fn test_system_character_uses_region_hints() {
        let tokens = || vec![multi("Jita", vec![jita(), TokenType::Character(7)])];
        let hinted = resolve_types(tokens(), &["The Forge".to_string()]);
        assert_eq!(hinted[0].token_type, Some(jita()));
        let unhinted = resolve_types(tokens(), &["Delve".to_string()]);
        assert_eq!(unhinted[0].token_type, Some(TokenType::Character(7)));
    }

    #[test]
    fn test_untyped_link_becomes_link() {
        let mut token = multi("Some Item", vec![]);
        token.is_link = true;
        let resolved = resolve_types(vec![token], &[]);
        assert_eq!(resolved[0].token_type, Some(TokenType::Link));
    }

    #[test]
    fn test_coalesce_plain_runs() {
        let tokens = vec![
            Token::plain(vec!["hello".to_string()]),
            Token::plain(vec!["there".to_string()]),
            Token::new(vec!["Jita".to_string()], Some(jita())),
            Token::plain(vec!["now".to_string()]),
        ];
        let coalesced = coalesce_plain(tokens);
        assert_eq!(coalesced.len(), 3);
        assert_eq!(coalesced[0].text(), "hello there");
    }

    #[test]
    fn test_text_case_helpers() {
        assert!(is_lowercase_text("bob"));
        assert!(!is_lowercase_text("?"));
        assert!(is_capitalized("Bob"));
        assert!(!is_capitalized("Cosmo Fox"));
    }
}
