//! Chat message tokenizer
//!
//! Enumerates every plausible segmentation of a chat message. There is no
//! grammar to lean on: intel chat is shorthand ("2x loki jita gate nv"), so
//! the tokenizer runs a breadth-first search over 1-3 word windows, keeps
//! every candidate type a window could have, and collapses known composite
//! shapes (kills, gates, movement, counts, questions) as it goes.
//!
//! Resolution of the remaining ambiguity happens in two places: per-token
//! passes here (`resolve`) and the ranking policy across whole
//! segmentations (`crate::ranking`).

use std::collections::{HashMap, HashSet, VecDeque};

use futures::future::join_all;
use intel_types::{
    CharacterId, CharacterStatus, ShipType, SolarSystem, Token, TokenType,
};

use crate::config::ParserConfig;
use crate::lookup::Lookups;

pub mod classify;
pub mod normalize;
mod patterns;
mod resolve;
pub mod vocabulary;

use classify::{is_plausible_character_name, Candidates, SpanClassifier};
use normalize::{normalize_message, split_words};

/// A word span with every type it could have, before disambiguation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MultiTypeToken {
    pub words: Vec<String>,
    pub types: Candidates,
    pub is_link: bool,
}

impl MultiTypeToken {
    pub fn new(words: Vec<String>, types: Candidates) -> Self {
        Self {
            words,
            types,
            is_link: false,
        }
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Plain text that may be merged with its plain neighbors
    pub fn is_mergeable(&self) -> bool {
        self.types.is_empty() && !self.is_link
    }

    pub fn system(&self) -> Option<&SolarSystem> {
        self.types.iter().find_map(|t| match t {
            TokenType::System(system) => Some(system),
            _ => None,
        })
    }

    pub fn gate(&self) -> Option<&SolarSystem> {
        self.types.iter().find_map(|t| match t {
            TokenType::Gate { system, .. } => Some(system),
            _ => None,
        })
    }

    pub fn ship(&self) -> Option<(&ShipType, u32, bool)> {
        self.types.iter().find_map(|t| match t {
            TokenType::Ship {
                ship,
                count,
                is_plural,
            } => Some((ship, *count, *is_plural)),
            _ => None,
        })
    }

    pub fn character_id(&self) -> Option<CharacterId> {
        self.types.iter().find_map(|t| match t {
            TokenType::Character(id) => Some(*id),
            _ => None,
        })
    }
}

/// Search state: tokens built so far and how many words they consumed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Parsing {
    tokens: Vec<MultiTypeToken>,
    consumed: usize,
}

/// Segments chat messages into candidate token sequences
#[derive(Clone)]
pub struct Tokenizer {
    lookups: Lookups,
    config: ParserConfig,
}

impl Tokenizer {
    pub fn new(lookups: Lookups, config: ParserConfig) -> Self {
        Self { lookups, config }
    }

    /// All distinct complete segmentations of `message`, in discovery order.
    ///
    /// Never fails: when the search explodes, the result is a single
    /// segmentation holding one untyped token with every word.
    pub async fn tokenize(&self, message: &str, region_hints: &[String]) -> Vec<Vec<Token>> {
        let normalized = normalize_message(message);
        let words = split_words(&normalized);
        let statuses = self.character_statuses(&words).await;
        let classifier = SpanClassifier::new(&self.lookups, region_hints, &statuses);
        self.search(&words, &classifier)
    }

    /// Batch existence/activity lookup for every span that could be a name.
    /// Failed batches are logged and treated as "no such characters".
    async fn character_statuses(&self, words: &[String]) -> HashMap<String, CharacterStatus> {
        let mut seen = HashSet::new();
        let mut names: Vec<String> = Vec::new();
        for (start, end) in spans(words, self.config.max_span_words) {
            let name = words[start..end].join(" ");
            if is_plausible_character_name(&name) && seen.insert(name.clone()) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return HashMap::new();
        }

        let directory = &self.lookups.characters;
        let batches = names
            .chunks(self.config.character_batch_size)
            .map(|batch| directory.character_names_status(batch));

        let mut statuses = HashMap::new();
        for result in join_all(batches).await {
            match result {
                Ok(found) => statuses.extend(found),
                Err(e) => tracing::warn!("Character name lookup failed, treating as unknown: {}", e),
            }
        }
        statuses
    }

    fn search(&self, words: &[String], classifier: &SpanClassifier<'_>) -> Vec<Vec<Token>> {
        let max_span = self.config.max_span_words;
        let mut cache: HashMap<(usize, usize), Candidates> = HashMap::new();
        let mut frontier: VecDeque<Parsing> = VecDeque::new();
        let mut queued: HashSet<Parsing> = HashSet::new();
        let mut finished: Vec<Vec<MultiTypeToken>> = Vec::new();

        let initial = Parsing {
            tokens: Vec::new(),
            consumed: 0,
        };
        queued.insert(initial.clone());
        frontier.push_back(initial);

        while let Some(mut state) = frontier.pop_front() {
            queued.remove(&state);

            // Link markers flag the token before them
            while state.consumed < words.len() && words[state.consumed].is_empty() {
                if let Some(last) = state.tokens.last_mut() {
                    last.is_link = true;
                }
                state.consumed += 1;
            }
            if state.consumed == words.len() {
                finished.push(state.tokens);
                continue;
            }

            let remaining = words.len() - state.consumed;
            for length in 1..=max_span.min(remaining) {
                let start = state.consumed;
                let end = start + length;
                if words[start..end].iter().any(String::is_empty) {
                    break;
                }

                let types = cache
                    .entry((start, end))
                    .or_insert_with(|| classifier.classify(&words[start..end]))
                    .clone();

                let mut tokens = state.tokens.clone();
                tokens.push(MultiTypeToken::new(words[start..end].to_vec(), types));
                let is_last = words[end..].iter().all(String::is_empty);
                patterns::apply_detectors(&mut tokens, is_last);

                let next = Parsing {
                    tokens,
                    consumed: end,
                };
                if end == words.len() {
                    finished.push(next.tokens);
                } else if queued.insert(next.clone()) {
                    frontier.push_back(next);
                    if frontier.len() > self.config.max_frontier {
                        tracing::debug!(
                            "Tokenizer frontier exceeded {} states, falling back to plain text",
                            self.config.max_frontier
                        );
                        return vec![fallback(words)];
                    }
                }
            }
        }

        let mut seen: HashSet<Vec<Token>> = HashSet::new();
        let mut results = Vec::new();
        for tokens in finished {
            let tokens = resolve::filter_characters(tokens, classifier);
            let tokens = resolve::resolve_types(tokens, classifier.region_hints());
            let tokens = resolve::coalesce_plain(tokens);
            if seen.insert(tokens.clone()) {
                results.push(tokens);
            }
        }
        results
    }
}

/// Every (start, end) window of up to `max_span` words that holds no link marker
fn spans(words: &[String], max_span: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..words.len()).flat_map(move |start| {
        (start + 1..=(start + max_span).min(words.len()))
            .take_while(move |&end| !words[end - 1].is_empty())
            .map(move |end| (start, end))
    })
}

/// One untyped token covering every word
fn fallback(words: &[String]) -> Vec<Token> {
    let words: Vec<String> = words.iter().filter(|w| !w.is_empty()).cloned().collect();
    if words.is_empty() {
        return Vec::new();
    }
    vec![Token::plain(words)]
}
