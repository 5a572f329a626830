//! End-to-end message understanding
//!
//! Tokenize → rank → extract → merge. Each stage is also exposed on its own
//! so callers can inspect intermediate results.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use intel_types::{IntelUnderstanding, Token};

use crate::config::ParserConfig;
use crate::conversation::{self, ParsedMessage};
use crate::extract::Extractor;
use crate::lookup::{Lookups, StaticUniverse};
use crate::ranking;
use crate::tokenizer::Tokenizer;

/// Chat message parser bound to a set of lookup services
#[derive(Clone)]
pub struct IntelParser {
    tokenizer: Tokenizer,
    extractor: Extractor,
    config: ParserConfig,
}

impl IntelParser {
    pub fn new(lookups: Lookups, config: ParserConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(lookups.clone(), config.clone()),
            extractor: Extractor::new(lookups),
            config,
        }
    }

    /// Parser over an in-memory universe, with its fuzzy matching tuned
    /// by `config.fuzzy_threshold` and `config.fuzzy_min_len`
    pub fn from_universe(universe: StaticUniverse, config: ParserConfig) -> Self {
        let universe = universe.with_fuzzy(config.fuzzy_threshold, config.fuzzy_min_len);
        Self::new(Lookups::from_universe(Arc::new(universe)), config)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Every distinct segmentation of `message`
    pub async fn tokenize(&self, message: &str, region_hints: &[String]) -> Vec<Vec<Token>> {
        self.tokenizer.tokenize(message, region_hints).await
    }

    pub fn choose_best(&self, candidates: &[Vec<Token>]) -> Vec<Token> {
        ranking::choose_best(candidates)
    }

    pub async fn extract(&self, tokens: &[Token]) -> IntelUnderstanding {
        self.extractor.extract(tokens).await
    }

    /// Understanding of a single message, without conversation context
    pub async fn understand(&self, message: &str, region_hints: &[String]) -> IntelUnderstanding {
        let candidates = self.tokenize(message, region_hints).await;
        let tokens = self.choose_best(&candidates);
        tracing::debug!(
            "Chose {} tokens out of {} segmentations for {:?}",
            tokens.len(),
            candidates.len(),
            message
        );
        self.extract(&tokens).await
    }

    /// Understand a message in the context of its channel's history.
    ///
    /// `history` holds earlier messages of the same channel, oldest first.
    /// Messages of one channel must be processed in order; the caller
    /// appends the returned message to the history.
    pub async fn understand_in_channel(
        &self,
        author: &str,
        timestamp: DateTime<Utc>,
        text: &str,
        region_hints: &[String],
        history: &[ParsedMessage],
    ) -> ParsedMessage {
        let mut message = ParsedMessage {
            author: author.to_string(),
            timestamp,
            text: text.to_string(),
            understanding: self.understand(text, region_hints).await,
        };
        message.understanding =
            conversation::merge(&message, history, self.config.question_window());
        message
    }
}
