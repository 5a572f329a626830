//! Chat Intel - understanding intel channel chatter
//!
//! Turns free-text chat lines ("2x loki jita gate nv", "loc?") into
//! structured reports of what was seen where.
//!
//! ## Pipeline
//! Message -> Tokenizer (all segmentations) -> Ranking (best one)
//!   -> Extractor (IntelUnderstanding) -> Conversation merge (answers to questions)
//!
//! Name, ship and character lookups are traits in [`lookup`]; the
//! [`lookup::StaticUniverse`] implements them over in-memory tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_intel::{IntelParser, ParserConfig, StaticUniverse};
//!
//! # async fn run() -> chat_intel::Result<()> {
//! let universe = StaticUniverse::from_yaml_file("universe.yaml")?;
//! let parser = IntelParser::from_universe(universe, ParserConfig::default());
//! let understanding = parser.understand("Jita gate 2x Loki", &[]).await;
//! println!("{:?}", understanding.entities);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Parser settings
pub mod config;

// Lookup service contracts and the in-memory universe
pub mod lookup;

// Message understanding stages
pub mod tokenizer;
pub mod ranking;
pub mod extract;
pub mod conversation;

// End-to-end entry point
pub mod pipeline;

// Chat log input
pub mod chat_log;

pub use intel_types;

pub use chat_log::ChatLine;
pub use config::ParserConfig;
pub use conversation::ParsedMessage;
pub use error::{ConfigError, IntelError, Result, UniverseError};
pub use lookup::{Lookups, StaticUniverse};
pub use pipeline::IntelParser;
