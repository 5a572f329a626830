//! Intel chat CLI
//!
//! Reads a chat log (file or stdin), understands every message against a
//! YAML universe and prints one JSON object per message.
//!
//! Usage:
//!   cargo run --features cli --bin intel_cli -- \
//!     --universe data/universe.yaml \
//!     --region Delve --region "Period Basis" \
//!     Delve.Imperium_20260301_200000.txt
//!
//!   # Single message, no conversation context
//!   cargo run --features cli --bin intel_cli -- \
//!     --universe data/universe.yaml \
//!     --message "Jita gate 2x Loki nv"

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use chat_intel::{ChatLine, IntelParser, ParsedMessage, ParserConfig, StaticUniverse};

/// Messages kept as conversation context
const HISTORY_LIMIT: usize = 50;

/// Understand intel channel chat logs
#[derive(Parser, Debug)]
#[command(name = "intel_cli")]
#[command(about = "Parse intel channel chat into structured reports")]
struct Args {
    /// YAML universe with systems, ships and characters
    #[arg(long, short = 'u', env = "INTEL_UNIVERSE")]
    universe: PathBuf,

    /// Parser configuration YAML (defaults from environment otherwise)
    #[arg(long, short = 'c', env = "INTEL_CONFIG")]
    config: Option<PathBuf>,

    /// Region the channel covers (can be specified multiple times)
    #[arg(long, short = 'r')]
    region: Vec<String>,

    /// Parse a single message instead of a log
    #[arg(long, short = 'm', conflicts_with = "log")]
    message: Option<String>,

    /// Chat log file (stdin when omitted)
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ParserConfig::from_yaml_file(path)?,
        None => ParserConfig::default(),
    };
    if !args.universe.exists() {
        eprintln!(
            "{} Universe file not found: {}",
            "ERROR:".red().bold(),
            args.universe.display()
        );
        std::process::exit(1);
    }
    let universe = StaticUniverse::from_yaml_file(&args.universe)?;
    let parser = IntelParser::from_universe(universe, config);

    if let Some(message) = &args.message {
        let understanding = parser.understand(message, &args.region).await;
        println!("{}", serde_json::to_string(&understanding)?);
        return Ok(());
    }

    let reader: Box<dyn BufRead> = match &args.log {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("Failed to open chat log {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut history: Vec<ParsedMessage> = Vec::new();
    let mut processed = 0usize;
    let mut skipped = 0usize;
    for line in reader.lines() {
        let line = line?;
        let Some(chat) = ChatLine::parse(&line) else {
            skipped += 1;
            continue;
        };

        let parsed = parser
            .understand_in_channel(
                &chat.author,
                chat.timestamp,
                &chat.text,
                &args.region,
                &history,
            )
            .await;
        println!("{}", serde_json::to_string(&parsed)?);
        processed += 1;

        history.push(parsed);
        if history.len() > HISTORY_LIMIT {
            history.remove(0);
        }
    }

    eprintln!(
        "{} {} messages, {} lines skipped",
        "Done:".green().bold(),
        processed,
        skipped
    );
    Ok(())
}
