//! Chat log line parsing
//!
//! Game chat logs write one message per line:
//!
//! ```text
//! [ 2026.03.01 20:00:05 ] Cosmo Fox > Jita gate 2x Loki
//! ```
//!
//! Header lines and anything else that does not match are skipped.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*(\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2})\s*\]\s*(.+?)\s*>\s?(.*)$").unwrap()
});

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// One message from a chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl ChatLine {
    /// Parse a log line. Log timestamps are UTC.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);
        let captures = LINE_RE.captures(line)?;
        let timestamp = NaiveDateTime::parse_from_str(&captures[1], TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();
        Some(Self {
            timestamp,
            author: captures[2].to_string(),
            text: captures[3].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_message_line() {
        let line = ChatLine::parse("\u{feff}[ 2026.03.01 20:00:05 ] Cosmo Fox > Jita gate 2x Loki\r\n")
            .unwrap();
        assert_eq!(line.author, "Cosmo Fox");
        assert_eq!(line.text, "Jita gate 2x Loki");
        assert_eq!(
            line.timestamp,
            Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 5).unwrap()
        );
    }

    #[test]
    fn test_text_may_contain_separator() {
        let line = ChatLine::parse("[ 2026.03.01 20:00:05 ] Bob > 5 > 3").unwrap();
        assert_eq!(line.author, "Bob");
        assert_eq!(line.text, "5 > 3");
    }

    #[test]
    fn test_header_lines_skipped() {
        assert!(ChatLine::parse("  Channel Name:    Delve.Imperium").is_none());
        assert!(ChatLine::parse("").is_none());
        assert!(ChatLine::parse("[ 2026.13.01 20:00:05 ] Bob > hi").is_none());
    }
}
