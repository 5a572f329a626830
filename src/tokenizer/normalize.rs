//! Chat message normalization
//!
//! Chat logs render links with a trailing `*`. Normalization turns that
//! artifact into a double space, which the tokenizer reads as a link marker
//! (a blank word) after splitting on single spaces.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of three or more spaces
static WIDE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {3,}").unwrap());

/// Cyrillic small letter o, a common look-alike in pasted names
const CYRILLIC_O: char = '\u{043E}';

/// Normalize a raw chat message, in order:
/// - link artifacts `* ` and a trailing `*` become a double space, `*)` becomes `)`
/// - commas are removed
/// - the Cyrillic look-alike `о` becomes `o`
/// - runs of 3+ spaces collapse to 2
/// - a single leading and a single trailing space are trimmed
pub fn normalize_message(message: &str) -> String {
    let mut text = message.replace("* ", "  ").replace("*)", ")");
    if let Some(stripped) = text.strip_suffix('*') {
        text = format!("{stripped}  ");
    }

    let text: String = text
        .chars()
        .filter(|c| *c != ',')
        .map(|c| if c == CYRILLIC_O { 'o' } else { c })
        .collect();

    let text = WIDE_SPACE_RE.replace_all(&text, "  ");
    let text = text.strip_prefix(' ').unwrap_or(&text);
    let text = text.strip_suffix(' ').unwrap_or(text);
    text.to_string()
}

/// Split normalized text into words. Blank entries are link markers.
pub fn split_words(normalized: &str) -> Vec<String> {
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.split(' ').map(str::to_string).collect()
}
