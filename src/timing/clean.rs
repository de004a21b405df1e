use regex::Regex;
use std::sync::LazyLock;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Drops `[Verse]`-style annotations and squeezes whitespace.
pub fn clean_text(raw: &str) -> String {
    let stripped = BRACKETED.replace_all(raw, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
