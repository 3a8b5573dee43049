//! Glob-style URL pattern matching for `url_pattern` rules.
//!
//! Patterns support `*` (any run of characters, deliberately crossing `/`
//! boundaries so that `*github.com*` matches any GitHub URL regardless of
//! path depth) and `?` (any single character). Everything else matches
//! literally and case-insensitively, with the `http(s)://` scheme and any
//! trailing slash ignored on both sides.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of one or more `*` in a `regex::escape`d pattern
static STAR_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\\*)+").expect("star-run pattern is a valid regex")
});

/// Whether `url` matches the glob-style `pattern`.
///
/// Empty inputs and patterns that fail to compile are non-matches, never
/// errors; a user's broken pattern must not take resolution down with it.
#[must_use]
pub fn matches(url: &str, pattern: &str) -> bool {
    if url.is_empty() || pattern.is_empty() {
        return false;
    }
    match compile(&normalize(pattern)) {
        Some(regex) => regex.is_match(&normalize(url)),
        None => false,
    }
}

/// Strip the scheme and a trailing slash, lowercase the rest
fn normalize(input: &str) -> String {
    let stripped = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
    stripped.to_lowercase()
}

/// Compile a normalized glob pattern into an anchored regex.
///
/// Every regex metacharacter except `*` and `?` is escaped; `*` and `**`
/// both become `.*`, `?` becomes `.`.
fn compile(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern);
    let with_stars = STAR_RUN.replace_all(&escaped, ".*");
    let translated = with_stars.replace(r"\?", ".");
    Regex::new(&format!("^{translated}$")).ok()
}
