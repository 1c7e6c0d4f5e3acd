//! Small text helpers shared by the analyzers: sentence splitting, whole-word
//! search, bullet detection and literal occurrence counting.

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n+").expect("valid sentence regex"));

static NUMBERED_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[.)]\s+").expect("valid numbered bullet regex"));

const BULLET_MARKERS: &[char] = &['-', '*', '•', '·', '◦', '▪', '–'];

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits text into trimmed, non-empty sentences. Lines count as sentence
/// boundaries; a period only ends a sentence when followed by whitespace, so
/// terms like `node.js` survive intact.
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences of `text` that contain `term` (case-insensitive).
pub fn sentences_containing<'a>(text: &'a str, term: &str) -> Vec<&'a str> {
    let term = term.to_lowercase();
    sentences(text)
        .into_iter()
        .filter(|s| s.to_lowercase().contains(&term))
        .collect()
}

/// Non-overlapping literal occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets of `term` in `haystack` where the match is not embedded in a
/// larger word. Works for terms with symbols (`c++`, `node.js`) where a regex
/// `\b` would not.
pub fn find_whole_word(haystack: &str, term: &str) -> Vec<usize> {
    if term.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(term)
        .filter(|(start, matched)| {
            let before = haystack[..*start].chars().next_back();
            let after = haystack[start + matched.len()..].chars().next();
            let open = before.map_or(true, |c| !is_word_char(c));
            let close = after.map_or(true, |c| !is_word_char(c));
            open && close
        })
        .map(|(start, _)| start)
        .collect()
}

pub fn contains_whole_word(haystack: &str, term: &str) -> bool {
    !find_whole_word(haystack, term).is_empty()
}

pub fn is_bullet(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(BULLET_MARKERS) || NUMBERED_BULLET.is_match(trimmed)
}

/// Removes a leading bullet marker or list number, returning the item text.
pub fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim();
    if let Some(m) = NUMBERED_BULLET.find(trimmed) {
        return trimmed[m.end()..].trim();
    }
    trimmed.trim_start_matches(BULLET_MARKERS).trim()
}

/// Inserts `insertion` right after the first case-insensitive occurrence of
/// `needle`, keeping the original casing of the match. Returns `None` when
/// `needle` is absent.
pub fn insert_after_first_ignore_case(haystack: &str, needle: &str, insertion: &str) -> Option<String> {
    let needle_lower = needle.to_lowercase();
    let end = haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            haystack[i..]
                .get(..needle.len())
                .is_some_and(|window| window.to_lowercase() == needle_lower)
        })?
        + needle.len();
    Some(format!("{}{}{}", &haystack[..end], insertion, &haystack[end..]))
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
