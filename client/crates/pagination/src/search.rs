//! Search-term sanitisation and input validation.
//!
//! Sanitisation runs exactly once, at the query layer, so a term takes one
//! canonical form before it participates in a cache key or a request.

use std::fmt;

use serde::Serialize;

const MAX_SEARCH_CHARS: usize = 100;

/// Search input rejected before it reaches the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchInputError {
    /// The input looks like an injection attempt.
    #[error("search contains disallowed characters")]
    DisallowedCharacters,
    /// The input exceeds the maximum search length.
    #[error("search too long: at most {max} characters")]
    TooLong { max: usize },
}

/// A sanitised, cache-key-safe search term.
///
/// ## Invariants
/// - Lowercase, whitespace-collapsed, at most 100 characters.
/// - Contains only word characters, spaces, dashes, and dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Normalise raw input into a canonical term.
    ///
    /// Trims, caps the length, lowercases, strips leading/trailing symbol
    /// runs, drops characters outside the allowed set, and collapses
    /// whitespace. Returns `None` when nothing searchable survives.
    #[must_use]
    pub fn sanitize(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let capped: String = trimmed.chars().take(MAX_SEARCH_CHARS).collect();
        let lowered = capped.to_lowercase();
        let edge_trimmed =
            lowered.trim_matches(|c: char| !(is_word_char(c) || c.is_whitespace()));
        let filtered: String = edge_trimmed
            .chars()
            .filter(|&c| is_word_char(c) || c.is_whitespace() || c == '-' || c == '.')
            .collect();
        let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            None
        } else {
            Some(Self(collapsed))
        }
    }

    /// The canonical term.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<SearchTerm> for String {
    fn from(term: SearchTerm) -> Self {
        term.0
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check raw form input before it is accepted as a search.
///
/// Detects the obvious injection shapes (SQL metacharacters, inline event
/// handlers, path traversal, embedded script tags) and over-long input.
///
/// # Errors
///
/// Returns [`SearchInputError`] when the input must be rejected.
pub fn validate_search_input(input: &str) -> Result<(), SearchInputError> {
    if input.is_empty() {
        return Ok(());
    }

    if input.chars().count() > MAX_SEARCH_CHARS {
        return Err(SearchInputError::TooLong {
            max: MAX_SEARCH_CHARS,
        });
    }

    let lowered = input.to_lowercase();
    let suspicious = ["--", ";", "<", ">", "{", "}", "`", "../", "..\\"]
        .iter()
        .any(|needle| lowered.contains(needle))
        || ["onload", "onerror", "onclick", "script", "iframe", "object"]
            .iter()
            .any(|needle| lowered.contains(needle));

    if suspicious {
        return Err(SearchInputError::DisallowedCharacters);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lowercases("Budi Santoso", "budi santoso")]
    #[case::collapses_whitespace("  budi   santoso ", "budi santoso")]
    #[case::strips_edge_symbols("##budi!!", "budi")]
    #[case::keeps_dash_and_dot("jl. merdeka-7", "jl. merdeka-7")]
    #[case::drops_disallowed("bu'di@desa", "budidesa")]
    fn sanitises_to_canonical_form(#[case] input: &str, #[case] expected: &str) {
        let term = SearchTerm::sanitize(input).expect("input should survive sanitisation");
        assert_eq!(term.as_str(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::symbols_only("@#$%")]
    fn rejects_unsearchable_input(#[case] input: &str) {
        assert_eq!(SearchTerm::sanitize(input), None);
    }

    #[test]
    fn caps_length_before_filtering() {
        let input = "a".repeat(250);
        let term = SearchTerm::sanitize(&input).expect("long input still sanitises");
        assert_eq!(term.as_str().chars().count(), 100);
    }

    #[rstest]
    #[case::sql_comment("name--")]
    #[case::semicolon("name;drop")]
    #[case::angle_bracket("<img src=x>")]
    #[case::event_handler("onerror=alert(1)")]
    #[case::traversal("../etc/passwd")]
    #[case::script_tag("a script here")]
    fn flags_suspicious_input(#[case] input: &str) {
        assert_eq!(
            validate_search_input(input),
            Err(SearchInputError::DisallowedCharacters),
        );
    }

    #[test]
    fn flags_over_long_input() {
        let input = "a".repeat(101);
        assert_eq!(
            validate_search_input(&input),
            Err(SearchInputError::TooLong { max: 100 }),
        );
    }

    #[test]
    fn accepts_ordinary_input() {
        assert_eq!(validate_search_input("budi santoso"), Ok(()));
        assert_eq!(validate_search_input(""), Ok(()));
    }
}
