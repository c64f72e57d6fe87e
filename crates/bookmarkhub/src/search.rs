//! Advanced search queries.
//!
//! A query is lowercased and split on whitespace. Each token is one term:
//!
//! - `rust` must appear somewhere in the bookmark (AND).
//! - `rust|go|zig` needs any one of its alternatives to appear (OR).
//!
//! So `tutorial rust|go` finds bookmarks mentioning "tutorial" and at least
//! one of "rust" or "go". Matching is a plain substring scan over the title,
//! URL, description and tags.

use std::fmt;

use crate::bookmark::Bookmark;

/// One term of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Keyword that must be present.
    And(String),
    /// Alternatives, at least one of which must be present.
    Or(Vec<String>),
}

impl Term {
    /// Whether `text` (already lowercased) satisfies the term.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::And(keyword) => text.contains(keyword.as_str()),
            Self::Or(keywords) => keywords.iter().any(|k| text.contains(k.as_str())),
        }
    }
}

/// A parsed search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<Term>,
}

impl SearchQuery {
    /// Parse a query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let terms = query
            .to_lowercase()
            .split_whitespace()
            .filter_map(|token| {
                if token.contains('|') {
                    let keywords: Vec<String> = token
                        .split('|')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect();
                    (!keywords.is_empty()).then_some(Term::Or(keywords))
                } else {
                    Some(Term::And(token.to_string()))
                }
            })
            .collect();

        Self { terms }
    }

    /// The parsed terms, in query order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether the query has no terms and so matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether lowercased `text` satisfies every term.
    #[must_use]
    pub fn matches_text(&self, text: &str) -> bool {
        self.terms.iter().all(|term| term.matches(text))
    }

    /// Whether the bookmark satisfies every term.
    #[must_use]
    pub fn matches(&self, bookmark: &Bookmark) -> bool {
        self.is_empty() || self.matches_text(&bookmark.searchable_text())
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .terms
            .iter()
            .map(|term| match term {
                Term::And(keyword) => keyword.clone(),
                Term::Or(keywords) => keywords.join("|"),
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::BookmarkDraft;

    fn bookmark(title: &str, url: &str, description: &str) -> Bookmark {
        Bookmark::new(BookmarkDraft {
            url: url.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_and_terms() {
        let query = SearchQuery::parse("  Rust   Tutorial ");
        assert_eq!(
            query.terms(),
            &[
                Term::And("rust".to_string()),
                Term::And("tutorial".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_or_group() {
        let query = SearchQuery::parse("rust|GO||zig|");
        assert_eq!(
            query.terms(),
            &[Term::Or(vec![
                "rust".to_string(),
                "go".to_string(),
                "zig".to_string()
            ])]
        );
    }

    #[test]
    fn test_parse_drops_empty_or_group() {
        let query = SearchQuery::parse("| || rust");
        assert_eq!(query.terms(), &[Term::And("rust".to_string())]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let b = bookmark("Anything", "https://example.com", "");
        assert!(SearchQuery::parse("").matches(&b));
        assert!(SearchQuery::parse("   ").matches(&b));
        assert!(SearchQuery::parse("|").matches(&b));
    }

    #[test]
    fn test_and_requires_all_keywords() {
        let b = bookmark("Rust Book", "https://doc.rust-lang.org/book", "learn rust");
        assert!(SearchQuery::parse("rust book").matches(&b));
        assert!(!SearchQuery::parse("rust python").matches(&b));
    }

    #[test]
    fn test_or_requires_any_keyword() {
        let b = bookmark("Go Tour", "https://go.dev/tour", "");
        assert!(SearchQuery::parse("rust|tour").matches(&b));
        assert!(!SearchQuery::parse("rust|zig").matches(&b));
    }

    #[test]
    fn test_mixed_and_or() {
        let rust = bookmark("Rust tutorial", "https://example.com/rust", "");
        let go = bookmark("Go tutorial", "https://example.com/go", "");
        let other = bookmark("Go news", "https://news.example.com", "");

        let query = SearchQuery::parse("tutorial rust|go");
        assert!(query.matches(&rust));
        assert!(query.matches(&go));
        assert!(!query.matches(&other));
    }

    #[test]
    fn test_matches_url_and_description_case_insensitively() {
        let b = bookmark("Docs", "https://Docs.RS/serde", "SERIALIZATION framework");
        assert!(SearchQuery::parse("docs.rs").matches(&b));
        assert!(SearchQuery::parse("Serialization").matches(&b));
    }

    #[test]
    fn test_display_round_trips_terms() {
        let query = SearchQuery::parse("Tutorial rust|go");
        assert_eq!(query.to_string(), "tutorial rust|go");
    }
}
