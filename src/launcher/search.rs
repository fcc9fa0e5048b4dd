//! Fuzzy matching of typed queries against item text.
//!
//! Whitespace separates terms and every term has to match, ignoring case.
//! A blank query matches everything.

use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};

/// Reusable matcher. Listings test one query against many candidates, so
/// the last parsed query is kept.
pub struct FuzzySearch {
    matcher: Matcher,
    buf: Vec<char>,
    parsed: Option<(String, Pattern)>,
}

impl Default for FuzzySearch {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzySearch {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::new(),
            parsed: None,
        }
    }

    /// Score of `candidate` against `query`, None when some term is missing
    pub fn score(&mut self, candidate: &str, query: &str) -> Option<u32> {
        if query.trim().is_empty() {
            return Some(0);
        }

        if self.parsed.as_ref().map_or(true, |(q, _)| q != query) {
            let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
            self.parsed = Some((query.to_string(), pattern));
        }
        let (_, pattern) = self.parsed.as_ref()?;

        let haystack = Utf32Str::new(candidate, &mut self.buf);
        pattern.score(haystack, &mut self.matcher)
    }

    pub fn matches(&mut self, candidate: &str, query: &str) -> bool {
        self.score(candidate, query).is_some()
    }
}

/// Single match without keeping a matcher around
pub fn fuzzy_matches(candidate: &str, query: &str) -> bool {
    FuzzySearch::new().matches(candidate, query)
}
