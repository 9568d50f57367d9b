//! Natural ordering for identifiers with embedded numbers.
//!
//! `paragraph_9` sorts before `paragraph_10` because digit runs are compared by
//! magnitude instead of character by character.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit-run pattern is valid"));

/// An unbounded non-negative integer parsed from a run of ASCII digits.
///
/// Leading zeros are dropped, so `007` and `7` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Magnitude(String);

impl Magnitude {
    fn parse(digits: &str) -> Self {
        Self(digits.trim_start_matches('0').to_string())
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyToken {
    Text(String),
    Number(Magnitude),
}

/// Comparison key produced by [`natural_key`].
///
/// Tokens alternate literal/number starting with a (possibly empty) literal,
/// so two keys always compare like-typed tokens position by position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey(Vec<KeyToken>);

impl NaturalKey {
    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }
}

/// Splits `s` on maximal digit runs and tags each run as a number.
pub fn natural_key(s: &str) -> NaturalKey {
    let mut tokens = Vec::new();
    let mut last = 0;
    for run in DIGIT_RUN.find_iter(s) {
        tokens.push(KeyToken::Text(s[last..run.start()].to_string()));
        tokens.push(KeyToken::Number(Magnitude::parse(run.as_str())));
        last = run.end();
    }
    tokens.push(KeyToken::Text(s[last..].to_string()));
    NaturalKey(tokens)
}

/// Total order by natural key, falling back to plain string order for equal keys.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a)
        .cmp(&natural_key(b))
        .then_with(|| a.cmp(b))
}

/// Sorts identifiers in place by [`natural_cmp`].
pub fn sort_natural<S: AsRef<str>>(items: &mut [S]) {
    items.sort_by_cached_key(|item| (natural_key(item.as_ref()), item.as_ref().to_string()));
}
