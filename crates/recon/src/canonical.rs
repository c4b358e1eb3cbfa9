//! Driver identity canonicalization.
//!
//! Platforms spell the same driver differently: case, diacritics, hyphens,
//! and even word order ("Ion Popescu" vs "Popescu Ion") vary. The canonical
//! form folds all of that away so rows merge on one key.
//!
//! The word sort makes this lossy: two different people whose names share the
//! same token multiset ("Ion Mihai" / "Mihai Ion") collapse into one driver.
//! Historical snapshots were keyed this way, so the behavior is kept as is.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Deterministic, order-insensitive driver identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalName(String);

impl CanonicalName {
    /// Canonicalize one free-text name.
    ///
    /// NFKD-decompose and drop non-ASCII (strips diacritics), lowercase,
    /// hyphens to spaces, split on whitespace, sort the words, rejoin with a
    /// single space, title-case.
    pub fn new(raw: &str) -> Self {
        let folded = raw
            .nfkd()
            .filter(char::is_ascii)
            .collect::<String>()
            .to_ascii_lowercase()
            .replace('-', " ");

        let mut words: Vec<&str> = folded.split_whitespace().collect();
        words.sort_unstable();

        Self(title_case(&words.join(" ")))
    }

    /// Canonicalize a name split across first/last columns. A missing part
    /// counts as empty.
    pub fn from_parts(first: Option<&str>, last: Option<&str>) -> Self {
        Self::new(&format!("{} {}", first.unwrap_or(""), last.unwrap_or("")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper-case a letter that follows a non-letter, lower-case the rest.
/// `o'neil` -> `O'Neil`, `2pac` -> `2Pac`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if prev_alpha {
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c.to_ascii_uppercase());
        }
        prev_alpha = c.is_ascii_alphabetic();
    }
    out
}
