//! Header validation gate, run before any adapter touches a table.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::ReconError;
use crate::model::{Platform, RawTable};
use crate::platform::adapter_for;

/// Fold a header for comparison: NBSP to space, strip diacritics, lowercase,
/// trim and collapse inner whitespace.
pub fn normalize_header(raw: &str) -> String {
    let stripped: String = raw
        .replace('\u{a0}', " ")
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized header -> first column index carrying it.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &[String]) -> Self {
        let mut columns = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            columns.entry(normalize_header(header)).or_insert(i);
        }
        Self { columns }
    }

    pub fn position(&self, header: &str) -> Option<usize> {
        self.columns.get(&normalize_header(header)).copied()
    }

    /// Required headers with no matching column, in the order given.
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|h| self.position(h).is_none())
            .map(|h| h.to_string())
            .collect()
    }
}

/// Check `table` carries every header `platform` requires.
///
/// Reports all missing headers at once, not just the first.
pub fn validate(platform: Platform, table: &RawTable) -> Result<(), ReconError> {
    validate_headers(platform, adapter_for(platform).required_headers(), table)
}

pub fn validate_headers(
    platform: Platform,
    required: &[&str],
    table: &RawTable,
) -> Result<(), ReconError> {
    let missing = HeaderIndex::new(&table.headers).missing(required);
    if missing.is_empty() {
        Ok(())
    } else {
        log::debug!("{platform} '{}': missing {missing:?}", table.source);
        Err(ReconError::Schema {
            platform,
            source: table.source.clone(),
            missing,
        })
    }
}
