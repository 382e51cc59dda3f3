use std::collections::HashMap;

use crate::interest::{same_interest, Interest};

/// Mapping from normalized query string to the result set previously
/// resolved for that exact string. No eviction, no TTL; entries live for
/// the whole session.
#[derive(Debug, Default)]
pub struct SuggestionCache {
  entries: HashMap<String, Vec<Interest>>,
}

impl SuggestionCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Vec<Interest>> {
    self.entries.get(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Insert or overwrite; a key maps to at most one entry at a time.
  pub fn put(&mut self, key: impl Into<String>, results: Vec<Interest>) {
    self.entries.insert(key.into(), results);
  }

  /// The most specific stored key that `key` starts with, together with its
  /// entry. Longer keys win because they have already excluded more
  /// irrelevant candidates.
  pub fn longest_ancestor(&self, key: &str) -> Option<(&str, &[Interest])> {
    self
      .entries
      .iter()
      .filter(|(stored, _)| key.starts_with(stored.as_str()))
      .max_by_key(|(stored, _)| stored.len())
      .map(|(stored, entry)| (stored.as_str(), entry.as_slice()))
  }

  /// True when some stored prefix of `key` holds an empty entry and `key`
  /// extends it by at most `lookahead` characters. An empty result for a
  /// shorter prefix is strong evidence that small extensions are also empty.
  pub fn has_empty_ancestor_within(&self, key: &str, lookahead: usize) -> bool {
    let key_len = key.chars().count();
    self.entries.iter().any(|(stored, entry)| {
      entry.is_empty()
        && key.starts_with(stored.as_str())
        && key_len <= stored.chars().count() + lookahead
    })
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Deduplicated running union of every suggestion ever fetched. Auxiliary
/// index only; never authoritative for display.
#[derive(Debug, Default)]
pub struct Corpus {
  items: Vec<Interest>,
}

impl Corpus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn merge(&mut self, incoming: &[Interest]) {
    for candidate in incoming {
      if !self.items.iter().any(|known| same_interest(known, candidate)) {
        self.items.push(candidate.clone());
      }
    }
  }

  pub fn items(&self) -> &[Interest] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}
