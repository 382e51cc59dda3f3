use crate::cache::SuggestionCache;
use crate::interest::Interest;
use crate::query;

/// The last non-empty result set shown, and the query it answered.
/// Displayed whenever the live query is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fallback {
  pub query: String,
  pub results: Vec<Interest>,
}

impl Fallback {
  pub fn new(query: impl Into<String>, results: Vec<Interest>) -> Self {
    Self { query: query.into(), results }
  }

  pub fn is_seeded(&self) -> bool {
    !self.query.is_empty()
  }
}

/// Side effects a local hit asks its caller to apply. The resolver itself
/// never mutates the cache or the fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
  /// Write the results into the cache under this key.
  pub cache_under: Option<String>,
  /// Promote the results to become the new fallback.
  pub promote: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocalOutcome {
  Hit { results: Vec<Interest>, effects: Effects },
  /// Not an error: a routing decision telling the caller to fetch.
  Miss,
}

/// Answer a query without network I/O if previously fetched data allows it.
///
/// Tried in order, short-circuiting on the first success:
/// 1. empty query: the fallback results, unconditionally;
/// 2. exact cache hit, returned verbatim;
/// 3. the fallback result set filtered down, when the query extends the
///    fallback query;
/// 4. the longest cached ancestor's entry filtered down.
pub fn resolve(raw_query: &str, cache: &SuggestionCache, fallback: &Fallback) -> LocalOutcome {
  let q = query::normalize(raw_query);

  if q.is_empty() {
    return LocalOutcome::Hit { results: fallback.results.clone(), effects: Effects::default() };
  }

  if let Some(entry) = cache.get(&q) {
    return LocalOutcome::Hit {
      results: entry.clone(),
      effects: Effects { cache_under: None, promote: !entry.is_empty() },
    };
  }

  if fallback.is_seeded() && q.starts_with(&fallback.query) && !fallback.results.is_empty() {
    let filtered = filter_matching(&fallback.results, &q);
    if !filtered.is_empty() {
      return LocalOutcome::Hit {
        results: filtered,
        effects: Effects { cache_under: Some(q), promote: true },
      };
    }
  }

  if let Some((results, effects)) = ancestor_filter(&q, cache) {
    return LocalOutcome::Hit { results, effects };
  }

  LocalOutcome::Miss
}

/// Filter the most specific cached ancestor of `normalized_query` down to
/// the candidates still matching. Also run by the controller once more
/// right before a fetch, in case an entry landed since the first attempt.
pub fn ancestor_filter(
  normalized_query: &str,
  cache: &SuggestionCache,
) -> Option<(Vec<Interest>, Effects)> {
  let (_, entry) = cache.longest_ancestor(normalized_query)?;
  if entry.is_empty() {
    return None;
  }

  let filtered = filter_matching(entry, normalized_query);
  if filtered.is_empty() {
    return None;
  }

  let effects = Effects { cache_under: Some(normalized_query.to_string()), promote: true };
  Some((filtered, effects))
}

pub fn filter_matching(candidates: &[Interest], normalized_query: &str) -> Vec<Interest> {
  candidates.iter().filter(|interest| interest.matches(normalized_query)).cloned().collect()
}
