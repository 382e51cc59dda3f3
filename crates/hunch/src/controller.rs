use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{Corpus, SuggestionCache};
use crate::fetcher::{FetchError, SuggestionSource};
use crate::interest::{exclude_selected, same_interest, Interest};
use crate::query;
use crate::resolver::{self, Fallback, LocalOutcome};

/// Fast path for first-letter responsiveness.
pub const SHORT_QUERY_DEBOUNCE: Duration = Duration::from_millis(100);
/// The user is still typing inside an already-resolved branch; bias toward
/// resolving locally before firing network traffic.
pub const EXTENSION_DEBOUNCE: Duration = Duration::from_millis(800);
/// New or unrelated query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// How many characters past an empty cached prefix the no-results
/// suppression still applies. Bounded so longer unrelated completions are
/// never permanently starved.
const SUPPRESSION_LOOKAHEAD: usize = 3;

/// Common first letters warmed at session start.
pub const PRELOAD_LETTERS: [&str; 10] = ["s", "c", "m", "t", "b", "p", "a", "r", "h", "f"];

const NETWORK_ERROR_MESSAGE: &str = "Couldn't fetch suggestions. Try again.";
const BAD_FORMAT_MESSAGE: &str = "The suggestion service sent an invalid response.";

/// Authoritative "latest intent" marker. Completions carrying a superseded
/// token are discarded on arrival, never applied late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Debouncing,
  Fetching,
}

/// What the presentation layer renders: the ordered suggestion list plus
/// loading and error state.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionView {
  pub results: Vec<Interest>,
  pub loading: bool,
  pub error: Option<String>,
}

/// Debounced orchestrator for one search session.
///
/// Owns the cache, the corpus, the fallback result set and the selection
/// list; all of them are mutated only by this controller's completion
/// handlers. Nothing is evicted or torn down mid-session.
pub struct ResolutionController<S: SuggestionSource> {
  source: S,
  cache: SuggestionCache,
  corpus: Corpus,
  /// Last non-empty result set obtained, shown whenever the query is empty.
  fallback: Fallback,
  /// Outcome of the most recent completed fetch, empty results included.
  /// Feeds the no-results suppression heuristic.
  last_fetch: Fallback,
  current_results: Vec<Interest>,
  selected: Vec<Interest>,
  loading: bool,
  error: Option<String>,
  phase: Phase,
  generation: u64,
  preloaded: bool,
}

impl<S: SuggestionSource> ResolutionController<S> {
  pub fn new(source: S) -> Self {
    Self {
      source,
      cache: SuggestionCache::new(),
      corpus: Corpus::new(),
      fallback: Fallback::default(),
      last_fetch: Fallback::default(),
      current_results: Vec::new(),
      selected: Vec::new(),
      loading: false,
      error: None,
      phase: Phase::Idle,
      generation: 0,
      preloaded: false,
    }
  }

  pub fn view(&self) -> SuggestionView {
    SuggestionView {
      results: self.current_results.clone(),
      loading: self.loading,
      error: self.error.clone(),
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn selected(&self) -> &[Interest] {
    &self.selected
  }

  pub fn cache(&self) -> &SuggestionCache {
    &self.cache
  }

  pub fn corpus(&self) -> &Corpus {
    &self.corpus
  }

  /// Commit an interest. Selected interests disappear from the current
  /// list and are excluded from every later resolution; the cache itself
  /// is never retroactively invalidated.
  pub fn select(&mut self, interest: Interest) {
    if self.selected.iter().any(|chosen| same_interest(chosen, &interest)) {
      return;
    }
    self.current_results.retain(|candidate| !same_interest(candidate, &interest));
    self.selected.push(interest);
  }

  pub fn deselect(&mut self, interest: &Interest) {
    self.selected.retain(|chosen| !same_interest(chosen, interest));
  }

  /// Pick the debounce interval for a normalized query.
  pub fn debounce_interval(&self, normalized_query: &str) -> Duration {
    if normalized_query.chars().count() <= 1 {
      SHORT_QUERY_DEBOUNCE
    } else if query::is_strict_extension(&self.fallback.query, normalized_query) {
      EXTENSION_DEBOUNCE
    } else {
      DEFAULT_DEBOUNCE
    }
  }

  /// Register a new resolution intent, superseding any in-flight one.
  pub fn begin_intent(&mut self) -> IntentToken {
    self.generation += 1;
    self.phase = Phase::Debouncing;
    IntentToken(self.generation)
  }

  fn is_current(&self, token: IntentToken) -> bool {
    token.0 == self.generation
  }

  /// Full per-keystroke path: debounce, then resolve. Callers that want
  /// keystrokes to supersede each other drop this future and call again.
  pub async fn on_query_changed(&mut self, raw_query: &str) {
    let token = self.begin_intent();
    let interval = self.debounce_interval(&query::normalize(raw_query));
    tokio::time::sleep(interval).await;
    self.resolve_intent(token, raw_query).await;
  }

  /// Resolve one intent, local-first. Only the latest intent's outcome may
  /// touch `current_results`, the cache or the fallback.
  pub async fn resolve_intent(&mut self, token: IntentToken, raw_query: &str) {
    if !self.is_current(token) {
      debug!("discarding superseded intent for {raw_query:?}");
      return;
    }

    let q = query::normalize(raw_query);

    match resolver::resolve(raw_query, &self.cache, &self.fallback) {
      LocalOutcome::Hit { results, effects } => {
        debug!("resolved {q:?} locally ({} candidates)", results.len());
        self.apply_effects(&q, &results, effects);
        self.publish(results);
      }
      LocalOutcome::Miss => self.fetch_intent(token, raw_query, q).await,
    }
  }

  async fn fetch_intent(&mut self, token: IntentToken, raw_query: &str, q: String) {
    if self.should_suppress(&q) {
      debug!("suppressing fetch for {q:?}: empty result known for a near prefix");
      self.publish(Vec::new());
      return;
    }

    // A cache entry may have landed since the local-resolve attempt
    // (preload runs through the same cache).
    if let Some((results, effects)) = resolver::ancestor_filter(&q, &self.cache) {
      self.apply_effects(&q, &results, effects);
      self.publish(results);
      return;
    }

    self.phase = Phase::Fetching;
    self.loading = true;

    match self.source.fetch(raw_query).await {
      Ok(candidates) => {
        if !self.is_current(token) {
          debug!("discarding stale fetch completion for {q:?}");
          return;
        }
        let kept = exclude_selected(candidates, &self.selected);
        self.cache.put(q.clone(), kept.clone());
        self.corpus.merge(&kept);
        self.last_fetch = Fallback::new(q.clone(), kept.clone());
        if !kept.is_empty() {
          self.fallback = Fallback::new(q, kept.clone());
        }
        self.publish(kept);
      }
      Err(err) => {
        if !self.is_current(token) {
          return;
        }
        warn!("fetch for {q:?} failed: {err}");
        self.fail(&err);
      }
    }
  }

  /// An empty result for a shorter prefix is strong evidence that small
  /// extensions of it are also empty; skip the call instead of asking.
  fn should_suppress(&self, normalized_query: &str) -> bool {
    self.last_fetch.is_seeded()
      && normalized_query.starts_with(&self.last_fetch.query)
      && self.last_fetch.results.is_empty()
      && self.cache.has_empty_ancestor_within(normalized_query, SUPPRESSION_LOOKAHEAD)
  }

  fn apply_effects(&mut self, q: &str, results: &[Interest], effects: resolver::Effects) {
    if let Some(key) = effects.cache_under {
      self.cache.put(key, results.to_vec());
    }
    if effects.promote {
      self.fallback = Fallback::new(q, results.to_vec());
    }
  }

  fn publish(&mut self, results: Vec<Interest>) {
    self.current_results = exclude_selected(results, &self.selected);
    self.error = None;
    self.loading = false;
    self.phase = Phase::Idle;
  }

  fn fail(&mut self, err: &FetchError) {
    self.error = Some(
      match err {
        FetchError::Network { .. } => NETWORK_ERROR_MESSAGE,
        FetchError::BadFormat => BAD_FORMAT_MESSAGE,
      }
      .to_string(),
    );
    self.current_results.clear();
    self.loading = false;
    self.phase = Phase::Idle;
  }

  /// Warm the cache with common single-letter queries, sequentially, once
  /// per session. Individual failures are logged and skipped; the first
  /// successful letter seeds the fallback when nothing has resolved yet.
  pub async fn preload(&mut self) {
    if self.preloaded {
      return;
    }
    self.preloaded = true;

    for letter in PRELOAD_LETTERS {
      if self.cache.contains(letter) {
        continue;
      }
      match self.source.fetch(letter).await {
        Ok(candidates) => {
          let kept = exclude_selected(candidates, &self.selected);
          self.cache.put(letter, kept.clone());
          self.corpus.merge(&kept);
          if !self.fallback.is_seeded() && !kept.is_empty() {
            self.fallback = Fallback::new(letter, kept);
          }
        }
        Err(err) => warn!("preload for {letter:?} failed: {err}"),
      }
    }
  }
}
