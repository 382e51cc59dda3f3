use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hunch::controller::{
  Phase, ResolutionController, DEFAULT_DEBOUNCE, EXTENSION_DEBOUNCE, PRELOAD_LETTERS,
  SHORT_QUERY_DEBOUNCE,
};
use hunch::fetcher::{FetchError, SuggestionSource};
use hunch::interest::Interest;

#[derive(Clone)]
enum MockReply {
  Respond(Vec<Interest>),
  NetworkError,
  BadFormat,
}

/// Scripted suggestion source with call recording and failure injection.
struct MockSource {
  replies: HashMap<String, MockReply>,
  default_reply: MockReply,
  calls: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
  fn new(default_reply: MockReply) -> Self {
    Self { replies: HashMap::new(), default_reply, calls: Arc::new(Mutex::new(Vec::new())) }
  }

  fn reply(mut self, query: &str, reply: MockReply) -> Self {
    self.replies.insert(query.to_string(), reply);
    self
  }

  fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
    Arc::clone(&self.calls)
  }
}

#[async_trait]
impl SuggestionSource for MockSource {
  async fn fetch(&self, query: &str) -> Result<Vec<Interest>, FetchError> {
    self.calls.lock().unwrap().push(query.to_string());
    match self.replies.get(query).unwrap_or(&self.default_reply) {
      MockReply::Respond(interests) => Ok(interests.clone()),
      MockReply::NetworkError => Err(FetchError::network("connection refused")),
      MockReply::BadFormat => Err(FetchError::BadFormat),
    }
  }
}

fn interest(name: &str) -> Interest {
  Interest::named(name)
}

fn with_id(id: &str, name: &str) -> Interest {
  Interest { id: Some(id.to_string()), ..Interest::named(name) }
}

/// Drive one resolution without waiting out the debounce interval.
async fn resolve_now(controller: &mut ResolutionController<MockSource>, raw_query: &str) {
  let token = controller.begin_intent();
  controller.resolve_intent(token, raw_query).await;
}

#[tokio::test]
async fn first_fetch_then_local_refinement() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![interest("Music"), interest("Movies")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  assert_eq!(controller.view().results.len(), 2);
  assert!(controller.cache().contains("m"));

  resolve_now(&mut controller, "mu").await;
  assert_eq!(controller.view().results, vec![interest("Music")]);

  // the refinement never reached the network
  assert_eq!(*calls.lock().unwrap(), vec!["m".to_string()]);
  // and was written back under its own key
  assert_eq!(controller.cache().get("mu"), Some(&vec![interest("Music")]));
}

#[tokio::test]
async fn clearing_the_query_shows_the_last_valid_results() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("tango", MockReply::Respond(vec![interest("Tango")]));
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "tango").await;
  resolve_now(&mut controller, "").await;

  assert_eq!(controller.view().results, vec![interest("Tango")]);
  assert!(controller.view().error.is_none());
}

#[tokio::test]
async fn repeated_queries_resolve_identically() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![interest("Music"), interest("Movies")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  let first = controller.view().results;
  resolve_now(&mut controller, "m").await;
  let second = controller.view().results;

  assert_eq!(first, second);
  assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn selection_is_excluded_from_later_resolutions() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![with_id("42", "Music"), interest("Movies")]))
    .reply("rock", MockReply::Respond(vec![with_id("42", "Music"), interest("Rock")]));
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  controller.select(with_id("42", "Music"));
  assert_eq!(controller.view().results, vec![interest("Movies")]);

  // local path: the cache entry still contains the selected interest
  assert_eq!(controller.cache().get("m").unwrap().len(), 2);
  resolve_now(&mut controller, "m").await;
  assert_eq!(controller.view().results, vec![interest("Movies")]);

  // remote path: freshly fetched candidates are filtered too
  resolve_now(&mut controller, "rock").await;
  assert_eq!(controller.view().results, vec![interest("Rock")]);
}

#[tokio::test]
async fn deselect_restores_the_candidate_on_the_next_resolution() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![with_id("42", "Music"), interest("Movies")]));
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  controller.select(with_id("42", "Music"));
  controller.deselect(&with_id("42", "Music"));
  resolve_now(&mut controller, "m").await;

  assert_eq!(controller.view().results.len(), 2);
}

#[tokio::test]
async fn empty_prefix_suppresses_short_extensions_only() {
  let source = MockSource::new(MockReply::Respond(Vec::new()));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "tr").await;
  assert_eq!(calls.lock().unwrap().len(), 1);

  // two extra characters: resolved to empty without a network call
  resolve_now(&mut controller, "trex").await;
  assert_eq!(calls.lock().unwrap().len(), 1);
  assert!(controller.view().results.is_empty());
  assert!(controller.view().error.is_none());

  // five extra characters: past the lookahead, must reach the fetcher
  resolve_now(&mut controller, "trexxxx").await;
  assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn superseded_intents_are_discarded() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("old", MockReply::Respond(vec![interest("Old")]))
    .reply("new", MockReply::Respond(vec![interest("New")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  let stale = controller.begin_intent();
  let latest = controller.begin_intent();

  // the superseded intent must not fetch or publish anything
  controller.resolve_intent(stale, "old").await;
  assert!(calls.lock().unwrap().is_empty());
  assert!(controller.view().results.is_empty());

  controller.resolve_intent(latest, "new").await;
  assert_eq!(controller.view().results, vec![interest("New")]);
}

#[tokio::test]
async fn network_failure_surfaces_an_error_and_clears_results() {
  let source = MockSource::new(MockReply::NetworkError)
    .reply("m", MockReply::Respond(vec![interest("Music")]));
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  assert_eq!(controller.view().results.len(), 1);

  resolve_now(&mut controller, "zz").await;
  let view = controller.view();
  assert!(view.results.is_empty());
  assert!(!view.loading);
  assert_eq!(view.error.as_deref(), Some("Couldn't fetch suggestions. Try again."));

  // the cache survived the failure; a cached query clears the error
  resolve_now(&mut controller, "m").await;
  assert!(controller.view().error.is_none());
  assert_eq!(controller.view().results.len(), 1);
}

#[tokio::test]
async fn bad_format_gets_its_own_message() {
  let source = MockSource::new(MockReply::BadFormat);
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "zz").await;
  assert_eq!(
    controller.view().error.as_deref(),
    Some("The suggestion service sent an invalid response.")
  );
}

#[tokio::test]
async fn debounce_interval_tracks_the_query_shape() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("mu", MockReply::Respond(vec![interest("Music")]));
  let mut controller = ResolutionController::new(source);

  assert_eq!(controller.debounce_interval(""), SHORT_QUERY_DEBOUNCE);
  assert_eq!(controller.debounce_interval("a"), SHORT_QUERY_DEBOUNCE);
  assert_eq!(controller.debounce_interval("ab"), DEFAULT_DEBOUNCE);

  resolve_now(&mut controller, "mu").await;
  assert_eq!(controller.debounce_interval("mus"), EXTENSION_DEBOUNCE);
  assert_eq!(controller.debounce_interval("mu"), DEFAULT_DEBOUNCE);
  assert_eq!(controller.debounce_interval("rock"), DEFAULT_DEBOUNCE);
}

#[tokio::test]
async fn on_query_changed_debounces_then_resolves() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![interest("Music")]));
  let mut controller = ResolutionController::new(source);

  let started = std::time::Instant::now();
  controller.on_query_changed("m").await;

  assert!(started.elapsed() >= Duration::from_millis(100));
  assert_eq!(controller.view().results, vec![interest("Music")]);
  assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn preload_warms_every_letter_once() {
  let source = MockSource::new(MockReply::Respond(vec![interest("Anything")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  controller.preload().await;
  controller.preload().await;

  assert_eq!(calls.lock().unwrap().len(), PRELOAD_LETTERS.len());
  for letter in PRELOAD_LETTERS {
    assert!(controller.cache().contains(letter));
  }
}

#[tokio::test]
async fn preload_seeds_the_fallback_with_the_first_success() {
  let first = PRELOAD_LETTERS[0];
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply(first, MockReply::Respond(vec![interest("Seeded")]));
  let mut controller = ResolutionController::new(source);

  controller.preload().await;

  // an empty query now shows the seeded results
  resolve_now(&mut controller, "").await;
  assert_eq!(controller.view().results, vec![interest("Seeded")]);
}

#[tokio::test]
async fn preload_failures_are_skipped_silently() {
  let second = PRELOAD_LETTERS[1];
  let source = MockSource::new(MockReply::NetworkError)
    .reply(second, MockReply::Respond(vec![interest("Survivor")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  controller.preload().await;

  // every letter was still attempted and no error surfaced
  assert_eq!(calls.lock().unwrap().len(), PRELOAD_LETTERS.len());
  assert!(controller.view().error.is_none());
  assert!(controller.cache().contains(second));

  // the first successful letter seeded the fallback
  resolve_now(&mut controller, "").await;
  assert_eq!(controller.view().results, vec![interest("Survivor")]);
}

#[tokio::test]
async fn preload_skips_letters_already_cached() {
  let first = PRELOAD_LETTERS[0];
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply(first, MockReply::Respond(vec![interest("Fresh")]));
  let calls = source.call_log();
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, first).await;
  controller.preload().await;

  let log = calls.lock().unwrap();
  assert_eq!(log.iter().filter(|q| q.as_str() == first).count(), 1);
}

#[tokio::test]
async fn corpus_accumulates_across_fetches_without_duplicates() {
  let source = MockSource::new(MockReply::Respond(Vec::new()))
    .reply("m", MockReply::Respond(vec![with_id("1", "Music"), interest("Movies")]))
    .reply("rock", MockReply::Respond(vec![with_id("1", "Music"), interest("Rock")]));
  let mut controller = ResolutionController::new(source);

  resolve_now(&mut controller, "m").await;
  resolve_now(&mut controller, "rock").await;

  assert_eq!(controller.corpus().len(), 3);
}
