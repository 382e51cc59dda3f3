use serde::{Deserialize, Serialize};

/// One candidate or selected interest.
///
/// `id` is absent for user-created custom interests. `name` may embed a
/// bracketed location suffix (e.g. `"Tango [Berlin]"`) which is display-only
/// and never part of the matching key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub secondary_term: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emoji: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub popularity: Option<u32>,
}

impl Interest {
  pub fn named(name: impl Into<String>) -> Self {
    Self { id: None, name: name.into(), secondary_term: None, emoji: None, popularity: None }
  }

  /// Build a user-created interest from free text.
  ///
  /// `"Music: Rock"` becomes name `"Music"` with secondary term `"Rock"`;
  /// `"Hiking"` becomes name `"Hiking"` with no secondary term. A colon
  /// with nothing before it keeps whatever follows as the name, so the
  /// name is empty only when the whole input is. Callers accepting user
  /// input should reject that case; an empty name degenerates the
  /// name-equality identity rule.
  pub fn custom(input: &str) -> Self {
    match input.split_once(':') {
      Some((name, secondary)) if name.trim().is_empty() => Self::named(secondary.trim()),
      Some((name, secondary)) if !secondary.trim().is_empty() => Self {
        secondary_term: Some(secondary.trim().to_string()),
        ..Self::named(name.trim())
      },
      Some((name, _)) => Self::named(name.trim()),
      None => Self::named(input.trim()),
    }
  }

  /// The name with any trailing bracketed location suffix removed.
  pub fn base_term(&self) -> &str {
    let name = self.name.trim_end();
    match (name.rfind('['), name.ends_with(']')) {
      (Some(open), true) => name[..open].trim_end(),
      _ => name,
    }
  }

  /// Substring match of either search term against a normalized query.
  pub fn matches(&self, normalized_query: &str) -> bool {
    self.base_term().to_lowercase().contains(normalized_query)
      || self
        .secondary_term
        .as_deref()
        .is_some_and(|term| term.to_lowercase().contains(normalized_query))
  }

  /// Stricter prefix sub-check, for consumers that rank prefix hits above
  /// mid-string hits.
  pub fn prefix_matches(&self, normalized_query: &str) -> bool {
    self.base_term().to_lowercase().starts_with(normalized_query)
      || self
        .secondary_term
        .as_deref()
        .is_some_and(|term| term.to_lowercase().starts_with(normalized_query))
  }
}

/// Identity rule for dedup and selection exclusion.
///
/// When both sides carry an id the ids decide; in every other case exact
/// (non-normalized) name equality decides.
pub fn same_interest(a: &Interest, b: &Interest) -> bool {
  match (&a.id, &b.id) {
    (Some(left), Some(right)) => left == right,
    _ => a.name == b.name,
  }
}

/// Drop candidates the user has already committed to.
pub fn exclude_selected(candidates: Vec<Interest>, selected: &[Interest]) -> Vec<Interest> {
  candidates
    .into_iter()
    .filter(|candidate| !selected.iter().any(|chosen| same_interest(chosen, candidate)))
    .collect()
}
