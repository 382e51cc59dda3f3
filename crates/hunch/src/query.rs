/// Canonicalize raw query text for cache keys and comparisons.
///
/// Two raw strings that normalize identically are the same query
/// everywhere in the engine.
pub fn normalize(raw: &str) -> String {
  raw.trim().to_lowercase()
}

/// True when `query` extends `base` by at least one character.
pub fn is_strict_extension(base: &str, query: &str) -> bool {
  !base.is_empty() && query.len() > base.len() && query.starts_with(base)
}
