//! Hunch - Incremental Interest Suggestion Engine
//!
//! Turns a stream of query-text-changed events into a ranked suggestion
//! list while keeping network calls to a minimum: exact and prefix-ancestor
//! cache hits answer instantly, near-identical prefixes that recently
//! returned nothing suppress the lookup entirely, and only the latest
//! intent's outcome ever reaches the screen.

pub mod cache;
pub mod controller;
pub mod fetcher;
pub mod interest;
pub mod query;
pub mod resolver;
