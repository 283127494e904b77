//! Optional observability helpers for cache lookups and token fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit `oauth2_token_cache.fetch` spans (fields `scope` and `stage`) around
//!   upstream exchanges plus debug events for every lookup outcome.
//! - Enable `metrics` to increment the `oauth2_token_cache_requests_total` counter for every
//!   lookup, labeled by `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::{_prelude::*, auth::Scope};

/// How a single `get_token` call was satisfied; each call records exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
	/// Served from a fresh cache entry.
	Hit,
	/// Received the token from a fetch driven by another caller.
	Joined,
	/// Drove a fetch that succeeded, possibly one taken over from a dropped caller.
	Fetched,
	/// Received a failed fetch result, whether it drove the fetch or waited on it.
	Failed,
}
impl CacheOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOutcome::Hit => "hit",
			CacheOutcome::Joined => "joined",
			CacheOutcome::Fetched => "fetched",
			CacheOutcome::Failed => "failed",
		}
	}
}
impl Display for CacheOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Logs and counts a lookup outcome.
pub fn record_outcome(scope: &Scope, outcome: CacheOutcome) {
	log_cache_outcome(scope, outcome);
	record_cache_outcome(outcome);
}
