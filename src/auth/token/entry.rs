//! Cached token entries and freshness checks.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Freshness of a cached entry at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Entry may be handed out without contacting the token endpoint.
	Active,
	/// Entry reached its local expiry (less any configured margin).
	Expired,
}

/// Token stored by the cache alongside its locally valid expiry.
///
/// Entries are immutable; a successful re-fetch replaces the entry for its scope wholesale.
#[derive(Clone)]
pub struct CacheEntry {
	/// Access token handed to callers.
	pub token: TokenSecret,
	/// Expiry instant expressed on the local clock (already skew-corrected).
	pub expires_at: OffsetDateTime,
}
impl CacheEntry {
	/// Creates an entry for `token` that expires at the local instant `expires_at`.
	pub fn new(token: TokenSecret, expires_at: OffsetDateTime) -> Self {
		Self { token, expires_at }
	}

	/// Computes the status at `now`, treating the entry as expired `margin` early.
	pub fn status_at(&self, now: OffsetDateTime, margin: Duration) -> TokenStatus {
		match self.expires_at.checked_sub(margin) {
			Some(deadline) if deadline > now => TokenStatus::Active,
			_ => TokenStatus::Expired,
		}
	}

	/// Returns `true` if the entry can still be served at `now`.
	pub fn is_fresh_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(now, margin), TokenStatus::Active)
	}
}
impl Debug for CacheEntry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheEntry")
			.field("token", &self.token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::clock::unix_instant;

	fn entry(expires_at: i64) -> CacheEntry {
		CacheEntry::new(TokenSecret::new("abc"), unix_instant(expires_at))
	}

	#[test]
	fn entry_is_fresh_strictly_before_expiry() {
		let entry = entry(7);

		assert!(entry.is_fresh_at(unix_instant(6), Duration::ZERO));
		assert_eq!(entry.status_at(unix_instant(7), Duration::ZERO), TokenStatus::Expired);
		assert_eq!(entry.status_at(unix_instant(8), Duration::ZERO), TokenStatus::Expired);
	}

	#[test]
	fn margin_expires_entries_early() {
		let entry = entry(100);
		let margin = Duration::seconds(30);

		assert!(entry.is_fresh_at(unix_instant(69), margin));
		assert!(!entry.is_fresh_at(unix_instant(70), margin));
	}

	#[test]
	fn debug_output_redacts_token() {
		let rendered = format!("{:?}", entry(1));

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("abc"));
	}
}
