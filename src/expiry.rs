//! Skew-corrected expiry computation.
//!
//! The token endpoint reports an absolute `expires_at` on its own clock. When the response also
//! carries the server's notion of "now" (the `Date` header), the difference between the local
//! clock and the server clock is added to the reported expiry so cache-hit decisions made against
//! the local clock line up with the server's view of token lifetime.

// self
use crate::{_prelude::*, clock::Clock};

/// Converts server-reported expiries into local expiry instants.
#[derive(Clone)]
pub struct ExpiryCalculator {
	clock: Arc<dyn Clock>,
}
impl ExpiryCalculator {
	/// Creates a calculator that reads local time from `clock`.
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { clock }
	}

	/// Returns `local_now - server_time`.
	pub fn skew(&self, server_time: OffsetDateTime) -> Duration {
		self.clock.now() - server_time
	}

	/// Computes the local expiry for a token the server says expires at `server_expires_at`.
	///
	/// Without a server timestamp the reported expiry is trusted as-is.
	pub fn local_expiry(
		&self,
		server_expires_at: OffsetDateTime,
		server_time: Option<OffsetDateTime>,
	) -> OffsetDateTime {
		compute_local_expiry(self.clock.now(), server_expires_at, server_time)
	}
}
impl Debug for ExpiryCalculator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExpiryCalculator").field("now", &self.clock.now()).finish()
	}
}

/// Pure form of [`ExpiryCalculator::local_expiry`] with the local instant supplied explicitly.
pub fn compute_local_expiry(
	local_now: OffsetDateTime,
	server_expires_at: OffsetDateTime,
	server_time: Option<OffsetDateTime>,
) -> OffsetDateTime {
	match server_time {
		Some(server_now) => server_expires_at.saturating_add(local_now - server_now),
		None => server_expires_at,
	}
}
