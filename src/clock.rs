//! Local clock abstraction used for expiry and skew decisions.
//!
//! The cache reads the current instant through [`Clock`] so tests can drive time explicitly with
//! [`ManualClock`] instead of sleeping on the system clock.

// self
use crate::_prelude::*;

/// Source of the current local instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current local instant.
	fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the system's UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven [`Clock`] for deterministic tests.
///
/// Starts at the Unix epoch unless constructed with [`ManualClock::new`]. Share it through an
/// `Arc` so the test keeps a handle while the cache reads from the same instance.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Creates a clock frozen at `secs` seconds after the Unix epoch.
	pub fn at_unix(secs: i64) -> Self {
		Self::new(unix_instant(secs))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock to `secs` seconds after the Unix epoch.
	pub fn set_unix(&self, secs: i64) {
		self.set(unix_instant(secs));
	}

	/// Advances the clock by `delta` (negative values move it backwards).
	pub fn advance(&self, delta: Duration) {
		let mut now = self.0.lock();

		*now = now.saturating_add(delta);
	}

	/// Rewinds the clock to the Unix epoch.
	pub fn reset(&self) {
		self.set(OffsetDateTime::UNIX_EPOCH);
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Converts epoch seconds into an instant, saturating at the representable range.
pub fn unix_instant(secs: i64) -> OffsetDateTime {
	OffsetDateTime::UNIX_EPOCH.saturating_add(Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn manual_clock_moves_only_when_told() {
		let clock = ManualClock::default();

		assert_eq!(clock.now(), OffsetDateTime::UNIX_EPOCH);

		clock.set_unix(9);

		assert_eq!(clock.now().unix_timestamp(), 9);

		clock.advance(Duration::seconds(-4));

		assert_eq!(clock.now().unix_timestamp(), 5);

		clock.reset();

		assert_eq!(clock.now(), OffsetDateTime::UNIX_EPOCH);
	}

	#[test]
	fn system_clock_tracks_utc_now() {
		let before = OffsetDateTime::now_utc();
		let observed = SystemClock.now();

		assert!(observed >= before);
	}
}
