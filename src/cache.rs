//! Scope-keyed token cache with single-flight fetching.
//!
//! Each scope moves through `NoEntry -> Pending -> Cached`, returning to `Pending` once its entry
//! expires and back to `NoEntry` when a fetch fails. Lookups and in-flight registration happen
//! under one lock, so concurrent callers for a scope either read the cached token, join the
//! pending fetch, or become the single caller that registers a new one. Distinct scopes never
//! wait on each other.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	auth::{CacheEntry, Scope, TokenSecret},
	clock::{Clock, SystemClock},
	error::TokenRequestError,
	expiry::ExpiryCalculator,
	fetch::TokenFetcher,
	obs::{self, CacheOutcome, FetchSpan},
};

type FetchOutcome = Result<TokenSecret, TokenRequestError>;

/// Shared completion handle for one upstream fetch.
///
/// The caller that initializes the cell drives the fetch; every other caller joined to it waits
/// on the same cell and observes the same outcome.
type InFlight = OnceCell<FetchOutcome>;

#[derive(Default)]
struct CacheState {
	entries: HashMap<Scope, CacheEntry>,
	pending: HashMap<Scope, Pending>,
}

/// In-flight fetch registered for a scope, with the number of callers still waiting on it.
struct Pending {
	in_flight: Arc<InFlight>,
	claims: usize,
}

/// One caller's claim on an in-flight fetch.
///
/// Dropping the last claim before the fetch settles means nobody is left to drive it, so the
/// registration is removed and the scope falls back to `NoEntry`.
struct InFlightClaim<'a> {
	state: &'a Mutex<CacheState>,
	scope: &'a Scope,
	in_flight: Arc<InFlight>,
}
impl Drop for InFlightClaim<'_> {
	fn drop(&mut self) {
		let mut state = self.state.lock();
		let abandoned = match state.pending.get_mut(self.scope) {
			Some(pending) if Arc::ptr_eq(&pending.in_flight, &self.in_flight) => {
				pending.claims = pending.claims.saturating_sub(1);

				pending.claims == 0
			},
			_ => false,
		};

		if abandoned {
			state.pending.remove(self.scope);
		}
	}
}

enum Lookup {
	Hit(TokenSecret),
	Join(Arc<InFlight>),
	Start(Arc<InFlight>),
}

/// In-memory access-token cache keyed by scope.
///
/// Cloning the cache is cheap and clones share the same entries and in-flight fetches.
#[derive(Clone)]
pub struct TokenCache {
	fetcher: Arc<dyn TokenFetcher>,
	clock: Arc<dyn Clock>,
	expiry: ExpiryCalculator,
	expiry_margin: Duration,
	state: Arc<Mutex<CacheState>>,
}
impl TokenCache {
	/// Creates a cache over `fetcher` using the system clock.
	pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
		Self::builder(fetcher).build()
	}

	/// Returns a builder for customizing the clock and expiry margin.
	pub fn builder(fetcher: Arc<dyn TokenFetcher>) -> TokenCacheBuilder {
		TokenCacheBuilder::new(fetcher)
	}

	/// Returns a token for `scope`, defaulting to the wildcard scope when `None`.
	pub async fn get_token(&self, scope: Option<&str>) -> Result<TokenSecret, TokenRequestError> {
		self.get_scoped_token(&Scope::from_optional(scope)).await
	}

	/// Returns a cached token for `scope` or fetches one, joining any fetch already in flight.
	///
	/// Fetch failures are delivered unchanged to every joined caller and leave no cache entry,
	/// so the next call starts a fresh fetch.
	pub async fn get_scoped_token(&self, scope: &Scope) -> Result<TokenSecret, TokenRequestError> {
		let in_flight = match self.lookup(scope) {
			Lookup::Hit(token) => {
				obs::record_outcome(scope, CacheOutcome::Hit);

				return Ok(token);
			},
			Lookup::Join(in_flight) | Lookup::Start(in_flight) => in_flight,
		};
		let claim = InFlightClaim { state: &self.state, scope, in_flight };
		// Set only for the caller whose initializer runs, including one taking over a dropped fetch.
		let mut drove = false;
		let outcome = claim
			.in_flight
			.get_or_init(|| {
				drove = true;

				self.settle(scope, &claim.in_flight)
			})
			.await
			.clone();

		drop(claim);

		obs::record_outcome(scope, settled_outcome(&outcome, drove));

		outcome
	}

	/// Drops every cached entry and forgets every in-flight fetch.
	///
	/// A fetch still running when the cache is reset completes for the callers already joined to
	/// it but does not repopulate the cache.
	pub fn reset_caches(&self) {
		let mut state = self.state.lock();

		state.entries.clear();
		state.pending.clear();
	}

	/// Returns the local expiry of the entry cached for `scope`, fresh or not.
	pub fn cached_expiry(&self, scope: &Scope) -> Option<OffsetDateTime> {
		self.state.lock().entries.get(scope).map(|entry| entry.expires_at)
	}

	/// Returns `true` while a fetch for `scope` is in flight.
	pub fn is_pending(&self, scope: &Scope) -> bool {
		self.state.lock().pending.contains_key(scope)
	}

	fn lookup(&self, scope: &Scope) -> Lookup {
		let now = self.clock.now();
		let mut state = self.state.lock();

		if let Some(entry) =
			state.entries.get(scope).filter(|entry| entry.is_fresh_at(now, self.expiry_margin))
		{
			return Lookup::Hit(entry.token.clone());
		}
		if let Some(pending) = state.pending.get_mut(scope) {
			pending.claims += 1;

			return Lookup::Join(pending.in_flight.clone());
		}

		let in_flight = Arc::new(InFlight::new());

		state.pending.insert(scope.clone(), Pending { in_flight: in_flight.clone(), claims: 1 });

		Lookup::Start(in_flight)
	}

	async fn settle(&self, scope: &Scope, in_flight: &Arc<InFlight>) -> FetchOutcome {
		let span = FetchSpan::new(scope, "settle");
		let fetched = span.instrument(self.fetcher.fetch(scope)).await;
		let entry = fetched.map(|token| {
			let expires_at = self.expiry.local_expiry(token.expires_at, token.server_date);

			CacheEntry::new(token.access_token, expires_at)
		});
		let mut state = self.state.lock();
		// A reset while the fetch was running orphans this handle; its result must not land in
		// the cleared cache.
		let registered = state
			.pending
			.get(scope)
			.is_some_and(|current| Arc::ptr_eq(&current.in_flight, in_flight));

		if registered {
			state.pending.remove(scope);
		}

		let entry = entry?;
		let token = entry.token.clone();

		if registered {
			state.entries.insert(scope.clone(), entry);
		}

		Ok(token)
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenCache")
			.field("entries", &state.entries.len())
			.field("pending", &state.pending.len())
			.field("expiry_margin", &self.expiry_margin)
			.finish()
	}
}

/// Outcome recorded for a caller whose fetch settled, by result and by whether it drove the fetch.
fn settled_outcome(outcome: &FetchOutcome, drove: bool) -> CacheOutcome {
	match (outcome, drove) {
		(Err(_), _) => CacheOutcome::Failed,
		(Ok(_), true) => CacheOutcome::Fetched,
		(Ok(_), false) => CacheOutcome::Joined,
	}
}

/// Builder for [`TokenCache`] values.
pub struct TokenCacheBuilder {
	fetcher: Arc<dyn TokenFetcher>,
	clock: Arc<dyn Clock>,
	expiry_margin: Duration,
}
impl TokenCacheBuilder {
	/// Creates a builder using the system clock and no expiry margin.
	pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
		Self { fetcher, clock: Arc::new(SystemClock), expiry_margin: Duration::ZERO }
	}

	/// Overrides the clock used for expiry decisions and skew correction.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Treats cached entries as expired `margin` before their local expiry (defaults to zero).
	pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
		self.expiry_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Builds the cache.
	pub fn build(self) -> TokenCache {
		TokenCache {
			fetcher: self.fetcher,
			expiry: ExpiryCalculator::new(self.clock.clone()),
			clock: self.clock,
			expiry_margin: self.expiry_margin,
			state: Default::default(),
		}
	}
}
impl Debug for TokenCacheBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCacheBuilder").field("expiry_margin", &self.expiry_margin).finish()
	}
}
