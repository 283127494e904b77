//! In-memory OAuth 2.0 access-token cache for machine-to-machine callers.
//!
//! [`TokenCache`](cache::TokenCache) hands out cached access tokens per scope, coalesces
//! concurrent misses into a single upstream exchange, and corrects server-reported expiries
//! for clock skew using the token endpoint's `Date` header.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod endpoint;
pub mod error;
pub mod expiry;
pub mod fetch;
pub mod http;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		cache::TokenCache,
		clock::ManualClock,
		endpoint::TokenEndpoint,
		fetch::{HttpTokenFetcher, ReqwestTokenFetcher, StaticAssertion, TokenFetcher},
		http::ReqwestHttpClient,
	};

	/// Assertion value sent by [`build_reqwest_test_cache`].
	pub const TEST_ASSERTION: &str = "signed.test.assertion";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds an HTTP fetcher that posts [`TEST_ASSERTION`] to the provided token URL.
	pub fn build_reqwest_test_fetcher(token_url: &str) -> ReqwestTokenFetcher {
		let endpoint = TokenEndpoint::parse(token_url).expect("Test token endpoint should be valid.");

		HttpTokenFetcher::with_http_client(
			endpoint,
			Arc::new(StaticAssertion::new(TEST_ASSERTION)),
			test_reqwest_http_client(),
		)
	}

	/// Constructs a [`TokenCache`] backed by the reqwest fetcher and a manual clock starting at
	/// the Unix epoch.
	pub fn build_reqwest_test_cache(token_url: &str) -> (TokenCache, Arc<ManualClock>) {
		let fetcher: Arc<dyn TokenFetcher> = Arc::new(build_reqwest_test_fetcher(token_url));
		let clock = Arc::new(ManualClock::default());
		let cache = TokenCache::builder(fetcher).with_clock(clock.clone()).build();

		(cache, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use oauth2;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
