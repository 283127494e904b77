//! Token fetch contracts and the built-in HTTP fetcher.
//!
//! [`TokenFetcher`] is the cache's only upstream dependency: given a scope it performs one
//! exchange with the authorization server and reports the minted token, its absolute expiry, and
//! the server's clock reading when available. [`HttpTokenFetcher`] implements the contract for
//! the assertion grant over any [`TokenHttpClient`](crate::http::TokenHttpClient).

pub mod assertion;
pub mod http;

pub use assertion::*;
pub use http::*;

// self
use crate::{
	_prelude::*,
	auth::{Scope, TokenSecret},
	error::TokenRequestError,
};

/// Boxed future returned by [`TokenFetcher::fetch`].
pub type FetchFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TokenRequestError>> + 'a + Send>>;

/// Upstream exchange that mints a token for a scope.
pub trait TokenFetcher
where
	Self: Send + Sync,
{
	/// Requests a new token for `scope`.
	fn fetch<'a>(&'a self, scope: &'a Scope) -> FetchFuture<'a, FetchedToken>;
}

/// Token minted by a [`TokenFetcher`].
#[derive(Clone, Debug)]
pub struct FetchedToken {
	/// Access token returned by the server.
	pub access_token: TokenSecret,
	/// Absolute expiry on the server's clock.
	pub expires_at: OffsetDateTime,
	/// Server's "now" at response time, used to correct for clock skew.
	pub server_date: Option<OffsetDateTime>,
}
impl FetchedToken {
	/// Creates a token without a server timestamp.
	pub fn new(access_token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_at, server_date: None }
	}

	/// Attaches the server's clock reading.
	pub fn with_server_date(mut self, server_date: OffsetDateTime) -> Self {
		self.server_date = Some(server_date);

		self
	}
}
