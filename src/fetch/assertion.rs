//! Assertion sources that authenticate the client to the token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{Scope, TokenSecret},
	error::TokenRequestError,
};

/// Boxed future returned by [`AssertionSource::assertion`].
pub type AssertionFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, TokenRequestError>> + 'a + Send>>;

/// Produces the signed assertion sent with each token request.
///
/// Key management and signing live outside this crate; implementations typically mint a
/// short-lived JWT per call. Failures should be reported as [`TokenRequestError::Assertion`].
pub trait AssertionSource
where
	Self: Send + Sync,
{
	/// Returns an assertion suitable for requesting `scope`.
	fn assertion<'a>(&'a self, scope: &'a Scope) -> AssertionFuture<'a>;
}

/// [`AssertionSource`] that always returns the same pre-signed assertion.
#[derive(Clone, Debug)]
pub struct StaticAssertion(TokenSecret);
impl StaticAssertion {
	/// Wraps a pre-signed assertion.
	pub fn new(assertion: impl Into<String>) -> Self {
		Self(TokenSecret::new(assertion))
	}
}
impl AssertionSource for StaticAssertion {
	fn assertion<'a>(&'a self, _scope: &'a Scope) -> AssertionFuture<'a> {
		let assertion = self.0.clone();

		Box::pin(async move { Ok(assertion) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn static_assertion_ignores_scope() {
		let source = StaticAssertion::new("signed");
		let first = source
			.assertion(&Scope::new("a:b:c"))
			.await
			.expect("Static assertion should always resolve.");
		let second = source
			.assertion(&Scope::wildcard())
			.await
			.expect("Static assertion should always resolve.");

		assert_eq!(first.expose(), "signed");
		assert_eq!(first, second);
	}
}
