// self
use crate::{_prelude::*, auth::Scope, obs::CacheOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// Span wrapped around an upstream token exchange.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Creates a new span tagged with the scope and stage.
	pub fn new(scope: &Scope, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_token_cache.fetch", scope = scope.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (scope, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event describing how a lookup was satisfied.
pub fn log_cache_outcome(scope: &Scope, outcome: CacheOutcome) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			CacheOutcome::Failed =>
				tracing::warn!(scope = scope.as_str(), outcome = outcome.as_str(), "token fetch failed"),
			_ => tracing::debug!(scope = scope.as_str(), outcome = outcome.as_str(), "token lookup"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (scope, outcome);
	}
}

/// Emits a debug event for a decoded token endpoint response.
pub fn log_token_response(
	scope: &Scope,
	expires_at: OffsetDateTime,
	server_date: Option<OffsetDateTime>,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			scope = scope.as_str(),
			expires_at = expires_at.unix_timestamp(),
			server_date = server_date.map(OffsetDateTime::unix_timestamp),
			"token endpoint responded"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (scope, expires_at, server_date);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FetchSpan::new(&Scope::wildcard(), "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn logging_helpers_without_subscriber() {
		let scope = Scope::new("a:b:c");

		log_cache_outcome(&scope, CacheOutcome::Hit);
		log_cache_outcome(&scope, CacheOutcome::Failed);
		log_token_response(&scope, OffsetDateTime::UNIX_EPOCH, None);
	}
}
