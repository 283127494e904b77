//! Demonstrates serving cached service tokens through the assertion-grant fetcher with the
//! default reqwest transport, including coalesced concurrent requests.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_token_cache::{
	cache::TokenCache,
	endpoint::TokenEndpoint,
	fetch::{ReqwestTokenFetcher, StaticAssertion, TokenFetcher},
	http::ReqwestHttpClient,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expires_at = time::OffsetDateTime::now_utc().unix_timestamp() + 900;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("scope", "core:*:*");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"access_token\":\"demo-access\",\"expires_at\":{expires_at}}}"));
		})
		.await;
	let endpoint = TokenEndpoint::parse(&server.url("/token"))?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let fetcher: Arc<dyn TokenFetcher> = Arc::new(ReqwestTokenFetcher::with_http_client(
		endpoint,
		Arc::new(StaticAssertion::new("demo.signed.assertion")),
		http_client,
	));
	let cache = TokenCache::new(fetcher);
	let (first, second) =
		tokio::join!(cache.get_token(Some("core:*:*")), cache.get_token(Some("core:*:*")));
	let third = cache.get_token(Some("core:*:*")).await?;

	println!("Shared access token: {}.", first?.expose());
	println!("Joined access token: {}.", second?.expose());
	println!("Cached access token: {}.", third.expose());

	token_mock.assert_calls_async(1).await;

	Ok(())
}
