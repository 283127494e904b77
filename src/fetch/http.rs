//! Assertion-grant [`TokenFetcher`] over a [`TokenHttpClient`].

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	auth::{Scope, TokenSecret},
	endpoint::TokenEndpoint,
	error::TokenRequestError,
	fetch::{AssertionSource, FetchFuture, FetchedToken, TokenFetcher},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, parse_date},
	obs::{self, FetchSpan},
};

/// Fetcher specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenFetcher = HttpTokenFetcher<ReqwestHttpClient>;

/// Successful token endpoint payload.
#[derive(Deserialize)]
struct TokenResponseBody {
	access_token: TokenSecret,
	expires_at: i64,
}

/// OAuth error payload returned alongside non-success statuses.
#[derive(Default, Deserialize)]
struct ErrorResponseBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// [`TokenFetcher`] that POSTs `grant_type`, `assertion`, and `scope` to a token endpoint.
///
/// Each fetch asks the [`AssertionSource`] for a fresh assertion, sends one form-encoded request,
/// and decodes `access_token` plus the absolute `expires_at` (epoch seconds) from the JSON body.
/// The response `Date` header, when present and parsable, is reported as the server time.
pub struct HttpTokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Endpoint the fetcher posts to.
	pub endpoint: TokenEndpoint,
	/// Assertion provider authenticating the client.
	pub assertion: Arc<dyn AssertionSource>,
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
}
impl<C> HttpTokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a fetcher that reuses the caller-provided transport.
	pub fn with_http_client(
		endpoint: TokenEndpoint,
		assertion: Arc<dyn AssertionSource>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { endpoint, assertion, http_client: http_client.into() }
	}

	fn build_request(
		&self,
		scope: &Scope,
		assertion: &TokenSecret,
	) -> Result<HttpRequest, TokenRequestError> {
		let body = Serializer::new(String::new())
			.append_pair("grant_type", &self.endpoint.grant_type)
			.append_pair("assertion", assertion.expose())
			.append_pair("scope", scope.as_str())
			.finish();

		Request::builder()
			.method(Method::POST)
			.uri(self.endpoint.url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(TokenRequestError::request)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTokenFetcher<ReqwestHttpClient> {
	/// Creates a fetcher with a default reqwest transport.
	pub fn new(endpoint: TokenEndpoint, assertion: Arc<dyn AssertionSource>) -> Self {
		Self::with_http_client(endpoint, assertion, ReqwestHttpClient::default())
	}
}
impl<C> TokenFetcher for HttpTokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fetch<'a>(&'a self, scope: &'a Scope) -> FetchFuture<'a, FetchedToken> {
		let span = FetchSpan::new(scope, "http_exchange");

		Box::pin(span.instrument(async move {
			let assertion = self.assertion.assertion(scope).await?;
			let request = self.build_request(scope, &assertion)?;
			let meta = ResponseMetadataSlot::default();
			let handle = self.http_client.with_metadata(meta.clone());
			let response = handle
				.call(request)
				.await
				.map_err(|err| map_transport_error(meta.take(), err))?;
			let fetched = decode_token_response(&response)?;

			obs::log_token_response(scope, fetched.expires_at, fetched.server_date);

			Ok(fetched)
		}))
	}
}
impl<C> Debug for HttpTokenFetcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenFetcher").field("endpoint", &self.endpoint).finish()
	}
}

/// Decodes a token endpoint response into a [`FetchedToken`].
pub fn decode_token_response(response: &HttpResponse) -> Result<FetchedToken, TokenRequestError> {
	let status = response.status().as_u16();
	let meta = ResponseMetadata::from_headers(status, response.headers());

	if !response.status().is_success() {
		let body: ErrorResponseBody = serde_json::from_slice(response.body()).unwrap_or_default();

		return Err(TokenRequestError::Rejected {
			status,
			error: body.error,
			error_description: body.error_description,
			retry_after: meta.retry_after,
		});
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: TokenResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|err| TokenRequestError::malformed(status, err))?;
	let expires_at = OffsetDateTime::from_unix_timestamp(body.expires_at)
		.map_err(|_| TokenRequestError::ExpiryOutOfRange { expires_at: body.expires_at })?;

	Ok(FetchedToken {
		access_token: body.access_token,
		expires_at,
		server_date: parse_date(response.headers()),
	})
}

fn map_transport_error<E>(
	meta: Option<ResponseMetadata>,
	err: HttpClientError<E>,
) -> TokenRequestError
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.and_then(|value| value.status);

	match err {
		HttpClientError::Reqwest(inner) => {
			let source: Box<dyn StdError + Send + Sync> = inner;

			TokenRequestError::Transport { source: Arc::from(source), status }
		},
		HttpClientError::Http(inner) => TokenRequestError::request(inner),
		HttpClientError::Io(inner) => TokenRequestError::from(inner),
		HttpClientError::Other(message) => TokenRequestError::Other { message },
		_ => TokenRequestError::Other { message: "unrecognized transport failure".into() },
	}
}
