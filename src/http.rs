//! Transport primitives for token endpoint exchanges.
//!
//! The module exposes [`TokenHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients. Implementations
//! call [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status is known, so transport failures can be
//! reported with the status and retry hint that accompanied them.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderMap,
		header::{DATE, RETRY_AFTER},
	},
};
use time::{
	PrimitiveDateTime, format_description::FormatItem, format_description::well_known::Rfc2822,
	macros::format_description,
};
// self
use crate::_prelude::*;

/// IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`), the preferred HTTP-date form.
const IMF_FIXDATE: &[FormatItem<'static>] = format_description!(
	"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Abstraction over HTTP transports capable of executing token requests while publishing
/// response metadata.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared behind `Arc`, and the
/// handles they return must own whatever state is required so their request futures remain
/// `Send` for the lifetime of the in-flight exchange.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across requests.
	/// - Once an HTTP response provides status headers, save them with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Metadata from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Server clock reading taken from the `Date` header.
	pub date: Option<OffsetDateTime>,
}
impl ResponseMetadata {
	/// Extracts metadata from a status code and response headers.
	pub fn from_headers(status: u16, headers: &HeaderMap) -> Self {
		Self {
			status: Some(status),
			retry_after: parse_retry_after(headers),
			date: parse_date(headers),
		}
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and fetcher.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly, so prefer [`ReqwestHttpClient::without_redirects`] or a
/// custom client with redirects disabled.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that never follows redirects.
	pub fn without_redirects() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records response metadata.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata::from_headers(status.as_u16(), &headers));

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Parses the `Date` header as an RFC 2822 / HTTP-date timestamp.
pub fn parse_date(headers: &HeaderMap) -> Option<OffsetDateTime> {
	let raw = headers.get(DATE)?.to_str().ok()?.trim();

	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		return Some(moment);
	}

	PrimitiveDateTime::parse(raw, IMF_FIXDATE).ok().map(PrimitiveDateTime::assume_utc)
}

/// Parses the `Retry-After` header as either delta-seconds or an HTTP-date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	// self
	use super::*;

	fn headers(name: oauth2::http::HeaderName, value: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(name, HeaderValue::from_static(value));

		headers
	}

	#[test]
	fn date_header_parses_http_date() {
		let parsed = parse_date(&headers(DATE, "Thu, 01 Jan 1970 00:00:03 GMT"))
			.expect("IMF-fixdate should parse.");

		assert_eq!(parsed.unix_timestamp(), 3);

		let parsed = parse_date(&headers(DATE, "Sun, 06 Nov 1994 08:49:37 +0000"))
			.expect("Numeric offsets should parse.");

		assert_eq!(parsed.unix_timestamp(), 784_111_777);
	}

	#[test]
	fn invalid_or_missing_date_is_ignored() {
		assert!(parse_date(&HeaderMap::new()).is_none());
		assert!(parse_date(&headers(DATE, "yesterday")).is_none());
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		assert_eq!(parse_retry_after(&headers(RETRY_AFTER, "30")), Some(Duration::seconds(30)));
		assert!(parse_retry_after(&headers(RETRY_AFTER, "soon")).is_none());
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata::from_headers(
			200,
			&headers(DATE, "Thu, 01 Jan 1970 00:00:03 GMT"),
		));

		let meta = slot.take().expect("Stored metadata should be returned once.");

		assert_eq!(meta.status, Some(200));
		assert_eq!(meta.date.map(OffsetDateTime::unix_timestamp), Some(3));
		assert!(slot.take().is_none());
	}
}
