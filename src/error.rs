//! Crate-level error types shared by the cache, fetchers, and configuration builders.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Shareable error source; token request failures fan out to every joined caller, so their
/// sources must be cheap to clone.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint exchange failed.
	#[error(transparent)]
	TokenRequest(#[from] TokenRequestError),
}

/// Configuration and validation failures raised while assembling fetchers.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint was never configured.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Token endpoint cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint must use HTTPS unless it targets a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Grant type cannot be blank.
	#[error("Grant type must not be empty.")]
	EmptyGrantType,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures surfaced by a token fetch.
///
/// The cache never retries or swallows these; every caller joined to the failed fetch receives
/// a clone of the same value.
#[derive(Clone, Debug, ThisError)]
pub enum TokenRequestError {
	/// Underlying HTTP client reported a network or I/O failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
		/// HTTP status captured before the failure, when available.
		status: Option<u16>,
	},
	/// Token request could not be assembled.
	#[error("Token request could not be constructed.")]
	Request {
		/// Request builder failure.
		#[source]
		source: SharedError,
	},
	/// Token endpoint answered with a non-success status.
	#[error(
		"Token endpoint rejected the request with status {status}: {}.",
		rejection_detail(.error, .error_description)
	)]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// OAuth `error` code from the response body, when present.
		error: Option<String>,
		/// OAuth `error_description` from the response body, when present.
		error_description: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with a body that could not be decoded.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: SharedError,
	},
	/// Token endpoint reported an `expires_at` outside the representable range.
	#[error("Token endpoint returned an out-of-range expires_at: {expires_at}.")]
	ExpiryOutOfRange {
		/// Raw epoch-seconds value.
		expires_at: i64,
	},
	/// Signed assertion for the token request could not be produced.
	#[error("Assertion could not be produced: {message}.")]
	Assertion {
		/// Human-readable failure description.
		message: String,
	},
	/// Transport failed without a more specific cause.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TokenRequestError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Arc::new(src), status: None }
	}

	/// Wraps a request construction failure.
	pub fn request(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Request { source: Arc::new(src) }
	}

	/// Wraps a response decoding failure.
	pub fn malformed(status: u16, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::MalformedResponse { status, source: Arc::new(src) }
	}

	/// Returns the HTTP status associated with the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } | Self::MalformedResponse { status, .. } => Some(*status),
			Self::Transport { status, .. } => *status,
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TokenRequestError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}
impl From<std::io::Error> for TokenRequestError {
	fn from(e: std::io::Error) -> Self {
		Self::transport(e)
	}
}

fn rejection_detail<'a>(error: &'a Option<String>, description: &'a Option<String>) -> &'a str {
	description.as_deref().or(error.as_deref()).unwrap_or("no error details")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejected_message_prefers_description() {
		let err = TokenRequestError::Rejected {
			status: 400,
			error: Some("invalid_grant".into()),
			error_description: Some("assertion expired".into()),
			retry_after: None,
		};

		assert_eq!(
			err.to_string(),
			"Token endpoint rejected the request with status 400: assertion expired."
		);
		assert_eq!(err.status(), Some(400));

		let bare = TokenRequestError::Rejected {
			status: 503,
			error: None,
			error_description: None,
			retry_after: None,
		};

		assert!(bare.to_string().ends_with("status 503: no error details."));
	}

	#[test]
	fn token_request_error_keeps_source_across_clones() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
		let err = TokenRequestError::from(io);
		let cloned = err.clone();
		let source = StdError::source(&cloned)
			.expect("Transport errors should expose the original failure as their source.");

		assert_eq!(source.to_string(), "peer reset");
		assert!(err.status().is_none());

		let wrapped: Error = cloned.into();

		assert!(matches!(wrapped, Error::TokenRequest(TokenRequestError::Transport { .. })));
	}
}
