//! Token endpoint configuration.

// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, error::ConfigError};

/// Grant type sent when none is configured.
pub const DEFAULT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Validated token endpoint settings consumed by [`HttpTokenFetcher`](crate::fetch::HttpTokenFetcher).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEndpoint {
	/// Token endpoint URL receiving the form POST.
	pub url: Url,
	/// `grant_type` form value.
	pub grant_type: String,
}
impl TokenEndpoint {
	/// Creates a new builder.
	pub fn builder() -> TokenEndpointBuilder {
		TokenEndpointBuilder::default()
	}

	/// Validates `url` and uses the default grant type.
	pub fn new(url: Url) -> Result<Self, ConfigError> {
		Self::builder().url(url).build()
	}

	/// Parses and validates `url` and uses the default grant type.
	pub fn parse(url: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(url).map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Self::new(url)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.grant_type.trim().is_empty() {
			return Err(ConfigError::EmptyGrantType);
		}

		validate_endpoint(&self.url)
	}
}

/// Builder for [`TokenEndpoint`] values.
#[derive(Debug)]
pub struct TokenEndpointBuilder {
	/// Token endpoint URL.
	pub url: Option<Url>,
	/// `grant_type` form value.
	pub grant_type: String,
}
impl TokenEndpointBuilder {
	/// Sets the token endpoint URL.
	pub fn url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}

	/// Overrides the `grant_type` form value.
	pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = grant_type.into();

		self
	}

	/// Consumes the builder and validates the resulting endpoint.
	pub fn build(self) -> Result<TokenEndpoint, ConfigError> {
		let url = self.url.ok_or(ConfigError::MissingTokenEndpoint)?;
		let endpoint = TokenEndpoint { url, grant_type: self.grant_type };

		endpoint.validate()?;

		Ok(endpoint)
	}
}
impl Default for TokenEndpointBuilder {
	fn default() -> Self {
		Self { url: None, grant_type: DEFAULT_GRANT_TYPE.into() }
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_to_jwt_bearer_grant() {
		let endpoint = TokenEndpoint::parse("https://auth.example.com/oauth2/token")
			.expect("HTTPS endpoint should be accepted.");

		assert_eq!(endpoint.grant_type, DEFAULT_GRANT_TYPE);
		assert_eq!(endpoint.url.path(), "/oauth2/token");
	}

	#[test]
	fn rejects_insecure_remote_endpoints() {
		let err = TokenEndpoint::parse("http://auth.example.com/token")
			.expect_err("Plain HTTP should be rejected for remote hosts.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { .. }));

		for url in ["http://localhost:8080/token", "http://127.0.0.1/token", "http://[::1]/token"] {
			assert!(TokenEndpoint::parse(url).is_ok(), "Loopback endpoint {url} should be accepted.");
		}
	}

	#[test]
	fn builder_validates_required_fields() {
		assert!(matches!(TokenEndpoint::builder().build(), Err(ConfigError::MissingTokenEndpoint)));

		let url = Url::parse("https://auth.example.com/token").expect("Fixture URL should parse.");
		let err = TokenEndpoint::builder()
			.url(url.clone())
			.grant_type("  ")
			.build()
			.expect_err("Blank grant types should be rejected.");

		assert!(matches!(err, ConfigError::EmptyGrantType));

		let endpoint = TokenEndpoint::builder()
			.url(url)
			.grant_type("client_credentials")
			.build()
			.expect("Custom grant type should be accepted.");

		assert_eq!(endpoint.grant_type, "client_credentials");
		assert!(matches!(
			TokenEndpoint::parse("not a url"),
			Err(ConfigError::InvalidEndpoint { .. })
		));
	}
}
