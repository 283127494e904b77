//! Scope keys used to partition cached tokens.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Opaque authorization scope used verbatim as the cache key.
///
/// Scopes follow a colon-delimited convention (`a:b:c`) but are never split or validated; two
/// scopes share a cache entry only when their strings are identical. A caller that omits the
/// scope receives the [`WILDCARD`](Self::WILDCARD) scope.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Scope(Arc<str>);
impl Scope {
	/// Scope requested when the caller does not name one.
	pub const WILDCARD: &'static str = "*:*:*";

	/// Wraps a scope string without inspecting it.
	pub fn new(value: impl AsRef<str>) -> Self {
		Self(Arc::from(value.as_ref()))
	}

	/// Returns the wildcard scope.
	pub fn wildcard() -> Self {
		Self::new(Self::WILDCARD)
	}

	/// Normalizes an optional caller-supplied scope, defaulting to the wildcard.
	pub fn from_optional(scope: Option<&str>) -> Self {
		scope.map(Self::new).unwrap_or_else(Self::wildcard)
	}

	/// Returns the scope string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true for the wildcard scope.
	pub fn is_wildcard(&self) -> bool {
		self.as_str() == Self::WILDCARD
	}
}
impl Default for Scope {
	fn default() -> Self {
		Self::wildcard()
	}
}
impl Deref for Scope {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Scope {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<&str> for Scope {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Scope {
	fn from(value: String) -> Self {
		Self(Arc::from(value))
	}
}
impl From<Scope> for String {
	fn from(value: Scope) -> Self {
		value.0.as_ref().to_owned()
	}
}
impl Debug for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scope({})", self.0)
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_scope_defaults_to_wildcard() {
		let scope = Scope::from_optional(None);

		assert_eq!(scope.as_str(), "*:*:*");
		assert!(scope.is_wildcard());
		assert_eq!(scope, Scope::default());
		assert_eq!(scope, Scope::from_optional(Some("*:*:*")));
	}

	#[test]
	fn scopes_are_used_verbatim() {
		let padded = Scope::new(" a:b:c");
		let plain = Scope::from("a:b:c");

		assert_ne!(padded, plain);
		assert_eq!(plain.as_str(), "a:b:c");
		assert_eq!(format!("{plain:?}"), "Scope(a:b:c)");
		assert!(Scope::new("").as_str().is_empty());
	}

	#[test]
	fn scope_serializes_as_plain_string() {
		let payload =
			serde_json::to_string(&Scope::new("x:y:z")).expect("Scope should serialize to JSON.");

		assert_eq!(payload, "\"x:y:z\"");

		let scope: Scope =
			serde_json::from_str(&payload).expect("Serialized scope should deserialize.");

		assert_eq!(scope.as_str(), "x:y:z");
	}
}
