//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use http::{HeaderValue, header::InvalidHeaderValue};
// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret holds no characters (or only whitespace).
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Renders the secret as a sensitive `Bearer` header value.
	pub fn bearer_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn bearer_header_is_sensitive() {
		let header = TokenSecret::new("abc.def")
			.bearer_header()
			.expect("Plain ASCII tokens should form a valid header.");

		assert_eq!(header.to_str().expect("Header should be visible ASCII."), "Bearer abc.def");
		assert!(header.is_sensitive());
	}

	#[test]
	fn bearer_header_rejects_control_characters() {
		assert!(TokenSecret::new("line\nbreak").bearer_header().is_err());
	}

	#[test]
	fn blank_detection_ignores_whitespace() {
		assert!(TokenSecret::new("").is_blank());
		assert!(TokenSecret::new("  ").is_blank());
		assert!(!TokenSecret::new("x").is_blank());
	}
}
