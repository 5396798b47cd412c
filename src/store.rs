//! Storage contracts and built-in backends for the persisted token pair.

pub mod file;
pub mod memory;
pub mod vault;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use vault::TokenVault;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Fixed keys under which the token pair is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKey {
	/// Short-lived bearer credential.
	#[serde(rename = "accessToken")]
	AccessToken,
	/// Credential exchanged at the refresh endpoint.
	#[serde(rename = "refreshToken")]
	RefreshToken,
}
impl TokenKey {
	/// Every key, in the order they are cleared.
	pub const ALL: [TokenKey; 2] = [TokenKey::AccessToken, TokenKey::RefreshToken];

	/// Returns the storage key string.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKey::AccessToken => "accessToken",
			TokenKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for TokenKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Synchronous key-value backend holding the token pair.
///
/// Reads happen on every outgoing request, so implementations should answer from memory and
/// only touch slower media on writes.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the secret stored under `key`, if present.
	fn load(&self, key: TokenKey) -> Result<Option<TokenSecret>, StoreError>;

	/// Persists or replaces the secret stored under `key`.
	fn save(&self, key: TokenKey, secret: TokenSecret) -> Result<(), StoreError>;

	/// Removes the secret stored under `key`; removing an absent key succeeds.
	fn remove(&self, key: TokenKey) -> Result<(), StoreError>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("disk full"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn token_keys_serialize_as_fixed_storage_names() {
		let payload = serde_json::to_string(&TokenKey::ALL)
			.expect("Token keys should serialize to JSON.");

		assert_eq!(payload, "[\"accessToken\",\"refreshToken\"]");
		assert_eq!(TokenKey::RefreshToken.to_string(), "refreshToken");
	}
}
