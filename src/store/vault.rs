//! Role-level access to the persisted token pair.
//!
//! [`TokenVault`] sits between the gateway and a [`TokenStore`] backend. Reads fail open: a
//! backend error is logged and reported as "no token", so a broken storage medium degrades
//! the client to an unauthenticated state instead of crashing it. Writes never replace a
//! stored token with an empty value.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	store::{StoreError, TokenKey, TokenStore},
};

/// Shared handle to the token pair storage.
#[derive(Clone)]
pub struct TokenVault(Arc<dyn TokenStore>);
impl TokenVault {
	/// Wraps a storage backend.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self(store)
	}

	/// Returns the stored access token, treating blank values and backend failures as absent.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.read(TokenKey::AccessToken)
	}

	/// Returns the stored refresh token, treating blank values and backend failures as absent.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.read(TokenKey::RefreshToken)
	}

	/// Stores a new access token; blank tokens are ignored.
	pub fn set_access_token(&self, token: impl Into<TokenSecret>) -> Result<(), StoreError> {
		self.write(TokenKey::AccessToken, token.into())
	}

	/// Stores a new refresh token; blank tokens are ignored.
	pub fn set_refresh_token(&self, token: impl Into<TokenSecret>) -> Result<(), StoreError> {
		self.write(TokenKey::RefreshToken, token.into())
	}

	/// Stores both halves of a freshly issued pair.
	///
	/// A pair without a refresh token leaves the stored refresh token untouched.
	pub fn set_pair(&self, pair: &TokenPair) -> Result<(), StoreError> {
		self.set_access_token(pair.access_token.clone())?;

		if let Some(refresh) = &pair.refresh_token {
			self.set_refresh_token(refresh.clone())?;
		}

		Ok(())
	}

	/// Removes both tokens. Safe to call repeatedly; backend failures are logged.
	pub fn clear(&self) {
		for key in TokenKey::ALL {
			if let Err(e) = self.0.remove(key) {
				tracing::warn!(key = key.as_str(), error = %e, "failed to remove token from store");
			}
		}
	}

	fn read(&self, key: TokenKey) -> Option<TokenSecret> {
		match self.0.load(key) {
			Ok(secret) => secret.filter(|s| !s.is_blank()),
			Err(e) => {
				tracing::warn!(key = key.as_str(), error = %e, "token store read failed; treating as absent");

				None
			},
		}
	}

	fn write(&self, key: TokenKey, secret: TokenSecret) -> Result<(), StoreError> {
		if secret.is_blank() {
			tracing::debug!(key = key.as_str(), "ignoring blank token write");

			return Ok(());
		}

		self.0.save(key, secret)
	}
}
impl Debug for TokenVault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenVault")
			.field("access_token_set", &self.access_token().is_some())
			.field("refresh_token_set", &self.refresh_token().is_some())
			.finish()
	}
}
