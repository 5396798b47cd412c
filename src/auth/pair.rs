//! Access/refresh token pair issued by login and refresh calls.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens issued together by a login or refresh response.
///
/// A refresh token is optional because non-rotating backends may omit it from refresh
/// responses, in which case the previously stored refresh token stays in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer credential attached to every API request.
	pub access_token: TokenSecret,
	/// Longer-lived credential accepted only by the refresh endpoint.
	pub refresh_token: Option<TokenSecret>,
}
impl TokenPair {
	/// Creates a pair without a refresh token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}

	/// Attaches a refresh token to the pair.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
