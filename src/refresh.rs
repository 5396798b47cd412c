//! Refresh endpoint caller.
//!
//! [`RefreshClient`] talks to the transport directly, so a refresh call never passes through
//! the gateway's credential attachment or 401 handling and cannot recurse into another
//! refresh. The refresh token travels in a JSON body (`{"refreshToken": "..."}`); responses
//! may name the new tokens `accessToken`/`access` and `refreshToken`/`refresh`.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	error::RefreshError,
	http::{HttpTransport, OutboundRequest},
};

#[derive(Deserialize)]
struct RefreshResponseBody {
	#[serde(rename = "accessToken", alias = "access", default)]
	access_token: Option<String>,
	#[serde(rename = "refreshToken", alias = "refresh", default)]
	refresh_token: Option<String>,
}

/// Performs single, unretried refresh-token exchanges.
pub struct RefreshClient<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	endpoint: Url,
}
impl<T> RefreshClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a caller bound to `endpoint`.
	pub fn new(transport: impl Into<Arc<T>>, endpoint: Url) -> Self {
		Self { transport: transport.into(), endpoint }
	}

	/// Absolute URL of the refresh endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Exchanges `refresh_token` for a new token pair with exactly one network call.
	pub async fn exchange(&self, refresh_token: &TokenSecret) -> Result<TokenPair, RefreshError> {
		let payload = serde_json::json!({ "refreshToken": refresh_token.expose() }).to_string();
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let request = OutboundRequest {
			method: Method::POST,
			url: self.endpoint.clone(),
			headers,
			body: Some(payload.into()),
		};
		let response = self.transport.execute(request).await?;

		if !response.status().is_success() {
			return Err(RefreshError::Rejected {
				status: response.status(),
				body: response.text().into_owned(),
			});
		}

		parse_refresh_response(response.body())
	}
}
impl<T> Clone for RefreshClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { transport: Arc::clone(&self.transport), endpoint: self.endpoint.clone() }
	}
}
impl<T> Debug for RefreshClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshClient").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

fn parse_refresh_response(body: &[u8]) -> Result<TokenPair, RefreshError> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let decoded: RefreshResponseBody = serde_path_to_error::deserialize(&mut de)
		.map_err(|e| RefreshError::MalformedResponse { message: e.to_string() })?;
	let access_token = decoded
		.access_token
		.map(TokenSecret::new)
		.filter(|token| !token.is_blank())
		.ok_or_else(|| RefreshError::MalformedResponse {
			message: "response carried no access token".into(),
		})?;

	if access_token.bearer_header().is_err() {
		return Err(RefreshError::MalformedResponse {
			message: "access token cannot be sent as a header value".into(),
		});
	}

	let refresh_token = decoded.refresh_token.map(TokenSecret::new).filter(|token| !token.is_blank());

	Ok(TokenPair { access_token, refresh_token })
}
