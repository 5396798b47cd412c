//! Transport primitives for gateway-managed API calls.
//!
//! Callers describe requests with [`ApiRequest`]; the gateway resolves them into an
//! [`OutboundRequest`], attaches credentials, and hands them to an [`HttpTransport`].
//! Transports answer `Ok` for every HTTP status and reserve `Err` for failures where no
//! response arrived, which is what lets the gateway tell a 401 apart from a dead network.

// std
use std::{borrow::Cow, ops::Deref};
// crates.io
use bytes::Bytes;
use http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing resolved requests.
///
/// The trait is the gateway's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so one transport can back many cloned gateway handles, and the
/// futures they return must be `Send` so gateway calls can hop executor threads.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the request and returns whatever response arrives, regardless of status.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// Caller-facing request descriptor.
///
/// The descriptor is never mutated by the gateway; a replay after a token refresh rebuilds
/// the outbound request from it with only the `Authorization` header replaced.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	target: String,
	headers: HeaderMap,
	body: Option<Bytes>,
}
impl ApiRequest {
	/// Creates a request for `target`, which may be absolute or relative to the base URL.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), headers: HeaderMap::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(Method::GET, target)
	}

	/// Shorthand for a `POST` request.
	pub fn post(target: impl Into<String>) -> Self {
		Self::new(Method::POST, target)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(target: impl Into<String>) -> Self {
		Self::new(Method::PUT, target)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(target: impl Into<String>) -> Self {
		Self::new(Method::PATCH, target)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(target: impl Into<String>) -> Self {
		Self::new(Method::DELETE, target)
	}

	/// Adds a header from string parts, validating both.
	pub fn header(self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let header_name = HeaderName::from_bytes(name.as_bytes())?;
		let header_value = HeaderValue::from_str(value)
			.map_err(|source| ConfigError::InvalidHeaderValue { name: name.to_owned(), source })?;

		Ok(self.typed_header(header_name, header_value))
	}

	/// Adds an already-validated header, replacing any previous value.
	pub fn typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets an explicit bearer credential; the gateway will not substitute the stored token
	/// on the first attempt.
	pub fn bearer(self, token: &TokenSecret) -> Result<Self, ConfigError> {
		let value = token.bearer_header().map_err(|source| ConfigError::InvalidHeaderValue {
			name: AUTHORIZATION.as_str().to_owned(),
			source,
		})?;

		Ok(self.typed_header(AUTHORIZATION, value))
	}

	/// Serializes `body` as the JSON payload and sets `content-type`.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let payload = serde_json::to_vec(body).map_err(ConfigError::InvalidJsonBody)?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(payload.into());

		Ok(self)
	}

	/// Sets a raw payload.
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target as supplied by the caller.
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Caller-supplied headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Caller-supplied payload.
	pub fn payload(&self) -> Option<&Bytes> {
		self.body.as_ref()
	}

	/// Returns `true` when the caller already set an `Authorization` header.
	pub fn has_explicit_credentials(&self) -> bool {
		self.headers.contains_key(AUTHORIZATION)
	}

	/// Builds the outbound form against an already-resolved URL.
	pub(crate) fn to_outbound(&self, url: Url) -> OutboundRequest {
		OutboundRequest {
			method: self.method.clone(),
			url,
			headers: self.headers.clone(),
			body: self.body.clone(),
		}
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Headers, including the gateway-attached `Authorization` header when present.
	pub headers: HeaderMap,
	/// Optional payload.
	pub body: Option<Bytes>,
}
impl OutboundRequest {
	/// Returns the `Authorization` header value, if any.
	pub fn authorization(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
	}
}

/// Response returned by a transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Bytes,
}
impl ApiResponse {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Shorthand for a header-less response.
	pub fn from_status(status: StatusCode, body: impl Into<Bytes>) -> Self {
		Self::new(status, HeaderMap::new(), body)
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body.
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	/// Consumes the response and returns the raw body.
	pub fn into_body(self) -> Bytes {
		self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Decodes the body as JSON, reporting the path of the first mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source })
	}

	/// Returns `true` for responses the gateway passes through to callers unchanged.
	pub fn is_pass_through(&self) -> bool {
		!self.status.is_client_error() && !self.status.is_server_error()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let OutboundRequest { method, url, headers, body } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?;

			Ok(ApiResponse::new(status, headers, body))
		})
	}
}
