//! Gateway-level error types shared by transports, stores, and the refresh protocol.

// crates.io
use bytes::Bytes;
use http::{StatusCode, header::InvalidHeaderValue};
// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure on an explicit write.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token refresh failed; the session has been terminated.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Server answered with a non-success status other than 401.
	#[error("Request failed with HTTP status {status}.")]
	Status {
		/// Status returned by the server.
		status: StatusCode,
		/// Raw response body for caller-level handling.
		body: Bytes,
	},
	/// Server answered 401 after the single permitted retry, or the refresh endpoint itself
	/// answered 401.
	#[error("Request is still unauthorized; the session has been terminated.")]
	Unauthorized {
		/// Raw response body of the final 401.
		body: Bytes,
	},
	/// Response body did not match the expected JSON shape.
	#[error("Response body could not be decoded: {source}.")]
	Decode {
		/// Path-aware decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status attached to the error, when one was received.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
			Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request target or configured URL cannot be parsed.
	#[error("URL `{target}` is invalid.")]
	InvalidUrl {
		/// Offending input.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Scheme found in the configured base URL.
		scheme: String,
	},
	/// Base URL cannot carry relative paths (e.g., `mailto:`).
	#[error("Base URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending base URL.
		url: String,
	},
	/// Header name is not a valid HTTP token.
	#[error(transparent)]
	InvalidHeaderName(#[from] http::header::InvalidHeaderName),
	/// Header value contains bytes HTTP forbids.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeaderValue {
		/// Header the value was meant for.
		name: String,
		/// Underlying validation failure.
		#[source]
		source: InvalidHeaderValue,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	InvalidJsonBody(#[source] serde_json::Error),
	/// Configuration document could not be parsed.
	#[error("Configuration document is invalid: {source}.")]
	InvalidDocument {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures where no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Token refresh failures.
///
/// The type is `Clone` so one refresh outcome can be handed to every request parked on it.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// No refresh token is stored; the refresh endpoint was not called.
	#[error("No refresh token is available.")]
	MissingRefreshToken,
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the refresh token with HTTP status {status}.")]
	Rejected {
		/// Status returned by the refresh endpoint.
		status: StatusCode,
		/// Lossy UTF-8 rendering of the response body.
		body: String,
	},
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint is unreachable: {message}.")]
	Network {
		/// Rendered transport failure.
		message: String,
	},
	/// Refresh endpoint answered 2xx with an unusable payload.
	#[error("Refresh endpoint returned a malformed response: {message}.")]
	MalformedResponse {
		/// Description of what was wrong with the payload.
		message: String,
	},
	/// Session was terminated while the refresh was in flight.
	#[error("Session was terminated before the refresh completed.")]
	SessionTerminated,
	/// The request driving the refresh was dropped before it settled.
	#[error("Refresh was abandoned before it completed.")]
	Abandoned,
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		let mut message = e.to_string();
		let mut source = StdError::source(&e);

		while let Some(inner) = source {
			message.push_str(": ");
			message.push_str(&inner.to_string());
			source = inner.source();
		}

		Self::Network { message }
	}
}
