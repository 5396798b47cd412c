#![allow(dead_code)]

// std
use std::{
	io,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use bearer_gateway::{
	auth::TokenPair,
	config::GatewayConfig,
	error::TransportError,
	gateway::{Gateway, SessionObserver, TerminationNotice, TerminationReason},
	http::{ApiResponse, HttpTransport, OutboundRequest, TransportFuture},
	store::{MemoryStore, TokenKey, TokenStore},
	url::Url,
};
use http::StatusCode;
use tokio::sync::watch;

/// Access token the scripted API accepts after a successful refresh.
pub const FRESH_ACCESS: &str = "NEW";
/// Refresh token the scripted refresh endpoint honors.
pub const GOOD_REFRESH: &str = "VALID";
/// Rotated refresh token issued alongside [`FRESH_ACCESS`].
pub const ROTATED_REFRESH: &str = "ROTATED";
/// Access token callers set explicitly; always accepted.
pub const EXPLICIT_ACCESS: &str = "EXPLICIT";

pub type TestGateway = Gateway<ScriptedTransport>;

/// In-process API double.
///
/// - `/auth/refresh` answers `{"accessToken":"NEW","refreshToken":"ROTATED"}` when the body
///   carries `VALID` and `401` otherwise. Responses wait until the refresh gate is open.
/// - `/auth/logout` answers with the configured logout status.
/// - `/boom` answers `500`, `/offline` fails without a response, `/always-401` answers `401`.
/// - `/slow` behaves like any other path once the slow gate is open.
/// - Every other path answers `200` for `Bearer NEW` or `Bearer EXPLICIT` and `401`
///   otherwise.
pub struct ScriptedTransport {
	api_calls: Mutex<Vec<OutboundRequest>>,
	logout_calls: Mutex<Vec<OutboundRequest>>,
	refresh_calls: AtomicUsize,
	unauthorized: watch::Sender<usize>,
	refresh_gate: watch::Sender<bool>,
	slow_gate: watch::Sender<bool>,
	logout_status: Mutex<Option<StatusCode>>,
}
impl ScriptedTransport {
	pub fn new() -> Self {
		Self {
			api_calls: Mutex::new(Vec::new()),
			logout_calls: Mutex::new(Vec::new()),
			refresh_calls: AtomicUsize::new(0),
			unauthorized: watch::Sender::new(0),
			refresh_gate: watch::Sender::new(true),
			slow_gate: watch::Sender::new(false),
			logout_status: Mutex::new(Some(StatusCode::NO_CONTENT)),
		}
	}

	/// Holds refresh responses until [`ScriptedTransport::release_refresh`] is called.
	pub fn hold_refresh(&self) {
		self.refresh_gate.send_replace(false);
	}

	pub fn release_refresh(&self) {
		self.refresh_gate.send_replace(true);
	}

	/// Lets `/slow` answer.
	pub fn release_slow(&self) {
		self.slow_gate.send_replace(true);
	}

	/// `None` makes the logout call fail without a response.
	pub fn set_logout_status(&self, status: Option<StatusCode>) {
		*self.logout_status.lock().expect("Logout status lock poisoned.") = status;
	}

	/// Resolves once at least `count` API calls have been answered with `401`.
	pub async fn wait_for_unauthorized(&self, count: usize) {
		let mut rx = self.unauthorized.subscribe();

		rx.wait_for(|seen| *seen >= count).await.expect("Transport outlives the test.");
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	pub fn unauthorized_count(&self) -> usize {
		*self.unauthorized.borrow()
	}

	pub fn api_calls(&self) -> Vec<OutboundRequest> {
		self.api_calls.lock().expect("API call log poisoned.").clone()
	}

	pub fn logout_calls(&self) -> Vec<OutboundRequest> {
		self.logout_calls.lock().expect("Logout call log poisoned.").clone()
	}

	/// Authorization headers of every API call, in send order.
	pub fn authorizations(&self) -> Vec<Option<String>> {
		self.api_calls()
			.iter()
			.map(|request| request.authorization().map(str::to_owned))
			.collect()
	}

	async fn refresh(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
		self.refresh_calls.fetch_add(1, Ordering::SeqCst);

		let mut gate = self.refresh_gate.subscribe();

		gate.wait_for(|open| *open).await.expect("Transport outlives the test.");

		let presented = request
			.body
			.as_ref()
			.and_then(|body| serde_json::from_slice::<serde_json::Value>(body).ok())
			.and_then(|body| body.get("refreshToken").and_then(|v| v.as_str()).map(str::to_owned));

		if presented.as_deref() == Some(GOOD_REFRESH) {
			let body = serde_json::json!({
				"accessToken": FRESH_ACCESS,
				"refreshToken": ROTATED_REFRESH,
			});

			Ok(ApiResponse::from_status(StatusCode::OK, body.to_string()))
		} else {
			Ok(ApiResponse::from_status(StatusCode::UNAUTHORIZED, r#"{"message":"refresh expired"}"#))
		}
	}

	fn logout(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
		self.logout_calls.lock().expect("Logout call log poisoned.").push(request);

		match *self.logout_status.lock().expect("Logout status lock poisoned.") {
			Some(status) => Ok(ApiResponse::from_status(status, "")),
			None => Err(offline()),
		}
	}

	fn api(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
		let path = request.url.path().to_owned();
		let accepted = matches!(
			request.authorization(),
			Some(value) if value == format!("Bearer {FRESH_ACCESS}") || value == format!("Bearer {EXPLICIT_ACCESS}")
		);

		self.api_calls.lock().expect("API call log poisoned.").push(request);

		match path.as_str() {
			"/offline" => Err(offline()),
			"/boom" => Ok(ApiResponse::from_status(StatusCode::INTERNAL_SERVER_ERROR, "exploded")),
			"/always-401" => Ok(self.unauthorized()),
			_ if accepted => Ok(ApiResponse::from_status(StatusCode::OK, format!(r#"{{"path":"{path}"}}"#))),
			_ => Ok(self.unauthorized()),
		}
	}

	fn unauthorized(&self) -> ApiResponse {
		self.unauthorized.send_modify(|seen| *seen += 1);

		ApiResponse::from_status(StatusCode::UNAUTHORIZED, r#"{"message":"token expired"}"#)
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let path = request.url.path().to_owned();

			match path.as_str() {
				"/auth/refresh" => self.refresh(request).await,
				"/auth/logout" => self.logout(request),
				"/slow" => {
					let mut gate = self.slow_gate.subscribe();

					gate.wait_for(|open| *open).await.expect("Transport outlives the test.");

					self.api(request)
				},
				_ => self.api(request),
			}
		})
	}
}

/// Records every termination notice.
#[derive(Default)]
pub struct RecordingObserver(Mutex<Vec<TerminationNotice>>);
impl RecordingObserver {
	pub fn reasons(&self) -> Vec<TerminationReason> {
		self.0.lock().expect("Observer log poisoned.").iter().map(|notice| notice.reason).collect()
	}

	pub fn notices(&self) -> Vec<TerminationNotice> {
		self.0.lock().expect("Observer log poisoned.").clone()
	}
}
impl SessionObserver for RecordingObserver {
	fn session_terminated(&self, notice: &TerminationNotice) {
		self.0.lock().expect("Observer log poisoned.").push(notice.clone());
	}
}

pub struct Harness {
	pub gateway: TestGateway,
	pub transport: Arc<ScriptedTransport>,
	pub store: MemoryStore,
	pub observer: Arc<RecordingObserver>,
}

/// Builds a gateway over a [`ScriptedTransport`] and a store seeded with `entries`.
pub fn harness(entries: &[(TokenKey, &str)]) -> Harness {
	let store = MemoryStore::seeded(entries.iter().copied());
	let transport = Arc::new(ScriptedTransport::new());
	let observer = Arc::new(RecordingObserver::default());
	let config = GatewayConfig::builder(
		Url::parse("https://api.example.com").expect("Base URL fixture should parse."),
	)
	.build()
	.expect("Gateway config fixture should validate.");
	let backend: Arc<dyn TokenStore> = Arc::new(store.clone());
	let gateway = TestGateway::with_transport(config, backend, Arc::clone(&transport))
		.expect("Gateway should build from a valid config.")
		.with_observer(observer.clone());

	Harness { gateway, transport, store, observer }
}

/// Store contents: an expired access token plus a refresh token the API honors.
pub fn expired_session() -> Harness {
	harness(&[(TokenKey::AccessToken, "OLD"), (TokenKey::RefreshToken, GOOD_REFRESH)])
}

pub fn stored(store: &MemoryStore, key: TokenKey) -> Option<String> {
	store
		.load(key)
		.expect("Memory loads are infallible.")
		.map(|secret| secret.expose().to_owned())
}

pub fn login_pair() -> TokenPair {
	TokenPair::new(FRESH_ACCESS).with_refresh_token(GOOD_REFRESH)
}

fn offline() -> TransportError {
	TransportError::network(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))
}
