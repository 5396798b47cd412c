//! Authenticated request gateway.
//!
//! [`Gateway`] attaches the stored access token to outgoing requests and recovers from `401`
//! responses by refreshing the token pair at most once at a time. Requests that hit a `401`
//! while a refresh is running are parked and replayed with the token that refresh produced.
//! A request is replayed at most once; a second `401`, or a failed refresh, terminates the
//! session.

pub mod metrics;
pub mod session;

mod single_flight;

pub use metrics::GatewayMetrics;
pub use session::*;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use url::Position;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	config::GatewayConfig,
	error::{ConfigError, RefreshError},
	gateway::single_flight::{FlightLease, Settlement, SingleFlight, Ticket},
	http::{ApiRequest, ApiResponse, HttpTransport, OutboundRequest},
	obs::{self, Operation, OperationSpan, Outcome},
	refresh::RefreshClient,
	store::{TokenStore, TokenVault},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Credential a single attempt is sent with.
enum Credential {
	/// Whatever the store holds, unless the caller set an explicit `Authorization` header.
	Stored,
	/// Token produced by the refresh this request waited on; marks the request as retried.
	Refreshed(TokenSecret),
}

/// Authenticated HTTP gateway shared by every API call of an application.
///
/// Cloning is cheap and every clone shares the token store, the refresh coordination state,
/// the metrics, and the session status channel, so one logical gateway can be handed to
/// any number of tasks.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Validated configuration.
	pub config: Arc<GatewayConfig>,
	/// Transport used for API calls, refreshes, and logout.
	pub transport: Arc<T>,
	/// Token pair storage.
	pub vault: TokenVault,
	/// Shared counters describing refresh and replay activity.
	pub metrics: Arc<GatewayMetrics>,
	refresher: RefreshClient<T>,
	flight: Arc<Mutex<SingleFlight>>,
	status: Arc<watch::Sender<SessionStatus>>,
	observer: Option<Arc<dyn SessionObserver>>,
	/// Set once the current session has been terminated; cleared when a new one starts.
	ended: Arc<AtomicBool>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		config.validate()?;

		let transport = transport.into();
		let refresher = RefreshClient::new(Arc::clone(&transport), config.refresh_endpoint()?);
		let vault = TokenVault::new(store);
		let initial = if vault.access_token().is_some() {
			SessionStatus::Authenticated
		} else {
			SessionStatus::Unauthenticated
		};

		Ok(Self {
			config: Arc::new(config),
			transport,
			vault,
			metrics: Default::default(),
			refresher,
			flight: Default::default(),
			status: Arc::new(watch::Sender::new(initial)),
			observer: None,
			ended: Default::default(),
		})
	}

	/// Registers the hook that is told when a session ends.
	pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = Some(observer);

		self
	}

	/// Sends a request through the gateway.
	///
	/// Responses below `400` are returned as-is. A `401` triggers (or joins) a token refresh
	/// and a single replay. Other `4xx`/`5xx` statuses surface as [`Error::Status`] and
	/// transport failures as [`Error::Transport`]; neither triggers a refresh.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const OP: Operation = Operation::Request;

		let span = OperationSpan::new(OP, "send");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span.instrument(self.drive(&span, &request)).await;

		obs::record_outcome(OP, Outcome::of(&result));

		result
	}

	/// Sends a `GET` request and decodes the JSON response body.
	pub async fn get_json<R>(&self, target: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(ApiRequest::get(target)).await?.json()
	}

	/// Returns `true` while a token refresh is running.
	pub fn is_refreshing(&self) -> bool {
		self.flight.lock().in_flight()
	}

	async fn drive(&self, span: &OperationSpan, request: &ApiRequest) -> Result<ApiResponse> {
		let url = self.config.resolve(request.target())?;
		let targets_refresh_endpoint = same_endpoint(&url, self.refresher.endpoint());
		let mut credential = Credential::Stored;

		span.record_request(request.method(), &url);

		loop {
			let (outbound, attached) = self.outbound(request, &url, &credential)?;
			let response = self.transport.execute(outbound).await?;
			let status = response.status();

			if status != StatusCode::UNAUTHORIZED {
				if response.is_pass_through() {
					return Ok(response);
				}

				tracing::debug!(%status, "request failed");

				return Err(Error::Status { status, body: response.into_body() });
			}
			if targets_refresh_endpoint {
				self.terminate_session(TerminationReason::RefreshEndpointUnauthorized);

				return Err(Error::Unauthorized { body: response.into_body() });
			}
			if matches!(credential, Credential::Refreshed(_)) {
				self.terminate_session(TerminationReason::UnauthorizedAfterRefresh);

				return Err(Error::Unauthorized { body: response.into_body() });
			}

			tracing::debug!("request unauthorized; waiting for a fresh access token");

			let token = self.fresh_access_token(attached.as_ref()).await?;

			self.metrics.record_replay();

			credential = Credential::Refreshed(token);
		}
	}

	/// Builds one attempt. Also returns the stored token that was attached, if any.
	fn outbound(
		&self,
		request: &ApiRequest,
		url: &Url,
		credential: &Credential,
	) -> Result<(OutboundRequest, Option<TokenSecret>)> {
		let mut outbound = request.to_outbound(url.clone());
		let attached = match credential {
			Credential::Stored if request.has_explicit_credentials() => None,
			Credential::Stored => self.vault.access_token(),
			Credential::Refreshed(_) => None,
		};
		let token = match credential {
			Credential::Refreshed(token) => Some(token),
			Credential::Stored => attached.as_ref(),
		};

		if let Some(token) = token {
			outbound.headers.insert(AUTHORIZATION, bearer(token)?);
		}

		Ok((outbound, attached))
	}

	/// Resolves the token a `401`'d request should be replayed with.
	///
	/// `sent` is the stored token the request carried. When a refresh committed a different
	/// token after the request left, that token is reused instead of starting another flight.
	/// When the session ended after the request left, the request is rejected without a new
	/// flight, so one session end is reported once.
	async fn fresh_access_token(
		&self,
		sent: Option<&TokenSecret>,
	) -> Result<TokenSecret, RefreshError> {
		let ticket = {
			let mut flight = self.flight.lock();

			if let Some(sent) = sent
				&& !flight.in_flight()
			{
				match self.vault.access_token() {
					Some(current) if &current != sent => {
						tracing::debug!(
							"access token changed while the request was in flight; replaying"
						);

						return Ok(current);
					},
					None => {
						tracing::debug!(
							"session ended while the request was in flight; rejecting"
						);

						return Err(RefreshError::SessionTerminated);
					},
					Some(_) => {},
				}
			}

			flight.join()
		};

		match ticket {
			Ticket::Follow(rx) => {
				self.metrics.record_parked();
				tracing::debug!("refresh already in flight; parking request");

				rx.await.unwrap_or(Err(RefreshError::Abandoned))
			},
			Ticket::Lead(id) => self.lead_refresh(FlightLease::new(Arc::clone(&self.flight), id)).await,
		}
	}

	async fn lead_refresh(&self, lease: FlightLease) -> Result<TokenSecret, RefreshError> {
		const OP: Operation = Operation::Refresh;

		let span = OperationSpan::new(OP, "lead_refresh");

		obs::record_outcome(OP, Outcome::Attempt);
		self.metrics.record_refresh_attempt();

		let flight = lease.id();
		let exchanged = span
			.instrument(async {
				match self.vault.refresh_token() {
					Some(refresh_token) => self.refresher.exchange(&refresh_token).await,
					None => Err(RefreshError::MissingRefreshToken),
				}
			})
			.await;
		let (outcome, pair) = match exchanged {
			Ok(pair) => (Ok(pair.access_token.clone()), Some(pair)),
			Err(e) => (Err(e), None),
		};
		let settlement = lease.settle(outcome, || {
			if let Some(pair) = &pair {
				self.store_refreshed(pair);
			}
		});

		match settlement {
			Settlement::Current { outcome: Ok(token), followers } => {
				tracing::info!(flight, followers, "access token refreshed");
				self.metrics.record_refresh_success();
				obs::record_outcome(OP, Outcome::Success);

				Ok(token)
			},
			Settlement::Current { outcome: Err(e), followers } => {
				tracing::warn!(flight, followers, error = %e, "token refresh failed");
				self.metrics.record_refresh_failure();
				obs::record_outcome(OP, Outcome::Failure);
				self.terminate_session(TerminationReason::from(&e));

				Err(e)
			},
			Settlement::Cancelled(outcome) => {
				tracing::info!(flight, "session ended during refresh; discarding result");
				self.metrics.record_refresh_failure();
				obs::record_outcome(OP, Outcome::Failure);

				Err(outcome.err().unwrap_or(RefreshError::SessionTerminated))
			},
		}
	}

	fn store_refreshed(&self, pair: &TokenPair) {
		if let Err(e) = self.vault.set_pair(pair) {
			tracing::warn!(error = %e, "failed to persist refreshed tokens; continuing with in-memory token");
		}

		self.ended.store(false, Ordering::SeqCst);
		self.status.send_replace(SessionStatus::Authenticated);
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway that provisions its own reqwest-backed transport.
	pub fn new(config: GatewayConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			transport: Arc::clone(&self.transport),
			vault: self.vault.clone(),
			metrics: Arc::clone(&self.metrics),
			refresher: self.refresher.clone(),
			flight: Arc::clone(&self.flight),
			status: Arc::clone(&self.status),
			observer: self.observer.clone(),
			ended: Arc::clone(&self.ended),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_endpoint", &self.refresher.endpoint().as_str())
			.field("vault", &self.vault)
			.field("status", &*self.status.borrow())
			.field("observer_set", &self.observer.is_some())
			.finish()
	}
}

fn bearer(token: &TokenSecret) -> Result<HeaderValue, ConfigError> {
	token.bearer_header().map_err(|source| ConfigError::InvalidHeaderValue {
		name: AUTHORIZATION.as_str().to_owned(),
		source,
	})
}

fn same_endpoint(url: &Url, endpoint: &Url) -> bool {
	url[..Position::AfterPath] == endpoint[..Position::AfterPath]
}
