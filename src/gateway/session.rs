//! Session lifecycle: establishing a session after login, terminating it when authentication
//! cannot be recovered, and the best-effort server-side logout.

// std
use std::sync::atomic::Ordering;
// crates.io
use http::{HeaderMap, Method, header::AUTHORIZATION};
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	error::RefreshError,
	gateway::{Gateway, single_flight},
	http::{HttpTransport, OutboundRequest},
	obs::{self, Operation, OperationSpan, Outcome},
};

/// Authentication state published to the application shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
	/// An access token is stored.
	Authenticated,
	/// No usable credentials; the user must log in.
	Unauthenticated,
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
	/// The refresh endpoint rejected the refresh token or could not be reached.
	RefreshFailed,
	/// A 401 arrived and no refresh token was stored.
	MissingRefreshToken,
	/// A request was still unauthorized after being replayed with a refreshed token.
	UnauthorizedAfterRefresh,
	/// A request addressed to the refresh endpoint itself answered 401.
	RefreshEndpointUnauthorized,
	/// The user logged out.
	Logout,
}
impl TerminationReason {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TerminationReason::RefreshFailed => "refresh_failed",
			TerminationReason::MissingRefreshToken => "missing_refresh_token",
			TerminationReason::UnauthorizedAfterRefresh => "unauthorized_after_refresh",
			TerminationReason::RefreshEndpointUnauthorized => "refresh_endpoint_unauthorized",
			TerminationReason::Logout => "logout",
		}
	}
}
impl Display for TerminationReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<&RefreshError> for TerminationReason {
	fn from(e: &RefreshError) -> Self {
		match e {
			RefreshError::MissingRefreshToken => TerminationReason::MissingRefreshToken,
			_ => TerminationReason::RefreshFailed,
		}
	}
}

/// Details handed to a [`SessionObserver`] when a session ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminationNotice {
	/// Why the session ended.
	pub reason: TerminationReason,
	/// Route the user should be sent to.
	pub login_route: String,
	/// When the gateway terminated the session.
	pub at: OffsetDateTime,
}

/// Hook the application shell implements to react to session termination, typically by
/// navigating to [`TerminationNotice::login_route`].
///
/// Called synchronously on the task that terminated the session; implementations should
/// hand long-running work off elsewhere.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Receives the first termination of each session and every explicit logout.
	fn session_terminated(&self, notice: &TerminationNotice);
}

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Stores the token pair issued by a login call and marks the session authenticated.
	pub fn establish_session(&self, pair: TokenPair) -> Result<()> {
		self.vault.set_pair(&pair)?;
		self.ended.store(false, Ordering::SeqCst);
		self.status.send_replace(SessionStatus::Authenticated);

		tracing::info!(
			refresh_token = pair.refresh_token.is_some(),
			"session established"
		);

		Ok(())
	}

	/// Subscribes to authentication state changes.
	pub fn session_status(&self) -> watch::Receiver<SessionStatus> {
		self.status.subscribe()
	}

	/// Ends the session locally, then tells the server on a best-effort basis.
	///
	/// Local state is cleared before the server call starts, so a slow or failing logout
	/// endpoint never delays it. Server failures are logged and never returned; callers that
	/// do not want to wait for the server can spawn this future.
	pub async fn logout(&self) {
		let span = OperationSpan::new(Operation::Logout, "logout");

		span.instrument(async {
			let access_token = self.vault.access_token();

			self.terminate_session(TerminationReason::Logout);

			match access_token {
				Some(access_token) => self.revoke_remote(&access_token).await,
				None => tracing::debug!("no access token stored; skipping server-side logout"),
			}
		})
		.await
	}

	async fn revoke_remote(&self, access_token: &TokenSecret) {
		const OP: Operation = Operation::Logout;

		obs::record_outcome(OP, Outcome::Attempt);

		let url = match self.config.logout_endpoint() {
			Ok(url) => url,
			Err(e) => {
				tracing::warn!(error = %e, "logout endpoint is misconfigured; skipping server-side logout");
				obs::record_outcome(OP, Outcome::Failure);

				return;
			},
		};
		let mut headers = HeaderMap::new();

		if let Ok(value) = access_token.bearer_header() {
			headers.insert(AUTHORIZATION, value);
		}

		let request = OutboundRequest { method: Method::POST, url, headers, body: None };

		match self.transport.execute(request).await {
			Ok(response) if response.status().is_success() => {
				tracing::debug!("server-side logout acknowledged");
				obs::record_outcome(OP, Outcome::Success);
			},
			Ok(response) => {
				tracing::warn!(status = %response.status(), "server-side logout was rejected");
				obs::record_outcome(OP, Outcome::Failure);
			},
			Err(e) => {
				tracing::warn!(error = %e, "server-side logout failed");
				obs::record_outcome(OP, Outcome::Failure);
			},
		}
	}

	/// Terminates the session: rejects parked requests, clears the token store, publishes
	/// [`SessionStatus::Unauthenticated`], and notifies the observer.
	///
	/// Idempotent. Once a session has ended, later terminations only reach the observer when
	/// they are explicit logouts.
	pub(crate) fn terminate_session(&self, reason: TerminationReason) {
		let already_ended = self.ended.swap(true, Ordering::SeqCst);
		let parked = self.flight.lock().cancel();
		let rejected = parked.len();

		single_flight::notify(parked, &Err(RefreshError::SessionTerminated));
		self.vault.clear();
		self.status.send_replace(SessionStatus::Unauthenticated);
		self.metrics.record_termination();

		let notice = TerminationNotice {
			reason,
			login_route: self.config.login_route.clone(),
			at: OffsetDateTime::now_utc(),
		};

		tracing::info!(
			reason = reason.as_str(),
			rejected,
			login_route = %notice.login_route,
			"session terminated"
		);

		if already_ended && reason != TerminationReason::Logout {
			tracing::debug!(reason = reason.as_str(), "session already ended; observer not notified");

			return;
		}
		if let Some(observer) = &self.observer {
			observer.session_terminated(&notice);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_errors_map_to_termination_reasons() {
		assert_eq!(
			TerminationReason::from(&RefreshError::MissingRefreshToken),
			TerminationReason::MissingRefreshToken
		);
		assert_eq!(
			TerminationReason::from(&RefreshError::Network { message: "down".into() }),
			TerminationReason::RefreshFailed
		);
		assert_eq!(TerminationReason::UnauthorizedAfterRefresh.to_string(), "unauthorized_after_refresh");
	}
}
