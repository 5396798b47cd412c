//! Single-flight coordination for token refreshes.
//!
//! Every request that hits a 401 calls [`SingleFlight::join`] under the gateway's mutex. The
//! first caller becomes the leader of a new flight and performs the refresh; everyone else
//! is parked on a oneshot continuation until the leader settles the flight. Check-and-set
//! happens inside one critical section, which is what keeps refreshes at most one at a time.
//!
//! Flights carry ids so session termination can cancel the running flight: its followers are
//! rejected immediately and the leader's eventual result is recognised as stale.

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshError};

/// Result handed to every request parked on a flight.
pub(crate) type FlightOutcome = Result<TokenSecret, RefreshError>;

type Waiter = oneshot::Sender<FlightOutcome>;

/// Role assigned to a request that needs a fresh access token.
pub(crate) enum Ticket {
	/// Caller must perform the refresh for flight `id`.
	Lead(u64),
	/// Caller waits for the running flight to settle.
	Follow(oneshot::Receiver<FlightOutcome>),
}

/// Shared refresh state: the running flight, if any, and its parked followers.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
	current: Option<u64>,
	next_id: u64,
	waiters: Vec<Waiter>,
}
impl SingleFlight {
	/// Leads a new flight when none is running, otherwise parks the caller.
	pub(crate) fn join(&mut self) -> Ticket {
		if self.current.is_some() {
			let (tx, rx) = oneshot::channel();

			self.waiters.push(tx);

			return Ticket::Follow(rx);
		}

		let id = self.next_id;

		self.next_id = self.next_id.wrapping_add(1);
		self.current = Some(id);

		Ticket::Lead(id)
	}

	/// Ends flight `id` and hands back its followers; `None` when the flight was cancelled.
	pub(crate) fn finish(&mut self, id: u64) -> Option<Vec<Waiter>> {
		if self.current != Some(id) {
			return None;
		}

		self.current = None;

		Some(mem::take(&mut self.waiters))
	}

	/// Cancels the running flight (if any) and hands back its followers.
	pub(crate) fn cancel(&mut self) -> Vec<Waiter> {
		self.current = None;

		mem::take(&mut self.waiters)
	}

	pub(crate) fn in_flight(&self) -> bool {
		self.current.is_some()
	}

	#[cfg(test)]
	pub(crate) fn parked(&self) -> usize {
		self.waiters.len()
	}
}

/// Delivers `outcome` to every waiter. Waiters whose request was dropped are skipped.
pub(crate) fn notify(waiters: Vec<Waiter>, outcome: &FlightOutcome) {
	for waiter in waiters {
		let _ = waiter.send(outcome.clone());
	}
}

/// How a flight ended from the leader's point of view.
pub(crate) enum Settlement {
	/// The flight was still current; `followers` requests received the outcome.
	Current {
		/// Outcome delivered to the leader and every follower.
		outcome: FlightOutcome,
		/// Number of parked requests that were resolved.
		followers: usize,
	},
	/// The session ended while the flight was running; nothing was delivered or committed.
	Cancelled(FlightOutcome),
}

/// Leader-side handle on a flight.
///
/// Dropping the lease without settling it (the leading request future was dropped mid
/// refresh) ends the flight and rejects its followers with [`RefreshError::Abandoned`].
pub(crate) struct FlightLease {
	flight: Arc<Mutex<SingleFlight>>,
	id: u64,
	settled: bool,
}
impl FlightLease {
	pub(crate) fn new(flight: Arc<Mutex<SingleFlight>>, id: u64) -> Self {
		Self { flight, id, settled: false }
	}

	pub(crate) fn id(&self) -> u64 {
		self.id
	}

	/// Settles the flight.
	///
	/// `commit` runs under the coordination lock, and only while the flight is still current,
	/// so a result that arrives after session termination can never re-populate the store.
	/// Followers are resumed after the lock is released.
	pub(crate) fn settle<F>(mut self, outcome: FlightOutcome, commit: F) -> Settlement
	where
		F: FnOnce(),
	{
		self.settled = true;

		let waiters = {
			let mut state = self.flight.lock();
			let waiters = state.finish(self.id);

			if waiters.is_some() {
				commit();
			}

			waiters
		};

		match waiters {
			Some(waiters) => {
				let followers = waiters.len();

				notify(waiters, &outcome);

				Settlement::Current { outcome, followers }
			},
			None => Settlement::Cancelled(outcome),
		}
	}
}
impl Drop for FlightLease {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let waiters = self.flight.lock().finish(self.id);

		if let Some(waiters) = waiters {
			tracing::warn!(
				flight = self.id,
				followers = waiters.len(),
				"refresh leader dropped before settling; rejecting parked requests"
			);
			notify(waiters, &Err(RefreshError::Abandoned));
		}
	}
}
