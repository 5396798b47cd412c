// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_gateway_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_noop_without_metrics() {
		record_outcome(Operation::Refresh, Outcome::Failure);
	}

	#[test]
	fn outcome_of_maps_results() {
		assert_eq!(Outcome::of(&Ok::<(), ()>(())), Outcome::Success);
		assert_eq!(Outcome::of(&Err::<(), ()>(())), Outcome::Failure);
	}
}
