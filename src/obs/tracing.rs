// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::Operation};

/// A span builder used by gateway operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	span: Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		let span = tracing::info_span!(
			"bearer_gateway.operation",
			operation = operation.as_str(),
			stage,
			method = tracing::field::Empty,
			url = tracing::field::Empty,
		);

		Self { span }
	}

	/// Records the request line on the span once it is known.
	pub fn record_request(&self, method: &http::Method, url: &Url) {
		self.span.record("method", tracing::field::display(method));
		self.span.record("url", tracing::field::display(url));
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
