// std
use std::time::{Duration, Instant};
// self
use crate::{
	_prelude::*,
	obs::{OperationKind, OperationOutcome},
};

/// Counts and times one binding call.
///
/// Starting a meter records an `attempt`; [`OperationMeter::finish`] records the terminal
/// outcome. A meter dropped without finishing (its future was cancelled mid-flight) records
/// `cancelled`. With the `metrics` feature the counts land in
/// `cmis_binding_operation_total{operation,call,outcome}` and terminal outcomes also land in the
/// `cmis_binding_operation_seconds{operation,call,outcome}` histogram.
#[derive(Debug)]
pub struct OperationMeter {
	kind: OperationKind,
	call: &'static str,
	started: Instant,
	finished: bool,
}
impl OperationMeter {
	/// Records an attempt of `call` within `kind`.
	pub fn start(kind: OperationKind, call: &'static str) -> Self {
		emit(kind, call, OperationOutcome::Attempt, None);

		Self { kind, call, started: Instant::now(), finished: false }
	}

	/// Records the outcome classified from `result`.
	pub fn finish<T>(self, result: &Result<T>) -> OperationOutcome {
		let outcome = OperationOutcome::of(result);

		self.finish_with(outcome);

		outcome
	}

	/// Records an explicit terminal outcome.
	pub fn finish_with(mut self, outcome: OperationOutcome) {
		self.finished = true;

		emit(self.kind, self.call, outcome, Some(self.started.elapsed()));
	}
}
impl Drop for OperationMeter {
	fn drop(&mut self) {
		if !self.finished {
			emit(self.kind, self.call, OperationOutcome::Cancelled, Some(self.started.elapsed()));
		}
	}
}

fn emit(kind: OperationKind, call: &'static str, outcome: OperationOutcome, elapsed: Option<Duration>) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"cmis_binding_operation_total",
			"operation" => kind.as_str(),
			"call" => call,
			"outcome" => outcome.as_str()
		)
		.increment(1);

		if let Some(elapsed) = elapsed {
			metrics::histogram!(
				"cmis_binding_operation_seconds",
				"operation" => kind.as_str(),
				"call" => call,
				"outcome" => outcome.as_str()
			)
			.record(elapsed.as_secs_f64());
		}
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, call, outcome, elapsed);
	}
}
