//! Optional observability helpers for binding operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `cmis_binding.operation` with the
//!   `operation` (service area) and `stage` (call site) fields, plus debug events for link cache
//!   misses, challenge rounds, and token refreshes.
//! - Enable `metrics` to count every call in `cmis_binding_operation_total` (attempt, success,
//!   failure, cancelled) and time it in `cmis_binding_operation_seconds`, labeled by `operation`,
//!   `call` and `outcome`. See [`OperationMeter`].

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use tracing::debug_event;

// self
use crate::_prelude::*;

/// Operation areas observed by the binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// A single HTTP exchange driven by the request engine.
	HttpRequest,
	/// Authorization-code exchange against the OAuth token endpoint.
	TokenExchange,
	/// Refresh-token exchange against the OAuth token endpoint.
	TokenRefresh,
	/// Repository service calls.
	Repository,
	/// Object service calls.
	Object,
	/// Navigation service calls.
	Navigation,
	/// ACL service calls.
	Acl,
	/// Discovery service calls.
	Discovery,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::HttpRequest => "http_request",
			OperationKind::TokenExchange => "token_exchange",
			OperationKind::TokenRefresh => "token_refresh",
			OperationKind::Repository => "repository",
			OperationKind::Object => "object",
			OperationKind::Navigation => "navigation",
			OperationKind::Acl => "acl",
			OperationKind::Discovery => "discovery",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Caller cancelled before completion.
	Cancelled,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Cancelled => "cancelled",
		}
	}

	/// Classifies a finished operation result.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => OperationOutcome::Success,
			Err(e) if e.is_cancelled() => OperationOutcome::Cancelled,
			Err(_) => OperationOutcome::Failure,
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcome_classifies_results() {
		assert_eq!(OperationOutcome::of(&Ok::<_, Error>(())), OperationOutcome::Success);
		assert_eq!(OperationOutcome::of::<()>(&Err(Error::Cancelled)), OperationOutcome::Cancelled);
		assert_eq!(
			OperationOutcome::of::<()>(&Err(Error::invalid_argument("bad"))),
			OperationOutcome::Failure
		);
	}
}
