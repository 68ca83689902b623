//! Optional observability helpers for the request executor and token manager.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every logical call in a `ledger_http.request` span carrying the
//!   `operation`, `method`, `attempts`, and `status` fields. Debug summaries (opt-in per client or
//!   per call) go to the `ledger_http::debug` target and never include headers or secrets.
//! - Enable `metrics` to increment `ledger_http_attempts_total`, `ledger_http_requests_total`, and
//!   `ledger_http_token_fetch_total`.
//!
//! Everything here is best effort and compiles to no-ops when the features are off.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded per attempt and per logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// 2xx response.
	Success,
	/// Failed attempt that will be retried.
	Retry,
	/// Failure returned to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Success => "success",
			RequestOutcome::Retry => "retry",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels for token endpoint calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenFetchOutcome {
	/// A usable token was cached.
	Success,
	/// The endpoint failed or returned an unusable body.
	Failure,
}
impl TokenFetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenFetchOutcome::Success => "success",
			TokenFetchOutcome::Failure => "failure",
		}
	}
}
impl Display for TokenFetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
