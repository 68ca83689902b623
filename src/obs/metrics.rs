// self
use crate::obs::{RequestOutcome, TokenFetchOutcome};

/// Records one attempt of a logical call.
pub fn record_attempt(operation: &'static str, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"ledger_http_attempts_total",
			"operation" => operation,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Records the final outcome of a logical call.
pub fn record_request(operation: &'static str, outcome: RequestOutcome, retries_exhausted: bool) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"ledger_http_requests_total",
			"operation" => operation,
			"outcome" => outcome.as_str(),
			"retries_exhausted" => if retries_exhausted { "true" } else { "false" }
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome, retries_exhausted);
	}
}

/// Records one call to the token endpoint.
pub fn record_token_fetch(outcome: TokenFetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("ledger_http_token_fetch_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
