// crates.io
use ::http::Method;
// self
use crate::{_prelude::*, error::TransportError};

/// Target used for opt-in request/response summaries.
pub const DEBUG_TARGET: &str = "ledger_http::debug";

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// Span covering one logical call, retries included.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a span tagged with the operation name and HTTP method.
	pub fn new(operation: &'static str, method: &Method) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"ledger_http.request",
				operation,
				method = %method,
				attempts = tracing::field::Empty,
				status = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, method);

			Self {}
		}
	}

	/// Records how many attempts have been made so far.
	pub fn record_attempts(&self, attempts: u32) {
		#[cfg(feature = "tracing")]
		self.span.record("attempts", attempts);
		#[cfg(not(feature = "tracing"))]
		let _ = attempts;
	}

	/// Records the last observed HTTP status.
	pub fn record_status(&self, status: u16) {
		#[cfg(feature = "tracing")]
		self.span.record("status", status);
		#[cfg(not(feature = "tracing"))]
		let _ = status;
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs that a failed attempt will be retried after `delay`.
pub fn retry_scheduled(operation: &'static str, attempt: u32, delay: StdDuration, cause: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		operation,
		attempt,
		delay_ms = saturating_millis(delay),
		cause,
		"Retrying request."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, attempt, delay, cause);
}

#[cfg(feature = "tracing")]
fn saturating_millis(delay: StdDuration) -> u64 {
	u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Logs that the retry budget ran out; the last outcome is surfaced to the caller.
pub fn retries_exhausted(operation: &'static str, attempts: u32, cause: &str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation, attempts, cause, retries_exhausted = true, "Retries exhausted.");
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, attempts, cause);
}

/// Emits a request summary: method, URL, attempt, and whether an idempotency key rides along.
pub fn debug_request(
	operation: &'static str,
	method: &Method,
	url: &Url,
	attempt: u32,
	idempotent: bool,
) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		target: DEBUG_TARGET,
		"{operation} attempt {attempt}: {method} {url} (idempotency key: {}).",
		if idempotent { "yes" } else { "no" }
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, method, url, attempt, idempotent);
}

/// Emits a response summary: status, elapsed time, and body length.
pub fn debug_response(
	operation: &'static str,
	attempt: u32,
	status: u16,
	elapsed: StdDuration,
	body_len: usize,
) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		target: DEBUG_TARGET,
		"{operation} attempt {attempt}: HTTP {status} in {elapsed:?}, {body_len} byte(s)."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, attempt, status, elapsed, body_len);
}

/// Emits a transport failure summary.
pub fn debug_transport_failure(
	operation: &'static str,
	attempt: u32,
	elapsed: StdDuration,
	err: &TransportError,
) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		target: DEBUG_TARGET,
		"{operation} attempt {attempt}: {} failure after {elapsed:?}: {err}.",
		err.kind.as_str()
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, attempt, elapsed, err);
}
