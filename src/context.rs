//! Per-call request context: cancellation, overall deadline, idempotency key, and debug flag.
//!
//! A [`RequestContext`] bounds the whole logical call, not a single attempt. Every wait the
//! transport performs (network I/O, backoff sleeps, waiting on an in-flight token refresh) goes
//! through [`RequestContext::run`] so cancellation or an elapsed deadline returns promptly with
//! [`Error::Cancelled`].

// crates.io
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, error::CancelReason};

/// Header carrying the caller's idempotency key (`X-Idempotency`; header names are
/// case-insensitive and normalized to lowercase).
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency";

/// Caller-supplied context threaded through a single logical operation.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
	cancellation: CancellationToken,
	deadline: Option<Instant>,
	idempotency_key: Option<String>,
	debug: bool,
}
impl RequestContext {
	/// Creates a context with no deadline, no idempotency key, and a fresh cancellation token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Ties the context to an existing cancellation token (e.g. a child of a shutdown token).
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;

		self
	}

	/// Bounds the entire call, retries included, to `timeout` from now.
	pub fn with_timeout(self, timeout: StdDuration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	/// Bounds the entire call, retries included, to an absolute deadline.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(existing) => existing.min(deadline),
			None => deadline,
		});

		self
	}

	/// Attaches an opaque idempotency key, sent verbatim on every attempt of the call.
	pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
		self.idempotency_key = Some(key.into());

		self
	}

	/// Mints a random UUID v4 idempotency key for this call.
	pub fn with_generated_idempotency_key(self) -> Self {
		self.with_idempotency_key(uuid::Uuid::new_v4().to_string())
	}

	/// Enables or disables debug summaries for this call.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Returns the idempotency key, if any.
	pub fn idempotency_key(&self) -> Option<&str> {
		self.idempotency_key.as_deref().filter(|key| !key.is_empty())
	}

	/// Returns `true` when debug summaries were requested for this call.
	pub fn debug(&self) -> bool {
		self.debug
	}

	/// Returns the overall deadline, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Returns the cancellation token observed by this context.
	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancellation
	}

	/// Cancels the context; in-flight waits return [`Error::Cancelled`].
	pub fn cancel(&self) {
		self.cancellation.cancel();
	}

	/// Fails fast when the context is already cancelled or past its deadline.
	pub fn check(&self, operation: &'static str) -> Result<()> {
		if self.cancellation.is_cancelled() {
			return Err(Error::Cancelled { operation, reason: CancelReason::Cancelled });
		}
		if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
			return Err(Error::Cancelled { operation, reason: CancelReason::DeadlineExceeded });
		}

		Ok(())
	}

	/// Drives `fut` to completion unless the context is cancelled or its deadline elapses first.
	pub async fn run<F>(&self, operation: &'static str, fut: F) -> Result<F::Output>
	where
		F: Future,
	{
		self.check(operation)?;

		let deadline = async {
			match self.deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = self.cancellation.cancelled() =>
				Err(Error::Cancelled { operation, reason: CancelReason::Cancelled }),
			_ = deadline =>
				Err(Error::Cancelled { operation, reason: CancelReason::DeadlineExceeded }),
			output = fut => Ok(output),
		}
	}

	/// Sleeps for `delay` unless the context ends first.
	pub async fn sleep(&self, operation: &'static str, delay: StdDuration) -> Result<()> {
		self.run(operation, tokio::time::sleep(delay)).await
	}
}
