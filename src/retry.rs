//! Retry decisions and exponential backoff.
//!
//! [`RetryPolicy`] is pure computation: it never sleeps and never touches the network. The
//! executor asks [`RetryPolicy::should_retry`] after every attempt and sleeps for
//! [`RetryPolicy::retry_delay`] (honoring the caller's context) before issuing a fresh request.

mod config;

pub use config::*;

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, error::TransportError};

/// Outcome of a single attempt as seen by the retry policy.
#[derive(Clone, Copy, Debug)]
pub enum AttemptOutcome<'a> {
	/// The server answered with this status code.
	Response(u16),
	/// The transport failed before a response arrived.
	Transport(&'a TransportError),
}

/// Retry policy derived from an immutable [`RetryConfig`].
#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
	config: RetryConfig,
}
impl RetryPolicy {
	/// Wraps a validated configuration.
	pub fn new(config: RetryConfig) -> Self {
		Self { config }
	}

	/// Returns the underlying configuration.
	pub fn config(&self) -> &RetryConfig {
		&self.config
	}

	/// Decides whether another attempt should follow attempt number `attempt` (zero-based count
	/// of retries already made).
	pub fn should_retry(&self, attempt: u32, outcome: AttemptOutcome<'_>) -> bool {
		if attempt >= self.config.max_retries {
			return false;
		}

		match outcome {
			AttemptOutcome::Response(status) => self.config.is_retryable_status(status),
			AttemptOutcome::Transport(err) => self.config.is_retryable_transport_error(err),
		}
	}

	/// Deterministic backoff cap for retry number `attempt`: `initial_delay * 2^attempt`,
	/// clamped to `max_delay`. Non-decreasing in `attempt`.
	pub fn backoff_delay(&self, attempt: u32) -> StdDuration {
		let initial = self.config.initial_delay;
		let factor = 1_u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);

		initial.checked_mul(factor).unwrap_or(self.config.max_delay).min(self.config.max_delay)
	}

	/// Delay actually slept before retry number `attempt`: full jitter over
	/// [`backoff_delay`](Self::backoff_delay) when enabled.
	pub fn jittered_delay(&self, attempt: u32) -> StdDuration {
		let cap = self.backoff_delay(attempt);

		if !self.config.jitter || cap.is_zero() {
			return cap;
		}

		let nanos = u64::try_from(cap.as_nanos()).unwrap_or(u64::MAX);

		StdDuration::from_nanos(rand::rng().random_range(0..=nanos))
	}

	/// Chooses the wait before retry number `attempt`, preferring a server `Retry-After` hint
	/// (clamped to `max_delay`) over the computed backoff.
	pub fn retry_delay(&self, attempt: u32, retry_after: Option<StdDuration>) -> StdDuration {
		match retry_after {
			Some(hint) => hint.min(self.config.max_delay),
			None => self.jittered_delay(attempt),
		}
	}
}
impl From<RetryConfig> for RetryPolicy {
	fn from(config: RetryConfig) -> Self {
		Self::new(config)
	}
}
