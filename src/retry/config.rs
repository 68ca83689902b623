//! Immutable retry configuration and its builder.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError, TransportErrorKind},
};

/// Predicate deciding whether a transport-level failure is worth another attempt.
pub type RetryablePredicate = Arc<dyn Fn(&TransportError) -> bool + Send + Sync>;

/// Retry settings shared by every call made through one executor.
#[derive(Clone)]
pub struct RetryConfig {
	/// Retries allowed after the first attempt; `0` disables retry.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub initial_delay: StdDuration,
	/// Upper bound on any single delay.
	pub max_delay: StdDuration,
	/// HTTP status codes that trigger a retry.
	pub retryable_status_codes: BTreeSet<u16>,
	/// Whether sleeps are drawn uniformly from `[0, backoff]`.
	pub jitter: bool,
	retryable: RetryablePredicate,
}
impl RetryConfig {
	/// Default retry budget.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Default first backoff.
	pub const DEFAULT_INITIAL_DELAY: StdDuration = StdDuration::from_millis(100);
	/// Default backoff ceiling.
	pub const DEFAULT_MAX_DELAY: StdDuration = StdDuration::from_secs(10);
	/// Default retryable status codes.
	pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> RetryConfigBuilder {
		RetryConfigBuilder::default()
	}

	/// Configuration that performs exactly one attempt.
	pub fn disabled() -> Self {
		Self { max_retries: 0, ..Self::default() }
	}

	/// Evaluates the configured transport-error predicate.
	pub fn is_retryable_transport_error(&self, err: &TransportError) -> bool {
		(self.retryable)(err)
	}

	/// Returns `true` when `status` is configured as retryable.
	pub fn is_retryable_status(&self, status: u16) -> bool {
		self.retryable_status_codes.contains(&status)
	}
}
impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: Self::DEFAULT_MAX_RETRIES,
			initial_delay: Self::DEFAULT_INITIAL_DELAY,
			max_delay: Self::DEFAULT_MAX_DELAY,
			retryable_status_codes: Self::DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
			jitter: true,
			retryable: Arc::new(default_retryable),
		}
	}
}
impl Debug for RetryConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetryConfig")
			.field("max_retries", &self.max_retries)
			.field("initial_delay", &self.initial_delay)
			.field("max_delay", &self.max_delay)
			.field("retryable_status_codes", &self.retryable_status_codes)
			.field("jitter", &self.jitter)
			.finish_non_exhaustive()
	}
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
	config: RetryConfig,
}
impl RetryConfigBuilder {
	/// Sets the retry budget.
	pub fn max_retries(mut self, retries: u32) -> Self {
		self.config.max_retries = retries;

		self
	}

	/// Sets the first backoff delay.
	pub fn initial_delay(mut self, delay: StdDuration) -> Self {
		self.config.initial_delay = delay;

		self
	}

	/// Sets the backoff ceiling.
	pub fn max_delay(mut self, delay: StdDuration) -> Self {
		self.config.max_delay = delay;

		self
	}

	/// Replaces the retryable status codes.
	pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
		self.config.retryable_status_codes = codes.into_iter().collect();

		self
	}

	/// Enables or disables full jitter.
	pub fn jitter(mut self, enabled: bool) -> Self {
		self.config.jitter = enabled;

		self
	}

	/// Replaces the transport-error predicate.
	pub fn retryable_predicate<F>(mut self, predicate: F) -> Self
	where
		F: 'static + Fn(&TransportError) -> bool + Send + Sync,
	{
		self.config.retryable = Arc::new(predicate);

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<RetryConfig, ConfigError> {
		let config = self.config;

		if config.initial_delay.is_zero() {
			return Err(ConfigError::InvalidRetry { reason: "initial delay must be positive" });
		}
		if config.max_delay < config.initial_delay {
			return Err(ConfigError::InvalidRetry {
				reason: "max delay must not be shorter than the initial delay",
			});
		}

		Ok(config)
	}
}

fn default_retryable(err: &TransportError) -> bool {
	matches!(
		err.kind,
		TransportErrorKind::Connect
			| TransportErrorKind::Timeout
			| TransportErrorKind::Request
			| TransportErrorKind::Body
	)
}
