//! The single choke point every outbound ledger call passes through.
//!
//! [`RequestExecutor`] resolves the bearer token, attaches the caller's idempotency key, runs
//! the attempt loop under the caller's [`RequestContext`], and classifies the final outcome.
//! Retries of one call are strictly sequential and each one sends a freshly built request.

mod classify;
mod request;

pub use request::*;

// std
use std::time::Instant;
// crates.io
use ::http::{HeaderMap, HeaderValue, StatusCode};
// self
use crate::{
	_prelude::*,
	auth::TokenManager,
	config::ClientConfig,
	context::RequestContext,
	error::ConfigError,
	http::{self, HttpResponse, HttpTransport},
	obs::{self, RequestOutcome, RequestSpan},
	retry::{AttemptOutcome, RetryPolicy},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Executor backed by the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestExecutor = RequestExecutor<ReqwestTransport>;

/// Undecoded 2xx response returned by [`RequestExecutor::send_raw_request`].
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Returns the body as text, replacing invalid UTF-8 sequences.
	pub fn text(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}
impl From<HttpResponse> for RawResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status.as_u16(), headers: parts.headers, body }
	}
}

/// Composes the retry policy and token manager over a pluggable [`HttpTransport`].
pub struct RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	tokens: Arc<TokenManager<T>>,
	retry: RetryPolicy,
	user_agent: HeaderValue,
	debug: bool,
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an executor over a caller-supplied transport.
	///
	/// Fails before any network access when plugin auth is enabled with incomplete settings.
	pub fn with_transport(transport: Arc<T>, config: &ClientConfig) -> Result<Self, ConfigError> {
		let tokens = TokenManager::new(transport.clone(), config.access_manager().clone())?
			.with_static_token(config.auth_token().cloned());

		Ok(Self {
			transport,
			tokens: Arc::new(tokens),
			retry: RetryPolicy::new(config.retry().clone()),
			user_agent: config.user_agent().clone(),
			debug: config.debug(),
		})
	}

	/// Returns the token manager.
	pub fn tokens(&self) -> &TokenManager<T> {
		&self.tokens
	}

	/// Returns the retry policy.
	pub fn retry_policy(&self) -> &RetryPolicy {
		&self.retry
	}

	/// Sends `request` and decodes the 2xx body into `D`.
	///
	/// An empty or malformed 2xx body is an [`Error::Internal`].
	pub async fn send_request<D>(&self, ctx: &RequestContext, request: ApiRequest) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let response = self.dispatch(ctx, &request).await?;

		classify::decode_json(request.operation(), response.status(), response.body())
	}

	/// Sends `request` and discards any 2xx body (e.g. `DELETE` answered with 204).
	pub async fn send_request_no_content(
		&self,
		ctx: &RequestContext,
		request: ApiRequest,
	) -> Result<()> {
		self.dispatch(ctx, &request).await.map(|_| ())
	}

	/// Sends `request` and returns the 2xx response without decoding it.
	pub async fn send_raw_request(
		&self,
		ctx: &RequestContext,
		request: ApiRequest,
	) -> Result<RawResponse> {
		self.dispatch(ctx, &request).await.map(RawResponse::from)
	}

	async fn dispatch(&self, ctx: &RequestContext, request: &ApiRequest) -> Result<HttpResponse> {
		let operation = request.operation();
		let span = RequestSpan::new(operation, request.method());
		let mut tally = Tally::default();
		let result = span.instrument(self.attempt_loop(ctx, request, &span, &mut tally)).await;
		let outcome =
			if result.is_ok() { RequestOutcome::Success } else { RequestOutcome::Failure };

		obs::record_request(operation, outcome, tally.exhausted);

		result
	}

	async fn attempt_loop(
		&self,
		ctx: &RequestContext,
		request: &ApiRequest,
		span: &RequestSpan,
		tally: &mut Tally,
	) -> Result<HttpResponse> {
		let operation = request.operation();
		let debug = self.debug || ctx.debug();
		let mut reauthenticated = false;

		loop {
			let token =
				self.tokens.ensure_token(ctx).await.map_err(|e| e.with_operation(operation))?;
			let attempt = request.to_http(token.as_ref(), ctx.idempotency_key(), &self.user_agent)?;

			tally.attempts += 1;
			span.record_attempts(tally.attempts);

			if debug {
				obs::debug_request(
					operation,
					request.method(),
					request.url(),
					tally.attempts,
					ctx.idempotency_key().is_some(),
				);
			}

			let started = Instant::now();
			let outcome = ctx.run(operation, self.transport.execute(attempt)).await?;
			let elapsed = started.elapsed();
			let (retry_after, cause) = match outcome {
				Ok(response) => {
					let status = response.status();

					span.record_status(status.as_u16());

					if debug {
						obs::debug_response(
							operation,
							tally.attempts,
							status.as_u16(),
							elapsed,
							response.body().len(),
						);
					}
					if status.is_success() {
						obs::record_attempt(operation, RequestOutcome::Success);

						return Ok(response);
					}

					let reissue = status == StatusCode::UNAUTHORIZED
						&& !reauthenticated
						&& self.tokens.is_enabled();

					if let (true, Some(token)) = (reissue, token.as_ref()) {
						// One reissue with a fresh token; it does not consume the retry budget.
						reauthenticated = true;
						self.tokens.invalidate(token);
						obs::record_attempt(operation, RequestOutcome::Retry);
						obs::retry_scheduled(
							operation,
							tally.attempts,
							StdDuration::ZERO,
							"HTTP 401, refreshing token",
						);

						continue;
					}

					let verdict = AttemptOutcome::Response(status.as_u16());

					if !self.retry.should_retry(tally.retries, verdict) {
						self.give_up(operation, tally, verdict, &status.to_string());

						return Err(classify::classify_response(
							operation,
							request.resource(),
							status,
							response.body(),
						));
					}

					(http::retry_after(response.headers()), status.to_string())
				},
				Err(err) => {
					if debug {
						obs::debug_transport_failure(operation, tally.attempts, elapsed, &err);
					}

					let verdict = AttemptOutcome::Transport(&err);

					if !self.retry.should_retry(tally.retries, verdict) {
						self.give_up(operation, tally, verdict, err.kind.as_str());

						return Err(Error::Network { operation, source: err });
					}

					(None, err.kind.as_str().to_owned())
				},
			};
			let delay = self.retry.retry_delay(tally.retries, retry_after);

			tally.retries += 1;
			obs::record_attempt(operation, RequestOutcome::Retry);
			obs::retry_scheduled(operation, tally.attempts, delay, &cause);
			ctx.sleep(operation, delay).await?;
		}
	}

	fn give_up(
		&self,
		operation: &'static str,
		tally: &mut Tally,
		verdict: AttemptOutcome<'_>,
		cause: &str,
	) {
		// A retryable outcome that reached the budget is surfaced verbatim, tagged as exhausted.
		tally.exhausted = tally.retries > 0 && self.retry.should_retry(0, verdict);

		obs::record_attempt(operation, RequestOutcome::Failure);

		if tally.exhausted {
			obs::retries_exhausted(operation, tally.attempts, cause);
		}
	}
}
#[cfg(feature = "reqwest")]
impl RequestExecutor<ReqwestTransport> {
	/// Creates an executor over the default reqwest transport.
	pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::with_timeout(config.timeout())?;

		Self::with_transport(Arc::new(transport), config)
	}
}
impl<T> Debug for RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("tokens", &self.tokens)
			.field("retry", &self.retry)
			.field("user_agent", &self.user_agent)
			.field("debug", &self.debug)
			.finish_non_exhaustive()
	}
}

#[derive(Debug, Default)]
struct Tally {
	attempts: u32,
	retries: u32,
	exhausted: bool,
}
