//! Bearer token acquisition with caching and single-flight refresh.
//!
//! [`TokenManager::ensure_token`] serves the cached token under a read lock while it is fresh.
//! Once it expires (minus a safety margin), callers serialize on one async refresh guard: the
//! first caller performs the client-credentials request, and everyone who queued behind it
//! observes that refresh's outcome through a generation counter instead of issuing another
//! request. Failed refreshes are shared with the queued callers but never cached for later ones.

mod metrics;

pub use metrics::TokenMetrics;

// crates.io
use ::http::{
	Method,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessManagerConfig, TokenSecret,
		token::{CachedToken, TokenRequest, TokenResponse},
	},
	context::RequestContext,
	error::ConfigError,
	http::{ApiErrorBody, HttpResponse, HttpTransport},
	obs::{self, TokenFetchOutcome},
};

/// Operation name attached to token acquisition errors.
pub const TOKEN_OPERATION: &str = "RequestAccessToken";

/// Produces bearer tokens for outgoing requests.
pub struct TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	access: AccessManagerConfig,
	token_url: Option<Url>,
	static_token: Option<TokenSecret>,
	refresh_margin: Duration,
	state: RwLock<TokenState>,
	refresh_guard: AsyncMutex<()>,
	metrics: Arc<TokenMetrics>,
}
impl<T> TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Default safety margin subtracted from the token expiry.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);

	/// Creates a manager, validating the access-manager configuration before any network access.
	pub fn new(transport: Arc<T>, access: AccessManagerConfig) -> Result<Self, ConfigError> {
		access.validate()?;

		let token_url = if access.enabled { Some(access.token_endpoint()?) } else { None };

		Ok(Self {
			transport,
			access,
			token_url,
			static_token: None,
			refresh_margin: Self::DEFAULT_REFRESH_MARGIN,
			state: Default::default(),
			refresh_guard: AsyncMutex::new(()),
			metrics: Default::default(),
		})
	}

	/// Sets the token returned while plugin auth is disabled. Blank tokens are ignored.
	pub fn with_static_token(mut self, token: Option<TokenSecret>) -> Self {
		self.static_token = token.filter(|token| !token.is_blank());

		self
	}

	/// Overrides the safety margin (defaults to 60 seconds). Negative values clamp to zero.
	///
	/// Each token uses at most half its own lifetime as margin.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Returns `true` when tokens come from the authorization server.
	pub fn is_enabled(&self) -> bool {
		self.access.enabled
	}

	/// Returns the acquisition counters.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Returns a token for the `Authorization` header, refreshing it when needed.
	///
	/// With plugin auth disabled this is the static token (or `None`) and never touches the
	/// network. Otherwise a fresh cached token is returned without a network call, and an
	/// expired one is replaced by exactly one outbound request no matter how many callers race.
	pub async fn ensure_token(&self, ctx: &RequestContext) -> Result<Option<TokenSecret>> {
		if !self.access.enabled {
			return Ok(self.static_token.clone());
		}

		let observed = {
			let state = self.state.read();

			if let Some(token) = state.fresh(OffsetDateTime::now_utc()) {
				self.metrics.record_cache_hit();

				return Ok(Some(token));
			}

			state.generation
		};
		let _singleflight = ctx.run(TOKEN_OPERATION, self.refresh_guard.lock()).await?;

		{
			let state = self.state.read();

			// Someone refreshed while this caller queued; its token is shared even when it is
			// already inside the refresh margin.
			if state.generation != observed {
				if let Some(token) = state.live(OffsetDateTime::now_utc()) {
					self.metrics.record_cache_hit();

					return Ok(Some(token));
				}
				if let Some(failure) = &state.last_failure {
					return Err(failure.to_error());
				}
			}
		}

		self.refresh_locked(ctx).await.map(Some)
	}

	/// Drops the cached token if it is still `rejected`, so the next call fetches a new one.
	///
	/// Returns `true` when the cache was cleared.
	pub fn invalidate(&self, rejected: &TokenSecret) -> bool {
		let mut state = self.state.write();

		if state.cached.as_ref().is_some_and(|cached| cached.access_token == *rejected) {
			state.cached = None;

			return true;
		}

		false
	}

	async fn refresh_locked(&self, ctx: &RequestContext) -> Result<TokenSecret> {
		let Some(token_url) = self.token_url.as_ref() else {
			return Err(ConfigError::MissingAccessManagerField { field: "address" }.into());
		};
		let payload = serde_json::to_vec(&TokenRequest {
			client_id: &self.access.client_id,
			client_secret: self.access.client_secret.expose(),
		})
		.map_err(|e| Error::internal(TOKEN_OPERATION, "token request could not be encoded", e))?;
		let request = ::http::Request::builder()
			.method(Method::POST)
			.uri(token_url.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(payload)
			.map_err(ConfigError::from)?;

		self.metrics.record_fetch();

		let outcome = ctx.run(TOKEN_OPERATION, self.transport.execute(request)).await?;
		let result = match outcome {
			Ok(response) => parse_token_response(response, self.refresh_margin),
			Err(err) => Err(TokenFailure {
				status: None,
				code: None,
				message: format!("token endpoint is unreachable: {err}"),
			}),
		};
		let mut state = self.state.write();

		state.generation = state.generation.wrapping_add(1);

		match result {
			Ok(token) => {
				let access_token = token.access_token.clone();

				#[cfg(feature = "tracing")]
				tracing::debug!(
					token_type = %token.token_type,
					expires_at = %token.expires_at,
					"Access token refreshed."
				);

				state.cached = Some(Arc::new(token));
				state.last_failure = None;
				self.metrics.record_success();
				obs::record_token_fetch(TokenFetchOutcome::Success);

				Ok(access_token)
			},
			Err(failure) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					status = ?failure.status,
					code = ?failure.code,
					"Access token request failed: {}.",
					failure.message
				);

				state.cached = None;
				state.last_failure = Some(failure.clone());
				self.metrics.record_failure();
				obs::record_token_fetch(TokenFetchOutcome::Failure);

				Err(failure.to_error())
			},
		}
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("access", &self.access)
			.field("static_token_set", &self.static_token.is_some())
			.field("refresh_margin", &self.refresh_margin)
			.finish_non_exhaustive()
	}
}

#[derive(Debug, Default)]
struct TokenState {
	cached: Option<Arc<CachedToken>>,
	generation: u64,
	last_failure: Option<TokenFailure>,
}
impl TokenState {
	fn fresh(&self, now: OffsetDateTime) -> Option<TokenSecret> {
		self.cached
			.as_ref()
			.filter(|token| token.is_fresh_at(now))
			.map(|token| token.access_token.clone())
	}

	fn live(&self, now: OffsetDateTime) -> Option<TokenSecret> {
		self.cached
			.as_ref()
			.filter(|token| token.is_live_at(now))
			.map(|token| token.access_token.clone())
	}
}

/// Outcome of a failed refresh, replayed to every caller that waited on it.
#[derive(Clone, Debug)]
struct TokenFailure {
	status: Option<u16>,
	code: Option<String>,
	message: String,
}
impl TokenFailure {
	fn to_error(&self) -> Error {
		Error::Authentication {
			operation: TOKEN_OPERATION,
			status: self.status,
			code: self.code.clone(),
			message: self.message.clone(),
		}
	}
}

fn parse_token_response(
	response: HttpResponse,
	margin: Duration,
) -> Result<CachedToken, TokenFailure> {
	let status = response.status();

	if !status.is_success() {
		let body = ApiErrorBody::parse(response.body()).unwrap_or_default();
		let message = body
			.description()
			.map(str::to_owned)
			.unwrap_or_else(|| format!("token endpoint returned HTTP {}", status.as_u16()));

		return Err(TokenFailure { status: Some(status.as_u16()), code: body.code, message });
	}

	serde_json::from_slice::<TokenResponse>(response.body())
		.map_err(|e| format!("token response is malformed: {e}"))
		.and_then(|wire| wire.into_cached(OffsetDateTime::now_utc(), margin))
		.map_err(|message| TokenFailure { status: Some(status.as_u16()), code: None, message })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ErrorKind, http::HttpRequest, http::TransportFuture};

	struct Unreachable;
	impl HttpTransport for Unreachable {
		fn execute(&self, _request: HttpRequest) -> TransportFuture<'_> {
			panic!("Token manager must not touch the network in this test.");
		}
	}

	#[tokio::test]
	async fn disabled_manager_returns_static_token() {
		let manager = TokenManager::new(Arc::new(Unreachable), AccessManagerConfig::disabled())
			.expect("Disabled config should be accepted.")
			.with_static_token(Some(TokenSecret::new("static")));
		let token = manager
			.ensure_token(&RequestContext::new())
			.await
			.expect("Static token lookup should succeed.");

		assert_eq!(token.as_ref().map(TokenSecret::expose), Some("static"));
		assert_eq!(manager.metrics().fetches(), 0);
	}

	#[tokio::test]
	async fn blank_static_token_is_dropped() {
		let manager = TokenManager::new(Arc::new(Unreachable), AccessManagerConfig::disabled())
			.expect("Disabled config should be accepted.")
			.with_static_token(Some(TokenSecret::new("   ")));

		assert!(
			manager
				.ensure_token(&RequestContext::new())
				.await
				.expect("Lookup should succeed.")
				.is_none()
		);
	}

	#[tokio::test]
	async fn queued_caller_reuses_refreshed_token_inside_margin() {
		let manager = Arc::new(
			TokenManager::new(
				Arc::new(Unreachable),
				AccessManagerConfig::enabled("https://auth.example.com", "client", "secret"),
			)
			.expect("Enabled config should be accepted."),
		);
		let guard = manager.refresh_guard.lock().await;
		let waiter = {
			let manager = manager.clone();

			tokio::spawn(async move { manager.ensure_token(&RequestContext::new()).await })
		};

		tokio::time::sleep(StdDuration::from_millis(50)).await;

		{
			let now = OffsetDateTime::now_utc();
			let mut state = manager.state.write();

			state.generation += 1;
			state.cached = Some(Arc::new(CachedToken {
				access_token: TokenSecret::new("just-refreshed"),
				token_type: "Bearer".into(),
				refresh_token: None,
				expires_at: now + Duration::seconds(30),
				refresh_at: now - Duration::seconds(1),
			}));
		}

		drop(guard);

		let token = waiter
			.await
			.expect("Waiter task should not panic.")
			.expect("Waiter should reuse the refreshed token.");

		assert_eq!(token.as_ref().map(TokenSecret::expose), Some("just-refreshed"));
		assert_eq!(manager.metrics().fetches(), 0);
	}

	#[test]
	fn enabled_manager_rejects_empty_address() {
		let err = TokenManager::new(
			Arc::new(Unreachable),
			AccessManagerConfig::enabled("", "client", "secret"),
		)
		.expect_err("Empty address should fail at construction.");

		assert!(matches!(err, ConfigError::MissingAccessManagerField { field: "address" }));
	}

	#[test]
	fn failure_replays_as_authentication_error() {
		let failure = TokenFailure {
			status: Some(401),
			code: Some("AUT-1004".into()),
			message: "Invalid client".into(),
		};
		let err = failure.to_error();

		assert_eq!(err.kind(), ErrorKind::Authentication);
		assert_eq!(err.status(), Some(401));
		assert_eq!(err.operation(), Some(TOKEN_OPERATION));
	}

	#[test]
	fn error_response_is_parsed_into_failure() {
		let mut response = HttpResponse::new(
			br#"{"code":"AUT-1004","title":"Invalid Client","message":"Client secret mismatch."}"#
				.to_vec(),
		);

		*response.status_mut() = ::http::StatusCode::UNAUTHORIZED;

		let failure = parse_token_response(response, Duration::seconds(60))
			.expect_err("401 should be a failure.");

		assert_eq!(failure.status, Some(401));
		assert_eq!(failure.code.as_deref(), Some("AUT-1004"));
		assert_eq!(failure.message, "Client secret mismatch.");
	}
}
