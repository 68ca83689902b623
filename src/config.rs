//! Client configuration: named base URLs, static token, retry and access-manager settings.

// crates.io
use ::http::HeaderValue;
// self
use crate::{
	_prelude::*,
	auth::{AccessManagerConfig, TokenSecret},
	error::ConfigError,
	retry::RetryConfig,
};

/// Service name of the onboarding API (organizations, ledgers, assets, asset rates).
pub const ONBOARDING: &str = "onboarding";
/// Service name of the transaction API.
pub const TRANSACTION: &str = "transaction";
/// Environment variable enabling debug summaries.
pub const DEBUG_ENV: &str = "LEDGER_DEBUG";
/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("ledger-http/", env!("CARGO_PKG_VERSION"));

/// Immutable configuration shared by the executor and every service.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	base_urls: BTreeMap<String, Url>,
	auth_token: Option<TokenSecret>,
	retry: RetryConfig,
	access_manager: AccessManagerConfig,
	debug: bool,
	user_agent: HeaderValue,
	timeout: Option<StdDuration>,
}
impl ClientConfig {
	/// Returns a builder seeded with defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Returns the base URL registered under `name`.
	pub fn base_url(&self, name: &str) -> Result<&Url, ConfigError> {
		self.base_urls.get(name).ok_or_else(|| ConfigError::UnknownService { name: name.into() })
	}

	/// Joins percent-encoded path segments onto the base URL registered under `name`.
	pub fn endpoint<I, S>(&self, name: &str, segments: I) -> Result<Url, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let base = self.base_url(name)?;
		let mut url = base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeABase { url: base.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	/// Statically configured bearer token, used while plugin auth is disabled.
	pub fn auth_token(&self) -> Option<&TokenSecret> {
		self.auth_token.as_ref()
	}

	/// Retry settings.
	pub fn retry(&self) -> &RetryConfig {
		&self.retry
	}

	/// Plugin auth settings.
	pub fn access_manager(&self) -> &AccessManagerConfig {
		&self.access_manager
	}

	/// Whether debug summaries are emitted for every call.
	pub fn debug(&self) -> bool {
		self.debug
	}

	/// `User-Agent` header sent on every request.
	pub fn user_agent(&self) -> &HeaderValue {
		&self.user_agent
	}

	/// Per-attempt timeout applied by the default transport.
	pub fn timeout(&self) -> Option<StdDuration> {
		self.timeout
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	base_urls: Vec<(String, String)>,
	auth_token: Option<TokenSecret>,
	retry: RetryConfig,
	access_manager: AccessManagerConfig,
	debug: bool,
	user_agent: Option<String>,
	timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Registers a base URL under a service name (see [`ONBOARDING`] and [`TRANSACTION`]).
	pub fn base_url(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
		self.base_urls.push((name.into(), url.into()));

		self
	}

	/// Sets the static bearer token. Blank tokens are ignored.
	pub fn auth_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.auth_token = Some(token.into()).filter(|token| !token.is_blank());

		self
	}

	/// Overrides the retry settings.
	pub fn retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;

		self
	}

	/// Sets the plugin auth settings.
	pub fn access_manager(mut self, access_manager: AccessManagerConfig) -> Self {
		self.access_manager = access_manager;

		self
	}

	/// Enables or disables debug summaries.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Reads the debug flag from [`DEBUG_ENV`] once.
	pub fn debug_from_env(self) -> Self {
		let debug = std::env::var(DEBUG_ENV).map(|raw| parse_bool_flag(&raw)).unwrap_or(false);

		self.debug(debug)
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Sets a per-attempt timeout on the default transport.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates every URL and header value.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_urls = BTreeMap::new();

		for (name, raw) in self.base_urls {
			let url = Url::parse(raw.trim())
				.map_err(|source| ConfigError::InvalidAddress { address: raw.clone(), source })?;

			if url.cannot_be_a_base() {
				return Err(ConfigError::CannotBeABase { url: raw });
			}

			base_urls.insert(name, url);
		}

		self.access_manager.validate()?;

		let user_agent = HeaderValue::try_from(
			self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
		)
		.map_err(::http::Error::from)?;

		Ok(ClientConfig {
			base_urls,
			auth_token: self.auth_token,
			retry: self.retry,
			access_manager: self.access_manager,
			debug: self.debug,
			user_agent,
			timeout: self.timeout,
		})
	}
}

/// Interprets `true`/`1`/`yes`/`on` (case-insensitive) as enabled; anything else is disabled.
pub fn parse_bool_flag(raw: &str) -> bool {
	matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ClientConfig {
		ClientConfig::builder()
			.base_url(ONBOARDING, "https://onboarding.example.com/v1/")
			.base_url(TRANSACTION, "https://transaction.example.com/v1")
			.build()
			.expect("Fixture config should build.")
	}

	#[test]
	fn endpoint_encodes_segments() {
		let url = config()
			.endpoint(ONBOARDING, ["organizations", "org 1", "ledgers", "led/2"])
			.expect("Endpoint should resolve.");

		assert_eq!(
			url.as_str(),
			"https://onboarding.example.com/v1/organizations/org%201/ledgers/led%2F2"
		);
	}

	#[test]
	fn unknown_service_is_reported() {
		let err = config().base_url("crm").expect_err("Unregistered service should fail.");

		assert!(matches!(err, ConfigError::UnknownService { name } if name == "crm"));
	}

	#[test]
	fn build_rejects_bad_inputs() {
		assert!(matches!(
			ClientConfig::builder().base_url(ONBOARDING, "not a url").build(),
			Err(ConfigError::InvalidAddress { .. })
		));
		assert!(matches!(
			ClientConfig::builder().base_url(ONBOARDING, "mailto:ops@example.com").build(),
			Err(ConfigError::CannotBeABase { .. })
		));
		assert!(matches!(
			ClientConfig::builder()
				.access_manager(AccessManagerConfig::enabled("https://auth.example.com", "", "s"))
				.build(),
			Err(ConfigError::MissingAccessManagerField { field: "client_id" })
		));
		assert!(matches!(
			ClientConfig::builder().user_agent("bad\nagent").build(),
			Err(ConfigError::HttpRequest(_))
		));
	}

	#[test]
	fn defaults_are_applied() {
		let config =
			ClientConfig::builder().auth_token("  ").build().expect("Defaults should build.");

		assert!(config.auth_token().is_none());
		assert!(!config.debug());
		assert_eq!(config.retry().max_retries, RetryConfig::DEFAULT_MAX_RETRIES);
		assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
	}

	#[test]
	fn bool_flags_parse_leniently() {
		for raw in ["true", "TRUE", " 1 ", "yes", "On"] {
			assert!(parse_bool_flag(raw), "{raw:?} should enable debug.");
		}
		for raw in ["false", "0", "", "enabled"] {
			assert!(!parse_bool_flag(raw), "{raw:?} should not enable debug.");
		}
	}
}
