//! Access-manager (plugin auth) configuration.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Path of the client-credentials endpoint, relative to the access-manager address.
pub const TOKEN_ENDPOINT_PATH: &str = "v1/login/oauth/access_token";

/// Settings for obtaining bearer tokens from an external authorization server.
///
/// When `enabled` is false the executor falls back to the statically configured token (if any)
/// and never contacts the authorization server.
#[derive(Clone, Debug, Default)]
pub struct AccessManagerConfig {
	/// Whether plugin auth is active.
	pub enabled: bool,
	/// Base URL of the authorization server.
	pub address: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
}
impl AccessManagerConfig {
	/// Plugin auth turned off.
	pub fn disabled() -> Self {
		Self::default()
	}

	/// Plugin auth turned on against `address` with the given client credentials.
	pub fn enabled(
		address: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
	) -> Self {
		Self {
			enabled: true,
			address: address.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Rejects an enabled configuration with any empty field.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.enabled {
			return Ok(());
		}
		if self.address.trim().is_empty() {
			return Err(ConfigError::MissingAccessManagerField { field: "address" });
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingAccessManagerField { field: "client_id" });
		}
		if self.client_secret.is_blank() {
			return Err(ConfigError::MissingAccessManagerField { field: "client_secret" });
		}

		Ok(())
	}

	/// Resolves `{address}/v1/login/oauth/access_token`.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		let base = self.address.trim().trim_end_matches('/');

		Url::parse(&format!("{base}/{TOKEN_ENDPOINT_PATH}"))
			.map_err(|source| ConfigError::InvalidAddress { address: self.address.clone(), source })
	}
}
