//! Client facade wiring configuration, the request executor, and entity services.

// self
use crate::{
	_prelude::*, config::ClientConfig, error::ConfigError, executor::RequestExecutor,
	http::HttpTransport, services::AssetRates,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Entry point for ledger API calls.
///
/// Cloning is cheap; clones share the executor, so they also share the token cache.
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<ClientConfig>,
	executor: Arc<RequestExecutor<T>>,
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds a client over a caller-supplied transport.
	pub fn with_transport(config: ClientConfig, transport: Arc<T>) -> Result<Self, ConfigError> {
		let executor = RequestExecutor::with_transport(transport, &config)?;

		Ok(Self { config: Arc::new(config), executor: Arc::new(executor) })
	}

	/// Returns the configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the shared executor, for resources without a dedicated service.
	pub fn executor(&self) -> &RequestExecutor<T> {
		&self.executor
	}

	/// Asset rate operations.
	pub fn asset_rates(&self) -> AssetRates<T> {
		AssetRates::new(self.config.clone(), self.executor.clone())
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Builds a client over the default reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::with_timeout(config.timeout())?;

		Self::with_transport(config, Arc::new(transport))
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), executor: self.executor.clone() }
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("executor", &self.executor)
			.finish()
	}
}
