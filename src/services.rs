//! Entity services layered on the request executor.

pub mod asset_rates;

pub use asset_rates::*;

// self
use crate::_prelude::*;

/// Boxed future returned by entity service methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Short-circuits with [`Error::MissingParameter`] when `value` is empty, before any request is
/// built.
pub fn require(operation: &'static str, parameter: &'static str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		Err(Error::missing_parameter(operation, parameter))
	} else {
		Ok(())
	}
}
