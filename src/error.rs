//! Classified error types shared by the transport, token manager, and entity services.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used where the underlying cause is transport- or codec-specific.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by every public operation.
///
/// Each variant carries the failing operation name (e.g. `CreateOrUpdateAssetRate`) so callers
/// can diagnose failures without inspecting HTTP status codes themselves.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected before any network access.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A required identifier or input was empty.
	#[error("{operation}: missing required parameter `{parameter}`.")]
	MissingParameter {
		/// Failing operation.
		operation: &'static str,
		/// Name of the empty parameter.
		parameter: &'static str,
	},
	/// Input was structurally invalid, either locally or according to the server.
	#[error("{operation}: validation failed: {message}.")]
	Validation {
		/// Failing operation.
		operation: &'static str,
		/// HTTP status code, when the server rejected the input.
		status: Option<u16>,
		/// Server-provided error code, when available.
		code: Option<String>,
		/// Local or server-provided description.
		message: String,
	},
	/// The server responded with 404.
	#[error("{operation}: {resource} not found: {message}.")]
	NotFound {
		/// Failing operation.
		operation: &'static str,
		/// Resource label attached to the request.
		resource: String,
		/// Server-provided error code, when available.
		code: Option<String>,
		/// Server-provided description.
		message: String,
	},
	/// Token acquisition failed or the server responded with 401/403.
	#[error("{operation}: authentication failed: {message}.")]
	Authentication {
		/// Failing operation.
		operation: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Server-provided error code (e.g. `AUT-1004`), when available.
		code: Option<String>,
		/// Server-provided description.
		message: String,
	},
	/// Transport-level failure (DNS, connection reset, timeout).
	#[error("{operation}: network failure.")]
	Network {
		/// Failing operation.
		operation: &'static str,
		/// Normalized transport failure.
		#[source]
		source: TransportError,
	},
	/// Unexpected local failure or unclassified server response.
	#[error("{operation}: internal failure: {message}.")]
	Internal {
		/// Failing operation.
		operation: &'static str,
		/// HTTP status code, when the failure came from a response.
		status: Option<u16>,
		/// Human-readable description.
		message: String,
		/// Underlying codec or runtime failure.
		#[source]
		source: Option<BoxError>,
	},
	/// The caller's context was cancelled or its deadline elapsed.
	#[error("{operation}: {reason}.")]
	Cancelled {
		/// Failing operation.
		operation: &'static str,
		/// Why the call stopped waiting.
		reason: CancelReason,
	},
}
impl Error {
	/// Builds a [`Error::MissingParameter`].
	pub fn missing_parameter(operation: &'static str, parameter: &'static str) -> Self {
		Self::MissingParameter { operation, parameter }
	}

	/// Builds a local [`Error::Validation`] without an HTTP status.
	pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
		Self::Validation { operation, status: None, code: None, message: message.into() }
	}

	/// Builds an [`Error::Internal`] wrapping a local failure.
	pub fn internal(
		operation: &'static str,
		message: impl Into<String>,
		source: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Internal {
			operation,
			status: None,
			message: message.into(),
			source: Some(Box::new(source)),
		}
	}

	/// Re-tags the error with the operation that surfaced it. Configuration errors are unchanged.
	pub fn with_operation(mut self, new_operation: &'static str) -> Self {
		match &mut self {
			Self::Config(_) => {},
			Self::MissingParameter { operation, .. }
			| Self::Validation { operation, .. }
			| Self::NotFound { operation, .. }
			| Self::Authentication { operation, .. }
			| Self::Network { operation, .. }
			| Self::Internal { operation, .. }
			| Self::Cancelled { operation, .. } => *operation = new_operation,
		}

		self
	}

	/// Returns the flat classification tag.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Config,
			Self::MissingParameter { .. } => ErrorKind::MissingParameter,
			Self::Validation { .. } => ErrorKind::Validation,
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::Authentication { .. } => ErrorKind::Authentication,
			Self::Network { .. } => ErrorKind::Network,
			Self::Internal { .. } => ErrorKind::Internal,
			Self::Cancelled { .. } => ErrorKind::Cancelled,
		}
	}

	/// Returns the failing operation name; configuration errors have none.
	pub fn operation(&self) -> Option<&'static str> {
		match self {
			Self::Config(_) => None,
			Self::MissingParameter { operation, .. }
			| Self::Validation { operation, .. }
			| Self::NotFound { operation, .. }
			| Self::Authentication { operation, .. }
			| Self::Network { operation, .. }
			| Self::Internal { operation, .. }
			| Self::Cancelled { operation, .. } => Some(*operation),
		}
	}

	/// Returns the HTTP status code observed for this failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Validation { status, .. }
			| Self::Authentication { status, .. }
			| Self::Internal { status, .. } => *status,
			Self::NotFound { .. } => Some(404),
			_ => None,
		}
	}

	/// Returns the server-provided or local message, if the variant carries one.
	pub fn message(&self) -> Option<&str> {
		match self {
			Self::Validation { message, .. }
			| Self::NotFound { message, .. }
			| Self::Authentication { message, .. }
			| Self::Internal { message, .. } => Some(message.as_str()),
			_ => None,
		}
	}
}

/// Flat tag over [`Error`] variants for matching and metric labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::Config`].
	Config,
	/// See [`Error::MissingParameter`].
	MissingParameter,
	/// See [`Error::Validation`].
	Validation,
	/// See [`Error::NotFound`].
	NotFound,
	/// See [`Error::Authentication`].
	Authentication,
	/// See [`Error::Network`].
	Network,
	/// See [`Error::Internal`].
	Internal,
	/// See [`Error::Cancelled`].
	Cancelled,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Config => "config",
			Self::MissingParameter => "missing_parameter",
			Self::Validation => "validation",
			Self::NotFound => "not_found",
			Self::Authentication => "authentication",
			Self::Network => "network",
			Self::Internal => "internal",
			Self::Cancelled => "cancelled",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why a call stopped waiting before it produced an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
	/// The context's cancellation token fired.
	Cancelled,
	/// The context's overall deadline elapsed.
	DeadlineExceeded,
}
impl Display for CancelReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Cancelled => f.write_str("request was cancelled"),
			Self::DeadlineExceeded => f.write_str("request deadline exceeded"),
		}
	}
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Plugin auth is enabled but a required field is empty.
	#[error("Access manager is enabled but `{field}` is empty.")]
	MissingAccessManagerField {
		/// Name of the empty field.
		field: &'static str,
	},
	/// A configured address cannot be parsed or joined.
	#[error("Address `{address}` is invalid.")]
	InvalidAddress {
		/// Offending address.
		address: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A base URL cannot carry path segments.
	#[error("Base URL `{url}` cannot be used as a path base.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// No base URL is registered under the requested service name.
	#[error("No base URL is configured for service `{name}`.")]
	UnknownService {
		/// Requested service name.
		name: String,
	},
	/// Retry configuration violates its invariants.
	#[error("Retry configuration is invalid: {reason}.")]
	InvalidRetry {
		/// Violated invariant.
		reason: &'static str,
	},
	/// A header name or value cannot be encoded.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Coarse classification of transport failures consulted by the retry predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
	/// Connection could not be established (DNS, refused, reset during connect).
	Connect,
	/// The transport gave up waiting.
	Timeout,
	/// The request failed while being sent.
	Request,
	/// The response body failed while being read.
	Body,
	/// The request could not be built by the transport.
	Builder,
	/// Anything the transport could not classify.
	Other,
}
impl TransportErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Connect => "connect",
			Self::Timeout => "timeout",
			Self::Request => "request",
			Self::Body => "body",
			Self::Builder => "builder",
			Self::Other => "other",
		}
	}
}
impl Display for TransportErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-level failure normalized across HTTP stacks.
#[derive(Debug, ThisError)]
#[error("Transport {kind} failure: {source}.")]
pub struct TransportError {
	/// Classification used by retry predicates.
	pub kind: TransportErrorKind,
	/// Transport-specific failure.
	#[source]
	pub source: BoxError,
}
impl TransportError {
	/// Wraps a transport-specific failure under the given classification.
	pub fn new(
		kind: TransportErrorKind,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self { kind, source: Box::new(src) }
	}

	/// Wraps a connection failure.
	pub fn connect(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::new(TransportErrorKind::Connect, src)
	}

	/// Wraps a timeout.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::new(TransportErrorKind::Timeout, src)
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		let kind = match e.kind() {
			std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
			std::io::ErrorKind::ConnectionRefused
			| std::io::ErrorKind::ConnectionReset
			| std::io::ErrorKind::ConnectionAborted
			| std::io::ErrorKind::NotConnected => TransportErrorKind::Connect,
			_ => TransportErrorKind::Other,
		};

		Self::new(kind, e)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let kind = if e.is_builder() {
			TransportErrorKind::Builder
		} else if e.is_timeout() {
			TransportErrorKind::Timeout
		} else if e.is_connect() {
			TransportErrorKind::Connect
		} else if e.is_body() || e.is_decode() {
			TransportErrorKind::Body
		} else if e.is_request() {
			TransportErrorKind::Request
		} else {
			TransportErrorKind::Other
		};

		Self::new(kind, e)
	}
}
