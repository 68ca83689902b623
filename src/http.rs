//! Transport primitives shared by the request executor and the token manager.
//!
//! The module exposes [`HttpTransport`] so downstream crates (and tests) can plug in their own
//! HTTP stack. Implementations receive a fully built [`HttpRequest`] per attempt (retries always
//! produce a fresh request) and return either the complete [`HttpResponse`] or a
//! [`TransportError`] whose [`kind`](TransportError::kind) drives the retry predicate.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::{HeaderMap, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Outbound request handed to a transport.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Fully buffered response returned by a transport.
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single request attempt.
///
/// The trait is the crate's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by the executor and the token manager
/// behind an [`Arc`], and the returned futures must be `Send` so callers can move in-flight
/// requests across executor threads.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes one attempt and buffers the whole response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with an optional per-attempt timeout.
	pub fn with_timeout(timeout: Option<StdDuration>) -> Result<Self, crate::error::ConfigError> {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Error body returned by the ledger API and the authorization server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiErrorBody {
	/// Machine-readable error code (e.g. `0007`, `AUT-1004`).
	#[serde(default)]
	pub code: Option<String>,
	/// Short error title.
	#[serde(default)]
	pub title: Option<String>,
	/// Human-readable description.
	#[serde(default)]
	pub message: Option<String>,
	/// Entity the error refers to, when the server reports one.
	#[serde(default, rename = "entityType", alias = "entity_type")]
	pub entity_type: Option<String>,
}
impl ApiErrorBody {
	/// Parses an error body, returning `None` when it is not the expected JSON shape.
	pub fn parse(body: &[u8]) -> Option<Self> {
		serde_json::from_slice(body).ok()
	}

	/// Returns the most descriptive non-empty text: `message`, then `title`.
	pub fn description(&self) -> Option<&str> {
		self.message
			.as_deref()
			.filter(|value| !value.trim().is_empty())
			.or_else(|| self.title.as_deref().filter(|value| !value.trim().is_empty()))
	}
}

/// Parses a `Retry-After` header expressed as delta-seconds or an RFC 2822 date.
pub fn retry_after(headers: &HeaderMap) -> Option<StdDuration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(StdDuration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return StdDuration::try_from(delta).ok();
		}
	}

	None
}
