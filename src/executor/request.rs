// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};
// self
use crate::{_prelude::*, auth::TokenSecret, context::IDEMPOTENCY_HEADER, http::HttpRequest};

const APPLICATION_JSON: &str = "application/json";

/// Request payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Body {
	/// No payload.
	#[default]
	Empty,
	/// JSON bytes sent as `application/json`.
	Json(Vec<u8>),
	/// Bytes passed through unmodified with an explicit content type.
	Raw {
		/// Payload bytes.
		bytes: Vec<u8>,
		/// `Content-Type` header value.
		content_type: HeaderValue,
	},
}
impl Body {
	/// Returns the payload length in bytes.
	pub fn len(&self) -> usize {
		match self {
			Self::Empty => 0,
			Self::Json(bytes) | Self::Raw { bytes, .. } => bytes.len(),
		}
	}

	/// Returns `true` when there is no payload.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A pre-built logical request handed to the executor by an entity service.
///
/// The executor turns it into a fresh [`HttpRequest`] for every attempt, adding the bearer
/// token, the caller's idempotency key, and the client's `User-Agent`.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	operation: &'static str,
	resource: Option<String>,
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Body,
}
impl ApiRequest {
	/// Creates a request for `operation` (e.g. `CreateOrUpdateAssetRate`).
	pub fn new(operation: &'static str, method: Method, url: Url) -> Self {
		Self {
			operation,
			resource: None,
			method,
			url,
			headers: HeaderMap::new(),
			body: Body::Empty,
		}
	}

	/// `GET` request.
	pub fn get(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::GET, url)
	}

	/// `POST` request.
	pub fn post(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::POST, url)
	}

	/// `PUT` request.
	pub fn put(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::PUT, url)
	}

	/// `PATCH` request.
	pub fn patch(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::PATCH, url)
	}

	/// `DELETE` request.
	pub fn delete(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::DELETE, url)
	}

	/// `HEAD` request.
	pub fn head(operation: &'static str, url: Url) -> Self {
		Self::new(operation, Method::HEAD, url)
	}

	/// Labels the target resource for `NotFound` errors (defaults to the URL path).
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}

	/// Adds an extra header. Authorization, idempotency, and `User-Agent` are owned by the
	/// executor and overwrite anything set here.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(|e| {
			Error::internal(self.operation, "request body could not be encoded as JSON", e)
		})?;

		self.body = Body::Json(bytes);

		Ok(self)
	}

	/// Sends `bytes` unmodified with the given content type (e.g. `text/plain` for DSL payloads).
	pub fn with_raw(mut self, bytes: impl Into<Vec<u8>>, content_type: &str) -> Result<Self> {
		let content_type = HeaderValue::from_str(content_type).map_err(|_| {
			Error::validation(self.operation, "content type is not a valid header value")
		})?;

		self.body = Body::Raw { bytes: bytes.into(), content_type };

		Ok(self)
	}

	/// Appends query parameters.
	pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		self.url.query_pairs_mut().extend_pairs(pairs);

		self
	}

	/// Operation name attached to errors and telemetry.
	pub fn operation(&self) -> &'static str {
		self.operation
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Payload.
	pub fn body(&self) -> &Body {
		&self.body
	}

	/// Resource label used in `NotFound` errors.
	pub fn resource(&self) -> &str {
		self.resource.as_deref().unwrap_or_else(|| self.url.path())
	}

	/// Builds the wire request for one attempt.
	pub(crate) fn to_http(
		&self,
		token: Option<&TokenSecret>,
		idempotency_key: Option<&str>,
		user_agent: &HeaderValue,
	) -> Result<HttpRequest> {
		let mut headers = self.headers.clone();

		headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

		match &self.body {
			Body::Empty => {},
			Body::Json(_) => {
				headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
			},
			Body::Raw { content_type, .. } => {
				headers.insert(CONTENT_TYPE, content_type.clone());
			},
		}

		if let Some(token) = token {
			let bearer = format!("Bearer {}", token.expose());
			let mut value = HeaderValue::try_from(bearer).map_err(|e| {
				Error::internal(self.operation, "bearer token is not a valid header value", e)
			})?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}
		if let Some(key) = idempotency_key {
			let value = HeaderValue::from_str(key).map_err(|_| {
				Error::validation(self.operation, "idempotency key is not a valid header value")
			})?;

			headers.insert(IDEMPOTENCY_HEADER, value);
		}

		headers.insert(USER_AGENT, user_agent.clone());

		let payload = match &self.body {
			Body::Empty => Vec::new(),
			Body::Json(bytes) | Body::Raw { bytes, .. } => bytes.clone(),
		};
		let mut request = HttpRequest::new(payload);

		*request.method_mut() = self.method.clone();
		*request.uri_mut() = self
			.url
			.as_str()
			.parse()
			.map_err(|e| Error::internal(self.operation, "request URL is not a valid URI", e))?;
		*request.headers_mut() = headers;

		Ok(request)
	}
}
