//! Scripted in-process transport and fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
	time::Duration,
};
// crates.io
use http::{HeaderMap, HeaderValue, Method, StatusCode, header::HeaderName};
use parking_lot::Mutex;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
// self
use ledger_http::{
	auth::{AccessManagerConfig, TOKEN_ENDPOINT_PATH},
	config::{ClientConfig, ONBOARDING, TRANSACTION},
	error::{TransportError, TransportErrorKind},
	http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
	retry::RetryConfig,
};

pub const LEDGER_BASE: &str = "https://ledger.test/v1";
pub const AUTH_BASE: &str = "https://auth.test";
pub const CLIENT_ID: &str = "ledger-client";
pub const CLIENT_SECRET: &str = "ledger-secret";

/// One scripted reaction of the transport.
#[derive(Clone, Debug)]
pub enum Step {
	Respond { status: u16, headers: Vec<(&'static str, String)>, body: String, delay: Duration },
	Fail { kind: TransportErrorKind, delay: Duration },
}
impl Step {
	pub fn status(status: u16) -> Self {
		Self::Respond { status, headers: Vec::new(), body: String::new(), delay: Duration::ZERO }
	}

	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self::Respond {
			status,
			headers: vec![("content-type", "application/json".into())],
			body: body.into(),
			delay: Duration::ZERO,
		}
	}

	pub fn fail(kind: TransportErrorKind) -> Self {
		Self::Fail { kind, delay: Duration::ZERO }
	}

	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		if let Self::Respond { headers, .. } = &mut self {
			headers.push((name, value.into()));
		}

		self
	}

	pub fn delayed(mut self, by: Duration) -> Self {
		match &mut self {
			Self::Respond { delay, .. } | Self::Fail { delay, .. } => *delay = by,
		}

		self
	}
}

/// Outbound request as observed by the transport.
#[derive(Clone, Debug)]
pub struct Captured {
	pub method: Method,
	pub path: String,
	pub headers: HeaderMap,
	pub body: Vec<u8>,
}
impl Captured {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Transport answering from per-path queues. The last step of a queue repeats forever.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
	routes: Mutex<HashMap<String, VecDeque<Step>>>,
	captured: Mutex<Vec<Captured>>,
}
impl ScriptedTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn script(&self, path: &str, steps: impl IntoIterator<Item = Step>) {
		self.routes.lock().entry(path.to_owned()).or_default().extend(steps);
	}

	pub fn captured(&self) -> Vec<Captured> {
		self.captured.lock().clone()
	}

	pub fn calls_to(&self, path: &str) -> Vec<Captured> {
		self.captured.lock().iter().filter(|call| call.path == path).cloned().collect()
	}

	fn next_step(&self, path: &str) -> Option<Step> {
		let mut routes = self.routes.lock();
		let queue = routes.get_mut(path)?;

		if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let (parts, body) = request.into_parts();
		let path = parts.uri.path().to_owned();

		self.captured.lock().push(Captured {
			method: parts.method,
			path: path.clone(),
			headers: parts.headers,
			body,
		});

		let step = self.next_step(&path);

		Box::pin(async move {
			match step {
				Some(Step::Respond { status, headers, body, delay }) => {
					tokio::time::sleep(delay).await;

					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					for (name, value) in headers {
						response.headers_mut().insert(
							HeaderName::from_static(name),
							HeaderValue::from_str(&value)
								.expect("Scripted header should be valid."),
						);
					}

					Ok(response)
				},
				Some(Step::Fail { kind, delay }) => {
					tokio::time::sleep(delay).await;

					Err(TransportError::new(kind, std::io::Error::other("scripted failure")))
				},
				None => {
					let body = format!("unscripted path {path}").into_bytes();
					let mut response = HttpResponse::new(body);

					*response.status_mut() = StatusCode::NOT_IMPLEMENTED;

					Ok(response)
				},
			}
		})
	}
}

/// Path of the token endpoint on the scripted authorization server.
pub fn token_path() -> String {
	format!("/{TOKEN_ENDPOINT_PATH}")
}

/// Retry settings with millisecond delays and no jitter.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
	RetryConfig::builder()
		.max_retries(max_retries)
		.initial_delay(Duration::from_millis(1))
		.max_delay(Duration::from_millis(10))
		.jitter(false)
		.build()
		.expect("Fast retry config should build.")
}

pub fn config(retry: RetryConfig) -> ClientConfig {
	ClientConfig::builder()
		.base_url(ONBOARDING, LEDGER_BASE)
		.base_url(TRANSACTION, LEDGER_BASE)
		.retry(retry)
		.build()
		.expect("Test config should build.")
}

pub fn plugin_auth_config(retry: RetryConfig) -> ClientConfig {
	ClientConfig::builder()
		.base_url(ONBOARDING, LEDGER_BASE)
		.retry(retry)
		.access_manager(AccessManagerConfig::enabled(AUTH_BASE, CLIENT_ID, CLIENT_SECRET))
		.build()
		.expect("Plugin auth config should build.")
}

/// Successful token endpoint body with an absolute expiry `ttl` from now.
pub fn token_body(token: &str, ttl: time::Duration) -> String {
	let expires_at = (OffsetDateTime::now_utc() + ttl)
		.format(&Rfc3339)
		.expect("Expiry should format as RFC 3339.");

	serde_json::json!({
		"accessToken": token,
		"tokenType": "Bearer",
		"refreshToken": format!("{token}-refresh"),
		"expiresAt": expires_at,
	})
	.to_string()
}
