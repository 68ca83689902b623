// crates.io
use ::http::StatusCode;
// self
use crate::{_prelude::*, http::ApiErrorBody};

const RAW_BODY_LIMIT: usize = 256;

/// Maps a final non-2xx response onto the error taxonomy.
///
/// 400/409/412/422 are validation failures, 401/403 authentication failures, and 404 a missing
/// resource. Everything else (5xx, 429 after retries, unexpected codes) is internal and keeps the
/// status.
pub(crate) fn classify_response(
	operation: &'static str,
	resource: &str,
	status: StatusCode,
	body: &[u8],
) -> Error {
	let parsed = ApiErrorBody::parse(body).unwrap_or_default();
	let message = describe(&parsed, status, body);
	let code = parsed.code;
	let status = status.as_u16();

	match status {
		400 | 409 | 412 | 422 =>
			Error::Validation { operation, status: Some(status), code, message },
		401 | 403 => Error::Authentication { operation, status: Some(status), code, message },
		404 => Error::NotFound {
			operation,
			resource: parsed.entity_type.unwrap_or_else(|| resource.to_owned()),
			code,
			message,
		},
		_ => Error::Internal { operation, status: Some(status), message, source: None },
	}
}

/// Decodes a 2xx body, naming the failing JSON path on error.
pub(crate) fn decode_json<D>(operation: &'static str, status: StatusCode, body: &[u8]) -> Result<D>
where
	D: DeserializeOwned,
{
	if body.iter().all(u8::is_ascii_whitespace) {
		return Err(Error::Internal {
			operation,
			status: Some(status.as_u16()),
			message: "response body is empty".into(),
			source: None,
		});
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
		let path = e.path().to_string();

		Error::Internal {
			operation,
			status: Some(status.as_u16()),
			message: format!("response body could not be decoded at `{path}`"),
			source: Some(Box::new(e.into_inner())),
		}
	})
}

fn describe(parsed: &ApiErrorBody, status: StatusCode, body: &[u8]) -> String {
	if let Some(description) = parsed.description() {
		return description.trim().to_owned();
	}

	let raw = String::from_utf8_lossy(body);
	let raw = raw.trim();

	if !raw.is_empty() {
		return truncate(raw, RAW_BODY_LIMIT);
	}

	status
		.canonical_reason()
		.map(str::to_owned)
		.unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn truncate(text: &str, limit: usize) -> String {
	match text.char_indices().nth(limit) {
		Some((idx, _)) => format!("{}...", &text[..idx]),
		None => text.to_owned(),
	}
}
