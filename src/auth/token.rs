//! Cached bearer token and the authorization server's wire shapes.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token held by the token manager; only the access token string leaves the crate.
#[derive(Clone)]
pub(crate) struct CachedToken {
	pub(crate) access_token: TokenSecret,
	pub(crate) token_type: String,
	pub(crate) refresh_token: Option<TokenSecret>,
	pub(crate) expires_at: OffsetDateTime,
	/// `expires_at` minus the refresh margin, clamped to half the lifetime seen at fetch time.
	pub(crate) refresh_at: OffsetDateTime,
}
impl CachedToken {
	/// Served from the cache without a refresh while `now < refresh_at`.
	pub(crate) fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now < self.refresh_at
	}

	/// Still accepted by the server, ignoring the refresh margin.
	pub(crate) fn is_live_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("refresh_at", &self.refresh_at)
			.finish()
	}
}

/// Client-credentials payload.
#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
	pub(crate) client_id: &'a str,
	pub(crate) client_secret: &'a str,
}

/// Successful token endpoint response; accepts camelCase and snake_case spellings.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	#[serde(rename = "accessToken", alias = "access_token", default)]
	access_token: String,
	#[serde(rename = "tokenType", alias = "token_type", default)]
	token_type: Option<String>,
	#[serde(rename = "refreshToken", alias = "refresh_token", default)]
	refresh_token: Option<String>,
	#[serde(rename = "expiresAt", alias = "expires_at", default)]
	expires_at: Option<String>,
	#[serde(rename = "expiresIn", alias = "expires_in", default)]
	expires_in: Option<i64>,
}
impl TokenResponse {
	/// Converts the wire response into a cached token, resolving relative expiry against `now`.
	///
	/// The refresh margin never exceeds half the token's lifetime, so short-lived tokens are
	/// still served from the cache for a while.
	pub(crate) fn into_cached(
		self,
		now: OffsetDateTime,
		margin: Duration,
	) -> Result<CachedToken, String> {
		if self.access_token.trim().is_empty() {
			return Err("token response is missing an access token".into());
		}

		let expires_at = match (self.expires_at.as_deref(), self.expires_in) {
			(Some(raw), _) if !raw.trim().is_empty() =>
				OffsetDateTime::parse(raw.trim(), &Rfc3339)
					.map_err(|e| format!("token response has an invalid expiry `{raw}`: {e}"))?,
			(_, Some(secs)) if secs > 0 => now + Duration::seconds(secs),
			_ => return Err("token response is missing an expiry".into()),
		};
		let lifetime = expires_at - now;
		let margin =
			if lifetime.is_positive() { margin.min(lifetime / 2_i32) } else { Duration::ZERO };

		Ok(CachedToken {
			access_token: TokenSecret::new(self.access_token),
			token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
			refresh_token: self
				.refresh_token
				.filter(|value| !value.is_empty())
				.map(TokenSecret::new),
			expires_at,
			refresh_at: expires_at - margin,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const MARGIN: Duration = Duration::seconds(60);

	fn parse(body: &str) -> TokenResponse {
		serde_json::from_str(body).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn camel_case_response_parses_absolute_expiry() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse(
			r#"{
				"accessToken": "abc",
				"tokenType": "Bearer",
				"refreshToken": "r",
				"expiresAt": "2025-01-01T01:00:00Z"
			}"#,
		)
		.into_cached(now, MARGIN)
		.expect("Camel-case response should convert.");

		assert_eq!(token.access_token.expose(), "abc");
		assert_eq!(token.token_type, "Bearer");
		assert_eq!(token.refresh_token.as_ref().map(TokenSecret::expose), Some("r"));
		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(token.refresh_at, macros::datetime!(2025-01-01 00:59 UTC));
	}

	#[test]
	fn snake_case_response_falls_back_to_relative_expiry() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse(r#"{"access_token":"abc","token_type":"bearer","expires_in":600}"#)
			.into_cached(now, MARGIN)
			.expect("Snake-case response should convert.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:10 UTC));
		assert!(token.refresh_token.is_none());
	}

	#[test]
	fn missing_fields_are_rejected() {
		let now = OffsetDateTime::now_utc();

		assert!(parse(r#"{"expiresIn":60}"#).into_cached(now, MARGIN).is_err());
		assert!(parse(r#"{"accessToken":"abc"}"#).into_cached(now, MARGIN).is_err());
		assert!(
			parse(r#"{"accessToken":"abc","expiresAt":"tomorrow"}"#)
				.into_cached(now, MARGIN)
				.is_err()
		);
	}

	#[test]
	fn freshness_honors_margin() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse(r#"{"accessToken":"abc","expiresIn":180}"#)
			.into_cached(now, MARGIN)
			.expect("Relative expiry should convert.");

		assert!(token.is_fresh_at(now + Duration::seconds(119)));
		assert!(!token.is_fresh_at(now + Duration::seconds(120)));
		assert!(token.is_live_at(now + Duration::seconds(179)));
		assert!(!token.is_live_at(now + Duration::seconds(180)));
	}

	#[test]
	fn short_lived_token_clamps_margin_to_half_its_lifetime() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse(r#"{"accessToken":"abc","expiresIn":30}"#)
			.into_cached(now, MARGIN)
			.expect("Short-lived token should convert.");

		assert_eq!(token.refresh_at, now + Duration::seconds(15));
		assert!(token.is_fresh_at(now + Duration::seconds(14)));
		assert!(!token.is_fresh_at(now + Duration::seconds(15)));
	}

	#[test]
	fn expired_token_is_neither_fresh_nor_live() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse(r#"{"accessToken":"abc","expiresAt":"2024-12-31T23:59:00Z"}"#)
			.into_cached(now, MARGIN)
			.expect("Past expiry should still convert.");

		assert_eq!(token.refresh_at, token.expires_at);
		assert!(!token.is_fresh_at(now));
		assert!(!token.is_live_at(now));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let token = CachedToken {
			access_token: TokenSecret::new("very-secret"),
			token_type: "Bearer".into(),
			refresh_token: Some(TokenSecret::new("also-secret")),
			expires_at: OffsetDateTime::now_utc(),
			refresh_at: OffsetDateTime::now_utc(),
		};
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("very-secret"));
		assert!(!rendered.contains("also-secret"));
	}
}
