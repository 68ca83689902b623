mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use ledger_http::{
	Client, Error, ErrorKind, RequestContext,
	auth::{AccessManagerConfig, TOKEN_ENDPOINT_PATH},
	config::{ClientConfig, ONBOARDING},
	services::{AssetRatesService, UpdateAssetRateInput},
};

const RATES_PATH: &str = "/v1/organizations/org-1/ledgers/led-1/asset-rates";
const RATE_BODY: &str = r#"{
	"id": "01956b69-9102-75b7-8860-3e75c11d231c",
	"organizationId": "org-1",
	"ledgerId": "led-1",
	"externalId": "usd-brl",
	"from": "USD",
	"to": "BRL",
	"rate": 5.25,
	"scale": 2,
	"source": "Central Bank",
	"ttl": 3600,
	"createdAt": "2025-01-01T00:00:00Z",
	"updatedAt": "2025-01-01T00:00:00Z"
}"#;

fn scripted_client(transport: &Arc<ScriptedTransport>) -> Client<ScriptedTransport> {
	Client::with_transport(config(fast_retry(3)), transport.clone())
		.expect("Client should build over the scripted transport.")
}

fn input() -> UpdateAssetRateInput {
	UpdateAssetRateInput::new("USD", "BRL", 5.25)
		.with_external_id("usd-brl")
		.with_source("Central Bank")
		.with_ttl(3600)
}

#[tokio::test]
async fn empty_organization_id_short_circuits() {
	let transport = ScriptedTransport::new();
	let err = scripted_client(&transport)
		.asset_rates()
		.create_or_update_asset_rate(&RequestContext::new(), "", "led-1", &input())
		.await
		.expect_err("Empty organization ID should be rejected.");

	assert_eq!(err.kind(), ErrorKind::MissingParameter);
	assert!(err.to_string().contains("organizationID"));
	assert!(transport.captured().is_empty());
}

#[tokio::test]
async fn empty_identifiers_are_named_in_errors() {
	let transport = ScriptedTransport::new();
	let rates = scripted_client(&transport).asset_rates();
	let ctx = RequestContext::new();
	let cases = [("org-1", "", "usd-brl", "ledgerID"), ("org-1", "led-1", " ", "externalID")];

	for (organization_id, ledger_id, external_id, parameter) in cases {
		let err = rates
			.get_asset_rate_by_external_id(&ctx, organization_id, ledger_id, external_id)
			.await
			.expect_err("Empty identifiers should be rejected.");

		assert!(matches!(err, Error::MissingParameter { parameter: p, .. } if p == parameter));
	}

	assert!(transport.captured().is_empty());
}

#[tokio::test]
async fn invalid_input_is_rejected_locally() {
	let transport = ScriptedTransport::new();
	let err = scripted_client(&transport)
		.asset_rates()
		.create_or_update_asset_rate(
			&RequestContext::new(),
			"org-1",
			"led-1",
			&UpdateAssetRateInput::new("USD", "", 5.25),
		)
		.await
		.expect_err("Empty target asset should be rejected.");

	assert_eq!(err.kind(), ErrorKind::Validation);
	assert!(transport.captured().is_empty());
}

#[tokio::test]
async fn server_error_then_success_makes_two_attempts() {
	let transport = ScriptedTransport::new();

	transport.script(RATES_PATH, [Step::status(500), Step::json(200, RATE_BODY)]);

	let rate = scripted_client(&transport)
		.asset_rates()
		.create_or_update_asset_rate(
			&RequestContext::new().with_idempotency_key("rate-usd-brl-1"),
			"org-1",
			"led-1",
			&input(),
		)
		.await
		.expect("Retry should recover from the 500.");
	let calls = transport.calls_to(RATES_PATH);

	assert_eq!(rate.rate, 5.25);
	assert_eq!(rate.external_id, "usd-brl");
	assert_eq!(calls.len(), 2);

	for call in calls {
		assert_eq!(call.method, http::Method::PUT);
		assert_eq!(call.header("x-idempotency"), Some("rate-usd-brl-1"));
		assert_eq!(call.header("content-type"), Some("application/json"));

		let body: serde_json::Value =
			serde_json::from_slice(&call.body).expect("Request body should be JSON.");

		assert_eq!(body["from"], "USD");
		assert_eq!(body["externalId"], "usd-brl");
	}
}

#[tokio::test]
async fn reqwest_round_trip_with_static_token() {
	let server = MockServer::start_async().await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path(RATES_PATH)
				.header("authorization", "Bearer static-token")
				.header("content-type", "application/json")
				.json_body(serde_json::json!({
					"from": "USD",
					"to": "BRL",
					"rate": 5.25,
					"source": "Central Bank",
					"ttl": 3600,
					"externalId": "usd-brl",
				}));
			then.status(200).header("content-type", "application/json").body(RATE_BODY);
		})
		.await;
	let get = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{RATES_PATH}/usd-brl"));
			then.status(200).header("content-type", "application/json").body(RATE_BODY);
		})
		.await;
	let config = ClientConfig::builder()
		.base_url(ONBOARDING, server.url("/v1"))
		.auth_token("static-token")
		.build()
		.expect("Config should build.");
	let client = Client::new(config).expect("Reqwest client should build.");
	let ctx = RequestContext::new();
	let created = client
		.asset_rates()
		.create_or_update_asset_rate(&ctx, "org-1", "led-1", &input())
		.await
		.expect("PUT should succeed.");
	let fetched = client
		.asset_rates()
		.get_asset_rate_by_external_id(&ctx, "org-1", "led-1", "usd-brl")
		.await
		.expect("GET should succeed.");

	assert_eq!(created, fetched);

	put.assert_async().await;
	get.assert_async().await;
}

#[tokio::test]
async fn reqwest_not_found_is_classified() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{RATES_PATH}/missing"));
			then.status(404).json_body(serde_json::json!({
				"code": "0036",
				"title": "Entity Not Found",
				"message": "No asset rate was found for the given external ID.",
			}));
		})
		.await;
	let config = ClientConfig::builder()
		.base_url(ONBOARDING, server.url("/v1"))
		.build()
		.expect("Config should build.");
	let err = Client::new(config)
		.expect("Reqwest client should build.")
		.asset_rates()
		.get_asset_rate_by_external_id(&RequestContext::new(), "org-1", "led-1", "missing")
		.await
		.expect_err("Missing rate should fail.");

	assert!(matches!(
		&err,
		Error::NotFound { operation: "GetAssetRateByExternalID", code: Some(code), message, .. }
			if code == "0036" && message == "No asset rate was found for the given external ID."
	));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn reqwest_plugin_auth_attaches_fetched_token() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{TOKEN_ENDPOINT_PATH}"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("plugin-token", time::Duration::hours(1)));
		})
		.await;
	let get = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("{RATES_PATH}/usd-brl"))
				.header("authorization", "Bearer plugin-token");
			then.status(200).header("content-type", "application/json").body(RATE_BODY);
		})
		.await;
	let config = ClientConfig::builder()
		.base_url(ONBOARDING, server.url("/v1"))
		.access_manager(AccessManagerConfig::enabled(server.base_url(), CLIENT_ID, CLIENT_SECRET))
		.build()
		.expect("Plugin auth config should build.");
	let rates = Client::new(config).expect("Reqwest client should build.").asset_rates();
	let ctx = RequestContext::new();

	for _ in 0..3 {
		rates
			.get_asset_rate_by_external_id(&ctx, "org-1", "led-1", "usd-brl")
			.await
			.expect("Authenticated GET should succeed.");
	}

	token.assert_calls_async(1).await;
	get.assert_calls_async(3).await;
}
