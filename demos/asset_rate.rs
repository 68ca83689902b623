//! Demonstrates creating and fetching an asset rate through plugin auth against a mock ledger,
//! with one transient 503 absorbed by the retry policy.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use ledger_http::{
	Client, RequestContext,
	auth::{AccessManagerConfig, TOKEN_ENDPOINT_PATH},
	config::{ClientConfig, ONBOARDING},
	retry::RetryConfig,
	services::{AssetRatesService, UpdateAssetRateInput},
};

const RATE_BODY: &str = r#"{
	"id": "01956b69-9102-75b7-8860-3e75c11d231c",
	"organizationId": "org-demo",
	"ledgerId": "led-demo",
	"externalId": "usd-brl",
	"from": "USD",
	"to": "BRL",
	"rate": 5.25,
	"scale": 2,
	"source": "Central Bank",
	"ttl": 3600
}"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{TOKEN_ENDPOINT_PATH}"));
			then.status(200).header("content-type", "application/json").body(
				r#"{"accessToken":"demo-access","tokenType":"Bearer","expiresIn":900}"#,
			);
		})
		.await;
	let flaky_mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/v1/organizations/org-demo/ledgers/led-demo/asset-rates")
				.header("x-idempotency", "demo-usd-brl");
			then.status(503);
		})
		.await;
	let config = ClientConfig::builder()
		.base_url(ONBOARDING, server.url("/v1"))
		.access_manager(AccessManagerConfig::enabled(
			server.base_url(),
			"demo-client",
			"demo-secret",
		))
		.retry(
			RetryConfig::builder()
				.max_retries(2)
				.initial_delay(Duration::from_millis(50))
				.max_delay(Duration::from_millis(200))
				.build()?,
		)
		.build()?;
	let rates = Client::new(config)?.asset_rates();
	let ctx = RequestContext::new()
		.with_idempotency_key("demo-usd-brl")
		.with_timeout(Duration::from_secs(5));
	let input = UpdateAssetRateInput::new("USD", "BRL", 5.25)
		.with_external_id("usd-brl")
		.with_source("Central Bank")
		.with_ttl(3600);
	let err = rates
		.create_or_update_asset_rate(&ctx, "org-demo", "led-demo", &input)
		.await
		.expect_err("The mock ledger always answers 503 for this route.");

	println!("Gave up after retries: {err} (kind: {}).", err.kind());

	flaky_mock.assert_calls_async(3).await;
	flaky_mock.delete_async().await;

	let put_mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/v1/organizations/org-demo/ledgers/led-demo/asset-rates")
				.header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(RATE_BODY);
		})
		.await;
	let rate = rates.create_or_update_asset_rate(&ctx, "org-demo", "led-demo", &input).await?;

	println!("Stored {} -> {} at {} ({}).", rate.from, rate.to, rate.rate, rate.external_id);

	put_mock.assert_async().await;
	token_mock.assert_calls_async(1).await;

	Ok(())
}
