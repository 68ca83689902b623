//! Asset rate endpoints of the onboarding API.

// self
use crate::{
	_prelude::*,
	config::{ClientConfig, ONBOARDING},
	context::RequestContext,
	executor::{ApiRequest, RequestExecutor},
	http::HttpTransport,
	services::{ServiceFuture, require},
};

const CREATE_OR_UPDATE: &str = "CreateOrUpdateAssetRate";
const GET_BY_EXTERNAL_ID: &str = "GetAssetRateByExternalID";

/// Conversion rate between two assets of one ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRate {
	/// Server-assigned identifier.
	pub id: String,
	/// Owning organization.
	#[serde(default)]
	pub organization_id: String,
	/// Owning ledger.
	#[serde(default)]
	pub ledger_id: String,
	/// Caller-assigned identifier used for lookups.
	#[serde(default)]
	pub external_id: String,
	/// Source asset code.
	pub from: String,
	/// Target asset code.
	pub to: String,
	/// Conversion rate.
	pub rate: f64,
	/// Decimal scale of `rate`, when the server reports one.
	#[serde(default)]
	pub scale: Option<f64>,
	/// Origin of the quote.
	#[serde(default)]
	pub source: Option<String>,
	/// Validity in seconds.
	#[serde(default)]
	pub ttl: Option<u64>,
	/// Creation time.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update time.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
	/// Free-form metadata.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Payload for [`AssetRatesService::create_or_update_asset_rate`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetRateInput {
	/// Source asset code.
	pub from: String,
	/// Target asset code.
	pub to: String,
	/// Conversion rate.
	pub rate: f64,
	/// Decimal scale of `rate`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scale: Option<f64>,
	/// Origin of the quote.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	/// Validity in seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ttl: Option<u64>,
	/// Caller-assigned identifier used for lookups.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub external_id: Option<String>,
	/// Free-form metadata.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub metadata: BTreeMap<String, serde_json::Value>,
}
impl UpdateAssetRateInput {
	/// Creates an input converting `from` into `to` at `rate`.
	pub fn new(from: impl Into<String>, to: impl Into<String>, rate: f64) -> Self {
		Self { from: from.into(), to: to.into(), rate, ..Default::default() }
	}

	/// Sets the external identifier.
	pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
		self.external_id = Some(external_id.into());

		self
	}

	/// Sets the quote source.
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());

		self
	}

	/// Sets the validity in seconds.
	pub fn with_ttl(mut self, ttl: u64) -> Self {
		self.ttl = Some(ttl);

		self
	}

	/// Rejects structurally invalid input before a request is built.
	pub fn validate(&self, operation: &'static str) -> Result<()> {
		if self.from.trim().is_empty() {
			return Err(Error::validation(operation, "`from` asset code must not be empty"));
		}
		if self.to.trim().is_empty() {
			return Err(Error::validation(operation, "`to` asset code must not be empty"));
		}
		if !self.rate.is_finite() {
			return Err(Error::validation(operation, "`rate` must be a finite number"));
		}
		if self.scale.is_some_and(|scale| !scale.is_finite()) {
			return Err(Error::validation(operation, "`scale` must be a finite number"));
		}

		Ok(())
	}
}

/// Asset rate operations.
pub trait AssetRatesService
where
	Self: Send + Sync,
{
	/// Creates the rate for `input.from → input.to`, or replaces it when one exists.
	fn create_or_update_asset_rate<'a>(
		&'a self,
		ctx: &'a RequestContext,
		organization_id: &'a str,
		ledger_id: &'a str,
		input: &'a UpdateAssetRateInput,
	) -> ServiceFuture<'a, AssetRate>;

	/// Fetches a rate by its external identifier.
	fn get_asset_rate_by_external_id<'a>(
		&'a self,
		ctx: &'a RequestContext,
		organization_id: &'a str,
		ledger_id: &'a str,
		external_id: &'a str,
	) -> ServiceFuture<'a, AssetRate>;
}

/// [`AssetRatesService`] backed by a [`RequestExecutor`].
pub struct AssetRates<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<ClientConfig>,
	executor: Arc<RequestExecutor<T>>,
}
impl<T> AssetRates<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates the service over a shared configuration and executor.
	pub fn new(config: Arc<ClientConfig>, executor: Arc<RequestExecutor<T>>) -> Self {
		Self { config, executor }
	}

	fn url(&self, organization_id: &str, ledger_id: &str, tail: &[&str]) -> Result<Url> {
		let head = ["organizations", organization_id, "ledgers", ledger_id, "asset-rates"];

		Ok(self.config.endpoint(ONBOARDING, head.iter().chain(tail))?)
	}
}
impl<T> AssetRatesService for AssetRates<T>
where
	T: ?Sized + HttpTransport,
{
	fn create_or_update_asset_rate<'a>(
		&'a self,
		ctx: &'a RequestContext,
		organization_id: &'a str,
		ledger_id: &'a str,
		input: &'a UpdateAssetRateInput,
	) -> ServiceFuture<'a, AssetRate> {
		Box::pin(async move {
			require(CREATE_OR_UPDATE, "organizationID", organization_id)?;
			require(CREATE_OR_UPDATE, "ledgerID", ledger_id)?;
			input.validate(CREATE_OR_UPDATE)?;

			let url = self.url(organization_id, ledger_id, &[])?;
			let request = ApiRequest::put(CREATE_OR_UPDATE, url)
				.with_resource("asset rate")
				.with_json(input)?;

			self.executor.send_request(ctx, request).await
		})
	}

	fn get_asset_rate_by_external_id<'a>(
		&'a self,
		ctx: &'a RequestContext,
		organization_id: &'a str,
		ledger_id: &'a str,
		external_id: &'a str,
	) -> ServiceFuture<'a, AssetRate> {
		Box::pin(async move {
			require(GET_BY_EXTERNAL_ID, "organizationID", organization_id)?;
			require(GET_BY_EXTERNAL_ID, "ledgerID", ledger_id)?;
			require(GET_BY_EXTERNAL_ID, "externalID", external_id)?;

			let url = self.url(organization_id, ledger_id, &[external_id])?;
			let request = ApiRequest::get(GET_BY_EXTERNAL_ID, url).with_resource("asset rate");

			self.executor.send_request(ctx, request).await
		})
	}
}
impl<T> Clone for AssetRates<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), executor: self.executor.clone() }
	}
}
impl<T> Debug for AssetRates<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssetRates").finish_non_exhaustive()
	}
}
