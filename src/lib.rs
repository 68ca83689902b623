//! Resilient request transport for ledger REST APIs: retry policy, plugin-auth token manager, and
//! typed error classification behind a single send operation.
//!
//! Every resource wrapper builds an [`executor::ApiRequest`] and hands it to
//! [`executor::RequestExecutor`], which resolves a bearer token through
//! [`auth::TokenManager`], propagates the caller's idempotency key, retries per
//! [`retry::RetryPolicy`], and classifies the final outcome into an [`error::Error`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod http;
pub mod obs;
pub mod retry;
pub mod services;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use client::Client;
pub use context::RequestContext;
pub use error::{Error, ErrorKind, Result};
pub use executor::{ApiRequest, RequestExecutor};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
