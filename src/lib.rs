//! Rust’s turnkey on-premise connectivity layer—assemble pooled, proxy-routed HTTP clients that
//! transparently carry refreshed OAuth proxy credentials in one crate built for integration
//! platforms.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod connector;
pub mod error;
pub mod interceptor;
pub mod issuer;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		connector::ConnectorParameters, interceptor::ProxyAuthInterceptor, issuer::TokenIssuer,
	};

	/// Builds connector parameters pointing at a mock token endpoint.
	///
	/// The proxy host/port are placeholders; tests that exercise the gateway never route
	/// through them.
	pub fn test_connector_parameters(token_url: &str) -> ConnectorParameters {
		ConnectorParameters::new(
			Url::parse(token_url).expect("Failed to parse mock token endpoint URL."),
			"test-client",
			"test-secret",
			"connectivity.local",
			20003,
		)
	}

	/// JSON body for mock token endpoints issuing bearer tokens.
	pub fn token_response_body(access_token: &str, expires_in: i64) -> String {
		format!(
			"{{\"access_token\":\"{access_token}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in}}}"
		)
	}

	/// Builds an enabled interceptor around the provided issuer and mock token endpoint.
	pub fn test_interceptor(token_url: &str, issuer: Arc<dyn TokenIssuer>) -> ProxyAuthInterceptor {
		ProxyAuthInterceptor::enabled(test_connector_parameters(token_url), issuer)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::{HeaderMap, HeaderName, HeaderValue};
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
#[cfg(test)] use onprem_connect as _;
