//! Authenticated proxy-request interception.
//!
//! [`ProxyAuthInterceptor`] guarantees that every outbound request carries a currently-valid
//! bearer credential and optional routing tag, without requiring callers to manage tokens.
//! One instance is shared across all concurrent requests of its HTTP client; a single
//! critical section spans the expiry check, the refresh, and the header injection, so
//! concurrent cache misses wait for one in-flight issuance instead of stampeding the token
//! endpoint.

mod metrics;

pub use metrics::TokenMetrics;

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	connector::ConnectorParameters,
	error::ConfigError,
	issuer::TokenIssuer,
	obs::{self, TokenFlowKind, TokenOutcome, TokenSpan},
};

/// Header carrying the bearer credential to the connectivity proxy.
pub const PROXY_AUTHORIZATION: HeaderName = http::header::PROXY_AUTHORIZATION;
/// Header carrying the routing tag that selects a backend location behind the proxy.
pub const SCC_LOCATION_ID: HeaderName =
	HeaderName::from_static("sap-connectivity-scc-location_id");

enum InterceptorState {
	Disabled,
	Enabled {
		parameters: ConnectorParameters,
		location_id: Option<String>,
		issuer: Arc<dyn TokenIssuer>,
		cache: AsyncMutex<Option<AccessToken>>,
	},
}

/// Interceptor injecting refreshed proxy credentials into outbound requests.
///
/// Constructed either disabled (absent connector parameters make every
/// [`intercept`](Self::intercept) a silent no-op) or enabled around one gateway's parameters
/// and a [`TokenIssuer`]. The cached token lives and dies with the instance; it is never
/// persisted externally.
pub struct ProxyAuthInterceptor {
	state: InterceptorState,
	metrics: TokenMetrics,
}
impl ProxyAuthInterceptor {
	/// Creates an interceptor that never mutates requests.
	pub fn disabled() -> Self {
		Self { state: InterceptorState::Disabled, metrics: TokenMetrics::default() }
	}

	/// Creates an interceptor that authenticates requests against the provided gateway.
	pub fn enabled(parameters: ConnectorParameters, issuer: Arc<dyn TokenIssuer>) -> Self {
		Self {
			state: InterceptorState::Enabled {
				parameters,
				location_id: None,
				issuer,
				cache: AsyncMutex::new(None),
			},
			metrics: TokenMetrics::default(),
		}
	}

	/// Maps optional connector parameters onto the enabled/disabled states.
	pub fn from_optional(
		parameters: Option<ConnectorParameters>,
		issuer: Arc<dyn TokenIssuer>,
	) -> Self {
		match parameters {
			Some(parameters) => Self::enabled(parameters, issuer),
			None => Self::disabled(),
		}
	}

	/// Sets the routing tag injected as `SAP-Connectivity-SCC-Location_ID`.
	///
	/// Empty tags are normalized to absent. Has no effect on a disabled interceptor.
	pub fn with_location_id(mut self, location_id: impl Into<String>) -> Self {
		if let InterceptorState::Enabled { location_id: slot, .. } = &mut self.state {
			let tag = location_id.into();

			*slot = (!tag.is_empty()).then_some(tag);
		}

		self
	}

	/// Returns `true` when interception is active.
	pub fn is_enabled(&self) -> bool {
		matches!(self.state, InterceptorState::Enabled { .. })
	}

	/// Returns the acquisition counters for this instance.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Ensures the request carries a currently-valid credential and routing tag.
	///
	/// Must be invoked exactly once per outbound request, before transmission and before any
	/// other header-mutating step that depends on final headers. On a disabled interceptor
	/// the headers are left untouched. On failure no header is added and the request must not
	/// be sent; nothing is cached negatively, so the next call attempts acquisition again.
	pub async fn intercept(&self, headers: &mut HeaderMap) -> Result<()> {
		let InterceptorState::Enabled { parameters, location_id, issuer, cache } = &self.state
		else {
			return Ok(());
		};
		// The critical section spans the expiry check, the refresh, and the header
		// injection; concurrent requests wait here and observe the refreshed token.
		let mut cached = cache.lock().await;
		let now = OffsetDateTime::now_utc();
		let token = match cached.take() {
			Some(token) if token.is_usable_at(now) => token,
			current => {
				let kind = if current.is_some() {
					TokenFlowKind::Renewal
				} else {
					TokenFlowKind::Initial
				};

				self.acquire(kind, parameters, issuer.as_ref()).await?
			},
		};
		let authorization = HeaderValue::from_str(&token.authorization_value());

		// A failed renewal already dropped its expired token; restore the cache before a
		// header-encoding failure can surface.
		*cached = Some(token);

		let authorization =
			authorization.map_err(|source| ConfigError::InvalidHeaderValue { source })?;
		let location = location_id
			.as_deref()
			.map(HeaderValue::from_str)
			.transpose()
			.map_err(|source| ConfigError::InvalidHeaderValue { source })?;

		headers.insert(PROXY_AUTHORIZATION, authorization);

		if let Some(tag) = location {
			headers.insert(SCC_LOCATION_ID, tag);
		}

		Ok(())
	}

	async fn acquire(
		&self,
		kind: TokenFlowKind,
		parameters: &ConnectorParameters,
		issuer: &dyn TokenIssuer,
	) -> Result<AccessToken> {
		self.metrics.record_attempt();
		obs::record_token_outcome(kind, TokenOutcome::Attempt);

		let span = TokenSpan::new(kind, "intercept");

		match span.instrument(issuer.issue_token(parameters)).await {
			Ok(token) => {
				self.metrics.record_success();
				obs::record_token_outcome(kind, TokenOutcome::Success);

				Ok(token)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_token_outcome(kind, TokenOutcome::Failure);

				Err(err.into())
			},
		}
	}
}
impl Debug for ProxyAuthInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.state {
			InterceptorState::Disabled =>
				f.debug_struct("ProxyAuthInterceptor").field("state", &"disabled").finish(),
			InterceptorState::Enabled { parameters, location_id, .. } => f
				.debug_struct("ProxyAuthInterceptor")
				.field("state", &"enabled")
				.field("client_id", &parameters.client_id)
				.field("location_id", location_id)
				.finish(),
		}
	}
}
