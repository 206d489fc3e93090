//! Explicit HTTP client assembly for the integration platform.
//!
//! [`HttpClientFactory`] turns [`HttpClientSettings`] into pooled, timeout-bounded reqwest
//! clients. Proxy routing is always an explicit configuration value applied at build time;
//! the factory never installs process-global proxy state. The on-premise path assembles a
//! [`GatewayClient`] that routes through the gateway's connectivity proxy and runs the
//! [`ProxyAuthInterceptor`](crate::interceptor::ProxyAuthInterceptor) before every dispatch.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")]
use crate::{
	connector::ConnectorParameters,
	error::{ConfigError, TransportError},
	interceptor::ProxyAuthInterceptor,
	issuer::{HttpTokenIssuer, TokenIssuer},
};

/// Connection-pooling, timeout, and proxy settings applied to every assembled client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpClientSettings {
	/// TCP connect timeout.
	pub connect_timeout: StdDuration,
	/// Total per-request timeout, from connection checkout through body transfer.
	pub request_timeout: StdDuration,
	/// How long idle pooled connections are kept alive.
	pub pool_idle_timeout: StdDuration,
	/// Maximum idle pooled connections retained per host.
	pub pool_max_idle_per_host: usize,
	/// Explicit forward proxy for general traffic; `None` keeps connections direct.
	pub proxy: Option<Url>,
}
impl HttpClientSettings {
	const DEFAULT_POOL_IDLE_TIMEOUT: StdDuration = StdDuration::from_secs(90);
	const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;
	const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(300);

	/// Overrides the TCP connect timeout.
	pub fn with_connect_timeout(mut self, timeout: StdDuration) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the total per-request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Routes general traffic through an explicit forward proxy.
	pub fn with_proxy(mut self, proxy: Url) -> Self {
		self.proxy = Some(proxy);

		self
	}
}
impl Default for HttpClientSettings {
	fn default() -> Self {
		Self {
			connect_timeout: Self::DEFAULT_TIMEOUT,
			request_timeout: Self::DEFAULT_TIMEOUT,
			pool_idle_timeout: Self::DEFAULT_POOL_IDLE_TIMEOUT,
			pool_max_idle_per_host: Self::DEFAULT_POOL_MAX_IDLE_PER_HOST,
			proxy: None,
		}
	}
}

/// Assembles reqwest clients and gateway clients from one settings profile.
///
/// The factory memoizes one shared base client for general traffic and token requests;
/// on-premise gateway clients are built per gateway because each routes through a different
/// connectivity proxy.
#[cfg(feature = "reqwest")]
#[derive(Debug, Default)]
pub struct HttpClientFactory {
	settings: HttpClientSettings,
	shared: Mutex<Option<ReqwestClient>>,
}
#[cfg(feature = "reqwest")]
impl HttpClientFactory {
	/// Creates a factory for the provided settings profile.
	pub fn new(settings: HttpClientSettings) -> Self {
		Self { settings, shared: Mutex::new(None) }
	}

	/// Returns the settings profile this factory assembles from.
	pub fn settings(&self) -> &HttpClientSettings {
		&self.settings
	}

	fn base_builder(&self) -> reqwest::ClientBuilder {
		ReqwestClient::builder()
			.connect_timeout(self.settings.connect_timeout)
			.timeout(self.settings.request_timeout)
			.pool_idle_timeout(self.settings.pool_idle_timeout)
			.pool_max_idle_per_host(self.settings.pool_max_idle_per_host)
	}

	/// Builds a fresh client honoring the settings profile, including the general proxy.
	pub fn build_client(&self) -> Result<ReqwestClient, ConfigError> {
		let mut builder = self.base_builder();

		if let Some(proxy) = &self.settings.proxy {
			builder = builder
				.proxy(reqwest::Proxy::all(proxy.clone()).map_err(ConfigError::http_client_build)?);
		}

		builder.build().map_err(ConfigError::from)
	}

	/// Returns the memoized shared client, building it on first use.
	pub fn shared_client(&self) -> Result<ReqwestClient, ConfigError> {
		let mut shared = self.shared.lock();

		if let Some(client) = shared.as_ref() {
			return Ok(client.clone());
		}

		let client = self.build_client()?;

		*shared = Some(client.clone());

		Ok(client)
	}

	/// Assembles a gateway client with the default HTTP token issuer.
	///
	/// Token requests go through the shared base client (the token endpoint is reached
	/// directly), while gateway traffic routes through the connectivity proxy. Absent
	/// parameters produce a pass-through gateway whose interceptor is disabled.
	pub fn gateway_client(
		&self,
		parameters: Option<ConnectorParameters>,
		location_id: Option<&str>,
	) -> Result<GatewayClient, ConfigError> {
		let issuer: Arc<dyn TokenIssuer> =
			Arc::new(HttpTokenIssuer::with_client(self.shared_client()?));

		self.gateway_client_with_issuer(parameters, location_id, issuer)
	}

	/// Assembles a gateway client around a caller-provided token issuer.
	pub fn gateway_client_with_issuer(
		&self,
		parameters: Option<ConnectorParameters>,
		location_id: Option<&str>,
		issuer: Arc<dyn TokenIssuer>,
	) -> Result<GatewayClient, ConfigError> {
		let Some(parameters) = parameters else {
			return Ok(GatewayClient::new(
				self.shared_client()?,
				Arc::new(ProxyAuthInterceptor::disabled()),
			));
		};
		// On-premise traffic routes through the gateway's connectivity proxy, overriding
		// any general forward proxy from the settings.
		let proxy = reqwest::Proxy::all(parameters.proxy_url()?)
			.map_err(ConfigError::http_client_build)?;
		let http = self.base_builder().proxy(proxy).build().map_err(ConfigError::from)?;
		let mut interceptor = ProxyAuthInterceptor::enabled(parameters, issuer);

		if let Some(tag) = location_id {
			interceptor = interceptor.with_location_id(tag);
		}

		Ok(GatewayClient::new(http, Arc::new(interceptor)))
	}
}

/// Assembled client + interceptor pair; the request-execution layer for gateway traffic.
///
/// The interceptor instance is shared by every clone of the gateway client, so all
/// concurrent requests funnel through one token cache.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct GatewayClient {
	http: ReqwestClient,
	interceptor: Arc<ProxyAuthInterceptor>,
}
#[cfg(feature = "reqwest")]
impl GatewayClient {
	/// Pairs an assembled client with a shared interceptor.
	pub fn new(http: ReqwestClient, interceptor: Arc<ProxyAuthInterceptor>) -> Self {
		Self { http, interceptor }
	}

	/// Returns the underlying reqwest client.
	pub fn http(&self) -> &ReqwestClient {
		&self.http
	}

	/// Returns the shared interceptor instance.
	pub fn interceptor(&self) -> &Arc<ProxyAuthInterceptor> {
		&self.interceptor
	}

	/// Starts a request builder targeting `url`.
	pub fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
		self.http.request(method, url)
	}

	/// Builds the request, then dispatches it through [`execute`](Self::execute).
	pub async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
		let request = builder.build().map_err(ConfigError::http_request)?;

		self.execute(request).await
	}

	/// Dispatches a request, running the interceptor exactly once before transmission.
	///
	/// When interception fails the request is not sent; the failure surfaces unchanged.
	pub async fn execute(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
		self.interceptor.intercept(request.headers_mut()).await?;

		Ok(self.http.execute(request).await.map_err(TransportError::from)?)
	}
}
