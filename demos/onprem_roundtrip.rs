//! Demonstrates assembling a gateway client whose dispatches transparently mint, inject, and
//! reuse a proxy credential against a mock connectivity gateway.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use onprem_connect::{
	client::{GatewayClient, HttpClientFactory, HttpClientSettings},
	connector::ConnectorParameters,
	interceptor::ProxyAuthInterceptor,
	issuer::HttpTokenIssuer,
	reqwest::Method,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let backend_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/erp/materials")
				.header("proxy-authorization", "Bearer demo-access")
				.header("sap-connectivity-scc-location_id", "loc-demo");
			then.status(200).body("[\"MAT-0001\",\"MAT-0002\"]");
		})
		.await;
	let parameters = ConnectorParameters::new(
		Url::parse(&server.url("/oauth/token"))?,
		"demo-client",
		"demo-secret",
		"connectivity.local",
		20003,
	);
	let factory = HttpClientFactory::new(HttpClientSettings::default());
	let interceptor =
		ProxyAuthInterceptor::enabled(parameters, Arc::new(HttpTokenIssuer::default()))
			.with_location_id("loc-demo");
	let gateway = GatewayClient::new(factory.build_client()?, Arc::new(interceptor));
	let materials = gateway
		.send(gateway.request(Method::GET, Url::parse(&server.url("/erp/materials"))?))
		.await?
		.text()
		.await?;

	println!("On-premise backend answered: {materials}.");

	gateway
		.send(gateway.request(Method::GET, Url::parse(&server.url("/erp/materials"))?))
		.await?;

	println!("Second dispatch reused the cached credential.");

	token_mock.assert_calls_async(1).await;
	backend_mock.assert_calls_async(2).await;

	Ok(())
}
