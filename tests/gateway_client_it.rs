// crates.io
use httpmock::prelude::*;
// self
use onprem_connect::{
	_preludet::*,
	client::{GatewayClient, HttpClientFactory, HttpClientSettings},
	interceptor::ProxyAuthInterceptor,
	issuer::HttpTokenIssuer,
	reqwest::Method,
};

fn ping_url(server: &MockServer) -> Url {
	Url::parse(&server.url("/api/ping")).expect("Mock backend URL should parse successfully.")
}

#[tokio::test]
async fn gateway_dispatch_carries_credential_and_location() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body("abc123", 3600));
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/ping")
				.header("proxy-authorization", "Bearer abc123")
				.header("sap-connectivity-scc-location_id", "loc-42");
			then.status(200).body("pong");
		})
		.await;
	let factory = HttpClientFactory::new(HttpClientSettings::default());
	// The mock backend is addressed directly; the interceptor wiring is what is under test.
	let interceptor = ProxyAuthInterceptor::enabled(
		test_connector_parameters(&server.url("/oauth/token")),
		Arc::new(HttpTokenIssuer::default()),
	)
	.with_location_id("loc-42");
	let gateway = GatewayClient::new(
		factory.build_client().expect("Gateway client assembly should succeed."),
		Arc::new(interceptor),
	);
	let response = gateway
		.send(gateway.request(Method::GET, ping_url(&server)))
		.await
		.expect("Authenticated dispatch should succeed.");

	assert_eq!(response.status().as_u16(), 200);

	// A second dispatch reuses the cached token instead of contacting the issuer again.
	gateway
		.send(gateway.request(Method::GET, ping_url(&server)))
		.await
		.expect("Cached dispatch should succeed.");

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(2).await;
	assert_eq!(gateway.interceptor().metrics().attempts(), 1);
}

#[tokio::test]
async fn failed_issuance_aborts_the_dispatch() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500).body("issuer exploded");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ping");
			then.status(200).body("pong");
		})
		.await;
	let factory = HttpClientFactory::new(HttpClientSettings::default());
	let interceptor = ProxyAuthInterceptor::enabled(
		test_connector_parameters(&server.url("/oauth/token")),
		Arc::new(HttpTokenIssuer::default()),
	);
	let gateway = GatewayClient::new(
		factory.build_client().expect("Gateway client assembly should succeed."),
		Arc::new(interceptor),
	);

	gateway
		.send(gateway.request(Method::GET, ping_url(&server)))
		.await
		.expect_err("Dispatch should abort when credential acquisition fails.");

	token_mock.assert_async().await;
	api_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn factory_assembles_a_pass_through_gateway_without_parameters() {
	let server = MockServer::start_async().await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ping");
			then.status(200).body("pong");
		})
		.await;
	let factory = HttpClientFactory::new(HttpClientSettings::default());
	let gateway = factory
		.gateway_client(None, None)
		.expect("Pass-through gateway assembly should succeed.");

	assert!(!gateway.interceptor().is_enabled());

	let response = gateway
		.send(gateway.request(Method::GET, ping_url(&server)))
		.await
		.expect("Pass-through dispatch should succeed.");

	assert_eq!(response.status().as_u16(), 200);

	api_mock.assert_async().await;
}

#[tokio::test]
async fn factory_routes_on_premise_gateways_through_the_connectivity_proxy() {
	let factory = HttpClientFactory::new(HttpClientSettings::default());
	let gateway = factory
		.gateway_client(
			Some(test_connector_parameters("https://auth.example.com/oauth/token")),
			Some("loc-42"),
		)
		.expect("On-premise gateway assembly should succeed.");

	// Routing through `connectivity.local:20003` is applied at build time; here we only
	// assert the interceptor side of the assembly.
	assert!(gateway.interceptor().is_enabled());
}
