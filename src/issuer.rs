//! Token-issuing capability consumed by the interceptor.
//!
//! The module exposes [`TokenIssuer`] alongside [`IssueMetadata`] and [`IssueMetadataSlot`] so
//! downstream crates can integrate custom token transports without losing status/Retry-After
//! diagnostics. Implementations call [`IssueMetadataSlot::take`] before dispatching a request
//! and [`IssueMetadataSlot::store`] once an HTTP status or retry hint is known, so rejection
//! errors carry consistent metadata.

// crates.io
#[cfg(feature = "reqwest")] use http::header::{AUTHORIZATION, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::AccessToken, connector::ConnectorParameters, error::IssueError};

/// Boxed future returned by [`TokenIssuer::issue_token`].
pub type IssueFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, IssueError>> + 'a + Send>>;

/// Contract for capabilities that mint connectivity-proxy access tokens.
///
/// The trait is the interceptor's only dependency on a token transport. It is object-safe so
/// fakes and bespoke transports plug in behind `Arc<dyn TokenIssuer>`; the returned future
/// must be `Send` so intercepted requests can hop executors while a refresh is in flight.
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Requests a fresh access token for the provided gateway.
	fn issue_token<'a>(&'a self, parameters: &'a ConnectorParameters) -> IssueFuture<'a>;
}

/// Captures metadata from the most recent token-endpoint response.
#[derive(Clone, Debug, Default)]
pub struct IssueMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot sharing [`IssueMetadata`] between transport and diagnostics layers.
///
/// Issuers take the slot's content before dispatching a request so stale information never
/// leaks across attempts, then store the captured status once the endpoint responds.
#[derive(Clone, Debug, Default)]
pub struct IssueMetadataSlot(Arc<Mutex<Option<IssueMetadata>>>);
impl IssueMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: IssueMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<IssueMetadata> {
		self.0.lock().take()
	}

	/// Returns a copy of the captured metadata without consuming it.
	pub fn snapshot(&self) -> Option<IssueMetadata> {
		self.0.lock().clone()
	}
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	token_type: String,
	expires_in: Option<i64>,
}

/// Parses a token-endpoint JSON body into an [`AccessToken`].
///
/// `expires_in` is optional; when present it must be positive and is converted to an
/// absolute expiry measured from `issued_at`.
pub fn parse_token_response(
	bytes: &[u8],
	issued_at: OffsetDateTime,
) -> Result<AccessToken, IssueError> {
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);
	let raw: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| IssueError::MalformedResponse { source })?;

	if raw.access_token.is_empty() {
		return Err(IssueError::MissingAccessToken);
	}

	let mut token = AccessToken::new(raw.token_type, raw.access_token);

	if let Some(secs) = raw.expires_in {
		if secs <= 0 {
			return Err(IssueError::NonPositiveExpiresIn);
		}

		let expires_at = issued_at
			.checked_add(Duration::seconds(secs))
			.ok_or(IssueError::ExpiresInOutOfRange)?;

		token = token.expires_at(expires_at);
	}

	Ok(token)
}

/// Thin wrapper around [`ReqwestClient`] performing the `client_credentials` exchange against
/// a gateway's token endpoint.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI; configure any
/// custom [`ReqwestClient`] accordingly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct HttpTokenIssuer {
	client: ReqwestClient,
	slot: IssueMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl HttpTokenIssuer {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, slot: IssueMetadataSlot::default() }
	}

	/// Returns the status/Retry-After captured from the most recent token-endpoint response.
	pub fn last_response(&self) -> Option<IssueMetadata> {
		self.slot.snapshot()
	}
}
#[cfg(feature = "reqwest")]
impl TokenIssuer for HttpTokenIssuer {
	fn issue_token<'a>(&'a self, parameters: &'a ConnectorParameters) -> IssueFuture<'a> {
		Box::pin(async move {
			self.slot.take();

			let response = self
				.client
				.post(parameters.token_url.clone())
				.header(AUTHORIZATION, parameters.basic_authorization())
				.form(&[("grant_type", "client_credentials")])
				.send()
				.await
				.map_err(IssueError::transport)?;
			let status = response.status();
			let retry_after = parse_retry_after(response.headers());

			self.slot.store(IssueMetadata { status: Some(status.as_u16()), retry_after });

			let bytes = response.bytes().await.map_err(IssueError::transport)?;

			if !status.is_success() {
				return Err(IssueError::Rejected {
					status: Some(status.as_u16()),
					retry_after,
					message: rejection_message(&bytes),
				});
			}

			parse_token_response(&bytes, OffsetDateTime::now_utc())
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	match raw.parse::<u64>() {
		Ok(secs) => Some(Duration::seconds(secs as i64)),
		Err(_) => {
			let moment = OffsetDateTime::parse(raw, &Rfc2822).ok()?;
			let delta = moment - OffsetDateTime::now_utc();

			delta.is_positive().then_some(delta)
		},
	}
}

#[cfg(feature = "reqwest")]
fn rejection_message(bytes: &[u8]) -> String {
	const MAX_LEN: usize = 256;

	let text = String::from_utf8_lossy(bytes);
	let text = text.trim();

	if text.is_empty() {
		return "token endpoint returned an empty body".into();
	}

	text.chars().take(MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const ISSUED_AT: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

	#[test]
	fn parse_converts_expires_in_to_an_absolute_instant() {
		let body = br#"{"access_token":"abc123","token_type":"Bearer","expires_in":3600}"#;
		let token = parse_token_response(body, ISSUED_AT)
			.expect("Well-formed token response should parse.");

		assert_eq!(token.token_type, "Bearer");
		assert_eq!(token.access_token.expose(), "abc123");
		assert_eq!(token.expires_at, Some(macros::datetime!(2025-06-01 13:00 UTC)));
	}

	#[test]
	fn parse_accepts_a_missing_expires_in() {
		let body = br#"{"access_token":"abc123","token_type":"Bearer"}"#;
		let token = parse_token_response(body, ISSUED_AT)
			.expect("Token response without expires_in should parse.");

		assert_eq!(token.expires_at, None);
	}

	#[test]
	fn parse_rejects_non_positive_expires_in() {
		let body = br#"{"access_token":"abc123","token_type":"Bearer","expires_in":0}"#;

		assert!(matches!(
			parse_token_response(body, ISSUED_AT),
			Err(IssueError::NonPositiveExpiresIn)
		));
	}

	#[test]
	fn parse_rejects_an_empty_access_token() {
		let body = br#"{"access_token":"","token_type":"Bearer","expires_in":60}"#;

		assert!(matches!(
			parse_token_response(body, ISSUED_AT),
			Err(IssueError::MissingAccessToken)
		));
	}

	#[test]
	fn parse_surfaces_the_failing_json_path() {
		let body = br#"{"access_token":"abc123","token_type":"Bearer","expires_in":"soon"}"#;
		let err = parse_token_response(body, ISSUED_AT)
			.expect_err("String expires_in should fail to parse.");

		match err {
			IssueError::MalformedResponse { source } =>
				assert_eq!(source.path().to_string(), "expires_in"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn metadata_slot_take_consumes_and_snapshot_does_not() {
		let slot = IssueMetadataSlot::default();

		slot.store(IssueMetadata { status: Some(429), retry_after: None });

		assert_eq!(slot.snapshot().and_then(|meta| meta.status), Some(429));
		assert_eq!(slot.take().and_then(|meta| meta.status), Some(429));
		assert!(slot.take().is_none());
	}
}
