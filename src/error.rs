//! Crate-level error types shared across the interceptor, issuer, and client assembly.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical crate error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or assembly problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential-acquisition failure raised by a token issuer.
	#[error(transparent)]
	Issue(#[from] IssueError),
	/// Transport failure while dispatching an intercepted request.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised while assembling clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed before dispatch.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Underlying request builder failure.
		#[source]
		source: BoxError,
	},
	/// Connectivity-proxy endpoint cannot be rendered as a URL.
	#[error("Connectivity-proxy endpoint is not a valid URL.")]
	InvalidProxyUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header value contained bytes that cannot be sent on the wire.
	#[error("Header value cannot be encoded for transmission.")]
	InvalidHeaderValue {
		/// Underlying encoding failure.
		#[source]
		source: http::header::InvalidHeaderValue,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a request builder failure inside [`ConfigError`].
	pub fn http_request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpRequest { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Credential-acquisition failures surfaced by [`TokenIssuer`](crate::issuer::TokenIssuer)
/// implementations.
///
/// These are never retried internally and never cached as negative results; the next
/// intercepted request attempts acquisition again.
#[derive(Debug, ThisError)]
pub enum IssueError {
	/// Network failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint rejected the credential request.
	#[error("Token endpoint rejected the credential request: {message}.")]
	Rejected {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Issuer-supplied reason string.
		message: String,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint response carried an empty access token.
	#[error("Token endpoint response is missing an access token.")]
	MissingAccessToken,
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl IssueError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}

/// Transport-level failures while sending intercepted requests.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
