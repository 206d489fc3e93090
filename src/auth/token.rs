//! Access-token model with point-of-use expiry checks.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Short-lived bearer credential issued for the connectivity proxy.
///
/// One token is cached per interceptor instance, replaced in place on refresh, and never
/// persisted externally.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Authorization scheme reported by the issuer (e.g. `Bearer`).
	pub token_type: String,
	/// Opaque credential; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute expiry instant; absence means the token stays valid until replaced.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Creates a token without an expiry instant.
	pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
		Self {
			token_type: token_type.into(),
			access_token: TokenSecret::new(access_token),
			expires_at: None,
		}
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry measured from the provided issuance instant.
	pub fn expires_in(self, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
		self.expires_at(issued_at + lifetime)
	}

	/// Returns `true` if the token is usable at the provided instant.
	///
	/// A token is usable iff no expiry is recorded or the expiry is strictly after the
	/// instant. Expiry is evaluated at point of use; there is no early-refresh margin.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|expires_at| expires_at > instant)
	}

	/// Convenience helper that checks usability against the current UTC instant.
	pub fn is_usable(&self) -> bool {
		self.is_usable_at(OffsetDateTime::now_utc())
	}

	/// Renders the `<token_type> <access_token>` value injected as `Proxy-Authorization`.
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token_type", &self.token_type)
			.field("access_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
