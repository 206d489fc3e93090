//! Optional observability helpers for token acquisition.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `onprem_connect.token` with the `flow`
//!   (initial vs. renewal) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `onprem_connect_token_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Token-acquisition flows observed by the interceptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenFlowKind {
	/// First acquisition for an empty cache.
	Initial,
	/// Replacement of an expired cached token.
	Renewal,
}
impl TokenFlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenFlowKind::Initial => "initial",
			TokenFlowKind::Renewal => "renewal",
		}
	}
}
impl Display for TokenFlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each acquisition attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenOutcome {
	/// Entry to an acquisition.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl TokenOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenOutcome::Attempt => "attempt",
			TokenOutcome::Success => "success",
			TokenOutcome::Failure => "failure",
		}
	}
}
impl Display for TokenOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
