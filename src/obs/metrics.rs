// self
use crate::obs::{TokenFlowKind, TokenOutcome};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_token_outcome(kind: TokenFlowKind, outcome: TokenOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"onprem_connect_token_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
