// self
use crate::obs::{CredentialOp, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(op: CredentialOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_adc_operation_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_is_safe_without_recorder() {
		record_outcome(CredentialOp::ResolveWellKnown, OpOutcome::NotConfigured);
	}
}
