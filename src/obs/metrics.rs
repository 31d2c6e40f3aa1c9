// self
use crate::{
	http::Method,
	obs::CallOutcome,
};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(method: Method, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"throttle_client_requests_total",
			"verb" => method.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}
