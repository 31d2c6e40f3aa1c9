//! Client-level error types shared across the query, limit, and pipeline layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// The four variants are deliberately disjoint so callers can branch on the
/// failure class without inspecting sources: local configuration problems,
/// transport failures, body decode failures, and observed cancellation.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (address, headers, body serialization).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body does not match the requested shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Caller cancellation observed at a suspension point.
	#[error("Call was cancelled before completion.")]
	Cancelled,
}
impl Error {
	/// Returns true when the error is the cancellation outcome.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Configuration and validation failures raised before a request is dispatched.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Api address plus path cannot be parsed into an absolute URL.
	#[error("Request URL is invalid: {url}.")]
	InvalidUrl {
		/// The rejected URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header produced by the caller or the pre-send hook is not representable
	/// on the wire.
	#[error("Header `{name}` carries a value the transport cannot represent.")]
	InvalidHeader {
		/// Name of the offending header.
		name: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	BodySerialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
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

/// Decode failures raised after a response body arrived intact.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body is not valid JSON for the requested target type.
	#[error("Response body does not decode into the requested type.")]
	Json {
		/// Structured parsing failure with the path to the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response, when available.
		status: Option<u16>,
	},
}
