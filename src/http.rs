//! Transport primitives for API calls.
//!
//! [`ApiTransport`] is the crate's only dependency on an HTTP stack: the
//! pipeline hands it a fully prepared [`ApiRequest`] and receives the raw
//! status and body back. The default [`ReqwestTransport`] adapter reuses a
//! process-wide connection pool so clients that do not supply their own
//! transport never multiply sockets.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
#[cfg(feature = "reqwest")] use std::sync::OnceLock;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::error::TransportError;

/// HTTP verbs the pipeline issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// Idempotent fetch.
	Get,
	/// JSON-bodied create/submit.
	Post,
	/// Resource removal.
	Delete,
}
impl Method {
	/// Returns the wire-format verb, also used as a span and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Ordered header map carried by an [`ApiRequest`].
///
/// Names and values stay plain strings until the transport adapter converts
/// them, so pre-send hooks never depend on a specific HTTP stack.
pub type Headers = BTreeMap<String, String>;

/// One outgoing request, created per call and discarded after completion.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute request URL (address + path + encoded parameters).
	pub url: Url,
	/// Headers, caller-extensible through the pre-send hook.
	pub headers: Headers,
	/// Serialized JSON body, when present.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a bodyless request with empty headers.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Headers::new(), body: None }
	}
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Complete response body.
	pub body: Vec<u8>,
}

/// Boxed future returned by [`ApiTransport::dispatch`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one API call.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be
/// shared across client instances, and the returned future must be `Send` so
/// pipeline futures can hop executors. Network failures should surface as
/// [`Error::Transport`]; the pipeline treats any `Ok` response as a completed
/// dispatch regardless of its HTTP status.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches one request and resolves with the raw response.
	fn dispatch(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. [`ReqwestTransport::default`] reuses the process-wide pool; pass a
/// custom client through [`ReqwestTransport::with_client`] to override TLS or
/// proxy settings.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Returns a transport backed by the process-wide shared client.
	pub fn shared() -> Self {
		Self(shared_client().clone())
	}

	/// Builds a transport with its own connection pool, configured like the
	/// shared one.
	///
	/// Fails with [`ConfigError::HttpClientBuild`] when the underlying client
	/// cannot be constructed, e.g. because the TLS backend fails to initialize.
	pub fn try_new() -> Result<Self> {
		Ok(Self(client_builder().build().map_err(ConfigError::from)?))
	}

	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestTransport {
	fn default() -> Self {
		Self::shared()
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn dispatch(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut headers = HeaderMap::with_capacity(request.headers.len());

			for (name, value) in &request.headers {
				let header_name = HeaderName::from_bytes(name.as_bytes())
					.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;
				let header_value = HeaderValue::from_str(value)
					.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;

				headers.insert(header_name, header_value);
			}

			let mut builder = client.request(method, request.url).headers(headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn client_builder() -> reqwest::ClientBuilder {
	ReqwestClient::builder().user_agent(concat!("throttle-client/", env!("CARGO_PKG_VERSION")))
}

/// Process-wide connection pool shared by every client that does not supply
/// its own transport; initialized lazily, lives for the process.
///
/// A build failure here means the TLS backend itself is unusable; callers who
/// want to handle that fallibly go through [`ReqwestTransport::try_new`].
#[cfg(feature = "reqwest")]
fn shared_client() -> &'static ReqwestClient {
	static SHARED: OnceLock<ReqwestClient> = OnceLock::new();

	SHARED.get_or_init(|| {
		client_builder().build().expect("Shared HTTP client must be constructible.")
	})
}
