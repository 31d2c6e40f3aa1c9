//! Request pipeline: URL assembly, pre-send hook, rate-limit backoff,
//! dispatch, and JSON decoding.
//!
//! Every verb convenience funnels into [`Client::send`]. The pipeline stalls
//! over-limit calls with a random half-to-two-second backoff while auto-wait
//! is enabled; the throttle is best effort, so a dispatch racing the window
//! reset may still land outside the ceiling. Transport and decode failures
//! stay distinct and neither is retried.

// crates.io
use rand::Rng;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	cancel::CancelToken,
	client::{CallContext, Client},
	error::DecodeError,
	http::{ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, CallOutcome, CallSpan},
	query::QueryParams,
};

/// One call through the pipeline: verb, path, parameters, optional body, and
/// cancellation token. Created per call, consumed by the dispatch.
#[derive(Clone, Debug)]
pub struct ApiCall {
	pub(crate) method: Method,
	pub(crate) path: String,
	pub(crate) params: QueryParams,
	pub(crate) body: Option<Vec<u8>>,
	pub(crate) cancel: CancelToken,
}
impl ApiCall {
	/// Creates a call with no parameters, body, or cancellation.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			params: QueryParams::new(),
			body: None,
			cancel: CancelToken::never(),
		}
	}

	/// Attaches query parameters.
	pub fn with_params(mut self, params: impl Into<QueryParams>) -> Self {
		self.params = params.into();

		self
	}

	/// Serializes and attaches a JSON body.
	pub fn with_json_body(mut self, body: &impl Serialize) -> Result<Self> {
		self.body =
			Some(serde_json::to_vec(body).map_err(crate::error::ConfigError::BodySerialize)?);

		Ok(self)
	}

	/// Attaches a cancellation token honored at every suspension point.
	pub fn with_cancel(mut self, token: CancelToken) -> Self {
		self.cancel = token;

		self
	}
}

impl<T> Client<T>
where
	T: ?Sized + ApiTransport,
{
	/// Issues a GET and decodes the JSON response.
	pub async fn get_json<R>(&self, path: &str, params: QueryParams) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiCall::new(Method::Get, path).with_params(params)).await
	}

	/// Issues a JSON-bodied POST and decodes the JSON response.
	pub async fn post_json<R>(&self, path: &str, body: &impl Serialize) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiCall::new(Method::Post, path).with_json_body(body)?).await
	}

	/// Issues a DELETE and decodes the JSON response.
	pub async fn delete_json<R>(&self, path: &str, params: QueryParams) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiCall::new(Method::Delete, path).with_params(params)).await
	}

	/// Sends a call and decodes the response body as `R`.
	pub async fn send_json<R>(&self, call: ApiCall) -> Result<R>
	where
		R: DeserializeOwned,
	{
		decode_json(self.send(call).await?)
	}

	/// Sends a call without decoding, for fire-and-forget endpoints or callers
	/// that inspect the raw response themselves.
	pub async fn send(&self, call: ApiCall) -> Result<ApiResponse> {
		let method = call.method;
		let span = CallSpan::new(method, &call.path);

		obs::record_call_outcome(method, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch(call)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(method, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(method, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, call: ApiCall) -> Result<ApiResponse> {
		if call.cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let url = self.request_url(&call.path, Some(&call.params))?;
		let mut request = ApiRequest::new(call.method, url);

		request.headers.insert("Accept".into(), "application/json".into());

		if let Some(body) = call.body {
			request.headers.insert("Content-Type".into(), "application/json; charset=utf-8".into());
			request.body = Some(body);
		}

		// Snapshot the credentials so the hook runs without the config lock and
		// may itself reconfigure the client.
		let (api_key, auth_token) = {
			let config = self.config.read();

			(config.api_key.clone(), config.auth_token.clone())
		};
		let ctx = CallContext {
			method: call.method,
			path: &call.path,
			policy: &self.policy,
			api_key: api_key.as_deref(),
			auth_token: auth_token.as_deref(),
		};

		self.hook.prepare(&ctx, &mut request.headers)?;

		// Best-effort throttle: stall while over-limit, then dispatch without
		// re-checking, tolerating the race with the window reset.
		loop {
			let (auto_wait, ceiling) = self.pacing();

			if !auto_wait || !self.rate.is_over_limit(ceiling) {
				break;
			}

			let wait = Duration::from_millis(rand::rng().random_range(500..=2_000));

			tokio::select! {
				() = call.cancel.cancelled() => return Err(Error::Cancelled),
				() = tokio::time::sleep(wait) => {},
			}
		}

		let response = tokio::select! {
			() = call.cancel.cancelled() => return Err(Error::Cancelled),
			result = self.transport.dispatch(request) => result?,
		};

		self.rate.record_total();

		let (auto_wait, ceiling) = self.pacing();

		if auto_wait && ceiling > 0 {
			self.rate.record();
		}

		Ok(response)
	}

	fn pacing(&self) -> (bool, i32) {
		let config = self.config.read();

		(config.auto_wait_for_limit, config.max_requests_per_second)
	}
}

fn decode_json<R>(response: ApiResponse) -> Result<R>
where
	R: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { source, status: Some(response.status) }.into())
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::OnceLock;
	// self
	use super::*;
	use crate::{
		client::PreSendHook,
		http::{Headers, TransportFuture},
	};

	struct NullTransport;
	impl ApiTransport for NullTransport {
		fn dispatch(&self, _request: ApiRequest) -> TransportFuture<'_> {
			Box::pin(async { Ok(ApiResponse { status: 200, body: b"{}".to_vec() }) })
		}
	}

	struct ReconfiguringHook {
		client: Arc<OnceLock<Arc<Client<NullTransport>>>>,
	}
	impl PreSendHook for ReconfiguringHook {
		fn prepare(&self, _ctx: &CallContext<'_>, _headers: &mut Headers) -> Result<()> {
			if let Some(client) = self.client.get() {
				client.set_auth_token(Some("rotated"));
			}

			Ok(())
		}
	}

	#[tokio::test]
	async fn hooks_may_reconfigure_the_client_mid_dispatch() {
		let slot = Arc::new(OnceLock::new());
		let client = Arc::new(
			Client::with_transport("https://api.example.com/v1", NullTransport)
				.with_hook(ReconfiguringHook { client: slot.clone() }),
		);

		slot.set(client.clone()).ok();

		let _: serde_json::Value = client
			.get_json("infos/formats", QueryParams::new())
			.await
			.expect("Reconfiguring hook must not stall the dispatch.");

		assert_eq!(client.auth_token().as_deref(), Some("rotated"));
	}

	#[test]
	fn call_builder_serializes_bodies_eagerly() {
		#[derive(Serialize)]
		struct Login<'a> {
			username: &'a str,
		}

		let call = ApiCall::new(Method::Post, "login")
			.with_json_body(&Login { username: "user" })
			.expect("Serializable bodies must not fail.");

		assert_eq!(call.body.as_deref(), Some(br#"{"username":"user"}"# as &[u8]));
	}

	#[test]
	fn decode_json_reports_the_status_of_the_response() {
		let malformed = ApiResponse { status: 502, body: b"<html>bad gateway</html>".to_vec() };
		let err = decode_json::<serde_json::Value>(malformed)
			.expect_err("Malformed bodies must fail to decode.");

		match err {
			Error::Decode(DecodeError::Json { status, .. }) => assert_eq!(status, Some(502)),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
