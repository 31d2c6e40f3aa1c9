//! Demonstrates plugging a custom transport into the client core: an
//! in-memory stack that serves canned JSON without opening a socket, plus a
//! custom pre-send hook stamping a correlation header.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use color_eyre::Result;
// self
use throttle_client::{
	client::{CallContext, Client, ClientPolicy, PreSendHook},
	http::{ApiRequest, ApiResponse, ApiTransport, Headers, TransportFuture},
	query::QueryParams,
};

/// Serves canned bodies keyed by request path.
struct InMemoryTransport;
impl ApiTransport for InMemoryTransport {
	fn dispatch(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let body: &[u8] = match request.url.path() {
				"/v1/infos/formats" => br#"{"data":["srt","sub","webvtt"]}"#,
				_ => br#"{"errors":["not found"]}"#,
			};

			println!(
				"[in-memory] {} {} (correlation: {}).",
				request.method,
				request.url,
				request.headers.get("X-Correlation-Id").map_or("none", String::as_str),
			);

			Ok(ApiResponse { status: 200, body: body.to_vec() })
		})
	}
}

/// Stamps a monotonically increasing correlation id on every call.
#[derive(Default)]
struct CorrelatingHook {
	next: AtomicU64,
}
impl PreSendHook for CorrelatingHook {
	fn prepare(
		&self,
		_ctx: &CallContext<'_>,
		headers: &mut Headers,
	) -> throttle_client::error::Result<()> {
		headers
			.insert("X-Correlation-Id".into(), self.next.fetch_add(1, Ordering::Relaxed).to_string());

		Ok(())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client = Client::with_transport("https://api.example.com/v1", InMemoryTransport)
		.with_policy(ClientPolicy::new("in-memory"))
		.with_hook(CorrelatingHook::default());

	for _ in 0..3 {
		let formats: serde_json::Value = client.get_json("infos/formats", QueryParams::new()).await?;

		println!("Formats: {formats}.");
	}

	println!("Total requests issued: {}.", client.total_requests());

	Ok(())
}
