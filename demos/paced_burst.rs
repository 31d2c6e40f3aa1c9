//! Demonstrates the per-second pacing: a burst beyond the configured ceiling
//! stalls until the window resets instead of hammering the server.

// std
use std::time::Instant;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use throttle_client::{client::Client, query::QueryParams};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/infos/formats");
			then.status(200).json_body(json!({ "data": ["srt", "sub", "webvtt"] }));
		})
		.await;
	let client = Client::new(format!("{}/api", server.base_url()));

	client.on_config_change(|event| println!("Configuration changed: {event:?}."));
	client.set_max_requests_per_second(3);
	client.set_auto_wait_for_limit(true);

	let started = Instant::now();

	for call in 1..=5u8 {
		let _: serde_json::Value = client.get_json("infos/formats", QueryParams::new()).await?;

		println!(
			"Call {call} done after {:?} (window: {}, total: {}).",
			started.elapsed(),
			client.requests_in_current_second(),
			client.total_requests(),
		);
	}

	println!("Burst of 5 calls against a ceiling of 3 took {:?}.", started.elapsed());

	Ok(())
}
