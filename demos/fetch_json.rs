//! Demonstrates a typed GET through the default reqwest transport: canonical
//! query encoding, policy-driven auth headers, and JSON decoding.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use throttle_client::{
	client::{Client, ClientPolicy},
	query::QueryParams,
};

#[derive(Debug, Deserialize)]
struct Listing {
	total_count: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let listing_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/discover/popular")
				.query_param("languages", "en,pt")
				.query_param("type", "movie")
				.header("api-key", "demo-key");
			then.status(200).json_body(json!({ "total_count": 42 }));
		})
		.await;
	let client = Client::new(format!("{}/api/v1", server.base_url()))
		.with_policy(ClientPolicy::new("demo").with_version(1).require_api_key())
		.with_api_key("demo-key");
	let params = QueryParams::new().with("Type", "Movie").with_seq("Languages", ["en", "pt"]);

	println!("Requesting {}.", client.request_url("discover/popular", Some(&params))?);

	let listing: Listing = client.get_json("discover/popular", params).await?;

	println!("Popular features: {}.", listing.total_count);

	listing_mock.assert_async().await;

	Ok(())
}
