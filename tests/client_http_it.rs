// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use throttle_client::{
	client::{Client, ClientPolicy},
	error::{DecodeError, Error},
	query::{QueryModel, QueryParams},
};

fn subtitles_client(server: &MockServer) -> Client<throttle_client::http::ReqwestTransport> {
	let client = Client::new(format!("{}/v1/", server.base_url()))
		.with_policy(ClientPolicy::new("subtitles").with_version(1).require_api_key().require_auth_token())
		.with_api_key("secret-key");

	client.set_auth_token(Some("abc123"));

	client
}

#[derive(Debug, Deserialize, PartialEq)]
struct Listing {
	total_count: u32,
	page: u32,
}

#[tokio::test]
async fn get_json_sends_canonical_urls_and_decodes_typed_bodies() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/discover/popular")
				.query_param("languages", "en,pt")
				.query_param("type", "movie")
				.header("accept", "application/json")
				.header("api-key", "secret-key")
				.header("authorization", "Bearer abc123");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "total_count": 42, "page": 1 }));
		})
		.await;
	let client = subtitles_client(&server);
	let params = QueryParams::new().with("Type", "Movie").with_seq("Languages", ["en", "pt"]);
	let listing: Listing = client
		.get_json("discover/popular", params)
		.await
		.expect("Mocked listing must decode into the target type.");

	assert_eq!(listing, Listing { total_count: 42, page: 1 });
	assert_eq!(client.total_requests(), 1);

	mock.assert_async().await;
}

#[tokio::test]
async fn query_models_flatten_into_the_request_url() {
	struct DiscoverFilter {
		kind: &'static str,
		languages: Vec<&'static str>,
		page: Option<u32>,
	}
	impl QueryModel for DiscoverFilter {
		fn query_params(&self) -> QueryParams {
			let mut params = QueryParams::new().with("Type", self.kind);

			params.insert_seq("Languages", &self.languages);
			params.insert_opt("Page", self.page);

			params
		}
	}

	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/discover/most_downloaded")
				.query_param("page", "3")
				.query_param("type", "episode");
			then.status(200).json_body(json!({ "total_count": 7, "page": 3 }));
		})
		.await;
	let client = subtitles_client(&server);
	let filter = DiscoverFilter { kind: "Episode", languages: Vec::new(), page: Some(3) };
	let listing: Listing = client
		.get_json("discover/most_downloaded", filter.query_params())
		.await
		.expect("Mocked listing must decode into the target type.");

	assert_eq!(listing.page, 3);

	mock.assert_async().await;
}

#[tokio::test]
async fn post_json_round_trips_utf8_json_bodies() {
	#[derive(Debug, Deserialize)]
	struct Login {
		token: String,
	}

	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/login")
				.header("content-type", "application/json; charset=utf-8")
				.json_body(json!({ "username": "user", "password": "pass" }));
			then.status(200).json_body(json!({ "token": "fresh-token" }));
		})
		.await;
	let client = subtitles_client(&server);
	let login: Login = client
		.post_json("login", &json!({ "username": "user", "password": "pass" }))
		.await
		.expect("Mocked login must decode.");

	assert_eq!(login.token, "fresh-token");

	mock.assert_async().await;
}

#[tokio::test]
async fn delete_json_reaches_the_trimmed_path() {
	#[derive(Debug, Deserialize)]
	struct Logout {
		status: u16,
	}

	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/v1/logout").header("authorization", "Bearer abc123");
			then.status(200).json_body(json!({ "status": 200 }));
		})
		.await;
	let client = subtitles_client(&server);
	let logout: Logout = client
		.delete_json("/logout/", QueryParams::new())
		.await
		.expect("Mocked logout must decode.");

	assert_eq!(logout.status, 200);

	mock.assert_async().await;
}

#[tokio::test]
async fn non_json_bodies_surface_as_decode_errors_end_to_end() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/infos/formats");
			then.status(502).header("content-type", "text/html").body("<html>bad gateway</html>");
		})
		.await;
	let client = subtitles_client(&server);
	let err = client
		.get_json::<serde_json::Value>("infos/formats", QueryParams::new())
		.await
		.expect_err("HTML bodies must fail decoding.");

	match err {
		Error::Decode(DecodeError::Json { status, .. }) => assert_eq!(status, Some(502)),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	// The dispatch completed even though decoding failed.
	assert_eq!(client.total_requests(), 1);
}
