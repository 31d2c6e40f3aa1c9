//! Self-throttling asynchronous JSON API client core—canonical query
//! encoding, per-second request pacing, and pluggable transports for thin
//! per-endpoint client layers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cancel;
pub mod client;
pub mod error;
pub mod http;
pub mod limit;
pub mod obs;
pub mod query;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::{Client, ClientPolicy},
		http::ReqwestTransport,
	};

	/// Builds a client against a mock server base address with the key+token
	/// policy most integration tests exercise.
	pub fn build_test_client(address: &str) -> Client<ReqwestTransport> {
		Client::new(address)
			.with_policy(ClientPolicy::new("test").require_api_key().require_auth_token())
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
