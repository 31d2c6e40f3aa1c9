//! Client base: configuration, counters, URL building, and change
//! notification.
//!
//! Concrete per-service clients compose a [`Client`] with a [`ClientPolicy`]
//! and, when the default key/bearer behavior is not enough, a custom
//! [`PreSendHook`]; their typed endpoint methods then funnel through the verb
//! conveniences in the pipeline module.

pub mod policy;

mod pipeline;

pub use pipeline::*;
pub use policy::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::ApiTransport,
	limit::RateWindow,
	query::{QueryModel, QueryParams},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestTransport>;

/// Mutable per-client configuration.
///
/// Owned exclusively by one [`Client`]; mutate it through the client's
/// setters so observers see every change.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base API address, kept trimmed of surrounding whitespace and slashes.
	pub address: String,
	/// API key attached by the default hook when the policy requires one.
	pub api_key: Option<String>,
	/// Bearer token attached when the policy requires one, typically obtained
	/// from a login endpoint.
	pub auth_token: Option<String>,
	/// Requests-per-second ceiling; zero or below means unlimited.
	pub max_requests_per_second: i32,
	/// Stalls over-limit calls instead of dispatching them immediately.
	pub auto_wait_for_limit: bool,
}
impl ClientConfig {
	/// Creates a configuration with no credentials and pacing disabled.
	pub fn new(address: impl AsRef<str>) -> Self {
		Self {
			address: trim_address(address.as_ref()),
			api_key: None,
			auth_token: None,
			max_requests_per_second: 0,
			auto_wait_for_limit: false,
		}
	}
}

/// Configuration fields reported to change observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigEvent {
	/// Base API address changed.
	Address,
	/// API key changed.
	ApiKey,
	/// Auth token changed.
	AuthToken,
	/// Requests-per-second ceiling changed.
	MaxRequestsPerSecond,
	/// Auto-wait flag toggled.
	AutoWaitForLimit,
}

type ConfigObserver = Arc<dyn Fn(ConfigEvent) + Send + Sync>;

/// Generic API client core shared by concrete per-service clients.
///
/// Holds the configuration, the pacing counters, the capability policy, and
/// the transport. Calls issued concurrently through one client are
/// independent; the counters are the only shared mutable state.
pub struct Client<T>
where
	T: ?Sized + ApiTransport,
{
	pub(crate) transport: Arc<T>,
	pub(crate) policy: ClientPolicy,
	pub(crate) hook: Arc<dyn PreSendHook>,
	pub(crate) config: RwLock<ClientConfig>,
	pub(crate) rate: RateWindow,
	observers: Mutex<Vec<ConfigObserver>>,
}
impl<T> Client<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(address: impl AsRef<str>, transport: impl Into<Arc<T>>) -> Self {
		Self {
			transport: transport.into(),
			policy: ClientPolicy::default(),
			hook: Arc::new(DefaultAuthHook),
			config: RwLock::new(ClientConfig::new(address)),
			rate: RateWindow::new(),
			observers: Mutex::new(Vec::new()),
		}
	}

	/// Sets the capability policy consulted by the pre-send hook.
	pub fn with_policy(mut self, policy: ClientPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Replaces the pre-send hook invoked before every dispatch.
	pub fn with_hook(mut self, hook: impl 'static + PreSendHook) -> Self {
		self.hook = Arc::new(hook);

		self
	}

	/// Sets the initial API key.
	pub fn with_api_key(self, key: impl Into<String>) -> Self {
		self.config.write().api_key = Some(key.into());

		self
	}

	/// Returns the capability policy.
	pub fn policy(&self) -> &ClientPolicy {
		&self.policy
	}

	/// Registers an observer notified after every configuration change.
	///
	/// Observers run outside every client lock, so a callback may call setters
	/// or register further observers.
	pub fn on_config_change(&self, observer: impl 'static + Fn(ConfigEvent) + Send + Sync) {
		self.observers.lock().push(Arc::new(observer));
	}

	/// Returns the trimmed base API address.
	pub fn api_address(&self) -> String {
		self.config.read().address.clone()
	}

	/// Replaces the base API address, trimming whitespace and slashes.
	pub fn set_api_address(&self, address: impl AsRef<str>) {
		let trimmed = trim_address(address.as_ref());
		let changed = {
			let mut config = self.config.write();

			if config.address == trimmed {
				false
			} else {
				config.address = trimmed;

				true
			}
		};

		if changed {
			self.notify(ConfigEvent::Address);
		}
	}

	/// Returns the configured API key.
	pub fn api_key(&self) -> Option<String> {
		self.config.read().api_key.clone()
	}

	/// Replaces the API key; `None` clears it.
	pub fn set_api_key(&self, key: Option<&str>) {
		let key = key.map(str::to_owned);
		let changed = {
			let mut config = self.config.write();

			if config.api_key == key {
				false
			} else {
				config.api_key = key;

				true
			}
		};

		if changed {
			self.notify(ConfigEvent::ApiKey);
		}
	}

	/// Returns the configured auth token.
	pub fn auth_token(&self) -> Option<String> {
		self.config.read().auth_token.clone()
	}

	/// Replaces the auth token; `None` clears it.
	pub fn set_auth_token(&self, token: Option<&str>) {
		let token = token.map(str::to_owned);
		let changed = {
			let mut config = self.config.write();

			if config.auth_token == token {
				false
			} else {
				config.auth_token = token;

				true
			}
		};

		if changed {
			self.notify(ConfigEvent::AuthToken);
		}
	}

	/// Returns the requests-per-second ceiling; zero or below means unlimited.
	pub fn max_requests_per_second(&self) -> i32 {
		self.config.read().max_requests_per_second
	}

	/// Replaces the requests-per-second ceiling.
	pub fn set_max_requests_per_second(&self, ceiling: i32) {
		let changed = {
			let mut config = self.config.write();

			if config.max_requests_per_second == ceiling {
				false
			} else {
				config.max_requests_per_second = ceiling;

				true
			}
		};

		if changed {
			self.notify(ConfigEvent::MaxRequestsPerSecond);
		}
	}

	/// Returns whether over-limit calls stall until the window resets.
	pub fn auto_wait_for_limit(&self) -> bool {
		self.config.read().auto_wait_for_limit
	}

	/// Toggles the auto-wait policy.
	///
	/// Flipping the policy resets the window counter so traffic that predates
	/// the change is never penalized.
	pub fn set_auto_wait_for_limit(&self, auto_wait: bool) {
		let changed = {
			let mut config = self.config.write();

			if config.auto_wait_for_limit == auto_wait {
				false
			} else {
				config.auto_wait_for_limit = auto_wait;

				true
			}
		};

		if changed {
			self.rate.reset_window();
			self.notify(ConfigEvent::AutoWaitForLimit);
		}
	}

	/// Returns the total number of requests dispatched by this client.
	pub fn total_requests(&self) -> u64 {
		self.rate.total()
	}

	/// Returns the number of requests recorded in the current pacing window.
	pub fn requests_in_current_second(&self) -> u64 {
		self.rate.in_current_window()
	}

	/// Reports whether the configured ceiling is currently exceeded.
	pub fn requests_hit_limit(&self) -> bool {
		self.rate.is_over_limit(self.max_requests_per_second())
	}

	/// Builds the absolute URL for a request to the API.
	///
	/// The path is trimmed of surrounding whitespace and slashes before being
	/// joined to the address; parameters serialize canonically per
	/// [`QueryParams::encode`].
	pub fn request_url(&self, path: &str, params: Option<&QueryParams>) -> Result<Url> {
		let address = self.api_address();
		let trimmed = path.trim_matches(|c: char| c.is_whitespace() || c == '/');
		let query = params.map(QueryParams::encode).unwrap_or_default();
		let raw = format!("{address}/{trimmed}{query}");

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source }.into())
	}

	/// Builds the absolute URL for a request described by a [`QueryModel`].
	pub fn request_url_for(&self, path: &str, model: &impl QueryModel) -> Result<Url> {
		self.request_url(path, Some(&model.query_params()))
	}

	/// Derives the main website URL from the API address by dropping the
	/// infrastructure host labels: everything through the last label ending in
	/// `api`, or a bare leading `www`.
	pub fn website_url(&self) -> Result<Url> {
		let address = self.api_address();
		let parsed = Url::parse(&address)
			.map_err(|source| ConfigError::InvalidUrl { url: address.clone(), source })?;
		let mut site = parsed.clone();

		site.set_path("");
		site.set_query(None);
		site.set_fragment(None);

		if let Some(host) = parsed.host_str() {
			let labels = host.split('.').collect::<Vec<_>>();
			let cut = labels
				.iter()
				.rposition(|label| label.ends_with("api"))
				.map(|index| index + 1)
				.unwrap_or(usize::from(labels.first() == Some(&"www")));

			if cut > 0 && labels.len() - cut >= 2 {
				site.set_host(Some(&labels[cut..].join(".")))
					.map_err(|source| ConfigError::InvalidUrl { url: address, source })?;
			}
		}

		Ok(site)
	}

	fn notify(&self, event: ConfigEvent) {
		// Snapshot the list so callbacks never run under the lock.
		let observers = self.observers.lock().clone();

		for observer in &observers {
			observer(event);
		}
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by the process-wide shared reqwest pool.
	pub fn new(address: impl AsRef<str>) -> Self {
		Self::with_transport(address, ReqwestTransport::shared())
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let config = self.config.read();

		f.debug_struct("Client")
			.field("address", &config.address)
			.field("policy", &self.policy)
			.field("api_key_set", &config.api_key.is_some())
			.field("auth_token_set", &config.auth_token.is_some())
			.field("max_requests_per_second", &config.max_requests_per_second)
			.field("auto_wait_for_limit", &config.auto_wait_for_limit)
			.finish()
	}
}

fn trim_address(raw: &str) -> String {
	raw.trim_matches(|c: char| c.is_whitespace() || c == '/').to_owned()
}
