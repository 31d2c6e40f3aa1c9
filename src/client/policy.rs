//! Capability flags and the pre-send hook contract.
//!
//! New services plug in by describing themselves in a [`ClientPolicy`] and,
//! when header attachment needs to deviate from the default key/bearer
//! scheme, supplying their own [`PreSendHook`]. The pipeline consults the
//! policy through the hook rather than hard-coding auth logic.

// self
use crate::{
	_prelude::*,
	http::{Headers, Method},
};

/// Static description of a concrete client's requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientPolicy {
	/// Human-readable client/provider name.
	pub name: &'static str,
	/// Version of the consumed API.
	pub version: u32,
	/// The service expects an API key header on every call.
	pub requires_api_key: bool,
	/// The service expects a bearer token on most calls, typically issued by a
	/// login endpoint.
	pub requires_auth_token: bool,
}
impl ClientPolicy {
	/// Creates a policy with no requirements.
	pub const fn new(name: &'static str) -> Self {
		Self { name, version: 0, requires_api_key: false, requires_auth_token: false }
	}

	/// Sets the consumed API version.
	pub const fn with_version(mut self, version: u32) -> Self {
		self.version = version;

		self
	}

	/// Declares that every call carries an API key header.
	pub const fn require_api_key(mut self) -> Self {
		self.requires_api_key = true;

		self
	}

	/// Declares that calls carry a bearer token once one is configured.
	pub const fn require_auth_token(mut self) -> Self {
		self.requires_auth_token = true;

		self
	}
}
impl Default for ClientPolicy {
	fn default() -> Self {
		Self::new("client")
	}
}

/// Read-only call snapshot handed to a [`PreSendHook`].
#[derive(Clone, Copy, Debug)]
pub struct CallContext<'a> {
	/// HTTP verb of the call.
	pub method: Method,
	/// Relative path of the call, before URL assembly.
	pub path: &'a str,
	/// Policy of the issuing client.
	pub policy: &'a ClientPolicy,
	/// API key configured on the client, when set.
	pub api_key: Option<&'a str>,
	/// Auth token configured on the client, when set.
	pub auth_token: Option<&'a str>,
}

/// Strategy invoked immediately before a request is dispatched.
///
/// The hook may mutate headers but never the URL or body; the pipeline
/// enforces this by handing out the header map alone.
pub trait PreSendHook
where
	Self: Send + Sync,
{
	/// Prepares the outgoing headers for one call.
	fn prepare(&self, ctx: &CallContext<'_>, headers: &mut Headers) -> Result<()>;
}

/// Default hook: attaches `Api-Key` unconditionally when the policy requires
/// a key, and `Authorization: Bearer` when a token is both required and
/// configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAuthHook;
impl PreSendHook for DefaultAuthHook {
	fn prepare(&self, ctx: &CallContext<'_>, headers: &mut Headers) -> Result<()> {
		if ctx.policy.requires_api_key {
			headers.insert("Api-Key".into(), ctx.api_key.unwrap_or_default().into());
		}
		if ctx.policy.requires_auth_token
			&& let Some(token) = ctx.auth_token.filter(|token| !token.is_empty())
		{
			headers.insert("Authorization".into(), format!("Bearer {token}"));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn context<'a>(
		policy: &'a ClientPolicy,
		key: Option<&'a str>,
		token: Option<&'a str>,
	) -> CallContext<'a> {
		CallContext {
			method: Method::Get,
			path: "infos/formats",
			policy,
			api_key: key,
			auth_token: token,
		}
	}

	#[test]
	fn default_hook_attaches_key_even_when_unset() {
		let policy = ClientPolicy::new("subtitles").require_api_key();
		let mut headers = Headers::new();

		DefaultAuthHook
			.prepare(&context(&policy, None, None), &mut headers)
			.expect("Default hook must not fail.");

		assert_eq!(headers.get("Api-Key").map(String::as_str), Some(""));
		assert!(!headers.contains_key("Authorization"));
	}

	#[test]
	fn default_hook_attaches_bearer_only_when_required_and_present() {
		let policy = ClientPolicy::new("subtitles").require_api_key().require_auth_token();
		let mut headers = Headers::new();

		DefaultAuthHook
			.prepare(&context(&policy, Some("k"), Some("t0ken")), &mut headers)
			.expect("Default hook must not fail.");

		assert_eq!(headers.get("Api-Key").map(String::as_str), Some("k"));
		assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer t0ken"));

		let unrequired = ClientPolicy::new("open");
		let mut headers = Headers::new();

		DefaultAuthHook
			.prepare(&context(&unrequired, Some("k"), Some("t0ken")), &mut headers)
			.expect("Default hook must not fail.");

		assert!(headers.is_empty());
	}

	#[test]
	fn empty_tokens_are_not_attached() {
		let policy = ClientPolicy::new("subtitles").require_auth_token();
		let mut headers = Headers::new();

		DefaultAuthHook
			.prepare(&context(&policy, None, Some("")), &mut headers)
			.expect("Default hook must not fail.");

		assert!(!headers.contains_key("Authorization"));
	}
}
