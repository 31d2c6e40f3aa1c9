//! Cooperative cancellation observed at the pipeline's suspension points.
//!
//! A [`CancelSource`] owns the signal; every [`CancelToken`] handed to a call
//! resolves its [`cancelled`](CancelToken::cancelled) future once the source
//! fires. Dropping the source without cancelling leaves tokens pending
//! forever, so abandoned sources never abort in-flight calls.

// crates.io
use tokio::sync::watch;
// self
use crate::_prelude::*;

/// Owning half of a cancellation signal.
#[derive(Debug)]
pub struct CancelSource {
	tx: watch::Sender<bool>,
}
impl CancelSource {
	/// Creates a signal that has not fired yet.
	pub fn new() -> Self {
		Self { tx: watch::channel(false).0 }
	}

	/// Issues a token observing this signal.
	pub fn token(&self) -> CancelToken {
		CancelToken { rx: Some(self.tx.subscribe()) }
	}

	/// Fires the signal; every outstanding token resolves promptly.
	pub fn cancel(&self) {
		self.tx.send_replace(true);
	}

	/// Returns true once [`cancel`](Self::cancel) has been called.
	pub fn is_cancelled(&self) -> bool {
		*self.tx.borrow()
	}
}
impl Default for CancelSource {
	fn default() -> Self {
		Self::new()
	}
}

/// Cloneable token a caller attaches to an individual call.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
	rx: Option<watch::Receiver<bool>>,
}
impl CancelToken {
	/// Returns a token that never fires, for callers without cancellation.
	pub fn never() -> Self {
		Self::default()
	}

	/// Returns true once the owning source has fired.
	pub fn is_cancelled(&self) -> bool {
		self.rx.as_ref().is_some_and(|rx| *rx.borrow())
	}

	/// Resolves once the owning source fires; pends forever otherwise.
	pub async fn cancelled(&self) {
		if let Some(rx) = &self.rx {
			let mut rx = rx.clone();

			if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
				return;
			}
		}

		std::future::pending::<()>().await
	}
}
