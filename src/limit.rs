//! Per-second request pacing state.
//!
//! [`RateWindow`] tracks how many requests completed inside the current
//! one-second window plus a monotonic total. Instead of arming a background
//! timer, the window stores its start instant and lazily resets the counter
//! once more than a second has elapsed; a new window starts only when traffic
//! resumes. Reads never mutate the window, so `is_over_limit` stays a pure
//! observation of current state.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::time::Instant;
// self
use crate::_prelude::*;

/// Length of the pacing window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Concurrency-safe request counters for one client instance.
///
/// The window counter lives under a short-held mutex so concurrent
/// increments are never lost and reads are never torn; the total is a plain
/// atomic because it only ever grows.
#[derive(Debug, Default)]
pub struct RateWindow {
	total: AtomicU64,
	window: Mutex<WindowState>,
}
impl RateWindow {
	/// Creates counters with no recorded traffic.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a completed dispatch against the current window.
	///
	/// Expired windows reset to zero before the increment, so the counter is
	/// reset exactly once per elapsed second of activity.
	pub fn record(&self) {
		let now = Instant::now();
		let mut state = self.window.lock();

		if state.expired(now) {
			state.count = 0;
			state.started_at = Some(now);
		}

		state.count += 1;
	}

	/// Records a completed dispatch against the monotonic total only.
	pub fn record_total(&self) {
		self.total.fetch_add(1, Ordering::Relaxed);
	}

	/// Returns the total number of dispatched requests.
	pub fn total(&self) -> u64 {
		self.total.load(Ordering::Relaxed)
	}

	/// Returns the number of requests recorded in the current window.
	///
	/// An expired window reads as zero without being re-armed.
	pub fn in_current_window(&self) -> u64 {
		let state = self.window.lock();

		if state.expired(Instant::now()) { 0 } else { state.count }
	}

	/// Returns true when a window is armed and has not yet elapsed.
	pub fn window_active(&self) -> bool {
		let state = self.window.lock();

		!state.expired(Instant::now())
	}

	/// Reports whether the configured ceiling is currently exceeded.
	///
	/// A ceiling of zero or below means unlimited and never reads the window.
	pub fn is_over_limit(&self, ceiling: i32) -> bool {
		if ceiling <= 0 {
			return false;
		}

		self.in_current_window() >= ceiling as u64
	}

	/// Clears the window counter and disarms the window.
	///
	/// The monotonic total is left untouched.
	pub fn reset_window(&self) {
		let mut state = self.window.lock();

		state.count = 0;
		state.started_at = None;
	}
}

#[derive(Debug, Default)]
struct WindowState {
	count: u64,
	started_at: Option<Instant>,
}
impl WindowState {
	fn expired(&self, now: Instant) -> bool {
		self.started_at.is_none_or(|started| now.duration_since(started) >= WINDOW)
	}
}
