//! Monotonic time source used by the settle state machine and the yield stage.
//!
//! The pipeline never reads the wall clock directly. [`SystemClock`] is used in
//! production; [`ManualClock`] advances only when something sleeps on it or when a
//! test calls [`ManualClock::advance`], which makes timing logic deterministic.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
	sync::Arc,
	time::{Duration, Instant},
};

#[async_trait]
pub trait Clock: Send + Sync {
	/// Time elapsed since the clock was created.
	fn now(&self) -> Duration;

	/// Suspends the caller for `duration`.
	async fn sleep(&self, duration: Duration);
}

/// Clock backed by [`Instant`] and `tokio::time::sleep`.
pub struct SystemClock {
	start: Instant,
}

impl SystemClock {
	pub fn new() -> Self {
		Self { start: Instant::now() }
	}

	pub fn arc() -> Arc<dyn Clock> {
		Arc::new(Self::new())
	}
}

impl Default for SystemClock {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Clock for SystemClock {
	fn now(&self) -> Duration {
		self.start.elapsed()
	}

	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// Virtual clock: sleeping advances time immediately.
#[derive(Clone, Default)]
pub struct ManualClock {
	now: Arc<Mutex<Duration>>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn advance(&self, duration: Duration) {
		*self.now.lock() += duration;
	}
}

#[async_trait]
impl Clock for ManualClock {
	fn now(&self) -> Duration {
		*self.now.lock()
	}

	async fn sleep(&self, duration: Duration) {
		self.advance(duration);
		tokio::task::yield_now().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn manual_clock_advances_on_sleep() {
		let clock = ManualClock::new();
		assert_eq!(clock.now(), Duration::ZERO);
		clock.sleep(Duration::from_millis(250)).await;
		clock.advance(Duration::from_millis(50));
		assert_eq!(clock.now(), Duration::from_millis(300));
	}

	#[test]
	fn manual_clock_clones_share_time() {
		let a = ManualClock::new();
		let b = a.clone();
		a.advance(Duration::from_secs(2));
		assert_eq!(b.now(), Duration::from_secs(2));
	}

	#[tokio::test]
	async fn system_clock_is_monotonic() {
		let clock = SystemClock::new();
		let t0 = clock.now();
		clock.sleep(Duration::from_millis(2)).await;
		assert!(clock.now() >= t0 + Duration::from_millis(2));
	}
}
