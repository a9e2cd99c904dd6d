//! Progress reporting and cooperative yielding for byte streams.

use crate::EventBus;
use anyhow::Result;
use async_trait::async_trait;
use futures::{
	StreamExt,
	stream::{self, BoxStream},
};
use mapmosaic_core::{Blob, Clock, SystemClock};
use std::{sync::Arc, time::Duration};

/// The host loop that a long running stream hands control back to.
#[async_trait]
pub trait FrameScheduler: Send + Sync {
	/// Resolves at the next frame or tick of the host loop.
	async fn next_frame(&self);
}

/// Yields to the tokio scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct YieldScheduler;

#[async_trait]
impl FrameScheduler for YieldScheduler {
	async fn next_frame(&self) {
		tokio::task::yield_now().await;
	}
}

/// Wraps a byte stream, reports the share of `total` bytes that passed and hands
/// control to a [`FrameScheduler`] whenever `interval` has passed since the last
/// frame. The bytes themselves are not changed.
pub struct ProgressStage {
	total: u64,
	events: EventBus,
	clock: Arc<dyn Clock>,
	frames: Arc<dyn FrameScheduler>,
	interval: Duration,
}

struct ProgressState<'a> {
	inner: BoxStream<'a, Result<Blob>>,
	stage: ProgressStage,
	bytes: u64,
	last_frame: Duration,
	frame_due: bool,
}

impl ProgressStage {
	pub fn new(total: u64, events: EventBus) -> Self {
		Self {
			total,
			events,
			clock: SystemClock::arc(),
			frames: Arc::new(YieldScheduler),
			interval: Duration::from_millis(500),
		}
	}

	#[must_use]
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	#[must_use]
	pub fn frames(mut self, frames: Arc<dyn FrameScheduler>) -> Self {
		self.frames = frames;
		self
	}

	#[must_use]
	pub fn interval(mut self, interval: Duration) -> Self {
		self.interval = interval;
		self
	}

	pub fn wrap<'a>(self, inner: BoxStream<'a, Result<Blob>>) -> BoxStream<'a, Result<Blob>> {
		let state = ProgressState {
			inner,
			last_frame: self.clock.now(),
			stage: self,
			bytes: 0,
			frame_due: false,
		};

		stream::unfold(state, |mut state| async move {
			if state.frame_due {
				state.stage.frames.next_frame().await;
				state.last_frame = state.stage.clock.now();
				state.frame_due = false;
			}

			let item = state.inner.next().await?;
			if let Ok(blob) = &item {
				state.bytes += blob.len() as u64;
				state.stage.events.progress(state.bytes, state.stage.total);

				let now = state.stage.clock.now();
				if now.saturating_sub(state.last_frame) > state.stage.interval {
					state.frame_due = true;
				}
			}
			Some((item, state))
		})
		.boxed()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::TryStreamExt;
	use mapmosaic_core::ManualClock;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingFrames(AtomicUsize);

	#[async_trait]
	impl FrameScheduler for CountingFrames {
		async fn next_frame(&self) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Chunks that each take `ms` on `clock` to produce.
	fn slow_chunks(clock: ManualClock, count: usize, ms: u64) -> BoxStream<'static, Result<Blob>> {
		stream::iter(0..count)
			.then(move |i| {
				let clock = clock.clone();
				async move {
					clock.advance(Duration::from_millis(ms));
					Ok(Blob::from(vec![i as u8; 4]))
				}
			})
			.boxed()
	}

	#[tokio::test]
	async fn reports_monotonic_progress() {
		let events = EventBus::new();
		let log = events.record();
		let clock = ManualClock::new();
		let stream = ProgressStage::new(40, events)
			.clock(Arc::new(clock.clone()))
			.wrap(slow_chunks(clock, 10, 1));

		let chunks: Vec<Blob> = stream.try_collect().await.unwrap();
		assert_eq!(chunks.len(), 10);
		assert_eq!(chunks[3].as_slice(), &[3, 3, 3, 3]);

		let progress = log.progress();
		assert_eq!(progress.len(), 10);
		assert!(progress.windows(2).all(|w| w[0] <= w[1]));
		assert_eq!(progress[0], 0.1);
		assert_eq!(progress.last(), Some(&1.0));
	}

	#[tokio::test]
	async fn yields_after_interval() {
		let clock = ManualClock::new();
		let frames = Arc::new(CountingFrames::default());
		let stream = ProgressStage::new(40, EventBus::new())
			.clock(Arc::new(clock.clone()))
			.frames(frames.clone())
			.interval(Duration::from_millis(500))
			.wrap(slow_chunks(clock, 10, 200));

		let _: Vec<Blob> = stream.try_collect().await.unwrap();
		// a frame is due after chunks 3, 6 and 9, each taking 200 ms
		assert_eq!(frames.0.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn fast_streams_never_yield() {
		let clock = ManualClock::new();
		let frames = Arc::new(CountingFrames::default());
		let stream = ProgressStage::new(40, EventBus::new())
			.clock(Arc::new(clock.clone()))
			.frames(frames.clone())
			.wrap(slow_chunks(clock, 10, 0));
		let _: Vec<Blob> = stream.try_collect().await.unwrap();
		assert_eq!(frames.0.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn errors_pass_through() {
		let inner = stream::iter([Ok(Blob::from(vec![1; 4])), Err(anyhow::anyhow!("boom"))]).boxed();
		let events = EventBus::new();
		let log = events.record();
		let results: Vec<Result<Blob>> = ProgressStage::new(8, events).wrap(inner).collect().await;
		assert_eq!(results.len(), 2);
		assert!(results[1].is_err());
		assert_eq!(log.progress(), vec![0.5]);
	}
}
