//! Decides when a surface has finished rendering a tile.
//!
//! A surface may keep drawing frames while icons, fonts and tiles arrive. Pixels
//! are read only after the surface reported a complete load and then stayed quiet
//! for the settle window. A frame drawn after read-back started is reported as a
//! late render: the image may miss whatever that frame added.

use crate::{RenderStatus, SurfaceEvent};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleState {
	/// No `Load` event yet.
	WaitingForLoad,
	/// Loaded, but tiles or style are still missing.
	Loading,
	/// Everything is loaded; waiting for the settle window to pass without a new frame.
	Settling { since: Duration },
	Stable,
	/// Pixels are being read.
	Reading,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleSignal {
	None,
	/// A frame arrived while stable; the surface has to settle again.
	Reopened,
	/// A frame arrived after read-back started.
	LateRender,
}

#[derive(Debug)]
pub struct RenderSettle {
	state: SettleState,
	settle: Duration,
	late_renders: usize,
}

impl RenderSettle {
	pub fn new(settle: Duration) -> Self {
		Self {
			state: SettleState::WaitingForLoad,
			settle,
			late_renders: 0,
		}
	}

	pub fn state(&self) -> SettleState {
		self.state
	}

	pub fn late_renders(&self) -> usize {
		self.late_renders
	}

	pub fn on_event(&mut self, event: SurfaceEvent, now: Duration) -> SettleSignal {
		use SettleState::*;
		match (self.state, event) {
			(WaitingForLoad, SurfaceEvent::Load(status)) => {
				self.restart(status, now);
				SettleSignal::None
			}
			(WaitingForLoad, SurfaceEvent::Render(_)) => SettleSignal::None,
			(Loading | Settling { .. }, SurfaceEvent::Load(status) | SurfaceEvent::Render(status)) => {
				self.restart(status, now);
				SettleSignal::None
			}
			(Stable, SurfaceEvent::Render(status)) => {
				self.restart(status, now);
				SettleSignal::Reopened
			}
			(Stable, SurfaceEvent::Load(_)) => SettleSignal::None,
			(Reading, SurfaceEvent::Render(_)) => {
				self.late_renders += 1;
				SettleSignal::LateRender
			}
			(Reading, SurfaceEvent::Load(_)) => SettleSignal::None,
		}
	}

	/// Advances to `Stable` once the settle window has passed. Returns whether the
	/// surface is stable.
	pub fn poll(&mut self, now: Duration) -> bool {
		if let SettleState::Settling { since } = self.state
			&& now.saturating_sub(since) >= self.settle
		{
			self.state = SettleState::Stable;
		}
		self.state == SettleState::Stable
	}

	/// Marks the start of read-back. Only allowed while stable.
	pub fn begin_read(&mut self) -> bool {
		if self.state == SettleState::Stable {
			self.state = SettleState::Reading;
			true
		} else {
			false
		}
	}

	fn restart(&mut self, status: RenderStatus, now: Duration) {
		self.state = if status.is_complete() {
			SettleState::Settling { since: now }
		} else {
			SettleState::Loading
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use SettleState::*;
	use SurfaceEvent::{Load, Render};

	const SETTLE: Duration = Duration::from_millis(2000);

	fn ms(value: u64) -> Duration {
		Duration::from_millis(value)
	}

	#[test]
	fn waits_for_load() {
		let mut settle = RenderSettle::new(SETTLE);
		assert_eq!(settle.on_event(Render(RenderStatus::COMPLETE), ms(0)), SettleSignal::None);
		assert_eq!(settle.state(), WaitingForLoad);
		assert!(!settle.poll(ms(10_000)));

		settle.on_event(Load(RenderStatus::COMPLETE), ms(100));
		assert_eq!(settle.state(), Settling { since: ms(100) });
		assert!(!settle.poll(ms(2099)));
		assert!(settle.poll(ms(2100)));
		assert_eq!(settle.state(), Stable);
	}

	#[test]
	fn incomplete_load_keeps_loading() {
		let mut settle = RenderSettle::new(SETTLE);
		settle.on_event(Load(RenderStatus::LOADING), ms(0));
		assert_eq!(settle.state(), Loading);
		assert!(!settle.poll(ms(5000)));

		settle.on_event(Render(RenderStatus::COMPLETE), ms(5000));
		assert_eq!(settle.state(), Settling { since: ms(5000) });

		// a frame that still misses tiles falls back to loading
		let partial = RenderStatus {
			tiles_loaded: false,
			style_loaded: true,
		};
		settle.on_event(Render(partial), ms(6000));
		assert_eq!(settle.state(), Loading);
	}

	#[test]
	fn render_restarts_the_window() {
		let mut settle = RenderSettle::new(SETTLE);
		settle.on_event(Load(RenderStatus::COMPLETE), ms(0));
		settle.on_event(Render(RenderStatus::COMPLETE), ms(1500));
		assert!(!settle.poll(ms(2000)));
		assert!(settle.poll(ms(3500)));
	}

	#[test]
	fn render_while_stable_reopens() {
		let mut settle = RenderSettle::new(SETTLE);
		settle.on_event(Load(RenderStatus::COMPLETE), ms(0));
		assert!(settle.poll(ms(2000)));
		assert_eq!(settle.on_event(Render(RenderStatus::COMPLETE), ms(2100)), SettleSignal::Reopened);
		assert!(!settle.poll(ms(2200)));
		assert!(!settle.begin_read());
		assert!(settle.poll(ms(4100)));
	}

	#[test]
	fn render_while_reading_is_late() {
		let mut settle = RenderSettle::new(SETTLE);
		settle.on_event(Load(RenderStatus::COMPLETE), ms(0));
		assert!(settle.poll(ms(2000)));
		assert!(settle.begin_read());
		assert_eq!(settle.state(), Reading);
		assert_eq!(settle.on_event(Render(RenderStatus::COMPLETE), ms(2001)), SettleSignal::LateRender);
		assert_eq!(settle.on_event(Render(RenderStatus::LOADING), ms(2002)), SettleSignal::LateRender);
		assert_eq!(settle.on_event(Load(RenderStatus::COMPLETE), ms(2003)), SettleSignal::None);
		assert_eq!(settle.late_renders(), 2);
		assert_eq!(settle.state(), Reading);
	}

	#[test]
	fn zero_window_is_stable_immediately() {
		let mut settle = RenderSettle::new(Duration::ZERO);
		settle.on_event(Load(RenderStatus::COMPLETE), ms(7));
		assert!(settle.poll(ms(7)));
	}
}
