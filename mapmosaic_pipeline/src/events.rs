//! Out-of-band events of a mosaic run.
//!
//! The pixel stream carries only image bytes. Everything else a caller may want to
//! observe (the output format, the metadata, progress, warnings and log messages)
//! is broadcast on an [`EventBus`].

use crate::MosaicMetadata;
use arc_swap::ArcSwap;
use mapmosaic_image::OutputFormat;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// Dimensions and color space of the image. Sent once, before any pixel data.
	Format(OutputFormat),

	/// Zoom, extent and resolution of the image. Sent once, after `Format`.
	Metadata(MosaicMetadata),

	/// Share of the raw image bytes that passed through the pipeline.
	Progress { fraction: f64, bytes: u64, total: u64 },

	/// Rendering of a tile starts.
	Step { message: String },

	/// Something went wrong without aborting the run.
	Warning { message: String },

	/// A `log` record forwarded by a [`LogAdapter`].
	Log {
		level: log::Level,
		target: String,
		message: String,
	},
}

/// Unique identifier for event listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type EventListener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Thread-safe broadcast of [`Event`]s.
///
/// Listeners are called synchronously in the order they subscribed. Cloning the
/// bus shares its listeners.
#[derive(Clone)]
pub struct EventBus {
	listeners: Arc<ArcSwap<Vec<EventListener>>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self {
			listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
		}
	}

	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		let listener: EventListener = Arc::new(listener);
		let mut id = 0;
		self.listeners.rcu(|old| {
			let mut new = (**old).clone();
			id = new.len();
			new.push(listener.clone());
			new
		});
		ListenerId(id)
	}

	/// Calls every listener with `event`. A panicking listener does not stop the others.
	pub fn emit(&self, event: Event) {
		let listeners = self.listeners.load();
		for listener in listeners.iter() {
			let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
				listener(&event);
			}));
		}
	}

	pub fn step(&self, message: String) {
		self.emit(Event::Step { message });
	}

	pub fn warn(&self, message: String) {
		self.emit(Event::Warning { message });
	}

	pub fn progress(&self, bytes: u64, total: u64) {
		let fraction = if total == 0 { 1.0 } else { bytes as f64 / total as f64 };
		self.emit(Event::Progress { fraction, bytes, total });
	}

	/// Records every following event, mostly useful in tests.
	pub fn record(&self) -> EventLog {
		let log = EventLog::default();
		let events = log.events.clone();
		self.subscribe(move |event| events.lock().push(event.clone()));
		log
	}

	/// Creates a [`log::Log`] implementation that forwards records to this bus.
	pub fn create_log_adapter(&self) -> LogAdapter {
		LogAdapter {
			event_bus: self.clone(),
		}
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

/// Events captured by [`EventBus::record`].
#[derive(Clone, Default)]
pub struct EventLog {
	events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
	pub fn events(&self) -> Vec<Event> {
		self.events.lock().clone()
	}

	pub fn progress(&self) -> Vec<f64> {
		self
			.events
			.lock()
			.iter()
			.filter_map(|event| match event {
				Event::Progress { fraction, .. } => Some(*fraction),
				_ => None,
			})
			.collect()
	}

	pub fn warnings(&self) -> Vec<String> {
		self
			.events
			.lock()
			.iter()
			.filter_map(|event| match event {
				Event::Warning { message } => Some(message.clone()),
				_ => None,
			})
			.collect()
	}
}

/// Adapter to forward `log` records to an event bus.
pub struct LogAdapter {
	event_bus: EventBus,
}

impl log::Log for LogAdapter {
	fn enabled(&self, _metadata: &log::Metadata) -> bool {
		true
	}

	fn log(&self, record: &log::Record) {
		self.event_bus.emit(Event::Log {
			level: record.level(),
			target: record.target().to_string(),
			message: record.args().to_string(),
		});
	}

	fn flush(&self) {}
}
