//! Progress bar on stderr, fed by mosaic events.

use mapmosaic_pipeline::Event;
use parking_lot::Mutex;
use std::{
	io::{IsTerminal, Write},
	sync::Arc,
	time::{Duration, Instant},
};

struct BarState {
	message: String,
	bytes: u64,
	total: u64,
	start: Instant,
	next_draw: Instant,
	finished: bool,
}

#[derive(Clone)]
pub struct ProgressBar {
	state: Arc<Mutex<BarState>>,
	enabled: bool,
}

impl ProgressBar {
	/// Draws only when stderr is a terminal.
	pub fn new() -> Self {
		let start = Instant::now();
		Self {
			state: Arc::new(Mutex::new(BarState {
				message: "rendering".to_string(),
				bytes: 0,
				total: 0,
				start,
				next_draw: start,
				finished: false,
			})),
			enabled: std::io::stderr().is_terminal(),
		}
	}

	/// Handles one event. Warnings are always printed, even without a terminal.
	pub fn on_event(&self, event: &Event) {
		match event {
			Event::Progress { bytes, total, .. } => {
				let mut state = self.state.lock();
				state.bytes = *bytes;
				state.total = *total;
				self.redraw(&mut state);
			}
			Event::Step { message } => {
				let mut state = self.state.lock();
				state.message.clone_from(message);
			}
			Event::Warning { message } => {
				if self.enabled {
					eprint!("\r\x1b[2K");
				}
				eprintln!("warning: {message}");
			}
			_ => {}
		}
	}

	pub fn finish(&self) {
		let mut state = self.state.lock();
		state.bytes = state.total;
		state.finished = true;
		self.redraw(&mut state);
		if self.enabled {
			eprintln!();
		}
	}

	fn redraw(&self, state: &mut BarState) {
		if !self.enabled {
			return;
		}
		let now = Instant::now();
		if now < state.next_draw && !state.finished {
			return;
		}
		state.next_draw = now + Duration::from_millis(100);

		let line = render_line(state, terminal_width());
		let mut output = std::io::stderr();
		let _ = write!(output, "\r\x1b[2K{line}");
		let _ = output.flush();
	}
}

fn render_line(state: &BarState, width: usize) -> String {
	let total = state.total.max(1);
	let bytes = state.bytes.min(total);
	let elapsed = state.start.elapsed().as_secs_f64();
	let per_sec = if elapsed > 0.0 { bytes as f64 / elapsed } else { 0.0 };
	let eta_secs = if bytes > 0 {
		elapsed * ((total - bytes) as f64 / bytes as f64)
	} else {
		0.0
	};

	let percent = (bytes as f64 * 100.0 / total as f64).floor() as u64;
	let rate = format!("{}B/s", human_number(per_sec));
	let eta = format_eta(Duration::from_secs_f64(eta_secs));
	let message = &state.message;

	let get_line = |bar: &str| format!("{message}▕{bar}▏({percent:>3}%) {rate:>8} {eta:>5}");
	let available = width.saturating_sub(get_line("").chars().count());
	get_line(&make_bar(bytes, total, available))
}

fn human_number(v: f64) -> String {
	let abs = v.abs();
	if abs >= 1_000_000_000.0 {
		format!("{:.1}G", v / 1_000_000_000.0)
	} else if abs >= 1_000_000.0 {
		format!("{:.1}M", v / 1_000_000.0)
	} else if abs >= 1_000.0 {
		format!("{:.1}k", v / 1_000.0)
	} else {
		format!("{v:.0}")
	}
}

fn format_eta(d: Duration) -> String {
	let total = d.as_secs();
	let hours = total / 3_600;
	let minutes = (total % 3_600) / 60;
	let seconds = total % 60;

	if total < 60 {
		format!("{seconds}s")
	} else if total < 3_600 {
		format!("{minutes:02}:{seconds:02}")
	} else {
		format!("{hours}:{minutes:02}:{seconds:02}")
	}
}

fn terminal_width() -> usize {
	terminal_size::terminal_size().map_or(80, |(width, _)| width.0.max(10) as usize)
}

fn make_bar(pos: u64, len: u64, width: usize) -> String {
	let width = width.max(1);
	let frac = (pos as f64 / len.max(1) as f64).clamp(0.0, 1.0);
	let exact = frac * width as f64;
	let whole = (exact.floor() as usize).min(width);
	let rem = exact - whole as f64;

	// thinnest last
	let partials = ["█", "▉", "▊", "▋", "▌", "▍", "▎", "▏"];

	let mut bar = "█".repeat(whole);
	if whole < width {
		let index = ((1.0 - rem) * 8.0).floor() as usize;
		if rem > 0.0 && index < 8 {
			bar.push_str(partials[index]);
		} else {
			bar.push(' ');
		}
		bar.push_str(&" ".repeat(width - whole - 1));
	}
	bar
}
