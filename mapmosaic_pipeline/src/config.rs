use crate::MosaicOptions;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
	time::Duration,
};

/// Tuning of the render loop and the encoder. Every field has a default, so an
/// empty document is a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicConfig {
	/// Upper bound for the edge of a rendered tile, in device pixels.
	pub max_surface_size: u32,

	/// Quiet time after the last render event before pixels are read.
	pub settle_timeout_ms: u64,

	/// How long a single tile may take to become stable.
	pub render_timeout_ms: u64,

	pub poll_interval_ms: u64,

	/// How often the progress stage hands control back to the host loop.
	pub yield_interval_ms: u64,

	/// PNG compression speed from 0 (smallest) to 100 (fastest).
	pub png_speed: u8,
}

impl Default for MosaicConfig {
	fn default() -> Self {
		Self {
			max_surface_size: 4000,
			settle_timeout_ms: 2000,
			render_timeout_ms: 60_000,
			poll_interval_ms: 16,
			yield_interval_ms: 500,
			png_speed: 10,
		}
	}
}

impl MosaicConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open config {path:?}"))?;
		Self::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse config {path:?}"))
	}

	pub fn check(&self) -> Result<()> {
		ensure!(self.max_surface_size > 0, "max_surface_size must be > 0");
		ensure!(self.poll_interval_ms > 0, "poll_interval_ms must be > 0");
		ensure!(
			self.render_timeout_ms >= self.settle_timeout_ms,
			"render_timeout_ms ({}) must not be shorter than settle_timeout_ms ({})",
			self.render_timeout_ms,
			self.settle_timeout_ms
		);
		ensure!(self.png_speed <= 100, "png_speed must be between 0 and 100");
		Ok(())
	}

	pub fn settle_timeout(&self) -> Duration {
		Duration::from_millis(self.settle_timeout_ms)
	}

	pub fn render_timeout(&self) -> Duration {
		Duration::from_millis(self.render_timeout_ms)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn yield_interval(&self) -> Duration {
		Duration::from_millis(self.yield_interval_ms)
	}
}

/// A complete render job as stored in a YAML file:
///
/// ```yaml
/// options:
///   bbox: [13.0, 52.3, 13.8, 52.7]
///   width: 800
///   height: 600
/// config:
///   png_speed: 80
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct JobFile {
	pub options: MosaicOptions,
	pub config: MosaicConfig,
}

impl JobFile {
	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open job file {path:?}"))?;
		serde_yaml_ng::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse job file {path:?}"))
	}
}
