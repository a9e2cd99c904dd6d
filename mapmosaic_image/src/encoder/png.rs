use super::{ByteBudget, RasterEncoder};
use crate::OutputFormat;
use anyhow::{Context, Result, anyhow};
use mapmosaic_core::Blob;
use parking_lot::Mutex;
use png::{AdaptiveFilterType, BitDepth, ColorType, Compression, FilterType, StreamWriter};
use std::{io, sync::Arc};

/// In-memory byte sink shared between the PNG writer and the encoder that drains it.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
	fn take(&self) -> Vec<u8> {
		std::mem::take(&mut *self.0.lock())
	}
}

impl io::Write for SharedSink {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

/// Maps a speed of 0 (smallest file) to 100 (fastest) onto PNG settings.
fn compression_for_speed(speed: Option<u8>) -> (Compression, FilterType, AdaptiveFilterType) {
	use AdaptiveFilterType::{Adaptive, NonAdaptive};
	match speed.unwrap_or(10).clamp(0, 100) {
		0..20 => (Compression::Best, FilterType::Paeth, Adaptive),
		20..40 => (Compression::Default, FilterType::Paeth, Adaptive),
		40..60 => (Compression::Default, FilterType::Paeth, NonAdaptive),
		60..80 => (Compression::Default, FilterType::Avg, NonAdaptive),
		80..90 => (Compression::Fast, FilterType::Avg, NonAdaptive),
		_ => (Compression::Fast, FilterType::NoFilter, NonAdaptive),
	}
}

/// Writes an 8-bit RGBA PNG incrementally.
pub struct PngEncoder {
	format: OutputFormat,
	budget: ByteBudget,
	sink: SharedSink,
	writer: Option<StreamWriter<'static, SharedSink>>,
}

impl PngEncoder {
	pub fn new(format: OutputFormat, speed: Option<u8>) -> Result<Self> {
		let (compression, filter, adaptive) = compression_for_speed(speed);
		log::trace!("png encoder for {format:?}: {compression:?}, {filter:?}, {adaptive:?}");

		let sink = SharedSink::default();
		let mut encoder = png::Encoder::new(sink.clone(), format.width, format.height);
		encoder.set_color(ColorType::Rgba);
		encoder.set_depth(BitDepth::Eight);
		encoder.set_compression(compression);
		encoder.set_filter(filter);
		encoder.set_adaptive_filter(adaptive);

		let writer = encoder
			.write_header()
			.context("failed to write PNG header")?
			.into_stream_writer()
			.context("failed to start PNG image data")?;

		Ok(Self {
			budget: ByteBudget::new(&format),
			format,
			sink,
			writer: Some(writer),
		})
	}
}

impl RasterEncoder for PngEncoder {
	fn format(&self) -> &OutputFormat {
		&self.format
	}

	fn write(&mut self, bytes: &[u8]) -> Result<()> {
		self.budget.spend(bytes.len())?;
		let writer = self.writer.as_mut().ok_or_else(|| anyhow!("PNG image is already finished"))?;
		io::Write::write_all(writer, bytes).context("failed to encode PNG image data")
	}

	fn take_output(&mut self) -> Blob {
		Blob::from(self.sink.take())
	}

	fn finish(&mut self) -> Result<Blob> {
		self.budget.check_complete()?;
		let writer = self.writer.take().ok_or_else(|| anyhow!("PNG image is already finished"))?;
		writer.finish().context("failed to finish PNG image")?;
		Ok(self.take_output())
	}
}
