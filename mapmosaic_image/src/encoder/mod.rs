//! Streaming raster encoders.
//!
//! An encoder is configured with an [`OutputFormat`], receives raw top-down RGBA
//! bytes in any chunking through [`RasterEncoder::write`], and hands out the
//! encoded bytes produced so far through [`RasterEncoder::take_output`]. Nothing
//! but the encoder's own working state is buffered, so arbitrarily large images
//! can be written.

mod png;
mod raw;

pub use self::png::*;
pub use self::raw::*;

use crate::OutputFormat;
use anyhow::Result;
use mapmosaic_core::{Blob, MosaicError};
use std::fmt::{self, Display};

pub trait RasterEncoder: Send {
	/// The configuration this encoder was created with.
	fn format(&self) -> &OutputFormat;

	/// Appends raw pixel bytes. Rows may be split across calls.
	fn write(&mut self, bytes: &[u8]) -> Result<()>;

	/// Removes and returns the encoded bytes produced since the last call.
	fn take_output(&mut self) -> Blob;

	/// Completes the image and returns the remaining encoded bytes.
	///
	/// Fails if fewer bytes than the format declares were written.
	fn finish(&mut self) -> Result<Blob>;
}

/// Output file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputEncoding {
	#[default]
	Png,
	/// Headerless RGBA bytes.
	Raw,
}

impl OutputEncoding {
	/// Creates an encoder for `format`. `png_speed` (0..=100) trades size for time.
	pub fn encoder(&self, format: OutputFormat, png_speed: Option<u8>) -> Result<Box<dyn RasterEncoder>> {
		Ok(match self {
			OutputEncoding::Png => Box::new(PngEncoder::new(format, png_speed)?),
			OutputEncoding::Raw => Box::new(RawEncoder::new(format)),
		})
	}

	pub fn extension(&self) -> &'static str {
		match self {
			OutputEncoding::Png => "png",
			OutputEncoding::Raw => "rgba",
		}
	}
}

impl Display for OutputEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			OutputEncoding::Png => "png",
			OutputEncoding::Raw => "raw",
		})
	}
}

/// Counts the raw bytes an encoder accepted against the size of the image.
#[derive(Debug)]
struct ByteBudget {
	written: u64,
	total: u64,
}

impl ByteBudget {
	fn new(format: &OutputFormat) -> Self {
		Self {
			written: 0,
			total: format.total_bytes(),
		}
	}

	fn spend(&mut self, len: usize) -> Result<()> {
		let written = self.written + len as u64;
		if written > self.total {
			return Err(MosaicError::stream_integrity(format!(
				"image holds {} bytes, but {written} were written",
				self.total
			)));
		}
		self.written = written;
		Ok(())
	}

	fn check_complete(&self) -> Result<()> {
		if self.written != self.total {
			return Err(MosaicError::stream_integrity(format!(
				"image needs {} bytes, but only {} were written",
				self.total, self.written
			)));
		}
		Ok(())
	}
}
