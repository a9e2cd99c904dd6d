use crate::ColorSpace;
use anyhow::Result;
use mapmosaic_core::MosaicError;
use std::fmt::{self, Debug};

/// Dimensions and color layout of an encoded image.
///
/// Broadcast once before any pixel data, so consumers can size their buffers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputFormat {
	pub width: u32,
	pub height: u32,
	pub color_space: ColorSpace,
}

impl OutputFormat {
	pub fn new(width: u32, height: u32, color_space: ColorSpace) -> Result<OutputFormat> {
		if width == 0 || height == 0 {
			return Err(MosaicError::validation(format!(
				"output image must not be empty, got {width}x{height}"
			)));
		}
		Ok(OutputFormat {
			width,
			height,
			color_space,
		})
	}

	pub fn rgba(width: u32, height: u32) -> Result<OutputFormat> {
		Self::new(width, height, ColorSpace::Rgba)
	}

	/// Bytes in one row of raw pixels.
	pub fn row_bytes(&self) -> usize {
		self.width as usize * self.color_space.channels() as usize
	}

	/// Bytes of the whole raw image.
	pub fn total_bytes(&self) -> u64 {
		self.row_bytes() as u64 * u64::from(self.height)
	}
}

impl Debug for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "OutputFormat({}x{} {})", self.width, self.height, self.color_space)
	}
}
