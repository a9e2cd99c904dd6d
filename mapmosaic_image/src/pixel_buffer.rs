use crate::{ColorSpace, unpremultiply};
use anyhow::Result;
use mapmosaic_core::MosaicError;
use std::fmt::{self, Debug};

/// Vertical order of the rows in a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowOrder {
	#[default]
	TopDown,
	/// First row is the bottom of the image, as GL read-back delivers it.
	BottomUp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMode {
	#[default]
	Straight,
	Premultiplied,
}

/// Raw RGBA8 pixels of one rendered tile.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
	width: u32,
	height: u32,
	data: Vec<u8>,
	row_order: RowOrder,
	alpha: AlphaMode,
}

impl PixelBuffer {
	/// Wraps top-down, straight-alpha RGBA data of `width × height` pixels.
	///
	/// Fails with a stream integrity error if `data` has the wrong length.
	pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<PixelBuffer> {
		let expected = width as usize * height as usize * ColorSpace::Rgba.channels() as usize;
		if data.len() != expected {
			return Err(MosaicError::stream_integrity(format!(
				"a {width}x{height} pixel buffer needs {expected} bytes, got {}",
				data.len()
			)));
		}
		Ok(PixelBuffer {
			width,
			height,
			data,
			row_order: RowOrder::TopDown,
			alpha: AlphaMode::Straight,
		})
	}

	#[must_use]
	pub fn with_row_order(mut self, row_order: RowOrder) -> PixelBuffer {
		self.row_order = row_order;
		self
	}

	#[must_use]
	pub fn with_alpha(mut self, alpha: AlphaMode) -> PixelBuffer {
		self.alpha = alpha;
		self
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn row_order(&self) -> RowOrder {
		self.row_order
	}

	pub fn alpha(&self) -> AlphaMode {
		self.alpha
	}

	pub fn row_bytes(&self) -> usize {
		self.width as usize * ColorSpace::Rgba.channels() as usize
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.data
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.data
	}

	/// Returns the bytes of image row `y`, counted from the top, regardless of the
	/// stored row order.
	///
	/// # Panics
	///
	/// Panics if `y >= height`.
	pub fn row(&self, y: u32) -> &[u8] {
		assert!(y < self.height, "row {y} is outside of a buffer with {} rows", self.height);
		let index = match self.row_order {
			RowOrder::TopDown => y,
			RowOrder::BottomUp => self.height - 1 - y,
		} as usize;
		let row_bytes = self.row_bytes();
		&self.data[index * row_bytes..(index + 1) * row_bytes]
	}

	/// Converts to top-down rows with straight alpha.
	#[must_use]
	pub fn normalize(mut self) -> PixelBuffer {
		if self.row_order == RowOrder::BottomUp {
			let row_bytes = self.row_bytes();
			let rows = self.height as usize;
			for top in 0..rows / 2 {
				let bottom = rows - 1 - top;
				let (upper, lower) = self.data.split_at_mut(bottom * row_bytes);
				upper[top * row_bytes..(top + 1) * row_bytes].swap_with_slice(&mut lower[..row_bytes]);
			}
			self.row_order = RowOrder::TopDown;
		}
		if self.alpha == AlphaMode::Premultiplied {
			self.data.chunks_exact_mut(4).for_each(unpremultiply);
			self.alpha = AlphaMode::Straight;
		}
		self
	}
}

impl Debug for PixelBuffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"PixelBuffer({}x{}, {:?}, {:?})",
			self.width, self.height, self.row_order, self.alpha
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn numbered(width: u32, height: u32) -> Vec<u8> {
		(0..width * height)
			.flat_map(|i| [i as u8, (i * 2) as u8, 0, 255])
			.collect()
	}

	#[test]
	fn length_is_checked() {
		let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
		assert!(matches!(MosaicError::find(&err), Some(MosaicError::StreamIntegrity(_))));
		assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
	}

	#[test]
	fn rows_top_down() {
		let buffer = PixelBuffer::new(2, 3, numbered(2, 3)).unwrap();
		assert_eq!(buffer.row(0), &[0, 0, 0, 255, 1, 2, 0, 255]);
		assert_eq!(buffer.row(2), &[4, 8, 0, 255, 5, 10, 0, 255]);
	}

	#[test]
	fn bottom_up_rows_are_flipped() {
		let buffer = PixelBuffer::new(2, 3, numbered(2, 3))
			.unwrap()
			.with_row_order(RowOrder::BottomUp);
		assert_eq!(buffer.row(0), &[4, 8, 0, 255, 5, 10, 0, 255]);

		let rows: Vec<Vec<u8>> = (0..3).map(|y| buffer.row(y).to_vec()).collect();
		let normalized = buffer.normalize();
		assert_eq!(normalized.row_order(), RowOrder::TopDown);
		for (y, row) in rows.iter().enumerate() {
			assert_eq!(normalized.row(y as u32), row.as_slice());
		}
		assert_eq!(normalized.as_slice()[..8], [4, 8, 0, 255, 5, 10, 0, 255]);
	}

	#[test]
	fn even_height_flip() {
		let buffer = PixelBuffer::new(1, 4, numbered(1, 4))
			.unwrap()
			.with_row_order(RowOrder::BottomUp)
			.normalize();
		let reds: Vec<u8> = buffer.as_slice().chunks(4).map(|p| p[0]).collect();
		assert_eq!(reds, vec![3, 2, 1, 0]);
	}

	#[test]
	fn premultiplied_alpha_is_removed() {
		let buffer = PixelBuffer::new(1, 1, vec![64, 32, 0, 128])
			.unwrap()
			.with_alpha(AlphaMode::Premultiplied)
			.normalize();
		assert_eq!(buffer.alpha(), AlphaMode::Straight);
		assert_eq!(buffer.into_vec(), vec![128, 64, 0, 128]);
	}

	#[test]
	fn debug_format() {
		let buffer = PixelBuffer::new(3, 1, vec![0; 12]).unwrap();
		assert_eq!(format!("{buffer:?}"), "PixelBuffer(3x1, TopDown, Straight)");
	}
}
