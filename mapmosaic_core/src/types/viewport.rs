use crate::{LngLat, MosaicError};
use anyhow::{Context, Result};
use std::fmt::Debug;

/// A pixel-dimensioned window onto the map: `width × height` pixels centered on
/// `center` at `zoom`, with north up and no pitch.
///
/// The geographic extent is derived from these four values; see
/// [`Viewport::bounding_box`](crate::Viewport::bounding_box).
#[derive(Clone, Copy, PartialEq)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
	pub zoom: f64,
	pub center: LngLat,
}

impl Viewport {
	/// Creates a viewport, checking that both dimensions are positive, the zoom is
	/// finite and the center is a valid coordinate. The center longitude may lie past
	/// ±180° for tiles beyond the antimeridian.
	pub fn new(width: u32, height: u32, zoom: f64, center: LngLat) -> Result<Viewport> {
		if width == 0 || height == 0 {
			return Err(MosaicError::validation(format!(
				"viewport width and height must be > 0, got {width}x{height}"
			)));
		}
		if !zoom.is_finite() {
			return Err(MosaicError::validation(format!("viewport zoom must be finite, got {zoom}")));
		}
		center.check().context("invalid viewport center")?;
		Ok(Viewport {
			width,
			height,
			zoom,
			center,
		})
	}

	pub fn size(&self) -> [u32; 2] {
		[self.width, self.height]
	}
}

impl Debug for Viewport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Viewport({}x{}, center: {:?}, zoom: {})",
			self.width, self.height, self.center, self.zoom
		)
	}
}
