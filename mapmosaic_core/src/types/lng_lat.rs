use anyhow::Result;
use std::fmt::Debug;

use crate::MosaicError;

/// A point in geographic space:
/// - `f64` longitude, not wrapped, so points east of the antimeridian may exceed 180
/// - `f64` latitude (range: [-90, 90])
#[derive(Clone, Copy, PartialEq)]
pub struct LngLat {
	pub lng: f64,
	pub lat: f64,
}

impl LngLat {
	pub fn new(lng: f64, lat: f64) -> Self {
		Self { lng, lat }
	}

	/// Checks that both values are finite and the latitude is within its valid range.
	pub fn check(&self) -> Result<()> {
		if !self.lng.is_finite() {
			return Err(MosaicError::validation(format!("longitude ({}) must be finite", self.lng)));
		}
		if !(self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)) {
			return Err(MosaicError::validation(format!(
				"latitude ({}) must be between -90 and 90",
				self.lat
			)));
		}
		Ok(())
	}
}

impl Debug for LngLat {
	/// Formats the point as `"longitude, latitude"`.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}, {}", self.lng, self.lat)
	}
}
