use crate::MosaicError;
use anyhow::Result;
use std::fmt::Debug;

pub(crate) const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
pub(crate) const MAX_MERCATOR_LNG: f64 = 180.0;

/// A geographical bounding box (`GeoBBox`) represents a rectangular area on a map
/// defined by its minimum and maximum longitude (x) and latitude (y) coordinates.
///
/// The bounding box is defined by four `f64` values:
/// - `west`: Minimum longitude.
/// - `south`: Minimum latitude.
/// - `east`: Maximum longitude.
/// - `north`: Maximum latitude.
///
/// Boxes built with [`GeoBBox::new`] are validated: `west < east`, `south < north` and
/// all values inside the valid longitude/latitude ranges. Extents derived from a
/// viewport use [`GeoBBox::from_extent`], whose longitudes may run past ±180°.
///
/// # Examples
///
/// ```
/// use mapmosaic_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-7.262, 57.7104, -6.0122, 58.5347).unwrap();
/// assert_eq!(bbox.as_array(), [-7.262, 57.7104, -6.0122, 58.5347]);
///
/// assert!(GeoBBox::new(10.0, 0.0, 10.0, 5.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	west: f64,
	south: f64,
	east: f64,
	north: f64,
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// # Errors
	/// Returns a validation error if a value is out of range, not finite, or if the box
	/// is empty (`west >= east` or `south >= north`).
	pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<GeoBBox> {
		GeoBBox {
			west,
			south,
			east,
			north,
		}
		.checked()
	}

	/// Creates the extent covered by a projected area, without range checks.
	///
	/// Longitudes are not wrapped, so an area that reaches across the antimeridian has
	/// `west < -180` or `east > 180`.
	///
	/// ```
	/// use mapmosaic_core::GeoBBox;
	///
	/// let extent = GeoBBox::from_extent(170.0, -1.0, 184.5, 1.0);
	/// assert_eq!(extent.east(), 184.5);
	/// assert!(GeoBBox::new(170.0, -1.0, 184.5, 1.0).is_err());
	/// ```
	#[must_use]
	pub fn from_extent(west: f64, south: f64, east: f64, north: f64) -> GeoBBox {
		GeoBBox {
			west,
			south,
			east,
			north,
		}
	}

	pub fn west(&self) -> f64 {
		self.west
	}

	pub fn south(&self) -> f64 {
		self.south
	}

	pub fn east(&self) -> f64 {
		self.east
	}

	pub fn north(&self) -> f64 {
		self.north
	}

	/// Returns the bounding box as `[west, south, east, north]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.west, self.south, self.east, self.north]
	}

	/// Returns a copy clamped to the latitude/longitude limits of the Web Mercator
	/// projection (`±85.05112877980659°`, `±180°`).
	///
	/// ```
	/// use mapmosaic_core::GeoBBox;
	///
	/// let bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap().limited_to_mercator();
	/// assert_eq!(bbox.as_array(), [-180.0, -85.05112877980659, 180.0, 85.05112877980659]);
	/// ```
	#[must_use]
	pub fn limited_to_mercator(mut self) -> GeoBBox {
		self.west = self.west.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.south = self.south.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.east = self.east.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.north = self.north.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self
	}

	/// Whether `other` lies inside `self`, allowing each edge to miss by `tolerance` degrees.
	pub fn contains(&self, other: &GeoBBox, tolerance: f64) -> bool {
		self.west <= other.west + tolerance
			&& self.south <= other.south + tolerance
			&& self.east >= other.east - tolerance
			&& self.north >= other.north - tolerance
	}

	fn checked(self) -> Result<Self> {
		let check = |ok: bool, message: String| if ok { Ok(()) } else { Err(MosaicError::validation(message)) };

		check(
			self.as_array().iter().all(|v| v.is_finite()),
			format!("bbox values must be finite, got {self:?}"),
		)?;
		check(self.west >= -180., format!("west ({}) must be >= -180", self.west))?;
		check(self.south >= -90., format!("south ({}) must be >= -90", self.south))?;
		check(self.east <= 180., format!("east ({}) must be <= 180", self.east))?;
		check(self.north <= 90., format!("north ({}) must be <= 90", self.north))?;
		check(
			self.west < self.east,
			format!("west ({}) must be < east ({})", self.west, self.east),
		)?;
		check(
			self.south < self.north,
			format!("south ({}) must be < north ({})", self.south, self.north),
		)?;
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "GeoBBox({}, {}, {}, {})", self.west, self.south, self.east, self.north)
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}
