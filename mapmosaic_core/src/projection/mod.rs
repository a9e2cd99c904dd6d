//! Web-Mercator math for north-up viewports.
//!
//! World coordinates are pixels on a square world of `TILE_SIZE · 2^zoom` pixels,
//! with the origin at the north-west corner (x grows east, y grows south). A
//! viewport maps its pixel `(0, 0)` to the world point half its size north-west of
//! its center.
//!
//! `project` and `unproject` are exact inverses: tiles planned from one viewport
//! line up without cumulative seams.

use crate::{GeoBBox, LngLat, MosaicError, Viewport};
use anyhow::Result;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Edge length of the zoom-0 world in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Earth circumference in meters used for the distance scales.
pub const EARTH_CIRCUMFERENCE: f64 = 40.03e6;

/// Ground distance per pixel at the center of a viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceScales {
	pub meters_per_pixel: f64,
	pub pixels_per_meter: f64,
	/// Pixels per degree of longitude and of latitude.
	pub pixels_per_degree: [f64; 2],
}

fn world_size(zoom: f64) -> f64 {
	TILE_SIZE * zoom.exp2()
}

/// Projects a coordinate to world pixels at `zoom`.
pub fn lng_lat_to_world(point: LngLat, zoom: f64) -> [f64; 2] {
	let size = world_size(zoom);
	let lambda = point.lng.to_radians();
	let phi = point.lat.to_radians();
	[
		size * (lambda + PI) / (2.0 * PI),
		size * (PI - (FRAC_PI_4 + phi * 0.5).tan().ln()) / (2.0 * PI),
	]
}

/// Inverse of [`lng_lat_to_world`].
pub fn world_to_lng_lat(world: [f64; 2], zoom: f64) -> LngLat {
	let size = world_size(zoom);
	let lambda = world[0] / size * 2.0 * PI - PI;
	let phi = 2.0 * (PI - world[1] / size * 2.0 * PI).exp().atan() - FRAC_PI_2;
	LngLat::new(lambda.to_degrees(), phi.to_degrees())
}

impl Viewport {
	/// Projects a coordinate to pixel offsets inside this viewport.
	pub fn project(&self, point: LngLat) -> [f64; 2] {
		let world = lng_lat_to_world(point, self.zoom);
		let center = lng_lat_to_world(self.center, self.zoom);
		[
			world[0] - center[0] + f64::from(self.width) / 2.0,
			world[1] - center[1] + f64::from(self.height) / 2.0,
		]
	}

	/// Converts pixel offsets inside this viewport to a coordinate.
	pub fn unproject(&self, pixel: [f64; 2]) -> LngLat {
		let center = lng_lat_to_world(self.center, self.zoom);
		world_to_lng_lat(
			[
				center[0] + pixel[0] - f64::from(self.width) / 2.0,
				center[1] + pixel[1] - f64::from(self.height) / 2.0,
			],
			self.zoom,
		)
	}

	/// The geographic extent of this viewport, from its top-left and bottom-right corners.
	///
	/// Longitudes are not wrapped: a viewport that reaches past the antimeridian has an
	/// extent with `west < -180` or `east > 180`.
	pub fn bounding_box(&self) -> GeoBBox {
		let nw = self.unproject([0.0, 0.0]);
		let se = self.unproject([f64::from(self.width), f64::from(self.height)]);
		GeoBBox::from_extent(nw.lng, se.lat, se.lng, nw.lat)
	}

	/// Local ground resolution at the center latitude.
	pub fn distance_scales(&self) -> DistanceScales {
		let size = world_size(self.zoom);
		let lat_cosine = self.center.lat.to_radians().cos();
		let pixels_per_degree_x = size / 360.0;
		let pixels_per_meter = size / EARTH_CIRCUMFERENCE / lat_cosine;
		DistanceScales {
			meters_per_pixel: 1.0 / pixels_per_meter,
			pixels_per_meter,
			pixels_per_degree: [pixels_per_degree_x, pixels_per_degree_x / lat_cosine],
		}
	}
}

/// Computes the viewport of exactly `width × height` pixels that contains `bbox`.
///
/// The bbox is first limited to the Web-Mercator latitude range. The zoom is the
/// smaller of the two zoom levels that fit the bbox horizontally and vertically, so
/// the bbox is inscribed without clipping and the other axis is padded.
///
/// ```
/// use mapmosaic_core::{GeoBBox, fit_viewport_to_bbox};
///
/// let bbox = GeoBBox::new(-10.0, -10.0, 10.0, 10.0).unwrap();
/// let viewport = fit_viewport_to_bbox(1024, 512, &bbox).unwrap();
/// assert!(viewport.bounding_box().contains(&bbox, 1e-9));
/// ```
pub fn fit_viewport_to_bbox(width: u32, height: u32, bbox: &GeoBBox) -> Result<Viewport> {
	let bbox = bbox.limited_to_mercator();
	fit_viewport_to_bounds(width, height, bbox.as_array())
}

/// Like [`fit_viewport_to_bbox`] but for raw `[west, south, east, north]` values, which
/// may lie outside the Mercator latitude range (as the corners of an
/// over-padded viewport do). Latitudes must stay strictly inside ±90°.
pub fn fit_viewport_to_bounds(width: u32, height: u32, bounds: [f64; 4]) -> Result<Viewport> {
	if width == 0 || height == 0 {
		return Err(MosaicError::validation(format!(
			"can not fit bounds into {width}x{height} pixels"
		)));
	}
	let [west, south, east, north] = bounds;
	if !(west < east && south < north) {
		return Err(MosaicError::validation(format!("can not fit degenerate bounds {bounds:?}")));
	}

	let nw = lng_lat_to_world(LngLat::new(west, north), 0.0);
	let se = lng_lat_to_world(LngLat::new(east, south), 0.0);
	let size = [(se[0] - nw[0]).abs(), (se[1] - nw[1]).abs()];
	if !(size[0].is_finite() && size[1].is_finite()) {
		return Err(MosaicError::validation(format!("bounds {bounds:?} can not be projected")));
	}

	let scale_x = f64::from(width) / size[0];
	let scale_y = f64::from(height) / size[1];
	let zoom = scale_x.min(scale_y).log2();
	let center = world_to_lng_lat([(nw[0] + se[0]) / 2.0, (nw[1] + se[1]) / 2.0], 0.0);

	Viewport::new(width, height, zoom, center)
}
