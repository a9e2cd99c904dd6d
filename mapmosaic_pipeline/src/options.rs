use anyhow::{Context, Result};
use mapmosaic_core::{GeoBBox, MosaicError};
use serde::Deserialize;

/// What to render: the map style, the region and the size of the image.
///
/// `width` and `height` are in display pixels; the output image has
/// `pixel_ratio` device pixels per display pixel in each direction.
///
/// ```
/// use mapmosaic_pipeline::MosaicOptions;
///
/// let options = MosaicOptions {
/// 	token: Some("secret".into()),
/// 	..MosaicOptions::default()
/// };
/// options.validate().unwrap();
/// assert_eq!(options.output_size().unwrap(), [1202, 1602]);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicOptions {
	/// Style URL handed to the renderer.
	pub style: String,

	/// Region of interest as `[west, south, east, north]`.
	pub bbox: [f64; 4],

	pub width: u32,
	pub height: u32,

	/// Device pixels per display pixel, 1 to 4.
	pub pixel_ratio: u32,

	/// Access token for the style and its sources.
	pub token: Option<String>,
}

impl Default for MosaicOptions {
	fn default() -> Self {
		Self {
			style: "mapbox://styles/mapbox/outdoors-v10".to_string(),
			bbox: [-7.262, 57.7104, -6.0122, 58.5347],
			width: 1200,
			height: 1600,
			pixel_ratio: 2,
			token: None,
		}
	}
}

impl MosaicOptions {
	/// Checks every option. Nothing is planned or rendered for invalid options.
	pub fn validate(&self) -> Result<()> {
		match &self.token {
			Some(token) if !token.trim().is_empty() => {}
			_ => return Err(MosaicError::validation("an access token is required")),
		}
		self.validate_layout()
	}

	/// Checks everything that determines the size and extent of the image, which is
	/// all but the access token.
	pub fn validate_layout(&self) -> Result<()> {
		self.geo_bbox()?;
		if self.width == 0 || self.height == 0 {
			return Err(MosaicError::validation(format!(
				"width and height must be > 0, got {}x{}",
				self.width, self.height
			)));
		}
		if !(1..=4).contains(&self.pixel_ratio) {
			return Err(MosaicError::validation(format!(
				"pixel ratio must be an integer between 1 and 4, got {}",
				self.pixel_ratio
			)));
		}
		self.output_size()?;
		Ok(())
	}

	pub fn geo_bbox(&self) -> Result<GeoBBox> {
		GeoBBox::try_from(self.bbox).context("invalid bbox")
	}

	/// Size of the output image in device pixels.
	///
	/// Each dimension is rounded down to a multiple of the pixel ratio and then grown by
	/// one ratio step, so that it is always a multiple of the ratio and never smaller
	/// than requested.
	pub fn output_size(&self) -> Result<[u32; 2]> {
		let ratio = self.pixel_ratio.max(1);
		let adjust = |value: u32| {
			(value - value % ratio)
				.checked_add(ratio)
				.ok_or_else(|| MosaicError::validation(format!("image size {value} is too large")))
		};
		Ok([adjust(self.width)?, adjust(self.height)?])
	}

	/// Size of the image in display pixels, the unit of planning.
	pub fn display_size(&self) -> Result<[u32; 2]> {
		let ratio = self.pixel_ratio.max(1);
		Ok(self.output_size()?.map(|value| value / ratio))
	}

	pub fn token(&self) -> &str {
		self.token.as_deref().unwrap_or_default()
	}
}
