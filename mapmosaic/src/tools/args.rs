use anyhow::{Context, Result, bail};
use mapmosaic_pipeline::MosaicOptions;

/// Options shared by all subcommands that describe the image.
#[derive(clap::Args, Debug)]
pub struct MosaicArgs {
	/// region to show
	#[arg(
		long,
		short,
		value_name = "lon_min,lat_min,lon_max,lat_max",
		allow_hyphen_values = true,
		display_order = 1
	)]
	pub bbox: Option<String>,

	/// image width in display pixels
	#[arg(long, value_name = "int", display_order = 1)]
	pub width: Option<u32>,

	/// image height in display pixels
	#[arg(long, value_name = "int", display_order = 1)]
	pub height: Option<u32>,

	/// device pixels per display pixel, 1 to 4
	#[arg(long, short = 'r', value_name = "int", display_order = 1)]
	pub pixel_ratio: Option<u32>,

	/// upper bound for the edge of a tile in device pixels
	#[arg(long, value_name = "int", display_order = 2)]
	pub max_surface_size: Option<u32>,
}

impl MosaicArgs {
	/// Overrides the fields of `options` that were given on the command line.
	pub fn apply(&self, options: &mut MosaicOptions) -> Result<()> {
		if let Some(bbox) = &self.bbox {
			options.bbox = parse_bbox(bbox)?;
		}
		if let Some(width) = self.width {
			options.width = width;
		}
		if let Some(height) = self.height {
			options.height = height;
		}
		if let Some(pixel_ratio) = self.pixel_ratio {
			options.pixel_ratio = pixel_ratio;
		}
		Ok(())
	}
}

pub fn parse_bbox(bbox: &str) -> Result<[f64; 4]> {
	log::trace!("parsing bbox argument: {bbox:?}");
	let values = bbox
		.split(&[' ', ',', ';'])
		.filter(|s| !s.is_empty())
		.map(|s| s.parse::<f64>().with_context(|| format!("bbox value {s:?} is not a number")))
		.collect::<Result<Vec<f64>>>()?;

	match values.as_slice() {
		[west, south, east, north] => Ok([*west, *south, *east, *north]),
		_ => bail!("bbox must contain exactly 4 numbers, got {bbox:?}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("13.0,52.3,13.8,52.7", [13.0, 52.3, 13.8, 52.7])]
	#[case("-7.262 57.7104 -6.0122 58.5347", [-7.262, 57.7104, -6.0122, 58.5347])]
	#[case("1; 2; 3; 4", [1.0, 2.0, 3.0, 4.0])]
	fn parses(#[case] input: &str, #[case] expected: [f64; 4]) {
		assert_eq!(parse_bbox(input).unwrap(), expected);
	}

	#[rstest]
	#[case("1,2,3")]
	#[case("1,2,3,4,5")]
	#[case("1,2,three,4")]
	#[case("")]
	fn rejects(#[case] input: &str) {
		assert!(parse_bbox(input).is_err());
	}

	#[test]
	fn applies_only_given_values() {
		let args = MosaicArgs {
			bbox: None,
			width: Some(300),
			height: None,
			pixel_ratio: Some(1),
			max_surface_size: None,
		};
		let mut options = MosaicOptions::default();
		args.apply(&mut options).unwrap();
		assert_eq!([options.width, options.height, options.pixel_ratio], [300, 1600, 1]);
		assert_eq!(options.bbox, MosaicOptions::default().bbox);
	}
}
