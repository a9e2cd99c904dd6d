use super::args::MosaicArgs;
use anyhow::Result;
use mapmosaic_pipeline::{MosaicBuilder, MosaicConfig, MosaicOptions, MosaicPlan};
use std::fmt::Write;

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true)]
pub struct Subcommand {
	#[command(flatten)]
	mosaic: MosaicArgs,

	/// largest renderbuffer the render surface supports, in device pixels
	#[arg(long, value_name = "int", default_value_t = 8192, display_order = 2)]
	renderbuffer_size: u32,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mut options = MosaicOptions::default();
	arguments.mosaic.apply(&mut options)?;

	let mut config = MosaicConfig::default();
	if let Some(size) = arguments.mosaic.max_surface_size {
		config.max_surface_size = size;
	}

	let plan = MosaicBuilder::new(options)
		.config(config)
		.plan(Some(arguments.renderbuffer_size))?;
	print!("{}", describe(&plan));
	Ok(())
}

fn describe(plan: &MosaicPlan) -> String {
	let format = &plan.format;
	let [west, south, east, north] = plan.metadata.bbox.as_array();
	let grid = &plan.grid;

	let mut text = String::new();
	let _ = writeln!(
		text,
		"image:      {}x{} {} ({}x{} display pixels)",
		format.width, format.height, format.color_space, plan.viewport.width, plan.viewport.height
	);
	let _ = writeln!(text, "zoom:       {:.4}", plan.metadata.zoom);
	let _ = writeln!(text, "bbox:       {west:.5}, {south:.5}, {east:.5}, {north:.5}");
	let _ = writeln!(
		text,
		"resolution: {:.3} m per display pixel",
		plan.metadata.meters_per_pixel
	);
	let _ = writeln!(
		text,
		"tiles:      {} columns x {} rows, edge at most {} display pixels",
		grid.columns(),
		grid.rows(),
		grid.max_tile_edge()
	);
	let _ = writeln!(text, "{:>6} {:>4} {:>6} {:>6} {:>6} {:>6}", "column", "row", "left", "top", "width", "height");
	for tile in grid.iter_raster() {
		let bounds = &tile.pixel_bounds;
		let _ = writeln!(
			text,
			"{:>6} {:>4} {:>6} {:>6} {:>6} {:>6}",
			tile.column,
			tile.row,
			bounds.left,
			bounds.top,
			bounds.width(),
			bounds.height()
		);
	}
	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::run_command;

	#[test]
	fn lewis_in_one_tile() {
		let plan = MosaicBuilder::new(MosaicOptions::default()).plan(Some(8192)).unwrap();
		let text = describe(&plan);
		assert!(text.starts_with("image:      1202x1602 rgba (601x801 display pixels)\n"));
		assert!(text.contains("tiles:      1 columns x 1 rows, edge at most 2000 display pixels\n"));
		assert!(text.ends_with("     0    0      0      0    601    801\n"));
	}

	#[test]
	fn small_renderbuffer() {
		let plan = MosaicBuilder::new(MosaicOptions::default()).plan(Some(512)).unwrap();
		let text = describe(&plan);
		assert!(text.contains("3 columns x 4 rows, edge at most 256"));
		assert_eq!(text.lines().count(), 6 + 12);
	}

	#[test]
	fn command() {
		run_command(vec!["mapmosaic", "plan", "--bbox=13.0,52.3,13.8,52.7", "--width=800", "--height=600"]).unwrap();
		assert!(run_command(vec!["mapmosaic", "plan", "--bbox=1,2,3"]).is_err());
		assert!(run_command(vec!["mapmosaic", "plan", "--pixel-ratio=5"]).is_err());
	}
}
