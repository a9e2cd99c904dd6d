//! Splits a viewport into a grid of independently renderable tiles.
//!
//! Every tile gets its own [`Viewport`], sized exactly to its pixel bounds and fitted
//! to the geographic extent that the same pixels cover in the overall viewport. A
//! renderer that is asked for that viewport produces exactly the pixels the overall
//! image needs at that position.

use crate::{GeoBBox, MosaicError, PixelBounds, Viewport, fit_viewport_to_bounds};
use anyhow::{Context, Result};
use itertools::iproduct;
use std::fmt::Debug;

/// One cell of a [`TileGrid`].
#[derive(Clone, PartialEq)]
pub struct PlannedTile {
	pub column: usize,
	pub row: usize,
	/// The viewport to render for this tile.
	pub viewport: Viewport,
	/// Where the tile lands in the final image, in display pixels.
	pub pixel_bounds: PixelBounds,
	pub bbox: GeoBBox,
}

impl Debug for PlannedTile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PlannedTile")
			.field("column", &self.column)
			.field("row", &self.row)
			.field("pixel_bounds", &self.pixel_bounds)
			.field("zoom", &self.viewport.zoom)
			.field("bbox", &self.bbox)
			.finish()
	}
}

/// Tiles of a planned mosaic, stored column-major: `tiles[column][row]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
	viewport: Viewport,
	max_tile_edge: u32,
	tiles: Vec<Vec<PlannedTile>>,
}

impl TileGrid {
	/// Plans the tiles of `viewport` so that no tile is wider or taller than
	/// `max_tile_edge` pixels.
	///
	/// Tiles in the last column and the last row are clipped to the image edge.
	/// If one tile suffices, it reuses `viewport` unchanged.
	///
	/// ```
	/// use mapmosaic_core::{LngLat, TileGrid, Viewport};
	///
	/// let viewport = Viewport::new(601, 801, 9.0, LngLat::new(-6.6, 58.1)).unwrap();
	/// let grid = TileGrid::plan(&viewport, 256).unwrap();
	/// assert_eq!((grid.columns(), grid.rows()), (3, 4));
	/// assert_eq!(grid.column_widths(), vec![256, 256, 89]);
	/// ```
	pub fn plan(viewport: &Viewport, max_tile_edge: u32) -> Result<TileGrid> {
		if max_tile_edge == 0 {
			return Err(MosaicError::validation("maximum tile edge must be > 0"));
		}

		let (width, height) = (viewport.width, viewport.height);
		let columns = width.div_ceil(max_tile_edge);
		let rows = height.div_ceil(max_tile_edge);

		let tiles = if columns == 1 && rows == 1 {
			vec![vec![PlannedTile {
				column: 0,
				row: 0,
				viewport: *viewport,
				pixel_bounds: PixelBounds::new(0, width, height, 0),
				bbox: viewport.bounding_box(),
			}]]
		} else {
			(0..columns)
				.map(|column| {
					(0..rows)
						.map(|row| {
							let top = row * max_tile_edge;
							let left = column * max_tile_edge;
							let bounds = PixelBounds::new(
								top,
								width.min(left + max_tile_edge),
								height.min(top + max_tile_edge),
								left,
							);
							plan_tile(viewport, column as usize, row as usize, bounds)
						})
						.collect::<Result<Vec<_>>>()
				})
				.collect::<Result<Vec<_>>>()?
		};

		log::debug!(
			"planned {columns}x{rows} tiles with max edge {max_tile_edge} for {viewport:?}"
		);

		Ok(TileGrid {
			viewport: *viewport,
			max_tile_edge,
			tiles,
		})
	}

	/// The overall viewport this grid was planned for.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn max_tile_edge(&self) -> u32 {
		self.max_tile_edge
	}

	pub fn columns(&self) -> usize {
		self.tiles.len()
	}

	pub fn rows(&self) -> usize {
		self.tiles.first().map_or(0, Vec::len)
	}

	pub fn len(&self) -> usize {
		self.columns() * self.rows()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get(&self, column: usize, row: usize) -> Option<&PlannedTile> {
		self.tiles.get(column)?.get(row)
	}

	/// Iterates column by column, top to bottom within a column.
	pub fn iter(&self) -> impl Iterator<Item = &PlannedTile> {
		self.tiles.iter().flatten()
	}

	/// Iterates row by row, left to right within a row.
	pub fn iter_raster(&self) -> impl Iterator<Item = &PlannedTile> {
		iproduct!(0..self.rows(), 0..self.columns()).map(|(row, column)| &self.tiles[column][row])
	}

	/// The tiles of one tile row, left to right.
	pub fn row(&self, row: usize) -> impl Iterator<Item = &PlannedTile> {
		self.tiles.iter().filter_map(move |column| column.get(row))
	}

	pub fn row_heights(&self) -> Vec<u32> {
		self.tiles
			.first()
			.map(|column| column.iter().map(|tile| tile.pixel_bounds.height()).collect())
			.unwrap_or_default()
	}

	pub fn column_widths(&self) -> Vec<u32> {
		self
			.tiles
			.iter()
			.filter_map(|column| column.first())
			.map(|tile| tile.pixel_bounds.width())
			.collect()
	}
}

fn plan_tile(overall: &Viewport, column: usize, row: usize, bounds: PixelBounds) -> Result<PlannedTile> {
	let nw = overall.unproject([f64::from(bounds.left), f64::from(bounds.top)]);
	let se = overall.unproject([f64::from(bounds.right), f64::from(bounds.bottom)]);
	let corners = [nw.lng, se.lat, se.lng, nw.lat];

	let viewport = fit_viewport_to_bounds(bounds.width(), bounds.height(), corners)
		.with_context(|| format!("failed to fit tile (column {column}, row {row})"))?;
	let bbox = GeoBBox::from_extent(nw.lng, se.lat, se.lng, nw.lat);

	Ok(PlannedTile {
		column,
		row,
		viewport,
		pixel_bounds: bounds,
		bbox,
	})
}
