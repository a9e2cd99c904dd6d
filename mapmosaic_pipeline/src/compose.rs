//! Assembles the tiles of a [`TileGrid`] into one stream of image rows.
//!
//! Tiles are rendered one at a time in raster order. The buffers of one tile row
//! (a band) are kept until every image row of the band has been emitted by
//! concatenating the matching rows of all its tiles, left to right. The band is
//! dropped before the next band is rendered, so at most one band of pixels is held
//! in memory.

use crate::{EventBus, RenderJob, RenderSettings, RenderSurface, render_tile};
use anyhow::Result;
use futures::{
	StreamExt,
	stream::{self, BoxStream},
};
use mapmosaic_core::{Blob, Clock, MosaicError, TileGrid, PlannedTile};
use mapmosaic_image::PixelBuffer;
use std::sync::Arc;

pub struct MosaicComposer<'a, S: RenderSurface + ?Sized> {
	grid: TileGrid,
	surface: &'a mut S,
	settings: RenderSettings,
	clock: Arc<dyn Clock>,
	events: EventBus,
}

struct Band {
	buffers: Vec<PixelBuffer>,
	next_row: u32,
	height: u32,
}

struct ComposeState<'a, S: RenderSurface + ?Sized> {
	composer: MosaicComposer<'a, S>,
	band: Option<Band>,
	next_tile_row: usize,
	row_bytes: usize,
	emitted: u64,
	total: u64,
}

impl<'a, S: RenderSurface + ?Sized> MosaicComposer<'a, S> {
	pub fn new(
		grid: TileGrid,
		surface: &'a mut S,
		settings: RenderSettings,
		clock: Arc<dyn Clock>,
		events: EventBus,
	) -> Self {
		Self {
			grid,
			surface,
			settings,
			clock,
			events,
		}
	}

	/// Size of the assembled image in device pixels.
	pub fn device_size(&self) -> [u32; 2] {
		let viewport = self.grid.viewport();
		[
			viewport.width * self.settings.pixel_ratio,
			viewport.height * self.settings.pixel_ratio,
		]
	}

	/// Returns the image as a stream of full rows of RGBA bytes, top to bottom.
	///
	/// Nothing is rendered before the stream is polled. The stream ends after the
	/// first error.
	pub fn into_stream(self) -> BoxStream<'a, Result<Blob>>
	where
		S: 'a,
	{
		if self.grid.is_empty() {
			return stream::iter([Err(anyhow::Error::new(MosaicError::EmptyGrid))]).boxed();
		}

		let [width, height] = self.device_size();
		let row_bytes = width as usize * 4;
		let state = ComposeState {
			band: None,
			next_tile_row: 0,
			row_bytes,
			emitted: 0,
			total: row_bytes as u64 * u64::from(height),
			composer: self,
		};

		stream::try_unfold(state, |mut state| async move {
			let band_done = state.band.as_ref().is_none_or(|band| band.next_row == band.height);
			if band_done {
				state.band = None;
				if state.next_tile_row == state.composer.grid.rows() {
					if state.emitted != state.total {
						return Err(MosaicError::stream_integrity(format!(
							"mosaic has {} bytes, but {} were emitted",
							state.total, state.emitted
						)));
					}
					log::debug!("mosaic complete, {} bytes", state.emitted);
					return Ok(None);
				}
				state.band = Some(state.composer.render_band(state.next_tile_row).await?);
				state.next_tile_row += 1;
			}

			let Some(band) = state.band.as_mut() else {
				return Ok(None);
			};
			let mut row = Blob::with_capacity(state.row_bytes);
			for buffer in &band.buffers {
				row.extend_from_slice(buffer.row(band.next_row));
			}
			band.next_row += 1;
			state.emitted += row.len() as u64;

			Ok::<_, anyhow::Error>(Some((row, state)))
		})
		.boxed()
	}

	async fn render_band(&mut self, tile_row: usize) -> Result<Band> {
		log::trace!("rendering band {tile_row} of {}", self.grid.rows());
		let tiles: Vec<PlannedTile> = self.grid.row(tile_row).cloned().collect();
		let mut buffers = Vec::with_capacity(tiles.len());
		for tile in tiles {
			buffers.push(self.render(&tile).await?);
		}
		let height = buffers.first().map_or(0, PixelBuffer::height);
		Ok(Band {
			buffers,
			next_row: 0,
			height,
		})
	}

	async fn render(&mut self, tile: &PlannedTile) -> Result<PixelBuffer> {
		let ratio = self.settings.pixel_ratio;
		let job = RenderJob {
			style: self.settings.style.clone(),
			token: self.settings.token.clone(),
			viewport: tile.viewport,
			pixel_ratio: ratio,
			column: tile.column,
			row: tile.row,
			pixel_bounds: tile.pixel_bounds,
		};

		log::debug!("render tile ({}, {}) {:?}", tile.column, tile.row, tile.pixel_bounds);
		self.events.step(format!(
			"rendering tile {} of {}",
			tile.row * self.grid.columns() + tile.column + 1,
			self.grid.len()
		));

		let buffer = render_tile(&mut *self.surface, &job, &self.settings, self.clock.as_ref(), &self.events).await?;

		let expected = tile.pixel_bounds.scaled(ratio);
		if buffer.width() != expected.width() || buffer.height() != expected.height() {
			return Err(MosaicError::stream_integrity(format!(
				"tile ({}, {}) delivered {}x{} pixels, expected {}x{}",
				tile.column,
				tile.row,
				buffer.width(),
				buffer.height(),
				expected.width(),
				expected.height()
			)));
		}

		Ok(buffer.normalize())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MockSurface, MosaicConfig};
	use futures::TryStreamExt;
	use mapmosaic_core::{LngLat, ManualClock, Viewport};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn grid(width: u32, height: u32, max: u32) -> TileGrid {
		let viewport = Viewport::new(width, height, 12.0, LngLat::new(8.0, 47.0)).unwrap();
		TileGrid::plan(&viewport, max).unwrap()
	}

	fn settings(ratio: u32) -> RenderSettings {
		RenderSettings::new("style", "token", ratio, &MosaicConfig::default())
	}

	fn composer(grid: TileGrid, surface: &mut MockSurface, ratio: u32) -> MosaicComposer<'_, MockSurface> {
		MosaicComposer::new(grid, surface, settings(ratio), Arc::new(ManualClock::new()), EventBus::new())
	}

	fn expected_image(width: u32, height: u32) -> Vec<u8> {
		(0..height)
			.flat_map(|y| (0..width).flat_map(move |x| MockSurface::pixel(x, y)))
			.collect()
	}

	#[rstest]
	#[case::grid(10, 7, 4, 1)]
	#[case::grid_with_ratio(10, 7, 4, 2)]
	#[case::single_column(5, 9, 5, 2)]
	#[case::single_row(9, 3, 4, 3)]
	#[case::single_tile(6, 6, 100, 2)]
	#[case::one_pixel_tiles(3, 2, 1, 1)]
	#[tokio::test]
	async fn assembles_raster_rows(#[case] width: u32, #[case] height: u32, #[case] max: u32, #[case] ratio: u32) {
		let mut surface = MockSurface::new();
		let composer = composer(grid(width, height, max), &mut surface, ratio);
		assert_eq!(composer.device_size(), [width * ratio, height * ratio]);

		let rows: Vec<Blob> = composer.into_stream().try_collect().await.unwrap();
		assert_eq!(rows.len(), (height * ratio) as usize);
		assert!(rows.iter().all(|row| row.len() == (width * ratio * 4) as usize));

		let image: Vec<u8> = rows.into_iter().flat_map(Blob::into_vec).collect();
		assert_eq!(image.len() as u64, u64::from(width * ratio) * u64::from(height * ratio) * 4);
		assert_eq!(image, expected_image(width * ratio, height * ratio));

		let tiles = width.div_ceil(max) * height.div_ceil(max);
		assert_eq!(surface.loads().len(), tiles as usize);
		assert_eq!(surface.releases(), tiles as usize);
	}

	#[tokio::test]
	async fn tiles_are_rendered_in_raster_order() {
		let mut surface = MockSurface::new();
		let stream = composer(grid(10, 7, 4), &mut surface, 1).into_stream();
		let _: Vec<Blob> = stream.try_collect().await.unwrap();
		let order: Vec<(usize, usize)> = surface.loads().iter().map(|job| (job.column, job.row)).collect();
		assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
		assert!(surface.loads().iter().all(|job| job.style == "style" && job.token == "token"));
	}

	#[tokio::test]
	async fn rendering_is_lazy() {
		let mut surface = MockSurface::new();
		{
			let mut stream = composer(grid(10, 7, 4), &mut surface, 1).into_stream();
			stream.next().await.unwrap().unwrap();
		}
		// only the first band was rendered before the stream was dropped
		assert_eq!(surface.loads().len(), 3);
		assert_eq!(surface.releases(), 3);
	}

	#[tokio::test]
	async fn failing_tile_aborts_the_stream() {
		let mut surface = MockSurface::new().fail_tile(1, 1);
		let mut stream = composer(grid(10, 7, 4), &mut surface, 1).into_stream();

		let mut rows = 0;
		let err = loop {
			match stream.next().await {
				Some(Ok(_)) => rows += 1,
				Some(Err(err)) => break err,
				None => panic!("stream ended without error"),
			}
		};
		assert_eq!(rows, 4);
		match MosaicError::find(&err) {
			Some(MosaicError::TileRender { column, row, .. }) => assert_eq!((*column, *row), (1, 1)),
			other => panic!("unexpected error {other:?}"),
		}
		assert!(stream.next().await.is_none());
		drop(stream);
		assert_eq!(surface.loads().len(), surface.releases());
	}

	#[tokio::test]
	async fn short_tile_breaks_integrity() {
		let mut surface = MockSurface::new().short_tile(0, 0);
		let err = composer(grid(10, 7, 4), &mut surface, 2)
			.into_stream()
			.try_collect::<Vec<Blob>>()
			.await
			.unwrap_err();
		assert!(matches!(MosaicError::find(&err), Some(MosaicError::StreamIntegrity(_))));
	}

	#[tokio::test]
	async fn late_render_does_not_abort() {
		let mut surface = MockSurface::new().late_render(0, 1);
		let events = EventBus::new();
		let log = events.record();
		let stream = MosaicComposer::new(
			grid(10, 7, 4),
			&mut surface,
			settings(1),
			Arc::new(ManualClock::new()),
			events,
		)
		.into_stream();
		let rows: Vec<Blob> = stream.try_collect().await.unwrap();
		assert_eq!(rows.len(), 7);
		assert_eq!(log.warnings().len(), 1);
	}
}
