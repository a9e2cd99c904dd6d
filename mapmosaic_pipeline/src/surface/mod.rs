//! The renderer side of the pipeline.
//!
//! A [`RenderSurface`] is a single rendering context, such as an offscreen GL
//! canvas, that renders one tile at a time. It is borrowed exclusively by the
//! composer and acquired per tile through a [`SurfaceSession`].

mod graticule;
mod mock;
mod session;
mod settle;

pub use graticule::*;
pub use mock::*;
pub use session::*;
pub use settle::*;

use anyhow::Result;
use async_trait::async_trait;
use mapmosaic_core::{PixelBounds, Viewport};
use mapmosaic_image::PixelBuffer;

/// Everything a surface needs to render one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderJob {
	pub style: String,
	pub token: String,
	/// Viewport of the tile in display pixels.
	pub viewport: Viewport,
	pub pixel_ratio: u32,
	pub column: usize,
	pub row: usize,
	/// Placement of the tile in the final image, in display pixels.
	pub pixel_bounds: PixelBounds,
}

impl RenderJob {
	/// Size of the pixel buffer the surface has to deliver, in device pixels.
	pub fn device_size(&self) -> [u32; 2] {
		[
			self.viewport.width * self.pixel_ratio,
			self.viewport.height * self.pixel_ratio,
		]
	}
}

/// Loading state reported with every surface event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStatus {
	pub tiles_loaded: bool,
	pub style_loaded: bool,
}

impl RenderStatus {
	pub const COMPLETE: RenderStatus = RenderStatus {
		tiles_loaded: true,
		style_loaded: true,
	};

	pub const LOADING: RenderStatus = RenderStatus {
		tiles_loaded: false,
		style_loaded: false,
	};

	pub fn is_complete(&self) -> bool {
		self.tiles_loaded && self.style_loaded
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
	/// The surface finished its initial load.
	Load(RenderStatus),
	/// The surface drew a frame.
	Render(RenderStatus),
}

#[async_trait]
pub trait RenderSurface: Send {
	/// Largest renderbuffer edge the surface supports, in device pixels.
	/// `None` means the surface can not render at all.
	fn max_renderbuffer_size(&self) -> Option<u32>;

	/// Starts rendering `job`. Completion is reported through [`poll_events`](Self::poll_events).
	async fn load(&mut self, job: &RenderJob) -> Result<()>;

	/// Returns the events that happened since the last call.
	fn poll_events(&mut self) -> Vec<SurfaceEvent>;

	/// Reads back the rendered pixels of the current job.
	async fn read_pixels(&mut self) -> Result<PixelBuffer>;

	/// Frees everything that belongs to the current job.
	fn release(&mut self);
}
