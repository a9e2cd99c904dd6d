use crate::{RenderJob, RenderStatus, RenderSurface, SurfaceEvent};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use mapmosaic_image::{PixelBuffer, RowOrder};

/// Scriptable surface for tests.
///
/// Every device pixel is painted with its position in the whole image (see
/// [`MockSurface::pixel`]), so an assembled mosaic can be checked byte by byte.
/// Buffers are delivered bottom-up, like GL read-back.
#[derive(Debug)]
pub struct MockSurface {
	max_renderbuffer_size: Option<u32>,
	fail_tile: Option<(usize, usize)>,
	short_tile: Option<(usize, usize)>,
	late_render_tile: Option<(usize, usize)>,
	never_settle: bool,
	loading_frames: usize,
	current: Option<RenderJob>,
	pending: Vec<SurfaceEvent>,
	loads: Vec<RenderJob>,
	releases: usize,
}

impl Default for MockSurface {
	fn default() -> Self {
		Self::new()
	}
}

impl MockSurface {
	pub fn new() -> Self {
		Self {
			max_renderbuffer_size: Some(16_384),
			fail_tile: None,
			short_tile: None,
			late_render_tile: None,
			never_settle: false,
			loading_frames: 0,
			current: None,
			pending: Vec::new(),
			loads: Vec::new(),
			releases: 0,
		}
	}

	#[must_use]
	pub fn with_max_renderbuffer_size(mut self, size: Option<u32>) -> Self {
		self.max_renderbuffer_size = size;
		self
	}

	/// `load` fails for this tile.
	#[must_use]
	pub fn fail_tile(mut self, column: usize, row: usize) -> Self {
		self.fail_tile = Some((column, row));
		self
	}

	/// This tile delivers one row less than requested.
	#[must_use]
	pub fn short_tile(mut self, column: usize, row: usize) -> Self {
		self.short_tile = Some((column, row));
		self
	}

	/// This tile draws another frame after its pixels were read.
	#[must_use]
	pub fn late_render(mut self, column: usize, row: usize) -> Self {
		self.late_render_tile = Some((column, row));
		self
	}

	/// Tiles never finish loading.
	#[must_use]
	pub fn never_settle(mut self) -> Self {
		self.never_settle = true;
		self
	}

	/// Each tile draws `frames` incomplete frames before it is fully loaded.
	#[must_use]
	pub fn loading_frames(mut self, frames: usize) -> Self {
		self.loading_frames = frames;
		self
	}

	/// Jobs passed to `load`, in order.
	pub fn loads(&self) -> &[RenderJob] {
		&self.loads
	}

	pub fn releases(&self) -> usize {
		self.releases
	}

	/// The color of the device pixel at `(x, y)` of the whole image.
	pub fn pixel(x: u32, y: u32) -> [u8; 4] {
		[
			(x & 0xff) as u8,
			(y & 0xff) as u8,
			(((x >> 8) & 0x0f) | (((y >> 8) & 0x0f) << 4)) as u8,
			255,
		]
	}

	fn is(tile: Option<(usize, usize)>, job: &RenderJob) -> bool {
		tile == Some((job.column, job.row))
	}
}

#[async_trait]
impl RenderSurface for MockSurface {
	fn max_renderbuffer_size(&self) -> Option<u32> {
		self.max_renderbuffer_size
	}

	async fn load(&mut self, job: &RenderJob) -> Result<()> {
		self.loads.push(job.clone());
		if Self::is(self.fail_tile, job) {
			bail!("mock failure at tile ({}, {})", job.column, job.row);
		}
		if self.never_settle || self.loading_frames > 0 {
			self.pending.push(SurfaceEvent::Load(RenderStatus::LOADING));
		} else {
			self.pending.push(SurfaceEvent::Load(RenderStatus::COMPLETE));
		}
		for frame in 0..self.loading_frames {
			let status = if frame + 1 == self.loading_frames && !self.never_settle {
				RenderStatus::COMPLETE
			} else {
				RenderStatus::LOADING
			};
			self.pending.push(SurfaceEvent::Render(status));
		}
		self.current = Some(job.clone());
		Ok(())
	}

	fn poll_events(&mut self) -> Vec<SurfaceEvent> {
		if self.never_settle && self.pending.is_empty() {
			return vec![SurfaceEvent::Render(RenderStatus::LOADING)];
		}
		std::mem::take(&mut self.pending)
	}

	async fn read_pixels(&mut self) -> Result<PixelBuffer> {
		let job = self.current.as_ref().ok_or_else(|| anyhow!("no tile was loaded"))?;
		let bounds = job.pixel_bounds.scaled(job.pixel_ratio);
		let [width, mut height] = job.device_size();
		if Self::is(self.short_tile, job) {
			height -= 1;
		}

		let mut data = Vec::with_capacity(width as usize * height as usize * 4);
		for y in (0..height).rev() {
			for x in 0..width {
				data.extend_from_slice(&Self::pixel(bounds.left + x, bounds.top + y));
			}
		}

		if Self::is(self.late_render_tile, job) {
			self.pending.push(SurfaceEvent::Render(RenderStatus::COMPLETE));
		}

		Ok(PixelBuffer::new(width, height, data)?.with_row_order(RowOrder::BottomUp))
	}

	fn release(&mut self) {
		self.current = None;
		self.pending.clear();
		self.releases += 1;
	}
}
