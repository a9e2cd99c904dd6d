use crate::{RenderJob, RenderStatus, RenderSurface, SurfaceEvent};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use mapmosaic_image::{AlphaMode, PixelBuffer, RowOrder};

const LAND: [u8; 4] = [236, 231, 218, 255];
const WATER: [u8; 4] = [198, 220, 238, 255];
const LINE: [u8; 4] = [90, 90, 110, 255];

/// A surface that draws a longitude/latitude graticule instead of a map.
///
/// Every device pixel is unprojected through the tile viewport, so neighbouring
/// tiles continue each other's lines exactly. Cells alternate between two colors.
/// Buffers are delivered bottom-up with premultiplied alpha, the way GL read-back
/// does.
#[derive(Debug)]
pub struct GraticuleSurface {
	max_renderbuffer_size: Option<u32>,
	current: Option<RenderJob>,
	pending: Vec<SurfaceEvent>,
}

impl Default for GraticuleSurface {
	fn default() -> Self {
		Self::new(8192)
	}
}

impl GraticuleSurface {
	pub fn new(max_renderbuffer_size: u32) -> Self {
		Self {
			max_renderbuffer_size: Some(max_renderbuffer_size),
			current: None,
			pending: Vec::new(),
		}
	}

	/// Distance between graticule lines in degrees, roughly 128 display pixels.
	pub fn step(zoom: f64) -> f64 {
		let degrees_per_pixel = 360.0 / (512.0 * zoom.round().exp2());
		let raw = degrees_per_pixel * 128.0;
		let magnitude = 10f64.powf(raw.log10().floor());
		[1.0, 2.0, 5.0, 10.0]
			.into_iter()
			.map(|factor| factor * magnitude)
			.find(|step| *step >= raw)
			.unwrap_or(10.0 * magnitude)
	}
}

fn on_line(value: f64, step: f64, tolerance: f64) -> bool {
	let offset = value.rem_euclid(step);
	offset < tolerance || step - offset < tolerance
}

#[async_trait]
impl RenderSurface for GraticuleSurface {
	fn max_renderbuffer_size(&self) -> Option<u32> {
		self.max_renderbuffer_size
	}

	async fn load(&mut self, job: &RenderJob) -> Result<()> {
		log::trace!("graticule: load tile ({}, {}) {:?}", job.column, job.row, job.viewport);
		self.current = Some(job.clone());
		self.pending.push(SurfaceEvent::Load(RenderStatus::COMPLETE));
		Ok(())
	}

	fn poll_events(&mut self) -> Vec<SurfaceEvent> {
		std::mem::take(&mut self.pending)
	}

	async fn read_pixels(&mut self) -> Result<PixelBuffer> {
		let job = self.current.as_ref().ok_or_else(|| anyhow!("no tile was loaded"))?;
		let viewport = &job.viewport;
		let ratio = f64::from(job.pixel_ratio);
		let [width, height] = job.device_size();

		let step = Self::step(viewport.zoom);
		let scales = viewport.distance_scales();
		let lng_tolerance = 0.5 / scales.pixels_per_degree[0];
		let lat_tolerance = 0.5 / scales.pixels_per_degree[1];

		let lngs: Vec<f64> = (0..width)
			.map(|x| viewport.unproject([(f64::from(x) + 0.5) / ratio, 0.0]).lng)
			.collect();
		let lats: Vec<f64> = (0..height)
			.map(|y| viewport.unproject([0.0, (f64::from(y) + 0.5) / ratio]).lat)
			.collect();

		let mut data = Vec::with_capacity(width as usize * height as usize * 4);
		for lat in lats.iter().rev() {
			let lat_line = on_line(*lat, step, lat_tolerance);
			let lat_cell = (lat / step).floor() as i64;
			for lng in &lngs {
				let color = if lat_line || on_line(*lng, step, lng_tolerance) {
					LINE
				} else if ((lng / step).floor() as i64 + lat_cell).rem_euclid(2) == 0 {
					LAND
				} else {
					WATER
				};
				data.extend_from_slice(&color);
			}
		}

		Ok(PixelBuffer::new(width, height, data)?
			.with_row_order(RowOrder::BottomUp)
			.with_alpha(AlphaMode::Premultiplied))
	}

	fn release(&mut self) {
		self.current = None;
		self.pending.clear();
	}
}
