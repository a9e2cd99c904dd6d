use crate::{EventBus, MosaicConfig, RenderJob, RenderSettle, RenderSurface, SettleSignal};
use anyhow::{Result, bail};
use mapmosaic_core::{Clock, MosaicError};
use mapmosaic_image::PixelBuffer;
use std::time::Duration;

/// Timing and identity of the tile renders of one mosaic.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
	pub style: String,
	pub token: String,
	pub pixel_ratio: u32,
	pub settle_timeout: Duration,
	pub render_timeout: Duration,
	pub poll_interval: Duration,
}

impl RenderSettings {
	pub fn new(style: &str, token: &str, pixel_ratio: u32, config: &MosaicConfig) -> Self {
		Self {
			style: style.to_string(),
			token: token.to_string(),
			pixel_ratio,
			settle_timeout: config.settle_timeout(),
			render_timeout: config.render_timeout(),
			poll_interval: config.poll_interval(),
		}
	}
}

/// Exclusive use of a surface for one tile. The surface is released when the
/// session is dropped, whether the tile succeeded or not.
pub struct SurfaceSession<'a, S: RenderSurface + ?Sized> {
	surface: &'a mut S,
}

impl<'a, S: RenderSurface + ?Sized> SurfaceSession<'a, S> {
	pub fn open(surface: &'a mut S) -> Self {
		Self { surface }
	}

	pub fn surface(&mut self) -> &mut S {
		self.surface
	}
}

impl<S: RenderSurface + ?Sized> Drop for SurfaceSession<'_, S> {
	fn drop(&mut self) {
		self.surface.release();
	}
}

/// Renders one tile: load, wait until the surface is stable, read the pixels.
///
/// Frames that arrive after read-back are reported as warnings. Every failure is
/// returned as a [`MosaicError::TileRender`] naming the tile.
pub async fn render_tile<S: RenderSurface + ?Sized>(
	surface: &mut S,
	job: &RenderJob,
	settings: &RenderSettings,
	clock: &dyn Clock,
	events: &EventBus,
) -> Result<PixelBuffer> {
	let mut session = SurfaceSession::open(surface);
	run_session(&mut session, job, settings, clock, events)
		.await
		.map_err(|err| MosaicError::tile_render(job.column, job.row, err))
}

async fn run_session<S: RenderSurface + ?Sized>(
	session: &mut SurfaceSession<'_, S>,
	job: &RenderJob,
	settings: &RenderSettings,
	clock: &dyn Clock,
	events: &EventBus,
) -> Result<PixelBuffer> {
	session.surface().load(job).await?;

	let mut settle = RenderSettle::new(settings.settle_timeout);
	let deadline = clock.now() + settings.render_timeout;
	loop {
		let now = clock.now();
		for event in session.surface().poll_events() {
			if settle.on_event(event, now) == SettleSignal::Reopened {
				log::trace!("tile ({}, {}) rendered again while stable", job.column, job.row);
			}
		}
		if settle.poll(now) {
			break;
		}
		if now >= deadline {
			bail!(
				"surface did not become stable within {:?} ({:?})",
				settings.render_timeout,
				settle.state()
			);
		}
		clock.sleep(settings.poll_interval).await;
	}

	if !settle.begin_read() {
		bail!("surface is not stable, state {:?}", settle.state());
	}
	let buffer = session.surface().read_pixels().await?;

	let now = clock.now();
	for event in session.surface().poll_events() {
		if settle.on_event(event, now) == SettleSignal::LateRender {
			let message = format!(
				"tile ({}, {}) was rendered again after its pixels were read; slow loading resources may be missing from the image",
				job.column, job.row
			);
			log::warn!("{message}");
			events.warn(message);
		}
	}

	Ok(buffer)
}
