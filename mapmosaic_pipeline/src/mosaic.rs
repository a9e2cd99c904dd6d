use crate::{
	Event, EventBus, FrameScheduler, MosaicComposer, MosaicConfig, MosaicOptions, ProgressStage, RenderSettings,
	RenderSurface, YieldScheduler, encode_stream,
};
use anyhow::{Context, Result};
use futures::{
	StreamExt,
	future,
	stream::{self, BoxStream},
};
use mapmosaic_core::{Blob, Clock, GeoBBox, MosaicError, SystemClock, TileGrid, Viewport, fit_viewport_to_bbox};
use mapmosaic_image::{OutputEncoding, OutputFormat, RasterEncoder};
use std::{io::Write, sync::Arc};

/// Zoom, extent and resolution of a mosaic, broadcast with its format.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicMetadata {
	pub format: OutputFormat,
	/// Zoom of the overall viewport, in display pixels.
	pub zoom: f64,
	/// Geographic extent of the whole image. Contains the requested bbox. Longitudes
	/// are not wrapped and may lie past ±180° when the padding crosses the antimeridian.
	pub bbox: GeoBBox,
	/// Ground resolution at the center, per display pixel.
	pub meters_per_pixel: f64,
}

/// Everything that is known about a mosaic before the first tile is rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicPlan {
	pub format: OutputFormat,
	pub metadata: MosaicMetadata,
	/// Overall viewport in display pixels.
	pub viewport: Viewport,
	pub grid: TileGrid,
}

/// Configures and starts a mosaic.
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use mapmosaic_image::OutputEncoding;
/// use mapmosaic_pipeline::{GraticuleSurface, MosaicBuilder, MosaicOptions};
///
/// let options = MosaicOptions {
/// 	token: Some("secret".into()),
/// 	..MosaicOptions::default()
/// };
/// let mut surface = GraticuleSurface::default();
/// let mosaic = MosaicBuilder::new(options).build(&mut surface)?;
/// let mut file = std::fs::File::create("map.png")?;
/// mosaic.write_to(OutputEncoding::Png, &mut file).await?;
/// # Ok(())
/// # }
/// ```
pub struct MosaicBuilder {
	options: MosaicOptions,
	config: MosaicConfig,
	clock: Arc<dyn Clock>,
	frames: Arc<dyn FrameScheduler>,
	events: EventBus,
}

impl MosaicBuilder {
	pub fn new(options: MosaicOptions) -> Self {
		Self {
			options,
			config: MosaicConfig::default(),
			clock: SystemClock::arc(),
			frames: Arc::new(YieldScheduler),
			events: EventBus::new(),
		}
	}

	#[must_use]
	pub fn config(mut self, config: MosaicConfig) -> Self {
		self.config = config;
		self
	}

	#[must_use]
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	#[must_use]
	pub fn frames(mut self, frames: Arc<dyn FrameScheduler>) -> Self {
		self.frames = frames;
		self
	}

	/// Uses `events` instead of a new bus, so listeners can subscribe before building.
	#[must_use]
	pub fn events(mut self, events: EventBus) -> Self {
		self.events = events;
		self
	}

	/// Plans the mosaic for a surface whose renderbuffer edge is limited to
	/// `max_renderbuffer_size` device pixels. The access token is not checked.
	pub fn plan(&self, max_renderbuffer_size: Option<u32>) -> Result<MosaicPlan> {
		let options = &self.options;
		options.validate_layout()?;
		self
			.config
			.check()
			.map_err(|err| MosaicError::validation(format!("invalid config: {err}")))?;

		let max_renderbuffer_size = max_renderbuffer_size
			.ok_or_else(|| MosaicError::environment("the render surface does not provide a renderbuffer"))?;
		let ratio = options.pixel_ratio;
		let max_tile_edge = self.config.max_surface_size.min(max_renderbuffer_size) / ratio;
		if max_tile_edge == 0 {
			return Err(MosaicError::environment(format!(
				"a renderbuffer of {max_renderbuffer_size} pixels is too small for pixel ratio {ratio}"
			)));
		}

		let [width, height] = options.output_size()?;
		let [display_width, display_height] = options.display_size()?;
		let viewport = fit_viewport_to_bbox(display_width, display_height, &options.geo_bbox()?)?;
		if viewport.zoom < 0.0 {
			return Err(MosaicError::validation(format!(
				"a {display_width}x{display_height} image of {:?} would need zoom {:.3}; use a larger size or a smaller bbox",
				options.geo_bbox()?,
				viewport.zoom
			)));
		}

		let grid = TileGrid::plan(&viewport, max_tile_edge)?;
		let format = OutputFormat::rgba(width, height)?;
		let metadata = MosaicMetadata {
			format,
			zoom: viewport.zoom,
			bbox: viewport.bounding_box(),
			meters_per_pixel: viewport.distance_scales().meters_per_pixel,
		};

		log::info!(
			"mosaic {width}x{height} at zoom {:.3}: {}x{} tiles of at most {max_tile_edge} display pixels",
			viewport.zoom,
			grid.columns(),
			grid.rows()
		);

		Ok(MosaicPlan {
			format,
			metadata,
			viewport,
			grid,
		})
	}

	/// Validates the options, plans the grid for `surface` and returns the mosaic.
	/// Nothing is rendered until its stream is polled.
	pub fn build<S: RenderSurface + ?Sized>(self, surface: &mut S) -> Result<Mosaic<'_, S>> {
		self.options.validate()?;
		let plan = self.plan(surface.max_renderbuffer_size())?;
		let settings = RenderSettings::new(
			&self.options.style,
			self.options.token(),
			self.options.pixel_ratio,
			&self.config,
		);

		Ok(Mosaic {
			plan,
			settings,
			config: self.config,
			clock: self.clock,
			frames: self.frames,
			events: self.events,
			surface,
		})
	}
}

/// Validates `options` and plans a mosaic with the default configuration.
pub fn build_mosaic<'a, S: RenderSurface + ?Sized>(options: &MosaicOptions, surface: &'a mut S) -> Result<Mosaic<'a, S>> {
	MosaicBuilder::new(options.clone()).build(surface)
}

/// A planned mosaic, ready to be streamed.
pub struct Mosaic<'a, S: RenderSurface + ?Sized> {
	plan: MosaicPlan,
	settings: RenderSettings,
	config: MosaicConfig,
	clock: Arc<dyn Clock>,
	frames: Arc<dyn FrameScheduler>,
	events: EventBus,
	surface: &'a mut S,
}

impl<'a, S: RenderSurface + ?Sized> Mosaic<'a, S> {
	pub fn format(&self) -> &OutputFormat {
		&self.plan.format
	}

	pub fn metadata(&self) -> &MosaicMetadata {
		&self.plan.metadata
	}

	pub fn grid(&self) -> &TileGrid {
		&self.plan.grid
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// The image as raw top-down RGBA rows in device pixels.
	///
	/// `Format` and `Metadata` events are emitted when the stream is first polled.
	pub fn into_raw_stream(self) -> BoxStream<'a, Result<Blob>>
	where
		S: 'a,
	{
		let announce = Self::announce(self.plan.format, &self.plan, &self.events);
		announce.chain(self.pixels()).boxed()
	}

	/// The image encoded as `encoding`.
	pub fn into_encoded_stream(self, encoding: OutputEncoding) -> Result<BoxStream<'a, Result<Blob>>>
	where
		S: 'a,
	{
		let encoder = encoding.encoder(self.plan.format, Some(self.config.png_speed))?;
		self.into_stream_with_encoder(encoder)
	}

	/// The image encoded by `encoder`. The announced format is the encoder's own, which
	/// must match the planned image.
	pub fn into_stream_with_encoder(self, encoder: Box<dyn RasterEncoder>) -> Result<BoxStream<'a, Result<Blob>>>
	where
		S: 'a,
	{
		let format = *encoder.format();
		if format != self.plan.format {
			return Err(MosaicError::stream_integrity(format!(
				"encoder expects {format:?}, but the mosaic produces {:?}",
				self.plan.format
			)));
		}
		let announce = Self::announce(format, &self.plan, &self.events);
		Ok(announce.chain(encode_stream(self.pixels(), encoder)).boxed())
	}

	/// Streams the encoded image into `writer` and returns the number of bytes written.
	pub async fn write_to<W: Write>(self, encoding: OutputEncoding, writer: &mut W) -> Result<u64>
	where
		S: 'a,
	{
		let mut stream = self.into_encoded_stream(encoding)?;
		let mut written = 0u64;
		while let Some(chunk) = stream.next().await {
			let chunk = chunk?;
			writer.write_all(chunk.as_slice()).context("failed to write image data")?;
			written += chunk.len() as u64;
		}
		writer.flush().context("failed to flush image data")?;
		Ok(written)
	}

	fn announce(format: OutputFormat, plan: &MosaicPlan, events: &EventBus) -> BoxStream<'a, Result<Blob>> {
		let metadata = MosaicMetadata {
			format,
			..plan.metadata.clone()
		};
		let events = events.clone();
		stream::once(async move {
			events.emit(Event::Format(format));
			events.emit(Event::Metadata(metadata));
		})
		.filter_map(|()| future::ready(None))
		.boxed()
	}

	fn pixels(self) -> BoxStream<'a, Result<Blob>>
	where
		S: 'a,
	{
		let total = self.plan.format.total_bytes();
		let composer = MosaicComposer::new(
			self.plan.grid,
			self.surface,
			self.settings,
			self.clock.clone(),
			self.events.clone(),
		);
		ProgressStage::new(total, self.events)
			.clock(self.clock)
			.frames(self.frames)
			.interval(self.config.yield_interval())
			.wrap(composer.into_stream())
	}
}
