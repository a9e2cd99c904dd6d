use futures::StreamExt;
use mapmosaic_core::{ManualClock, MosaicError};
use mapmosaic_image::OutputEncoding;
use mapmosaic_pipeline::{
	Event, EventBus, GraticuleSurface, MockSurface, MosaicBuilder, MosaicConfig, MosaicOptions,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn lewis() -> MosaicOptions {
	MosaicOptions {
		token: Some("pk.test".to_string()),
		..MosaicOptions::default()
	}
}

fn instant_config() -> MosaicConfig {
	MosaicConfig {
		settle_timeout_ms: 0,
		..MosaicConfig::default()
	}
}

#[tokio::test]
async fn lewis_in_twelve_tiles() {
	// a 512 pixel renderbuffer at ratio 2 allows tiles of 256 display pixels
	let mut surface = MockSurface::new().with_max_renderbuffer_size(Some(512));
	let mosaic = MosaicBuilder::new(lewis())
		.config(instant_config())
		.clock(Arc::new(ManualClock::new()))
		.build(&mut surface)
		.unwrap();
	assert_eq!((mosaic.format().width, mosaic.format().height), (1202, 1602));
	assert_eq!((mosaic.grid().columns(), mosaic.grid().rows()), (3, 4));

	let mut raw = Vec::new();
	let written = mosaic.write_to(OutputEncoding::Raw, &mut raw).await.unwrap();
	assert_eq!(written, 1202 * 1602 * 4);

	for (index, pixel) in raw.chunks_exact(4).enumerate() {
		let (x, y) = ((index % 1202) as u32, (index / 1202) as u32);
		assert_eq!(pixel, MockSurface::pixel(x, y), "pixel ({x}, {y})");
	}
	assert_eq!(surface.loads().len(), 12);
	assert_eq!(surface.releases(), 12);
	assert!(surface.loads().iter().all(|job| job.device_size()[0] <= 512 && job.device_size()[1] <= 512));
}

#[tokio::test]
async fn events_arrive_in_order() {
	let events = EventBus::new();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	events.subscribe(move |event| {
		sink.lock().push(match event {
			Event::Format(_) => "format",
			Event::Metadata(_) => "metadata",
			Event::Progress { .. } => "progress",
			Event::Step { .. } => "step",
			Event::Warning { .. } => "warning",
			Event::Log { .. } => "log",
		});
	});

	let options = MosaicOptions {
		width: 100,
		height: 60,
		pixel_ratio: 1,
		..lewis()
	};
	let config = MosaicConfig {
		max_surface_size: 50,
		..instant_config()
	};
	let mut surface = MockSurface::new().loading_frames(3);
	let mosaic = MosaicBuilder::new(options)
		.config(config)
		.clock(Arc::new(ManualClock::new()))
		.events(events)
		.build(&mut surface)
		.unwrap();
	let tiles = mosaic.grid().len();
	assert_eq!(tiles, 6);

	let mut png = Vec::new();
	mosaic.write_to(OutputEncoding::Png, &mut png).await.unwrap();

	let seen = seen.lock().clone();
	assert_eq!(seen[..3], ["format", "metadata", "step"]);
	assert_eq!(seen.iter().filter(|kind| **kind == "step").count(), tiles);
	assert_eq!(seen.iter().filter(|kind| **kind == "progress").count(), 61);
	assert!(!seen.contains(&"warning"));
}

#[tokio::test]
async fn graticule_png() {
	let options = MosaicOptions {
		width: 300,
		height: 200,
		bbox: [5.8, 45.8, 10.5, 47.8],
		..lewis()
	};
	let config = MosaicConfig {
		max_surface_size: 128,
		..instant_config()
	};
	let mut surface = GraticuleSurface::default();
	let mosaic = MosaicBuilder::new(options)
		.config(config)
		.clock(Arc::new(ManualClock::new()))
		.build(&mut surface)
		.unwrap();
	assert!(mosaic.grid().len() > 1);

	let mut png = Vec::new();
	mosaic.write_to(OutputEncoding::Png, &mut png).await.unwrap();
	let image = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
		.unwrap()
		.into_rgba8();
	assert_eq!(image.dimensions(), (302, 202));
	assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
}

#[tokio::test]
async fn failure_ends_the_stream_after_partial_output() {
	let options = MosaicOptions {
		width: 100,
		height: 60,
		pixel_ratio: 1,
		..lewis()
	};
	let config = MosaicConfig {
		max_surface_size: 50,
		..instant_config()
	};
	let mut surface = MockSurface::new().fail_tile(0, 1);
	let mosaic = MosaicBuilder::new(options)
		.config(config)
		.clock(Arc::new(ManualClock::new()))
		.build(&mut surface)
		.unwrap();

	let mut stream = mosaic.into_raw_stream();
	let mut rows = 0;
	let err = loop {
		match stream.next().await {
			Some(Ok(_)) => rows += 1,
			Some(Err(err)) => break err,
			None => panic!("stream ended without an error"),
		}
	};
	assert_eq!(rows, 50);
	assert!(matches!(
		MosaicError::find(&err),
		Some(MosaicError::TileRender { column: 0, row: 1, .. })
	));
	assert!(stream.next().await.is_none());
}
