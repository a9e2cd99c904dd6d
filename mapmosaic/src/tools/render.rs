use super::{args::MosaicArgs, progress::ProgressBar};
use anyhow::{Context, Result};
use mapmosaic_image::OutputEncoding;
use mapmosaic_pipeline::{EventBus, GraticuleSurface, JobFile, Mosaic, MosaicBuilder, MosaicConfig, RenderSurface};
use std::{
	fs::{self, File},
	io::BufWriter,
	path::{Path, PathBuf},
};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// output file, written as PNG unless --raw is given
	#[arg()]
	output: PathBuf,

	/// access token for the style and its sources
	#[arg(long, short, display_order = 0)]
	token: Option<String>,

	/// style URL
	#[arg(long, short, display_order = 0)]
	style: Option<String>,

	#[command(flatten)]
	mosaic: MosaicArgs,

	/// YAML file with `options` and `config` sections; command line values take precedence
	#[arg(long, value_name = "FILE", display_order = 3)]
	job: Option<PathBuf>,

	/// YAML file with pipeline settings, replaces the `config` section of --job
	#[arg(long, value_name = "FILE", display_order = 3)]
	config: Option<PathBuf>,

	/// write headerless RGBA rows instead of PNG
	#[arg(long, display_order = 4)]
	raw: bool,

	/// largest renderbuffer the render surface supports, in device pixels
	#[arg(long, value_name = "int", default_value_t = 8192, display_order = 4)]
	renderbuffer_size: u32,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let job = match &arguments.job {
		Some(path) => JobFile::from_path(path)?,
		None => JobFile::default(),
	};
	let mut options = job.options;
	let mut config = job.config;

	if let Some(path) = &arguments.config {
		config = MosaicConfig::from_path(path)?;
	}
	if let Some(size) = arguments.mosaic.max_surface_size {
		config.max_surface_size = size;
	}
	arguments.mosaic.apply(&mut options)?;
	if let Some(token) = &arguments.token {
		options.token = Some(token.clone());
	}
	if let Some(style) = &arguments.style {
		options.style.clone_from(style);
	}
	let encoding = if arguments.raw {
		OutputEncoding::Raw
	} else {
		OutputEncoding::Png
	};

	let events = EventBus::new();
	let bar = ProgressBar::new();
	let listener = bar.clone();
	events.subscribe(move |event| listener.on_event(event));

	let mut surface = GraticuleSurface::new(arguments.renderbuffer_size);
	let mosaic = MosaicBuilder::new(options)
		.config(config)
		.events(events)
		.build(&mut surface)?;

	let format = *mosaic.format();
	eprintln!(
		"render {}x{} {} image in {} tiles to {:?}",
		format.width,
		format.height,
		encoding,
		mosaic.grid().len(),
		arguments.output
	);

	let bytes = write_atomically(mosaic, encoding, &arguments.output).await?;
	bar.finish();
	eprintln!("finished writing {bytes} bytes");

	Ok(())
}

/// Streams the mosaic into `<output>.part` and renames it to `output` on success.
/// The partial file is removed on failure.
async fn write_atomically<S: RenderSurface + ?Sized>(
	mosaic: Mosaic<'_, S>,
	encoding: OutputEncoding,
	output: &Path,
) -> Result<u64> {
	let part = part_path(output);
	let file = File::create(&part).with_context(|| format!("failed to create {part:?}"))?;
	let mut writer = BufWriter::new(file);

	match mosaic.write_to(encoding, &mut writer).await {
		Ok(bytes) => {
			drop(writer);
			fs::rename(&part, output).with_context(|| format!("failed to move {part:?} to {output:?}"))?;
			Ok(bytes)
		}
		Err(err) => {
			drop(writer);
			if let Err(remove_err) = fs::remove_file(&part) {
				log::warn!("failed to remove {part:?}: {remove_err}");
			}
			Err(err)
		}
	}
}

fn part_path(output: &Path) -> PathBuf {
	let mut name = output.as_os_str().to_owned();
	name.push(".part");
	PathBuf::from(name)
}
