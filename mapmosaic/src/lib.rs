//! # MapMosaic
//!
//! Renders map images of any size by splitting them into tiles that a render
//! surface can handle, and streaming the tiles back out as one raster, row by row.
//!
//! ## Usage Example
//!
//! ```rust
//! use mapmosaic::{
//!     image::OutputEncoding,
//!     pipeline::{GraticuleSurface, MosaicBuilder, MosaicOptions},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = MosaicOptions {
//!         width: 200,
//!         height: 100,
//!         token: Some("secret".into()),
//!         ..MosaicOptions::default()
//!     };
//!     let mut surface = GraticuleSurface::default();
//!     let mosaic = MosaicBuilder::new(options).build(&mut surface)?;
//!     println!("rendering a {:?}", mosaic.format());
//!
//!     let mut png = Vec::new();
//!     mosaic.write_to(OutputEncoding::Png, &mut png).await?;
//!     Ok(())
//! }
//! ```

pub use mapmosaic_core as core;
pub use mapmosaic_image as image;
pub use mapmosaic_pipeline as pipeline;
