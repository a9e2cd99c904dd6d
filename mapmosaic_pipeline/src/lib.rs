//! Streaming assembly of map mosaics.
//!
//! [`MosaicBuilder`] validates [`MosaicOptions`], plans a [`TileGrid`](mapmosaic_core::TileGrid)
//! for the capabilities of a [`RenderSurface`] and returns a [`Mosaic`]. Polling the
//! mosaic's stream renders one tile at a time and emits the image row by row, raw or
//! encoded, while [`Event`]s report format, metadata and progress.

mod compose;
mod config;
mod encode;
mod events;
mod mosaic;
mod options;
mod progress;
pub mod surface;

pub use compose::*;
pub use config::*;
pub use encode::*;
pub use events::*;
pub use mosaic::*;
pub use options::*;
pub use progress::*;
pub use surface::*;
