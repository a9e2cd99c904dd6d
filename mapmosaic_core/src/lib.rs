//! Geographic types, Web-Mercator projection and tile planning for map mosaics.
//!
//! Everything in this crate is pure computation: no rendering, no encoding and no I/O.
//! The [`TileGrid`] planner splits a [`Viewport`] into renderable tiles, each of which
//! carries its own self-consistent viewport and its placement in the final image.

pub mod clock;
pub mod error;
pub mod planner;
pub mod projection;
pub mod types;

pub use clock::*;
pub use error::*;
pub use planner::*;
pub use projection::*;
pub use types::*;
