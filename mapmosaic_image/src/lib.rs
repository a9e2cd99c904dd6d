//! Pixel buffers and raster encoders for map mosaics.
//!
//! Renderers hand over [`PixelBuffer`]s in whatever row order and alpha mode they
//! produce; [`PixelBuffer::normalize`] turns them into the top-down, straight-alpha
//! RGBA rows that every [`RasterEncoder`] consumes.

mod color;
pub mod encoder;
mod format;
mod pixel_buffer;

pub use color::*;
pub use encoder::*;
pub use format::*;
pub use pixel_buffer::*;
