//! Contains the value types shared by every crate: bounding boxes, points, viewports,
//! pixel bounds and byte blobs.

mod blob;
pub use blob::*;

mod geo_bbox;
pub use geo_bbox::*;

mod lng_lat;
pub use lng_lat::*;

mod pixel_bounds;
pub use pixel_bounds::*;

mod viewport;
pub use viewport::*;
