mod args;
pub mod plan;
mod progress;
pub mod render;
