//! Typed failure classes of the mosaic pipeline.
//!
//! All fallible functions return [`anyhow::Result`]. Failures that a caller may want to
//! tell apart carry a [`MosaicError`] somewhere in their chain; use
//! [`MosaicError::find`] to recover it.
//!
//! ```rust
//! use mapmosaic_core::{GeoBBox, MosaicError};
//!
//! let err = GeoBBox::new(10.0, 0.0, -10.0, 5.0).unwrap_err();
//! assert!(matches!(MosaicError::find(&err), Some(MosaicError::Validation(_))));
//! ```

use std::fmt;

#[derive(Debug)]
pub enum MosaicError {
	/// Options or arguments are invalid. Reported before anything starts.
	Validation(String),
	/// No capable render surface is available.
	Environment(String),
	/// Rendering a tile failed or never completed.
	TileRender {
		column: usize,
		row: usize,
		source: anyhow::Error,
	},
	/// A tile or the whole stream produced a different number of bytes than declared.
	StreamIntegrity(String),
	/// The planner produced no tiles.
	EmptyGrid,
}

impl MosaicError {
	pub fn validation(message: impl Into<String>) -> anyhow::Error {
		anyhow::Error::new(MosaicError::Validation(message.into()))
	}

	pub fn environment(message: impl Into<String>) -> anyhow::Error {
		anyhow::Error::new(MosaicError::Environment(message.into()))
	}

	pub fn tile_render(column: usize, row: usize, source: anyhow::Error) -> anyhow::Error {
		anyhow::Error::new(MosaicError::TileRender { column, row, source })
	}

	pub fn stream_integrity(message: impl Into<String>) -> anyhow::Error {
		anyhow::Error::new(MosaicError::StreamIntegrity(message.into()))
	}

	/// Returns the first `MosaicError` in the chain of `err`, if any.
	pub fn find(err: &anyhow::Error) -> Option<&MosaicError> {
		err.chain().find_map(|e| e.downcast_ref::<MosaicError>())
	}
}

impl fmt::Display for MosaicError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MosaicError::Validation(message) => write!(f, "invalid options: {message}"),
			MosaicError::Environment(message) => write!(f, "unsupported environment: {message}"),
			MosaicError::TileRender { column, row, .. } => {
				write!(f, "failed to render tile (column {column}, row {row})")
			}
			MosaicError::StreamIntegrity(message) => write!(f, "broken pixel stream: {message}"),
			MosaicError::EmptyGrid => write!(f, "no tiles were planned"),
		}
	}
}

impl std::error::Error for MosaicError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			MosaicError::TileRender { source, .. } => Some(source.as_ref()),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::{Context, anyhow};
	use rstest::rstest;

	#[test]
	fn find_through_context() {
		let err = Err::<(), _>(MosaicError::validation("width must be > 0"))
			.context("while building mosaic")
			.unwrap_err();
		let found = MosaicError::find(&err).unwrap();
		assert!(matches!(found, MosaicError::Validation(_)));
		assert_eq!(found.to_string(), "invalid options: width must be > 0");
	}

	#[test]
	fn find_returns_none_for_foreign_errors() {
		let err = anyhow!("something else");
		assert!(MosaicError::find(&err).is_none());
	}

	#[test]
	fn tile_render_exposes_source() {
		let err = MosaicError::tile_render(2, 1, anyhow!("surface lost"));
		assert_eq!(err.to_string(), "failed to render tile (column 2, row 1)");
		assert_eq!(format!("{err:#}"), "failed to render tile (column 2, row 1): surface lost");
		let source = std::error::Error::source(MosaicError::find(&err).unwrap()).unwrap();
		assert_eq!(source.to_string(), "surface lost");
	}

	#[rstest]
	#[case(MosaicError::environment("no webgl"), "unsupported environment: no webgl")]
	#[case(MosaicError::stream_integrity("short tile"), "broken pixel stream: short tile")]
	#[case(anyhow::Error::new(MosaicError::EmptyGrid), "no tiles were planned")]
	fn display(#[case] err: anyhow::Error, #[case] message: &str) {
		assert_eq!(MosaicError::find(&err).unwrap().to_string(), message);
	}
}
