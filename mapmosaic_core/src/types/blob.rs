//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] used for
//! every chunk of pixel or encoded data that flows through the pipeline.
//!
//! # Examples
//!
//! ```rust
//! use mapmosaic_core::Blob;
//!
//! let blob = Blob::from(vec![0, 1, 2, 3, 4, 5, 6, 7]);
//! assert_eq!(blob.len(), 8);
//! assert_eq!(&blob.as_slice()[2..5], &[2, 3, 4]);
//! assert_eq!(blob.into_vec(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
//! ```

use std::fmt::Debug;

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob` that can hold `capacity` bytes without reallocating.
	#[must_use]
	pub fn with_capacity(capacity: usize) -> Blob {
		Blob(Vec::with_capacity(capacity))
	}

	pub fn extend_from_slice(&mut self, bytes: &[u8]) {
		self.0.extend_from_slice(bytes);
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		self.0.as_slice()
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let head = &self.0[..self.0.len().min(8)];
		write!(f, "Blob({} bytes, {head:02x?}", self.0.len())?;
		if self.0.len() > 8 {
			write!(f, "…")?;
		}
		write!(f, ")")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extend_and_len() {
		let mut blob = Blob::with_capacity(6);
		assert!(blob.is_empty());
		blob.extend_from_slice(&[1, 2, 3]);
		blob.extend_from_slice(&[4, 5, 6]);
		assert_eq!(blob.len(), 6);
		assert_eq!(blob.as_slice(), &[1, 2, 3, 4, 5, 6]);
	}

	#[test]
	fn debug_format() {
		assert_eq!(format!("{:?}", Blob::from(&[1u8, 255][..])), "Blob(2 bytes, [01, ff])");
		assert_eq!(
			format!("{:?}", Blob::from(vec![0u8; 10])),
			"Blob(10 bytes, [00, 00, 00, 00, 00, 00, 00, 00]…)"
		);
	}
}
