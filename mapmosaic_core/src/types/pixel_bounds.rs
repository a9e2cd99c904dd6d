use std::fmt::Debug;

/// Placement of a tile inside the final image, in pixels.
///
/// `top`/`left` are inclusive, `bottom`/`right` exclusive, so
/// `width() == right - left` and `height() == bottom - top`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelBounds {
	pub top: u32,
	pub right: u32,
	pub bottom: u32,
	pub left: u32,
}

impl PixelBounds {
	pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
		debug_assert!(left <= right && top <= bottom);
		Self {
			top,
			right,
			bottom,
			left,
		}
	}

	pub fn width(&self) -> u32 {
		self.right - self.left
	}

	pub fn height(&self) -> u32 {
		self.bottom - self.top
	}

	pub fn area(&self) -> u64 {
		u64::from(self.width()) * u64::from(self.height())
	}

	/// Converts display-pixel bounds to device pixels.
	///
	/// ```
	/// use mapmosaic_core::PixelBounds;
	///
	/// let bounds = PixelBounds::new(0, 300, 200, 100).scaled(2);
	/// assert_eq!(bounds.as_array(), [0, 600, 400, 200]);
	/// ```
	#[must_use]
	pub fn scaled(&self, ratio: u32) -> PixelBounds {
		PixelBounds::new(self.top * ratio, self.right * ratio, self.bottom * ratio, self.left * ratio)
	}

	pub fn overlaps(&self, other: &PixelBounds) -> bool {
		self.left < other.right && other.left < self.right && self.top < other.bottom && other.top < self.bottom
	}

	/// Returns `[top, right, bottom, left]`.
	pub fn as_array(&self) -> [u32; 4] {
		[self.top, self.right, self.bottom, self.left]
	}
}

impl Debug for PixelBounds {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"PixelBounds(x: {}..{}, y: {}..{})",
			self.left, self.right, self.top, self.bottom
		)
	}
}
