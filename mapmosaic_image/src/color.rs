use std::fmt::{self, Display};

/// Channel layout of the pixels flowing through the pipeline.
///
/// Only 8-bit RGBA is produced by map renderers, so it is the only variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
	#[default]
	Rgba,
}

impl ColorSpace {
	pub fn channels(&self) -> u32 {
		match self {
			ColorSpace::Rgba => 4,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			ColorSpace::Rgba => "rgba",
		}
	}
}

impl Display for ColorSpace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Converts one premultiplied RGBA pixel to straight alpha in place.
///
/// Fully transparent pixels become `[0, 0, 0, 0]`.
pub fn unpremultiply(pixel: &mut [u8]) {
	let alpha = u32::from(pixel[3]);
	match alpha {
		0 => pixel[..3].fill(0),
		255 => {}
		_ => {
			for value in &mut pixel[..3] {
				*value = ((u32::from(*value) * 255 + alpha / 2) / alpha).min(255) as u8;
			}
		}
	}
}
