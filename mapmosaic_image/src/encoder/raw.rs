use super::{ByteBudget, RasterEncoder};
use crate::OutputFormat;
use anyhow::Result;
use mapmosaic_core::Blob;

/// Passes raw pixel bytes through unchanged.
pub struct RawEncoder {
	format: OutputFormat,
	budget: ByteBudget,
	pending: Vec<u8>,
}

impl RawEncoder {
	pub fn new(format: OutputFormat) -> Self {
		Self {
			budget: ByteBudget::new(&format),
			format,
			pending: Vec::new(),
		}
	}
}

impl RasterEncoder for RawEncoder {
	fn format(&self) -> &OutputFormat {
		&self.format
	}

	fn write(&mut self, bytes: &[u8]) -> Result<()> {
		self.budget.spend(bytes.len())?;
		self.pending.extend_from_slice(bytes);
		Ok(())
	}

	fn take_output(&mut self) -> Blob {
		Blob::from(std::mem::take(&mut self.pending))
	}

	fn finish(&mut self) -> Result<Blob> {
		self.budget.check_complete()?;
		Ok(self.take_output())
	}
}
