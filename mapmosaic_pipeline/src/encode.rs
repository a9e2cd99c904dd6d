use anyhow::Result;
use futures::{
	StreamExt,
	stream::{self, BoxStream},
};
use mapmosaic_core::Blob;
use mapmosaic_image::RasterEncoder;

struct EncodeState<'a> {
	raw: BoxStream<'a, Result<Blob>>,
	encoder: Option<Box<dyn RasterEncoder>>,
}

/// Feeds a stream of raw rows into `encoder` and returns the encoded bytes as they
/// become available. The last chunk is produced by [`RasterEncoder::finish`].
pub fn encode_stream<'a>(raw: BoxStream<'a, Result<Blob>>, encoder: Box<dyn RasterEncoder>) -> BoxStream<'a, Result<Blob>> {
	let state = EncodeState {
		raw,
		encoder: Some(encoder),
	};

	stream::unfold(state, |mut state| async move {
		loop {
			let encoder = state.encoder.as_mut()?;
			match state.raw.next().await {
				Some(Ok(rows)) => {
					if let Err(err) = encoder.write(rows.as_slice()) {
						state.encoder = None;
						return Some((Err(err), state));
					}
					let output = encoder.take_output();
					if !output.is_empty() {
						return Some((Ok(output), state));
					}
				}
				Some(Err(err)) => {
					state.encoder = None;
					return Some((Err(err), state));
				}
				None => {
					let mut encoder = state.encoder.take()?;
					let result = encoder.finish();
					return Some((result, state));
				}
			}
		}
	})
	.boxed()
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::anyhow;
	use futures::TryStreamExt;
	use mapmosaic_image::{OutputEncoding, OutputFormat};

	fn rows(count: usize) -> BoxStream<'static, Result<Blob>> {
		stream::iter((0..count).map(|i| Ok(Blob::from(vec![i as u8; 8])))).boxed()
	}

	#[tokio::test]
	async fn raw_encoding_is_identity() {
		let format = OutputFormat::rgba(2, 3).unwrap();
		let encoder = OutputEncoding::Raw.encoder(format, None).unwrap();
		let chunks: Vec<Blob> = encode_stream(rows(3), encoder).try_collect().await.unwrap();
		let bytes: Vec<u8> = chunks.into_iter().flat_map(Blob::into_vec).collect();
		assert_eq!(bytes, [vec![0; 8], vec![1; 8], vec![2; 8]].concat());
	}

	#[tokio::test]
	async fn png_encoding() {
		let format = OutputFormat::rgba(2, 3).unwrap();
		let encoder = OutputEncoding::Png.encoder(format, Some(50)).unwrap();
		let chunks: Vec<Blob> = encode_stream(rows(3), encoder).try_collect().await.unwrap();
		let bytes: Vec<u8> = chunks.into_iter().flat_map(Blob::into_vec).collect();
		let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap();
		assert_eq!(image.into_rgba8().into_raw(), [vec![0; 8], vec![1; 8], vec![2; 8]].concat());
	}

	#[tokio::test]
	async fn short_input_fails_on_finish() {
		let format = OutputFormat::rgba(2, 3).unwrap();
		let encoder = OutputEncoding::Png.encoder(format, None).unwrap();
		let result: Result<Vec<Blob>> = encode_stream(rows(2), encoder).try_collect().await;
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn upstream_error_ends_the_stream() {
		let format = OutputFormat::rgba(2, 3).unwrap();
		let encoder = OutputEncoding::Raw.encoder(format, None).unwrap();
		let raw = stream::iter([Ok(Blob::from(vec![0; 8])), Err(anyhow!("tile failed")), Ok(Blob::from(vec![0; 8]))]).boxed();
		let results: Vec<Result<Blob>> = encode_stream(raw, encoder).collect().await;
		assert_eq!(results.len(), 2);
		assert_eq!(results[1].as_ref().unwrap_err().to_string(), "tile failed");
	}
}
