//! Streams content into a file while reporting progress.

use std::path::Path;

use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::FetchError;
use crate::progress::ProgressSink;

/// Copies `stream` into a new file at `destination`.
///
/// # Parameters
/// - `size` - Total expected bytes, progress is only reported when known.
/// - `cancel` - Checked between chunks.
///
/// # Errors
/// The partially written file is deleted before returning any error.
///
/// # Returns
/// The number of bytes written.
pub async fn write_stream<S, B, E>(
	stream: S,
	size: Option<u64>,
	destination: &Path,
	progress: Option<&dyn ProgressSink>,
	cancel: &CancellationToken,
) -> Result<u64, FetchError>
where
	S: Stream<Item = Result<B, E>>,
	B: AsRef<[u8]>,
	FetchError: From<E>,
{
	futures::pin_mut!(stream);
	let mut file = tokio::fs::File::create(destination).await?;

	let result = async {
		let mut written = 0u64;
		loop {
			let chunk = tokio::select! {
				_ = cancel.cancelled() => return Err(FetchError::Cancelled),
				chunk = stream.next() => chunk,
			};
			let Some(chunk) = chunk else { break };
			let chunk = chunk?;
			file.write_all(chunk.as_ref()).await?;
			written += chunk.as_ref().len() as u64;

			if let (Some(progress), Some(size)) = (progress, size.filter(|s| *s > 0)) {
				progress.report(written as f64 / size as f64 * 100.0);
			}
		}
		file.flush().await?;
		Ok::<_, FetchError>(written)
	}.await;

	match result {
		Ok(written) => {
			if let Some(progress) = progress {
				progress.report(100.0);
			}
			log::trace!("wrote {} bytes to {}", written, destination.display());
			Ok(written)
		},
		Err(e) => {
			drop(file);
			if let Err(remove) = tokio::fs::remove_file(destination).await {
				log::warn!("failed to clean up partial file {}: {}", destination.display(), remove);
			}
			Err(e)
		},
	}
}
