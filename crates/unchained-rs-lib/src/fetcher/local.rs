use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::{FetchError, PakFetcher, PakTarget};
use crate::progress::ProgressSink;

/// Copies paks out of a local registry laid out as `<root>/<org>/<repo>/<tag>/<pak_file_name>`.
pub struct LocalFilePakFetcher {
	root: PathBuf,
}

impl LocalFilePakFetcher {
	pub fn new(root: PathBuf) -> Self {
		Self { root }
	}

	pub fn source_path(&self, target: &PakTarget) -> PathBuf {
		self.root
			.join(&target.coordinates.id.org)
			.join(&target.coordinates.id.module_name)
			.join(&target.coordinates.version)
			.join(&target.pak_file_name)
	}
}

#[async_trait::async_trait]
impl PakFetcher for LocalFilePakFetcher {
	async fn download_pak(
		&self,
		target: &PakTarget,
		destination: &Path,
		progress: Option<&dyn ProgressSink>,
		cancel: &CancellationToken,
	) -> Result<(), FetchError> {
		let source = self.source_path(target);
		let file = match tokio::fs::File::open(&source).await {
			Ok(f) => f,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(FetchError::NotFound(target.coordinates.clone())),
			Err(e) => return Err(e.into()),
		};
		let size = file.metadata().await?.len();

		log::info!("copying {} from {}", target, source.display());
		super::file_writer::write_stream(tokio_util::io::ReaderStream::new(file), Some(size), destination, progress, cancel).await?;
		Ok(())
	}
}
