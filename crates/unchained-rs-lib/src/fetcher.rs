//! Acquiring pak content for a release.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::mods::{Release, ReleaseCoordinates};
use crate::progress::ProgressSink;

pub mod file_writer;
pub mod local;
pub use local::LocalFilePakFetcher;
pub mod http;
pub use http::HttpPakFetcher;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
	#[error("no pak available for {0}")]
	NotFound(ReleaseCoordinates),
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("server responded {status} for {url}")]
	Status {
		url: String,
		status: reqwest::StatusCode,
	},
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("download cancelled")]
	Cancelled,
	#[error("refusing to download from insecure url {0}")]
	InsecureUrl(String),
}

/// What to fetch: a release, the repository it is published from and the name of its pak in the release assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PakTarget {
	pub coordinates: ReleaseCoordinates,
	pub pak_file_name: String,
	pub repo_url: String,
}

impl PakTarget {
	/// A target published from the GitHub repository named by its coordinates.
	pub fn new(coordinates: ReleaseCoordinates, pak_file_name: impl Into<String>) -> Self {
		let repo_url = format!("https://github.com/{}/{}", coordinates.id.org, coordinates.id.module_name);
		Self {
			coordinates,
			pak_file_name: pak_file_name.into(),
			repo_url,
		}
	}

	pub fn with_repo_url(mut self, repo_url: impl Into<String>) -> Self {
		self.repo_url = repo_url.into().trim_end_matches('/').to_string();
		self
	}
}

impl From<&Release> for PakTarget {
	fn from(release: &Release) -> Self {
		Self::new(release.coordinates(), release.pak_file_name.clone())
			.with_repo_url(release.manifest.repo_url.clone())
	}
}

impl std::fmt::Display for PakTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} ({})", self.coordinates, self.pak_file_name)
	}
}

#[async_trait::async_trait]
pub trait PakFetcher: Send + Sync {
	/// Writes the pak for `target` to `destination`.
	///
	/// A partially written file is removed on failure or cancellation.
	async fn download_pak(
		&self,
		target: &PakTarget,
		destination: &Path,
		progress: Option<&dyn ProgressSink>,
		cancel: &CancellationToken,
	) -> Result<(), FetchError>;
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::mods::release::fixtures::release;

	#[test]
	fn target_defaults_to_github_repo() {
		let target = PakTarget::new(ReleaseCoordinates::new("OrgX", "Core", "v1.0.0"), "Core.pak");
		assert_eq!(target.repo_url, "https://github.com/OrgX/Core");
	}

	#[test]
	fn target_takes_repo_from_manifest() {
		let mut release = release("OrgX", "Core", "v1.0.0", &[]);
		release.manifest.repo_url = "https://example.com/mirror/Core/".to_string();
		let target = PakTarget::from(&release);
		assert_eq!(target.repo_url, "https://example.com/mirror/Core");
		assert_eq!(target.pak_file_name, "Core.pak");
	}
}
