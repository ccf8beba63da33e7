//! Pak content hashing and verification against release metadata.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha512};
use tokio::io::AsyncReadExt;

use crate::mods::Release;
use crate::pak_dir::PakDir;

#[derive(Debug, thiserror::Error)]
#[error("failed to hash {path}: {source}")]
pub struct HashFailure {
	pub path: PathBuf,
	#[source]
	pub source: std::io::Error,
}

/// SHA-512 of a file as lowercase hex.
///
/// # Returns
/// `None` when the file does not exist.
pub async fn hash_file(path: &Path) -> Result<Option<String>, HashFailure> {
	let mut file = match tokio::fs::File::open(path).await {
		Ok(f) => f,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(source) => return Err(HashFailure { path: path.to_path_buf(), source }),
	};

	let mut hasher = Sha512::new();
	let mut buffer = vec![0u8; 64 * 1024];
	loop {
		let read = file.read(&mut buffer).await.map_err(|source| HashFailure { path: path.to_path_buf(), source })?;
		if read == 0 {
			break;
		}
		hasher.update(&buffer[..read]);
	}

	Ok(Some(hex::encode(hasher.finalize())))
}

/// Outcome of checking one release's installed pak.
#[derive(Debug)]
pub enum HashCheck {
	Matched(Release),
	Mismatch { release: Release, actual: String },
	/// The release has no managed pak, or its file is gone.
	Missing(Release),
	Failed(Release, HashFailure),
}

impl HashCheck {
	pub fn release(&self) -> &Release {
		match self {
			HashCheck::Matched(r) | HashCheck::Missing(r) | HashCheck::Failed(r, _) => r,
			HashCheck::Mismatch { release, .. } => release,
		}
	}

	pub fn is_mismatch(&self) -> bool {
		matches!(self, HashCheck::Mismatch { .. })
	}
}

/// Compares each release's declared hash with the pak currently installed for it.
pub async fn validate_releases(pak_dir: &PakDir, releases: &[Release]) -> Vec<HashCheck> {
	let mut checks = Vec::with_capacity(releases.len());
	for release in releases {
		let Some(path) = pak_dir.managed_pak_path(&release.coordinates()) else {
			checks.push(HashCheck::Missing(release.clone()));
			continue;
		};

		let check = match hash_file(&path).await {
			Ok(Some(actual)) if actual.eq_ignore_ascii_case(&release.hash) => HashCheck::Matched(release.clone()),
			Ok(Some(actual)) => {
				log::warn!("hash mismatch for {}: expected {}, found {}", release, release.hash, actual);
				HashCheck::Mismatch { release: release.clone(), actual }
			},
			Ok(None) => HashCheck::Missing(release.clone()),
			Err(e) => {
				log::error!("{}", e);
				HashCheck::Failed(release.clone(), e)
			},
		};
		checks.push(check);
	}
	checks
}
