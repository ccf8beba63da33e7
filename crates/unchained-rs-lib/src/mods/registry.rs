//! Sources of mod metadata.
//!
//! A registry lays releases out as `<root>/<org>/<repo>/<repo>.json` for the mod manifest and
//! `<root>/<org>/<repo>/<tag>/<pak_file_name>` for each release's pak.

use std::path::{Path, PathBuf};

use super::{Mod, Release, ModIdentifier};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("IO error on {path}: {source}")]
	IO {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse manifest {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("failed to walk registry: {0}")]
	Walk(#[from] walkdir::Error),
}

/// Everything a registry could read, failures do not stop the remaining manifests from loading.
#[derive(Debug, Default)]
pub struct GetAllModsResult {
	pub mods: Vec<Mod>,
	pub errors: Vec<RegistryError>,
}

impl GetAllModsResult {
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}
}

#[async_trait::async_trait]
pub trait ModRegistry: Send + Sync {
	fn name(&self) -> String;
	async fn get_all_mods(&self) -> GetAllModsResult;
}

/// A registry stored on the local filesystem.
pub struct LocalModRegistry {
	root: PathBuf,
}

impl LocalModRegistry {
	pub fn new(root: PathBuf) -> Self {
		Self { root }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn mod_dir(&self, id: &ModIdentifier) -> PathBuf {
		self.root.join(&id.org).join(&id.module_name)
	}

	fn manifest_path(&self, id: &ModIdentifier) -> PathBuf {
		self.mod_dir(id).join(format!("{}.json", id.module_name))
	}

	async fn read_mod(path: &Path) -> Result<Mod, RegistryError> {
		let text = tokio::fs::read_to_string(path).await
			.map_err(|source| RegistryError::IO { path: path.to_path_buf(), source })?;
		serde_json::from_str(&text).map_err(|source| RegistryError::Parse { path: path.to_path_buf(), source })
	}

	/// Adds `release` to its mod's manifest and copies the pak at `pak_path` in next to it.
	///
	/// An existing release with the same tag is replaced.
	pub async fn add_release(&self, release: Release, pak_path: &Path) -> Result<(), RegistryError> {
		let id = ModIdentifier::from(&release);
		let manifest_path = self.manifest_path(&id);
		let release_dir = self.mod_dir(&id).join(&release.tag);
		let io_err = |path: &Path| {
			let path = path.to_path_buf();
			move |source: std::io::Error| RegistryError::IO { path, source }
		};

		let pak_file_name = release.pak_file_name.clone();
		let m = match Self::read_mod(&manifest_path).await {
			Ok(mut existing) => {
				existing.releases.retain(|r| r.tag != release.tag);
				existing.latest_manifest = release.manifest.clone();
				existing.releases.push(release);
				existing
			},
			Err(RegistryError::IO { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
				Mod { latest_manifest: release.manifest.clone(), releases: vec![release] }
			},
			Err(e) => return Err(e),
		};

		tokio::fs::create_dir_all(&release_dir).await.map_err(io_err(&release_dir))?;
		let destination = release_dir.join(&pak_file_name);
		if destination != pak_path {
			tokio::fs::copy(pak_path, &destination).await.map_err(io_err(&destination))?;
		}

		let json = serde_json::to_string_pretty(&m).map_err(|source| RegistryError::Parse { path: manifest_path.clone(), source })?;
		tokio::fs::write(&manifest_path, json).await.map_err(io_err(&manifest_path))?;
		log::info!("added {} to registry at {}", id, self.root.display());
		Ok(())
	}
}

#[async_trait::async_trait]
impl ModRegistry for LocalModRegistry {
	fn name(&self) -> String {
		format!("Local filesystem registry at {}", self.root.display())
	}

	async fn get_all_mods(&self) -> GetAllModsResult {
		let mut result = GetAllModsResult::default();
		let mut manifests = Vec::new();

		for entry in walkdir::WalkDir::new(&self.root).min_depth(3).max_depth(3) {
			match entry {
				Ok(e) if e.file_type().is_file() && e.path().extension().map_or(false, |x| x == "json") => manifests.push(e.into_path()),
				Ok(_) => {},
				Err(e) => result.errors.push(e.into()),
			}
		}

		for path in manifests {
			match Self::read_mod(&path).await {
				Ok(m) => result.mods.push(m),
				Err(e) => {
					log::warn!("{}", e);
					result.errors.push(e);
				},
			}
		}

		log::debug!("{} found {} mods", self.name(), result.mods.len());
		result
	}
}
