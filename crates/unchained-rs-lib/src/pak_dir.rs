//! The game's pak directory and the paks installed into it.
//!
//! A [`PakDir`] owns the records of which releases it installed and under which file names.
//! Files it did not install are "unmanaged" and only touched by the explicit `*_unmanaged` operations.
//! The base game's [`BASE_PAK_FILE_NAME`] and [`BASE_SIG_FILE_NAME`] are never modified.

use std::path::{Path, PathBuf};

use serde::*;

use crate::mods::{ModIdentifier, ReleaseCoordinates};
use crate::fetcher::FetchError;

pub mod naming;
pub mod lock;
pub mod install;
pub use install::InstallAction;
pub mod signing;

pub const BASE_PAK_FILE_NAME: &str = "pakchunk0-WindowsNoEditor.pak";
pub const BASE_SIG_FILE_NAME: &str = "pakchunk0-WindowsNoEditor.sig";

#[derive(Debug, thiserror::Error)]
pub enum PakDirError {
	#[error("IO error on {path}: {source}")]
	IO {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to fetch {coordinates}: {source}")]
	Fetch {
		coordinates: ReleaseCoordinates,
		#[source]
		source: FetchError,
	},
	#[error("default signature file '{0}' not found")]
	MissingDefaultSig(PathBuf),
	#[error("'{0}' already exists")]
	NameCollision(PathBuf),
	#[error("another reconciliation is already running in '{0}'")]
	ReconciliationInProgress(PathBuf),
}

impl PakDirError {
	pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
		let path = path.into();
		move |source| PakDirError::IO { path, source }
	}
}

/// A release installed by a [`PakDir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedPak {
	pub coordinates: ReleaseCoordinates,
	pub pak_file_name: String,
	/// Position in the install list this pak was last placed at.
	pub priority: usize,
}

pub struct PakDir {
	dir: PathBuf,
	managed: Vec<ManagedPak>,
}

impl PakDir {
	/// Records whose file no longer exists are dropped.
	pub fn new(dir: PathBuf, managed: Vec<ManagedPak>) -> Self {
		let mut pak_dir = Self { dir, managed };
		pak_dir.synchronize_with_dir();
		pak_dir
	}

	/// Opens `dir` using records previously written by [`PakDir::save`].
	///
	/// A missing records file is treated as no records.
	pub async fn load(dir: PathBuf, records_path: &Path) -> crate::Result<Self> {
		let managed = match tokio::fs::read_to_string(records_path).await {
			Ok(text) => serde_json::from_str(&text)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("no managed pak records at {}", records_path.display());
				Vec::new()
			},
			Err(e) => return Err(e.into()),
		};
		Ok(Self::new(dir, managed))
	}

	pub async fn save(&self, records_path: &Path) -> crate::Result<()> {
		if let Some(parent) = records_path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(records_path, serde_json::to_string_pretty(&self.managed)?).await?;
		Ok(())
	}

	fn synchronize_with_dir(&mut self) {
		let dir = &self.dir;
		self.managed.retain(|pak| {
			let exists = dir.join(&pak.pak_file_name).is_file();
			if !exists {
				log::warn!("managed pak {} for {} is missing from {}, forgetting it", pak.pak_file_name, pak.coordinates, dir.display());
			}
			exists
		});
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn managed_paks(&self) -> &[ManagedPak] {
		&self.managed
	}

	pub fn pak_path(&self, pak_file_name: &str) -> PathBuf {
		self.dir.join(pak_file_name)
	}

	fn managed_pak(&self, id: &ModIdentifier) -> Option<&ManagedPak> {
		self.managed.iter().find(|p| p.coordinates.matches_mod(id))
	}

	pub fn managed_pak_path(&self, coordinates: &ReleaseCoordinates) -> Option<PathBuf> {
		self.managed.iter()
			.find(|p| p.coordinates.matches(coordinates))
			.map(|p| self.pak_path(&p.pak_file_name))
	}

	/// File names of every `.pak` directly in the directory.
	fn pak_files(&self) -> Vec<String> {
		walkdir::WalkDir::new(&self.dir)
			.min_depth(1)
			.max_depth(1)
			.into_iter()
			.filter_map(|e| match e {
				Ok(e) => Some(e),
				Err(e) => {
					log::warn!("skipping unreadable entry in {}: {}", self.dir.display(), e);
					None
				},
			})
			.filter(|e| e.file_type().is_file() && e.path().extension().map_or(false, |x| x == "pak"))
			.map(|e| e.file_name().to_string_lossy().into_owned())
			.collect()
	}

	/// Mod paks present in the directory but not installed by this [`PakDir`].
	pub fn unmanaged_paks(&self) -> Vec<PathBuf> {
		self.pak_files().into_iter()
			.filter(|name| name != BASE_PAK_FILE_NAME && !self.managed.iter().any(|p| &p.pak_file_name == name))
			.map(|name| self.pak_path(&name))
			.collect()
	}

	/// Removes the installed pak for a mod along with its signature.
	///
	/// Does nothing when the mod is not installed.
	pub async fn uninstall(&mut self, id: &ModIdentifier) -> Result<(), PakDirError> {
		let Some(pak) = self.managed_pak(id).cloned() else {
			log::debug!("{} is not installed, nothing to uninstall", id);
			return Ok(())
		};

		let path = self.pak_path(&pak.pak_file_name);
		Self::unsign(&path).await?;
		delete_file(&path).await?;
		self.managed.retain(|p| p.coordinates != pak.coordinates);
		log::info!("uninstalled {} from {}", pak.coordinates, path.display());
		Ok(())
	}
}

/// Deletes a file, succeeding if it does not exist.
pub(crate) async fn delete_file(path: &Path) -> Result<(), PakDirError> {
	match tokio::fs::remove_file(path).await {
		Ok(()) => {
			log::debug!("deleted {}", path.display());
			Ok(())
		},
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(PakDirError::io(path)(e)),
	}
}

pub(crate) fn sig_path(pak_path: &Path) -> PathBuf {
	pak_path.with_extension("sig")
}

/// Runs every operation, collecting failures rather than stopping at the first.
pub(crate) fn collect_errors(results: Vec<Result<(), PakDirError>>) -> Result<(), Vec<PakDirError>> {
	let errors: Vec<PakDirError> = results.into_iter().filter_map(Result::err).collect();
	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn managed(module: &str, file: &str) -> ManagedPak {
		ManagedPak { coordinates: ReleaseCoordinates::new("Org", module, "v1.0.0"), pak_file_name: file.to_string(), priority: 0 }
	}

	#[test]
	fn drops_records_of_missing_files() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("q__-__A.pak"), b"a").unwrap();
		let pak_dir = PakDir::new(dir.path().to_path_buf(), vec![managed("A", "q__-__A.pak"), managed("B", "q__-__B.pak")]);
		assert_eq!(pak_dir.managed_paks(), &[managed("A", "q__-__A.pak")]);
	}

	#[test]
	fn unmanaged_excludes_base_and_managed() {
		let dir = tempfile::tempdir().unwrap();
		for name in [BASE_PAK_FILE_NAME, "q__-__A.pak", "manual.pak", "notes.txt"] {
			std::fs::write(dir.path().join(name), b"x").unwrap();
		}
		let pak_dir = PakDir::new(dir.path().to_path_buf(), vec![managed("A", "q__-__A.pak")]);
		assert_eq!(pak_dir.unmanaged_paks(), vec![dir.path().join("manual.pak")]);
	}

	#[tokio::test]
	async fn uninstall_removes_pak_and_sig() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("q__-__A.pak"), b"a").unwrap();
		std::fs::write(dir.path().join("q__-__A.sig"), b"s").unwrap();
		let mut pak_dir = PakDir::new(dir.path().to_path_buf(), vec![managed("A", "q__-__A.pak")]);

		pak_dir.uninstall(&ModIdentifier::new("Org", "A")).await.unwrap();
		assert!(pak_dir.managed_paks().is_empty());
		assert!(!dir.path().join("q__-__A.pak").exists());
		assert!(!dir.path().join("q__-__A.sig").exists());
	}

	#[tokio::test]
	async fn uninstall_unknown_is_noop() {
		let dir = tempfile::tempdir().unwrap();
		let mut pak_dir = PakDir::new(dir.path().to_path_buf(), vec![]);
		assert!(pak_dir.uninstall(&ModIdentifier::new("Org", "A")).await.is_ok());
	}

	#[tokio::test]
	async fn records_round_trip_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("q__-__A.pak"), b"a").unwrap();
		let records = dir.path().join("data/managed.json");
		PakDir::new(dir.path().to_path_buf(), vec![managed("A", "q__-__A.pak")]).save(&records).await.unwrap();

		let loaded = PakDir::load(dir.path().to_path_buf(), &records).await.unwrap();
		assert_eq!(loaded.managed_paks(), &[managed("A", "q__-__A.pak")]);
	}
}
