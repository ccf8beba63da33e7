//! Signature files.
//!
//! The game refuses paks without a matching `.sig`, a copy of the base game's signature is accepted.

use std::path::{Path, PathBuf};

use super::{PakDir, PakDirError, BASE_PAK_FILE_NAME, BASE_SIG_FILE_NAME, collect_errors, delete_file, sig_path, lock::LOCK_FILE_NAME};

impl PakDir {
	pub fn default_sig_path(&self) -> PathBuf {
		self.dir.join(BASE_SIG_FILE_NAME)
	}

	fn managed_pak_paths(&self) -> Vec<PathBuf> {
		self.managed.iter().map(|p| self.pak_path(&p.pak_file_name)).collect()
	}

	/// Copies the default signature next to `pak_path` unless it is already signed.
	pub async fn sign(&self, pak_path: &Path) -> Result<(), PakDirError> {
		let signed = sig_path(pak_path);
		if tokio::fs::try_exists(&signed).await.unwrap_or(false) {
			log::trace!("{} already signed", pak_path.display());
			return Ok(())
		}

		let default_sig = self.default_sig_path();
		if !tokio::fs::try_exists(&default_sig).await.unwrap_or(false) {
			return Err(PakDirError::MissingDefaultSig(default_sig))
		}
		tokio::fs::copy(&default_sig, &signed).await.map_err(PakDirError::io(&signed))?;
		log::debug!("signed {}", pak_path.display());
		Ok(())
	}

	pub async fn unsign(pak_path: &Path) -> Result<(), PakDirError> {
		delete_file(&sig_path(pak_path)).await
	}

	async fn sign_each(&self, paths: Vec<PathBuf>) -> Result<(), Vec<PakDirError>> {
		let mut results = Vec::with_capacity(paths.len());
		for path in paths {
			results.push(self.sign(&path).await);
		}
		collect_errors(results)
	}

	async fn unsign_each(paths: Vec<PathBuf>) -> Result<(), Vec<PakDirError>> {
		let mut results = Vec::with_capacity(paths.len());
		for path in paths {
			results.push(Self::unsign(&path).await);
		}
		collect_errors(results)
	}

	async fn delete_each(paths: Vec<PathBuf>) -> Result<(), Vec<PakDirError>> {
		let mut results = Vec::with_capacity(paths.len());
		for path in paths {
			results.push(delete_file(&path).await);
		}
		collect_errors(results)
	}

	pub async fn sign_all(&self) -> Result<(), Vec<PakDirError>> {
		self.sign_each(self.managed_pak_paths()).await
	}

	pub async fn unsign_all(&self) -> Result<(), Vec<PakDirError>> {
		Self::unsign_each(self.managed_pak_paths()).await
	}

	pub async fn sign_unmanaged(&self) -> Result<(), Vec<PakDirError>> {
		self.sign_each(self.unmanaged_paks()).await
	}

	pub async fn unsign_unmanaged(&self) -> Result<(), Vec<PakDirError>> {
		Self::unsign_each(self.unmanaged_paks()).await
	}

	/// Deletes unmanaged paks and their signatures.
	pub async fn delete_unmanaged(&self) -> Result<(), Vec<PakDirError>> {
		let paks = self.unmanaged_paks();
		let sigs = paks.iter().map(|p| sig_path(p)).collect();
		let sig_result = Self::delete_each(sigs).await;
		let pak_result = Self::delete_each(paks).await;
		match (sig_result, pak_result) {
			(Ok(()), Ok(())) => Ok(()),
			(a, b) => Err(a.err().into_iter().chain(b.err()).flatten().collect()),
		}
	}

	/// Signatures whose pak is gone.
	fn orphaned_sigs(&self) -> Vec<PathBuf> {
		walkdir::WalkDir::new(&self.dir)
			.min_depth(1)
			.max_depth(1)
			.into_iter()
			.filter_map(Result::ok)
			.map(walkdir::DirEntry::into_path)
			.filter(|p| p.extension().map_or(false, |x| x == "sig") && !p.with_extension("pak").is_file())
			.filter(|p| p.file_name().map_or(true, |n| n != BASE_SIG_FILE_NAME))
			.collect()
	}

	pub async fn delete_orphaned_sigs(&self) -> Result<(), Vec<PakDirError>> {
		Self::delete_each(self.orphaned_sigs()).await
	}

	/// Deletes everything except the base game's pak and signature, and forgets all managed paks.
	pub async fn reset(&mut self) -> Result<(), Vec<PakDirError>> {
		let keep = [BASE_PAK_FILE_NAME, BASE_SIG_FILE_NAME, LOCK_FILE_NAME];
		let paths = walkdir::WalkDir::new(&self.dir)
			.min_depth(1)
			.max_depth(1)
			.into_iter()
			.filter_map(Result::ok)
			.filter(|e| e.file_type().is_file())
			.filter(|e| !keep.iter().any(|k| e.file_name() == *k))
			.map(walkdir::DirEntry::into_path)
			.collect();

		let result = Self::delete_each(paths).await;
		self.synchronize_with_dir();
		log::info!("reset {}", self.dir.display());
		result
	}
}
