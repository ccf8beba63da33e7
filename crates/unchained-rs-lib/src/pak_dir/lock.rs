use std::fs::File;
use std::path::{Path, PathBuf};

use fs2::FileExt;

pub const LOCK_FILE_NAME: &str = ".unchained-rs.lock";

/// Advisory exclusive lock over a pak directory, released on drop.
#[derive(Debug)]
pub struct DirLock {
	file: File,
	path: PathBuf,
}

impl DirLock {
	/// # Returns
	/// `Ok(None)` when another holder already has the lock.
	pub fn try_acquire(dir: &Path) -> std::io::Result<Option<Self>> {
		let path = dir.join(LOCK_FILE_NAME);
		let file = std::fs::OpenOptions::new().create(true).write(true).open(&path)?;

		match file.try_lock_exclusive() {
			Ok(()) => {
				log::debug!("acquired lock {}", path.display());
				Ok(Some(Self { file, path }))
			},
			Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
				log::debug!("lock {} already held", path.display());
				Ok(None)
			},
			Err(e) => Err(e),
		}
	}
}

impl Drop for DirLock {
	fn drop(&mut self) {
		if let Err(e) = self.file.unlock() {
			log::warn!("failed to release lock {}: {}", self.path.display(), e);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn second_lock_is_refused() {
		let dir = tempfile::tempdir().unwrap();
		let first = DirLock::try_acquire(dir.path()).unwrap();
		assert!(first.is_some());
		assert!(DirLock::try_acquire(dir.path()).unwrap().is_none());
		drop(first);
		assert!(DirLock::try_acquire(dir.path()).unwrap().is_some());
	}
}
