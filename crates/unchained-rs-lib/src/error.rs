//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("pak directory error: {0}")]
	PakDir(#[from] crate::pak_dir::PakDirError),
	#[error("fetch failed: {0}")]
	Fetch(#[from] crate::fetcher::FetchError),
	#[error("hashing failed: {0}")]
	Hash(#[from] crate::hashing::HashFailure),
	#[error("registry error: {0}")]
	Registry(#[from] crate::mods::registry::RegistryError),
}
