//! Launcher core options.

use std::path::{Path, PathBuf};

pub struct UnchainedOptions {
	pak_dir: Option<PathBuf>,
	data_dir: PathBuf,
	download_dir: PathBuf,
	https_only: bool,
	check_for_dependency_updates: bool,
}

/// Resolves a per-user base directory, falling back to the working directory when the environment is bare.
fn user_dir(xdg_var: &str, home_suffix: &str) -> PathBuf {
	#[cfg(target_os = "windows")]
	let path = {
		let _ = (xdg_var, home_suffix);
		std::env::var("APPDATA").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
	};

	#[cfg(not(target_os = "windows"))]
	let path = if let Ok(e) = std::env::var(xdg_var) {
		PathBuf::from(e)
	} else if let Ok(home) = std::env::var("HOME") {
		PathBuf::from(home).join(home_suffix)
	} else {
		log::warn!("neither {} nor HOME is set, using the working directory", xdg_var);
		PathBuf::from(".")
	};

	path.join("unchained-rs")
}

impl Default for UnchainedOptions {
	fn default() -> Self {
		Self {
			pak_dir: None,
			data_dir: user_dir("XDG_DATA_HOME", ".local/share").join("data"),
			download_dir: user_dir("XDG_CACHE_HOME", ".cache").join("registry"),
			https_only: true,
			check_for_dependency_updates: true,
		}
	}
}

impl UnchainedOptions {
	/// Creates the data and download directories if they are missing.
	pub async fn create_dirs(&self) -> std::io::Result<()> {
		tokio::fs::create_dir_all(&self.data_dir).await?;
		tokio::fs::create_dir_all(&self.download_dir).await
	}

	pub fn pak_dir(&self) -> Option<&Path> {
		self.pak_dir.as_deref()
	}
	/// returns if the directory is valid or not.
	pub fn set_pak_dir(&mut self, pak_dir: PathBuf) -> bool {
		if pak_dir.is_dir() {
			self.pak_dir = Some(pak_dir);
			true
		} else {
			false
		}
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}
	/// returns if the directory is valid or not.
	pub fn set_data_dir(&mut self, data_dir: PathBuf) -> bool {
		if data_dir.is_dir() {
			self.data_dir = data_dir;
			true
		} else {
			false
		}
	}

	/// Where the managed pak records are persisted between runs.
	pub fn managed_paks_path(&self) -> PathBuf {
		self.data_dir.join("managed_paks.json")
	}

	pub fn download_dir(&self) -> &Path {
		&self.download_dir
	}
	/// returns if the directory is valid or not.
	pub fn set_download_dir(&mut self, download_dir: PathBuf) -> bool {
		if download_dir.is_dir() {
			self.download_dir = download_dir;
			true
		} else {
			false
		}
	}

	pub fn https_only(&self) -> bool {
		self.https_only
	}
	pub fn set_https_only(&mut self, https_only: bool) {
		self.https_only = https_only;
	}

	pub fn check_for_dependency_updates(&self) -> bool {
		self.check_for_dependency_updates
	}
	pub fn set_check_for_dependency_updates(&mut self, check: bool) {
		self.check_for_dependency_updates = check;
	}
}
