//! Various helpers for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use sha2::{Digest, Sha512};
use tokio_util::sync::CancellationToken;

use unchained_rs::dialogue::{UserChoice, UserDialogue};
use unchained_rs::fetcher::{FetchError, PakFetcher, PakTarget};
use unchained_rs::mods::{Dependency, Mod, ModManifest, ModType, OptionFlags, Release, ReleaseCoordinates};
use unchained_rs::pak_dir::{PakDir, BASE_PAK_FILE_NAME, BASE_SIG_FILE_NAME};
use unchained_rs::progress::ProgressSink;

pub fn sha512_hex(content: &[u8]) -> String {
	hex::encode(Sha512::digest(content))
}

/// Manifest for `org/module` depending on the latest release of each `(org, module)` in `dependencies`.
pub fn manifest(org: &str, module: &str, dependencies: &[(&str, &str)]) -> ModManifest {
	ModManifest {
		repo_url: format!("https://github.com/{}/{}", org, module),
		name: module.to_string(),
		description: format!("{} test mod", module),
		home_page: None,
		image_url: None,
		mod_type: ModType::Shared,
		authors: vec!["test".to_string()],
		dependencies: dependencies.iter().map(|(o, m)| Dependency {
			repo_url: format!("https://github.com/{}/{}", o, m),
			version: "*".to_string(),
		}).collect(),
		tags: vec![],
		maps: vec![],
		options: OptionFlags { actor_mod: false },
	}
}

/// A release whose pak is `<module>.pak` and whose hash matches `content`.
pub fn release(org: &str, module: &str, tag: &str, dependencies: &[(&str, &str)], content: &[u8]) -> Release {
	Release {
		tag: tag.to_string(),
		hash: sha512_hex(content),
		pak_file_name: format!("{}.pak", module),
		release_date: chrono::DateTime::<chrono::Utc>::default(),
		manifest: manifest(org, module, dependencies),
	}
}

pub fn mod_of(releases: Vec<Release>) -> Option<Mod> {
	let latest_manifest = releases.last()?.manifest.clone();
	Some(Mod { latest_manifest, releases })
}

/// A temporary pak directory holding the base game's pak and signature.
pub fn pak_dir_with_base() -> std::io::Result<(tempfile::TempDir, PakDir)> {
	let dir = tempfile::tempdir()?;
	std::fs::write(dir.path().join(BASE_PAK_FILE_NAME), b"base pak")?;
	std::fs::write(dir.path().join(BASE_SIG_FILE_NAME), b"base sig")?;
	let pak_dir = PakDir::new(dir.path().to_path_buf(), vec![]);
	Ok((dir, pak_dir))
}

/// Names of every file in `dir` except hidden ones, sorted.
pub fn file_names(dir: &Path) -> std::io::Result<Vec<String>> {
	let mut names = std::fs::read_dir(dir)?
		.map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
		.collect::<std::io::Result<Vec<_>>>()?;
	names.retain(|n| !n.starts_with('.'));
	names.sort();
	Ok(names)
}

/// Serves pak content from memory and remembers what was requested.
#[derive(Default)]
pub struct MemoryFetcher {
	paks: HashMap<ReleaseCoordinates, Vec<u8>>,
	requests: Mutex<Vec<PakTarget>>,
}

impl MemoryFetcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_pak(mut self, release: &Release, content: &[u8]) -> Self {
		self.paks.insert(release.coordinates(), content.to_vec());
		self
	}

	pub fn requests(&self) -> Vec<PakTarget> {
		self.requests.lock().map(|r| r.clone()).unwrap_or_default()
	}
}

#[async_trait::async_trait]
impl PakFetcher for MemoryFetcher {
	async fn download_pak(
		&self,
		target: &PakTarget,
		destination: &Path,
		progress: Option<&dyn ProgressSink>,
		cancel: &CancellationToken,
	) -> Result<(), FetchError> {
		if let Ok(mut requests) = self.requests.lock() {
			requests.push(target.clone());
		}
		if cancel.is_cancelled() {
			return Err(FetchError::Cancelled)
		}
		let content = self.paks.get(&target.coordinates)
			.ok_or_else(|| FetchError::NotFound(target.coordinates.clone()))?;
		tokio::fs::write(destination, content).await?;
		if let Some(progress) = progress {
			progress.report(100.0);
		}
		Ok(())
	}
}

/// Answers questions from a script, falling back to a default once it runs out.
pub struct ScriptedDialogue {
	answers: Mutex<VecDeque<UserChoice>>,
	fallback: UserChoice,
	asked: Mutex<Vec<String>>,
	shown: Mutex<Vec<String>>,
}

impl ScriptedDialogue {
	pub fn new(answers: impl IntoIterator<Item = UserChoice>, fallback: UserChoice) -> Self {
		Self {
			answers: Mutex::new(answers.into_iter().collect()),
			fallback,
			asked: Mutex::new(vec![]),
			shown: Mutex::new(vec![]),
		}
	}

	pub fn always(choice: UserChoice) -> Self {
		Self::new([], choice)
	}

	/// Titles of the questions asked so far.
	pub fn asked(&self) -> Vec<String> {
		self.asked.lock().map(|a| a.clone()).unwrap_or_default()
	}

	/// Titles of the messages shown so far.
	pub fn shown(&self) -> Vec<String> {
		self.shown.lock().map(|s| s.clone()).unwrap_or_default()
	}
}

#[async_trait::async_trait]
impl UserDialogue for ScriptedDialogue {
	async fn ask_yes_no(&self, title: &str, _message: &str) -> UserChoice {
		if let Ok(mut asked) = self.asked.lock() {
			asked.push(title.to_string());
		}
		self.answers.lock().ok()
			.and_then(|mut a| a.pop_front())
			.unwrap_or(self.fallback)
	}

	async fn show_message(&self, title: &str, _message: &str) {
		if let Ok(mut shown) = self.shown.lock() {
			shown.push(title.to_string());
		}
	}
}
