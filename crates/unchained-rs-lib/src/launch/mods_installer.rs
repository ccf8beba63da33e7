//! Makes sure every enabled release and its dependencies are installed and intact.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Abort, LaunchOptions, Preparer};
use crate::dialogue::{UserChoice, UserDialogue};
use crate::fetcher::{PakFetcher, PakTarget};
use crate::hashing::{self, HashCheck};
use crate::mods::{ModCatalog, ModIdentifier, ModManager};
use crate::pak_dir::PakDir;
use crate::progress::AccumulatedProgress;

pub struct ModsInstaller {
	mods: Arc<Mutex<ModManager>>,
	pak_dir: Arc<Mutex<PakDir>>,
	fetcher: Arc<dyn PakFetcher>,
	dialogue: Arc<dyn UserDialogue>,
	progress: Option<AccumulatedProgress>,
	records_path: Option<PathBuf>,
	cancel: CancellationToken,
}

impl ModsInstaller {
	pub fn new(
		mods: Arc<Mutex<ModManager>>,
		pak_dir: Arc<Mutex<PakDir>>,
		fetcher: Arc<dyn PakFetcher>,
		dialogue: Arc<dyn UserDialogue>,
	) -> Self {
		Self {
			mods,
			pak_dir,
			fetcher,
			dialogue,
			progress: None,
			records_path: None,
			cancel: CancellationToken::new(),
		}
	}

	/// Every download started by this installer is tracked by `progress`.
	pub fn with_progress(mut self, progress: AccumulatedProgress) -> Self {
		self.progress = Some(progress);
		self
	}

	/// Saves the managed pak records here after installing.
	pub fn with_records_path(mut self, records_path: PathBuf) -> Self {
		self.records_path = Some(records_path);
		self
	}

	/// Cancelling `cancel` stops in-flight downloads.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Resolves, verifies and installs the releases in `options`.
	///
	/// # Errors
	/// Aborts when an enabled release is unknown, when the user cancels a re-download prompt, or when
	/// some installs failed and the user declines to continue.
	pub async fn install(&self, options: &LaunchOptions) -> Result<(), Abort> {
		let releases = {
			let mods = self.mods.lock().await;
			if let Some(missing) = options.enabled_releases.iter().find(|c| mods.get_release(c).is_none()) {
				log::error!("enabled release {} is not in the catalog", missing);
				return Err(Abort::new(format!("release {} could not be found", missing)))
			}
			crate::mods::dependency_resolver::install_closure(&*mods, &options.enabled_releases)
		};

		let mut pak_dir = self.pak_dir.lock().await;
		for check in hashing::validate_releases(&pak_dir, &releases).await {
			match check {
				HashCheck::Mismatch { release, actual } => {
					let message = format!(
						"The installed pak for {} does not match its release.\nExpected {}\nFound {}\n\nDownload it again?",
						release, release.hash, actual,
					);
					match self.dialogue.ask_yes_no("Hash mismatch", &message).await {
						UserChoice::Yes => {
							pak_dir.uninstall(&ModIdentifier::from(&release)).await
								.map_err(|e| Abort::new(format!("failed to remove {}: {}", release, e)))?;
						},
						UserChoice::No => log::warn!("keeping mismatched pak for {}", release),
						UserChoice::Cancel => return Err(Abort::new("cancelled at hash mismatch prompt")),
					}
				},
				HashCheck::Failed(release, e) => log::warn!("could not verify {}: {}", release, e),
				HashCheck::Matched(_) | HashCheck::Missing(_) => {},
			}
		}

		let targets: Vec<PakTarget> = releases.iter().map(PakTarget::from).collect();
		let results: Vec<_> = pak_dir
			.install_set(targets, &*self.fetcher, self.progress.clone(), self.cancel.clone())
			.collect()
			.await;

		let failures: Vec<String> = results.into_iter()
			.filter_map(Result::err)
			.map(|e| {
				log::error!("{}", e);
				e.to_string()
			})
			.collect();

		if let Some(records_path) = &self.records_path {
			if let Err(e) = pak_dir.save(records_path).await {
				log::error!("failed to save managed pak records: {}", e);
			}
		}

		if !failures.is_empty() {
			let message = format!("Some mods failed to install:\n{}\n\nLaunch anyway?", failures.join("\n"));
			if self.dialogue.ask_yes_no("Install failed", &message).await != UserChoice::Yes {
				return Err(Abort::new(format!("{} mods failed to install", failures.len())))
			}
		}
		Ok(())
	}

	pub fn into_preparer(self) -> Preparer<LaunchOptions> {
		let this = Arc::new(self);
		Preparer::new(move |options: LaunchOptions| {
			let this = this.clone();
			async move {
				this.install(&options).await?;
				Ok(options)
			}
		})
	}
}
