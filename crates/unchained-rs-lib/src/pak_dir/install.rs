//! Reconciling the directory with an ordered list of releases.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{PakDir, PakDirError, ManagedPak, naming, lock::DirLock};
use crate::fetcher::{PakFetcher, PakTarget};
use crate::progress::{AccumulatedProgress, MemoryProgress};

/// One step of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
	/// Already installed under the right name, or under the name an unmanaged file pushed it to.
	Skip { target: PakTarget, index: usize, existing: ManagedPak },
	/// Installed, but under a name for a different position.
	Move { target: PakTarget, index: usize, existing: ManagedPak, pak_file_name: String },
	Download { target: PakTarget, index: usize, pak_file_name: String },
	/// Installed but no longer wanted.
	Remove { existing: ManagedPak },
}

/// Work left in an ongoing reconciliation.
struct Reconciliation<'a> {
	pak_dir: &'a mut PakDir,
	fetcher: &'a dyn PakFetcher,
	progress: Option<AccumulatedProgress>,
	cancel: CancellationToken,
	targets: Vec<PakTarget>,
	pending: Option<VecDeque<InstallAction>>,
	lock: Option<DirLock>,
}

impl PakDir {
	/// Works out what [`PakDir::install_set`] would do for `targets`, in execution order.
	pub fn plan(&self, targets: &[PakTarget]) -> Vec<InstallAction> {
		let names = naming::install_names(targets);
		let unmanaged: HashSet<String> = self.pak_files().into_iter()
			.filter(|name| !self.managed.iter().any(|p| &p.pak_file_name == name))
			.collect();

		let mut skips = Vec::new();
		let mut moves = Vec::new();
		let mut downloads = Vec::new();
		for (index, (target, pak_file_name)) in targets.iter().zip(names).enumerate() {
			match self.managed.iter().find(|p| p.coordinates.matches(&target.coordinates)) {
				None => downloads.push(InstallAction::Download { target: target.clone(), index, pak_file_name }),
				Some(existing) if Self::displaced_name(&pak_file_name, &unmanaged, &existing.pak_file_name) => {
					skips.push(InstallAction::Skip { target: target.clone(), index, existing: existing.clone() })
				},
				Some(existing) => {
					moves.push(InstallAction::Move { target: target.clone(), index, existing: existing.clone(), pak_file_name })
				},
			}
		}

		let wanted: HashSet<_> = targets.iter().map(|t| &t.coordinates).collect();
		self.managed.iter()
			.filter(|p| !wanted.contains(&p.coordinates))
			.map(|p| InstallAction::Remove { existing: p.clone() })
			.chain(skips)
			.chain(moves)
			.chain(downloads)
			.collect()
	}

	/// Makes the directory contain exactly `targets`, in that load order.
	///
	/// `targets` must already be sorted with dependencies before their dependents.
	/// Paks no longer wanted are removed first, then installed paks are kept or renamed
	/// into position, then missing paks are downloaded and signed.
	///
	/// The stream is lazy, nothing happens until it is polled. It yields one result per target,
	/// removals are logged rather than yielded. A failure for one target does not stop the rest.
	/// Dropping the stream stops further work, completed steps are not undone.
	///
	/// # Errors
	/// Yields a single [`PakDirError::ReconciliationInProgress`] when another reconciliation holds
	/// the directory.
	pub fn install_set<'a>(
		&'a mut self,
		targets: Vec<PakTarget>,
		fetcher: &'a dyn PakFetcher,
		progress: Option<AccumulatedProgress>,
		cancel: CancellationToken,
	) -> BoxStream<'a, Result<ManagedPak, PakDirError>> {
		let state = Reconciliation {
			pak_dir: self,
			fetcher,
			progress,
			cancel,
			targets,
			pending: None,
			lock: None,
		};

		stream::unfold(state, |mut state| async move {
			if state.pending.is_none() {
				match DirLock::try_acquire(&state.pak_dir.dir) {
					Ok(Some(lock)) => state.lock = Some(lock),
					Ok(None) => {
						let dir = state.pak_dir.dir.clone();
						state.pending = Some(VecDeque::new());
						return Some((Err(PakDirError::ReconciliationInProgress(dir)), state))
					},
					Err(e) => {
						let path = state.pak_dir.dir.join(super::lock::LOCK_FILE_NAME);
						state.pending = Some(VecDeque::new());
						return Some((Err(PakDirError::IO { path, source: e }), state))
					},
				}
				let plan = state.pak_dir.plan(&state.targets);
				log::info!("reconciling {} paks in {} with {} actions", state.targets.len(), state.pak_dir.dir.display(), plan.len());
				state.pending = Some(plan.into());
			}

			while let Some(action) = state.pending.as_mut().and_then(VecDeque::pop_front) {
				let result = match action {
					InstallAction::Remove { existing } => {
						state.pak_dir.process_remove(existing).await;
						continue;
					},
					InstallAction::Skip { index, existing, .. } => state.pak_dir.process_skip(index, existing),
					InstallAction::Move { index, existing, pak_file_name, .. } => state.pak_dir.process_move(index, existing, pak_file_name).await,
					InstallAction::Download { target, index, pak_file_name } => {
						state.pak_dir.process_download(target, index, pak_file_name, state.fetcher, state.progress.as_ref(), &state.cancel).await
					},
				};
				return Some((result, state))
			}

			if let Some(lock) = state.lock.take() {
				drop(lock);
				log::info!("finished reconciling {}", state.pak_dir.dir.display());
			}
			None
		}).boxed()
	}

	async fn process_remove(&mut self, existing: ManagedPak) {
		let path = self.pak_path(&existing.pak_file_name);
		let result = async {
			Self::unsign(&path).await?;
			super::delete_file(&path).await
		}.await;

		match result {
			Ok(()) => {
				log::info!("removed {} ({})", existing.coordinates, existing.pak_file_name);
				self.managed.retain(|p| p.coordinates != existing.coordinates);
			},
			Err(e) => log::error!("failed to remove {}: {}", existing.coordinates, e),
		}
	}

	fn process_skip(&mut self, index: usize, existing: ManagedPak) -> Result<ManagedPak, PakDirError> {
		log::debug!("{} already installed as {}", existing.coordinates, existing.pak_file_name);
		let updated = ManagedPak { priority: index, ..existing };
		if let Some(record) = self.managed.iter_mut().find(|p| p.coordinates == updated.coordinates) {
			record.priority = index;
		}
		Ok(updated)
	}

	async fn process_move(&mut self, index: usize, existing: ManagedPak, pak_file_name: String) -> Result<ManagedPak, PakDirError> {
		let source = self.pak_path(&existing.pak_file_name);
		let destination = self.pak_path(&pak_file_name);
		if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
			return Err(PakDirError::NameCollision(destination))
		}

		tokio::fs::rename(&source, &destination).await.map_err(PakDirError::io(&source))?;
		let source_sig = super::sig_path(&source);
		if tokio::fs::try_exists(&source_sig).await.unwrap_or(false) {
			let destination_sig = super::sig_path(&destination);
			tokio::fs::rename(&source_sig, &destination_sig).await.map_err(PakDirError::io(&source_sig))?;
		}
		log::info!("moved {} from {} to {}", existing.coordinates, existing.pak_file_name, pak_file_name);

		let moved = ManagedPak { coordinates: existing.coordinates, pak_file_name, priority: index };
		self.managed.retain(|p| p.coordinates != moved.coordinates);
		self.managed.push(moved.clone());
		Ok(moved)
	}

	/// Whether `current` is where a download for `wanted` lands when unmanaged files hold
	/// `wanted` and its successors.
	fn displaced_name(wanted: &str, unmanaged: &HashSet<String>, current: &str) -> bool {
		let mut name = wanted.to_string();
		loop {
			if name == current {
				return true
			}
			if !unmanaged.contains(&name) {
				return false
			}
			name = successor_pak_name(&name);
		}
	}

	/// First name derived from `suggested` which no pak in the directory uses.
	fn free_pak_name(&self, suggested: &str) -> String {
		let taken: HashSet<String> = self.pak_files().into_iter()
			.chain(self.managed.iter().map(|p| p.pak_file_name.clone()))
			.collect();

		let mut name = suggested.to_string();
		while taken.contains(&name) {
			name = successor_pak_name(&name);
		}
		name
	}

	async fn process_download(
		&mut self,
		target: PakTarget,
		index: usize,
		pak_file_name: String,
		fetcher: &dyn PakFetcher,
		progress: Option<&AccumulatedProgress>,
		cancel: &CancellationToken,
	) -> Result<ManagedPak, PakDirError> {
		let pak_file_name = self.free_pak_name(&pak_file_name);
		let destination = self.pak_path(&pak_file_name);

		let download_progress = MemoryProgress::new();
		if let Some(progress) = progress {
			progress.also_track(download_progress.clone());
		}

		log::info!("downloading {} from {} to {}", target, target.repo_url, destination.display());
		fetcher.download_pak(&target, &destination, Some(&download_progress), cancel).await
			.map_err(|source| PakDirError::Fetch { coordinates: target.coordinates.clone(), source })?;

		let installed = ManagedPak { coordinates: target.coordinates, pak_file_name, priority: index };
		self.managed.retain(|p| p.coordinates != installed.coordinates);
		self.managed.push(installed.clone());

		if let Err(e) = self.sign(&destination).await {
			log::error!("failed to sign {}: {}", installed.pak_file_name, e);
		}
		Ok(installed)
	}
}

/// `name` with the textual successor of its stem, keeping the extension.
fn successor_pak_name(name: &str) -> String {
	let path = PathBuf::from(name);
	let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	let extension = path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
	format!("{}{}", naming::textual_successor(&stem), extension)
}
