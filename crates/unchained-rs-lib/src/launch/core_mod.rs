use std::sync::Arc;

use tokio::sync::Mutex;

use super::{Abort, LaunchOptions, Preparer};
use crate::mods::{ModCatalog, ModIdentifier, ModManager, ReleaseCoordinates};

/// Makes sure the mod every modded launch needs is enabled and, when asked, current.
pub struct CoreModEnabler {
	mods: Arc<Mutex<ModManager>>,
	core: ModIdentifier,
}

impl CoreModEnabler {
	pub fn new(mods: Arc<Mutex<ModManager>>) -> Self {
		Self::with_core_mod(mods, ModIdentifier::new("Chiv2-Community", "Unchained-Mods"))
	}

	pub fn with_core_mod(mods: Arc<Mutex<ModManager>>, core: ModIdentifier) -> Self {
		Self { mods, core }
	}

	/// # Returns
	/// `options` with the chosen core release first in the enabled set.
	pub async fn ensure(&self, options: LaunchOptions) -> Result<LaunchOptions, Abort> {
		let mut mods = self.mods.lock().await;
		let Some(latest) = mods.get_latest_release(&self.core).map(ReleaseCoordinates::from) else {
			log::error!("core mod {} is not in the catalog", self.core);
			return Err(Abort::new(format!("could not find any release of {}", self.core)))
		};

		let enabled = options.enabled_releases.iter().find(|c| c.matches_mod(&self.core)).cloned();
		let chosen = match enabled {
			None => {
				log::info!("enabling core mod {}", latest);
				latest
			},
			Some(current) if options.check_for_dependency_updates && is_newer(&*mods, &latest, &current) => {
				log::info!("updating core mod {} to {}", current, latest.version);
				latest
			},
			Some(current) => current,
		};
		mods.enable_release(&chosen);

		let mut enabled_releases = vec![chosen];
		enabled_releases.extend(options.enabled_releases.into_iter().filter(|c| !c.matches_mod(&self.core)));
		Ok(LaunchOptions { enabled_releases, ..options })
	}

	pub fn into_preparer(self) -> Preparer<LaunchOptions> {
		let this = Arc::new(self);
		Preparer::new(move |options: LaunchOptions| {
			let this = this.clone();
			async move { this.ensure(options).await }
		})
	}
}

/// An enabled release missing from the catalog is always considered outdated.
fn is_newer(catalog: &dyn ModCatalog, candidate: &ReleaseCoordinates, current: &ReleaseCoordinates) -> bool {
	match (catalog.get_release(candidate), catalog.get_release(current)) {
		(Some(candidate), Some(current)) => candidate.version() > current.version(),
		(Some(_), None) => true,
		_ => false,
	}
}
