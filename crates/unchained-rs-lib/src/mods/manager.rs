//! Tracks which release of each mod the user has enabled.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::{Mod, Release, ModCatalog, ModIdentifier, ReleaseCoordinates};
use super::registry::{ModRegistry, RegistryError};

/// Published whenever the enabled set changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ModEvent {
	/// `previous` is the version of the same mod that was enabled before, if any.
	Enabled { release: Release, previous: Option<String> },
	Disabled { release: Release },
}

/// An enabled release with a newer release available.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCandidate {
	pub current: Release,
	pub available: Release,
}

impl UpdateCandidate {
	/// Only produces a candidate when `available` is strictly newer than `current`.
	pub fn new(current: &Release, available: &Release) -> Option<Self> {
		if available.version() > current.version() {
			Some(Self { current: current.clone(), available: available.clone() })
		} else {
			None
		}
	}
}

#[derive(Default)]
pub struct ModManager {
	mods: Vec<Mod>,
	enabled: Vec<ReleaseCoordinates>,
	subscribers: Vec<UnboundedSender<ModEvent>>,
}

impl ModCatalog for ModManager {
	fn mods(&self) -> &[Mod] {
		&self.mods
	}
}

impl ModManager {
	pub fn new(mods: Vec<Mod>) -> Self {
		Self {
			mods,
			..Default::default()
		}
	}

	/// Restores a previously enabled set, releases missing from the catalog are dropped.
	pub fn with_enabled(mut self, enabled: impl IntoIterator<Item = ReleaseCoordinates>) -> Self {
		for coordinates in enabled {
			if !self.enable_release(&coordinates) {
				log::warn!("could not restore enabled release {}", coordinates);
			}
		}
		self
	}

	/// Receives every [`ModEvent`] published after this call.
	pub fn subscribe(&mut self) -> UnboundedReceiver<ModEvent> {
		let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
		self.subscribers.push(tx);
		rx
	}

	fn publish(&mut self, event: ModEvent) {
		log::trace!("publishing {:?}", event);
		self.subscribers.retain(|s| s.send(event.clone()).is_ok());
	}

	pub fn enabled(&self) -> &[ReleaseCoordinates] {
		&self.enabled
	}

	pub fn enabled_releases(&self) -> Vec<&Release> {
		self.enabled.iter().filter_map(|c| self.get_release(c)).collect()
	}

	pub fn currently_enabled_release(&self, id: &ModIdentifier) -> Option<&Release> {
		self.enabled.iter()
			.find(|c| c.matches_mod(id))
			.and_then(|c| self.get_release(c))
	}

	/// Enables a release, disabling any other release of the same mod.
	///
	/// # Returns
	/// `false` if the release is unknown or already enabled.
	pub fn enable_release(&mut self, coordinates: &ReleaseCoordinates) -> bool {
		let Some(release) = self.get_release(coordinates).cloned() else {
			log::warn!("cannot enable {}, not in catalog", coordinates);
			return false
		};
		if self.enabled.contains(coordinates) {
			return false
		}

		let previous = self.enabled.iter().position(|c| c.matches_mod(&coordinates.id))
			.map(|i| self.enabled.remove(i).version);
		self.enabled.push(coordinates.clone());

		log::info!("enabled {}", coordinates);
		self.publish(ModEvent::Enabled { release, previous });
		true
	}

	/// Enables the latest release of a mod.
	pub fn enable_mod(&mut self, id: &ModIdentifier) -> bool {
		match self.get_latest_release(id).map(ReleaseCoordinates::from) {
			Some(coordinates) => self.enable_release(&coordinates),
			None => {
				log::warn!("cannot enable {}, no releases in catalog", id);
				false
			},
		}
	}

	/// # Returns
	/// `false` if the release was not enabled.
	pub fn disable_release(&mut self, coordinates: &ReleaseCoordinates) -> bool {
		let Some(i) = self.enabled.iter().position(|c| c == coordinates) else {
			return false
		};
		self.enabled.remove(i);

		log::info!("disabled {}", coordinates);
		match self.get_release(coordinates).cloned() {
			Some(release) => self.publish(ModEvent::Disabled { release }),
			None => log::debug!("disabled {} is no longer in the catalog, no event published", coordinates),
		}
		true
	}

	pub fn disable_mod(&mut self, id: &ModIdentifier) -> bool {
		match self.enabled.iter().find(|c| c.matches_mod(id)).cloned() {
			Some(coordinates) => self.disable_release(&coordinates),
			None => false,
		}
	}

	pub fn update_candidates(&self) -> Vec<UpdateCandidate> {
		self.enabled_releases().into_iter()
			.filter_map(|current| {
				let latest = self.get_latest_release(&ModIdentifier::from(current))?;
				UpdateCandidate::new(current, latest)
			})
			.collect()
	}

	/// Every release needed to launch with the enabled set, dependencies first.
	pub fn install_closure(&self) -> Vec<Release> {
		super::dependency_resolver::install_closure(self, &self.enabled)
	}

	/// Replaces the catalog with the registry's contents.
	///
	/// When the registry produced nothing but errors the current catalog is kept.
	///
	/// # Returns
	/// The errors encountered by the registry.
	pub async fn update_mods_list(&mut self, registry: &dyn ModRegistry) -> Vec<RegistryError> {
		let result = registry.get_all_mods().await;
		if result.mods.is_empty() && result.has_errors() {
			log::warn!("{} returned only errors, keeping the current mod list", registry.name());
			return result.errors
		}

		log::info!("loaded {} mods from {}", result.mods.len(), registry.name());
		self.mods = result.mods;
		for coordinates in &self.enabled {
			if self.get_release(coordinates).is_none() {
				log::warn!("enabled release {} is no longer in the catalog", coordinates);
			}
		}
		result.errors
	}
}
