use super::{Mod, Release, ModIdentifier, ReleaseCoordinates};

/// Read access to the known mods and their releases.
pub trait ModCatalog {
	fn mods(&self) -> &[Mod];

	fn get_mod(&self, id: &ModIdentifier) -> Option<&Mod> {
		self.mods().iter().find(|m| &m.id() == id)
	}

	fn get_release(&self, coordinates: &ReleaseCoordinates) -> Option<&Release> {
		self.get_mod(&coordinates.id)?
			.releases.iter()
			.find(|r| r.tag == coordinates.version)
	}

	fn get_latest_release(&self, id: &ModIdentifier) -> Option<&Release> {
		self.get_mod(id)?.latest_release()
	}
}

impl ModCatalog for Vec<Mod> {
	fn mods(&self) -> &[Mod] {
		self
	}
}
