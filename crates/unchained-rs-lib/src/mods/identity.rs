use serde::*;

use super::{Mod, Release, Dependency};

/// Identifies a mod regardless of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModIdentifier {
	pub org: String,
	pub module_name: String,
}

impl ModIdentifier {
	pub fn new(org: impl Into<String>, module_name: impl Into<String>) -> Self {
		Self {
			org: org.into(),
			module_name: module_name.into(),
		}
	}
}

impl std::fmt::Display for ModIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.org, self.module_name)
	}
}

impl AsRef<ModIdentifier> for ModIdentifier {
	fn as_ref(&self) -> &ModIdentifier {
		self
	}
}

impl From<&Release> for ModIdentifier {
	fn from(release: &Release) -> Self {
		Self::new(release.manifest.organization(), release.manifest.repo_name())
	}
}

impl From<&Mod> for ModIdentifier {
	fn from(m: &Mod) -> Self {
		Self::new(m.latest_manifest.organization(), m.latest_manifest.repo_name())
	}
}

impl From<&Dependency> for ModIdentifier {
	fn from(dependency: &Dependency) -> Self {
		Self::new(dependency.organization(), dependency.repo_name())
	}
}

/// Identifies one specific release of a mod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReleaseCoordinates {
	#[serde(flatten)]
	pub id: ModIdentifier,
	pub version: String,
}

impl ReleaseCoordinates {
	pub fn new(org: impl Into<String>, module_name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			id: ModIdentifier::new(org, module_name),
			version: version.into(),
		}
	}

	/// True if these coordinates point at any release of `id`.
	pub fn matches_mod(&self, id: &ModIdentifier) -> bool {
		&self.id == id
	}

	/// True if both the mod and the version are the same.
	pub fn matches(&self, other: &ReleaseCoordinates) -> bool {
		self == other
	}
}

impl std::fmt::Display for ReleaseCoordinates {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}@{}", self.id, self.version)
	}
}

impl AsRef<ModIdentifier> for ReleaseCoordinates {
	fn as_ref(&self) -> &ModIdentifier {
		&self.id
	}
}

impl From<&Release> for ReleaseCoordinates {
	fn from(release: &Release) -> Self {
		Self {
			id: ModIdentifier::from(release),
			version: release.tag.clone(),
		}
	}
}
