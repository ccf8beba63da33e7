//! Everything that has to happen before the game is started.

use crate::mods::ReleaseCoordinates;

pub mod preparer;
pub use preparer::{Preparer, Abort};

pub mod mods_installer;
pub use mods_installer::ModsInstaller;
pub mod signatures;
pub use signatures::{SigPreparer, NoSigPreparer};
pub mod plugin;
pub use plugin::PluginUpdateChecker;
pub mod core_mod;
pub use core_mod::CoreModEnabler;
pub mod pipelines;

/// The state threaded through a modded launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
	/// Releases the user asked for, dependencies are resolved from these.
	pub enabled_releases: Vec<ReleaseCoordinates>,
	pub check_for_dependency_updates: bool,
}

impl LaunchOptions {
	pub fn new(enabled_releases: Vec<ReleaseCoordinates>) -> Self {
		Self {
			enabled_releases,
			check_for_dependency_updates: true,
		}
	}

	pub fn from_options(enabled_releases: Vec<ReleaseCoordinates>, options: &crate::UnchainedOptions) -> Self {
		Self {
			enabled_releases,
			check_for_dependency_updates: options.check_for_dependency_updates(),
		}
	}
}
