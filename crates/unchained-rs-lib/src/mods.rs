//! Mods, their releases and which of them are enabled.

pub mod identity;
pub use identity::{ModIdentifier, ReleaseCoordinates};

pub mod release;
pub use release::{Mod, Release, ModManifest, Dependency, ModType, ModTag, OptionFlags};

pub mod catalog;
pub use catalog::ModCatalog;

pub mod registry;
pub mod dependency_resolver;

pub mod manager;
pub use manager::{ModManager, ModEvent, UpdateCandidate};
