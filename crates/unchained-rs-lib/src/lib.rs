pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::UnchainedOptions;

pub mod mods;
pub use mods::{ModIdentifier, ReleaseCoordinates, Mod, Release, ModManager};

pub mod pak_dir;
pub use pak_dir::{PakDir, ManagedPak, PakDirError};

pub mod fetcher;
pub use fetcher::{PakFetcher, PakTarget, FetchError};

pub mod hashing;
pub mod progress;
pub mod dialogue;
pub mod launch;
