//! The preparer chains for each way of launching the game.

use super::{LaunchOptions, Preparer};

/// Unsigns everything so the game starts unmodded.
pub fn vanilla<T: Send + 'static>(no_sig: Preparer<()>) -> Preparer<T> {
	Preparer::ignore_state(no_sig)
}

/// Installs the enabled mods and signs them, without the server plugin.
pub fn clientside(mods: Preparer<LaunchOptions>, sig: Preparer<()>) -> Preparer<LaunchOptions> {
	mods.sub(sig, |_| ())
}

/// The full modded launch.
///
/// The options adjusted by `core` are what `plugin` and `mods` both see.
pub fn unchained(
	core: Preparer<LaunchOptions>,
	plugin: Preparer<LaunchOptions>,
	mods: Preparer<LaunchOptions>,
	sig: Preparer<()>,
) -> Preparer<LaunchOptions> {
	core.then(plugin.and_then(mods)).sub(sig, |_| ())
}
