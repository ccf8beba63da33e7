//! Signing or unsigning paks before launch.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::{Abort, Preparer};
use crate::dialogue::UserDialogue;
use crate::pak_dir::{PakDir, PakDirError};

async fn report(dialogue: &dyn UserDialogue, step: &str, errors: Vec<PakDirError>) -> Abort {
	for e in &errors {
		log::error!("{}: {}", step, e);
	}
	let message = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
	dialogue.show_message(step, &message).await;
	Abort::new(format!("{} failed with {} errors", step, errors.len()))
}

/// Signs every pak so the game will load it.
pub struct SigPreparer {
	pak_dir: Arc<Mutex<PakDir>>,
	dialogue: Arc<dyn UserDialogue>,
}

impl SigPreparer {
	pub fn new(pak_dir: Arc<Mutex<PakDir>>, dialogue: Arc<dyn UserDialogue>) -> Self {
		Self { pak_dir, dialogue }
	}

	pub async fn prepare(&self) -> Result<(), Abort> {
		let pak_dir = self.pak_dir.lock().await;
		if let Err(errors) = pak_dir.sign_unmanaged().await {
			return Err(report(&*self.dialogue, "Signing unmanaged paks", errors).await)
		}
		if let Err(errors) = pak_dir.sign_all().await {
			return Err(report(&*self.dialogue, "Signing mod paks", errors).await)
		}
		if let Err(errors) = pak_dir.delete_orphaned_sigs().await {
			return Err(report(&*self.dialogue, "Removing orphaned signatures", errors).await)
		}
		log::info!("all paks signed");
		Ok(())
	}

	pub fn into_preparer(self) -> Preparer<()> {
		let this = Arc::new(self);
		Preparer::new(move |()| {
			let this = this.clone();
			async move { this.prepare().await }
		})
	}
}

/// Removes signatures so the game starts without mods.
pub struct NoSigPreparer {
	pak_dir: Arc<Mutex<PakDir>>,
	dialogue: Arc<dyn UserDialogue>,
}

impl NoSigPreparer {
	pub fn new(pak_dir: Arc<Mutex<PakDir>>, dialogue: Arc<dyn UserDialogue>) -> Self {
		Self { pak_dir, dialogue }
	}

	pub async fn prepare(&self) -> Result<(), Abort> {
		let pak_dir = self.pak_dir.lock().await;
		if let Err(errors) = pak_dir.unsign_unmanaged().await {
			return Err(report(&*self.dialogue, "Unsigning unmanaged paks", errors).await)
		}
		if let Err(errors) = pak_dir.unsign_all().await {
			return Err(report(&*self.dialogue, "Unsigning mod paks", errors).await)
		}
		log::info!("all paks unsigned");
		Ok(())
	}

	pub fn into_preparer(self) -> Preparer<()> {
		let this = Arc::new(self);
		Preparer::new(move |()| {
			let this = this.clone();
			async move { this.prepare().await }
		})
	}
}
