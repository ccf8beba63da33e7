//! Questions the core needs a user to answer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
	Yes,
	No,
	Cancel,
}

#[async_trait::async_trait]
pub trait UserDialogue: Send + Sync {
	async fn ask_yes_no(&self, title: &str, message: &str) -> UserChoice;
	async fn show_message(&self, title: &str, message: &str);
}

/// Answers every question the same way, for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoAnswer(pub UserChoice);

#[async_trait::async_trait]
impl UserDialogue for AutoAnswer {
	async fn ask_yes_no(&self, title: &str, message: &str) -> UserChoice {
		log::info!("{}: {} -> {:?}", title, message, self.0);
		self.0
	}

	async fn show_message(&self, title: &str, message: &str) {
		log::info!("{}: {}", title, message);
	}
}
