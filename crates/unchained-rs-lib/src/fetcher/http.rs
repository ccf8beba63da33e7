use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::{FetchError, PakFetcher, PakTarget};
use crate::progress::ProgressSink;

/// Downloads paks from release assets, `<repo_url>/releases/download/<tag>/<pak_file_name>`.
///
/// With a base url set, the repository is looked up as `<base_url>/<org>/<repo>` instead.
pub struct HttpPakFetcher {
	client: reqwest::Client,
	base_url: Option<String>,
	https_only: bool,
}

impl HttpPakFetcher {
	pub fn new(client: reqwest::Client) -> Self {
		Self {
			client,
			base_url: None,
			https_only: true,
		}
	}

	pub fn from_options(client: reqwest::Client, options: &crate::UnchainedOptions) -> Self {
		Self::new(client).with_https_only(options.https_only())
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
		self
	}

	pub fn with_https_only(mut self, https_only: bool) -> Self {
		self.https_only = https_only;
		self
	}

	pub fn url_for(&self, target: &PakTarget) -> String {
		let repo = match &self.base_url {
			Some(base_url) => format!("{}/{}/{}", base_url, target.coordinates.id.org, target.coordinates.id.module_name),
			None => target.repo_url.trim_end_matches('/').to_string(),
		};
		format!("{}/releases/download/{}/{}", repo, target.coordinates.version, target.pak_file_name)
	}
}

#[async_trait::async_trait]
impl PakFetcher for HttpPakFetcher {
	async fn download_pak(
		&self,
		target: &PakTarget,
		destination: &Path,
		progress: Option<&dyn ProgressSink>,
		cancel: &CancellationToken,
	) -> Result<(), FetchError> {
		let url = self.url_for(target);
		if self.https_only && !url.starts_with("https://") {
			return Err(FetchError::InsecureUrl(url))
		}

		log::info!("downloading {} from {}", target, url);
		let response = self.client.get(&url).send().await?;
		match response.status() {
			reqwest::StatusCode::NOT_FOUND => return Err(FetchError::NotFound(target.coordinates.clone())),
			status if !status.is_success() => return Err(FetchError::Status { url, status }),
			_ => {},
		}

		let size = response.content_length();
		super::file_writer::write_stream(response.bytes_stream(), size, destination, progress, cancel).await?;
		Ok(())
	}
}
