//! Keeping the server plugin binary current.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{Abort, LaunchOptions, Preparer};
use crate::dialogue::{UserChoice, UserDialogue};
use crate::fetcher::FetchError;

pub const PLUGIN_FILE_NAME: &str = "UnchainedPlugin.dll";

#[derive(Debug, Clone, PartialEq)]
pub struct PluginRelease {
	pub version: semver::Version,
	pub download_url: String,
	pub page_url: Option<String>,
}

/// Where plugin releases are published.
#[async_trait::async_trait]
pub trait PluginSource: Send + Sync {
	/// `None` when the latest release could not be determined.
	async fn latest_release(&self) -> Option<PluginRelease>;
	async fn download(&self, release: &PluginRelease, destination: &Path) -> Result<(), FetchError>;
}

/// Reads the version of an installed plugin.
pub trait VersionExtractor: Send + Sync {
	fn version(&self, path: &Path) -> Option<semver::Version>;
}

/// Path of the file recording which plugin version was installed.
pub fn version_record_path(plugin_path: &Path) -> PathBuf {
	let mut name = plugin_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(".version");
	plugin_path.with_file_name(name)
}

/// Uses the version recorded next to the plugin when it was installed.
///
/// A plugin without a record is treated as not installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedVersion;

impl VersionExtractor for RecordedVersion {
	fn version(&self, path: &Path) -> Option<semver::Version> {
		if !path.is_file() {
			return None
		}
		let recorded = std::fs::read_to_string(version_record_path(path)).ok()?;
		crate::mods::release::parse_tag(recorded.trim())
	}
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
	name: String,
	browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
	tag_name: String,
	html_url: String,
	assets: Vec<GithubAsset>,
}

/// Finds the latest release of a GitHub repository carrying the plugin as an asset.
pub struct GithubPluginSource {
	client: reqwest::Client,
	api_url: String,
	asset_name: String,
}

impl GithubPluginSource {
	pub fn new(client: reqwest::Client, org: &str, repo: &str) -> Self {
		Self {
			client,
			api_url: format!("https://api.github.com/repos/{}/{}/releases/latest", org, repo),
			asset_name: PLUGIN_FILE_NAME.to_string(),
		}
	}

	pub fn unchained_plugin(client: reqwest::Client) -> Self {
		Self::new(client, "Chiv2-Community", "UnchainedPlugin")
	}

	async fn fetch_latest(&self) -> Result<GithubRelease, reqwest::Error> {
		self.client.get(&self.api_url)
			.header(reqwest::header::USER_AGENT, "unchained-rs")
			.send().await?
			.error_for_status()?
			.json().await
	}
}

#[async_trait::async_trait]
impl PluginSource for GithubPluginSource {
	async fn latest_release(&self) -> Option<PluginRelease> {
		let release = match self.fetch_latest().await {
			Ok(r) => r,
			Err(e) => {
				log::warn!("failed to get latest plugin release from {}: {}", self.api_url, e);
				return None
			},
		};
		let Some(version) = crate::mods::release::parse_tag(&release.tag_name) else {
			log::warn!("latest plugin tag {} is not a version", release.tag_name);
			return None
		};
		let asset = release.assets.into_iter().find(|a| a.name == self.asset_name)?;
		Some(PluginRelease {
			version,
			download_url: asset.browser_download_url,
			page_url: Some(release.html_url),
		})
	}

	async fn download(&self, release: &PluginRelease, destination: &Path) -> Result<(), FetchError> {
		let response = self.client.get(&release.download_url)
			.header(reqwest::header::USER_AGENT, "unchained-rs")
			.send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status { url: release.download_url.clone(), status })
		}
		let size = response.content_length();
		crate::fetcher::file_writer::write_stream(response.bytes_stream(), size, destination, None, &CancellationToken::new()).await?;
		Ok(())
	}
}

pub struct PluginUpdateChecker {
	source: Arc<dyn PluginSource>,
	versions: Arc<dyn VersionExtractor>,
	dialogue: Arc<dyn UserDialogue>,
	plugin_path: PathBuf,
}

impl PluginUpdateChecker {
	pub fn new(
		source: Arc<dyn PluginSource>,
		versions: Arc<dyn VersionExtractor>,
		dialogue: Arc<dyn UserDialogue>,
		plugin_path: PathBuf,
	) -> Self {
		Self { source, versions, dialogue, plugin_path }
	}

	pub fn plugin_path(&self) -> &Path {
		&self.plugin_path
	}

	/// Downloads beside the plugin first so a failed download leaves the installed plugin alone.
	async fn update(&self, release: &PluginRelease) -> Result<(), Abort> {
		let mut partial_name = self.plugin_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
		partial_name.push(".download");
		let partial = self.plugin_path.with_file_name(partial_name);

		let result = async {
			self.source.download(release, &partial).await?;
			tokio::fs::rename(&partial, &self.plugin_path).await?;
			tokio::fs::write(version_record_path(&self.plugin_path), release.version.to_string()).await?;
			Ok::<_, FetchError>(())
		}.await;

		result.map_err(|e| {
			log::error!("failed to update plugin: {}", e);
			Abort::new(format!("failed to download plugin {}: {}", release.version, e))
		})
	}

	pub async fn check(&self, options: &LaunchOptions) -> Result<(), Abort> {
		if !options.check_for_dependency_updates {
			log::debug!("skipping plugin update check");
			return Ok(())
		}

		let Some(latest) = self.source.latest_release().await else {
			log::warn!("could not find latest plugin");
			return Err(Abort::new("could not find the latest plugin release"))
		};

		let current = self.versions.version(&self.plugin_path);
		if current.as_ref().map_or(false, |c| *c >= latest.version) {
			log::debug!("plugin is up to date");
			return Ok(())
		}

		let action = if current.is_some() { "Update" } else { "Install" };
		let message = format!(
			"Would you like to {} the unchained plugin?\n\nCurrent: {}\nLatest: {}{}",
			action.to_lowercase(),
			current.map_or_else(|| "not installed".to_string(), |v| v.to_string()),
			latest.version,
			latest.page_url.as_deref().map(|u| format!("\n{}", u)).unwrap_or_default(),
		);
		if self.dialogue.ask_yes_no(&format!("{} plugin", action), &message).await != UserChoice::Yes {
			log::info!("plugin {} declined", action.to_lowercase());
			return Ok(())
		}

		self.update(&latest).await?;
		log::info!("installed plugin {}", latest.version);
		Ok(())
	}

	pub fn into_preparer(self) -> Preparer<LaunchOptions> {
		let this = Arc::new(self);
		Preparer::new(move |options: LaunchOptions| {
			let this = this.clone();
			async move {
				this.check(&options).await?;
				Ok(options)
			}
		})
	}
}
