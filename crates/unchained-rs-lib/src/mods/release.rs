//! Registry metadata for mods and their releases.

use serde::*;

use super::{ModIdentifier, ReleaseCoordinates};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mod {
	pub latest_manifest: ModManifest,
	pub releases: Vec<Release>,
}

impl Mod {
	pub fn id(&self) -> ModIdentifier {
		ModIdentifier::from(self)
	}

	/// The release with the highest version, ignoring prereleases and tags which are not versions.
	pub fn latest_release(&self) -> Option<&Release> {
		self.releases.iter()
			.filter_map(|r| r.version().filter(|v| v.pre.is_empty()).map(|v| (v, r)))
			.max_by(|(a, _), (b, _)| a.cmp(b))
			.map(|(_, r)| r)
	}
}

/// A single published version of a mod.
///
/// Equality and hashing only consider the release's coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
	pub tag: String,
	pub hash: String,
	pub pak_file_name: String,
	pub release_date: chrono::DateTime<chrono::Utc>,
	pub manifest: ModManifest,
}

impl Release {
	pub fn coordinates(&self) -> ReleaseCoordinates {
		ReleaseCoordinates::from(self)
	}

	/// The tag parsed as a semantic version, a leading `v` is allowed.
	pub fn version(&self) -> Option<semver::Version> {
		parse_tag(&self.tag)
	}

	pub fn release_url(&self) -> String {
		format!("{}/releases/{}", self.manifest.repo_url, self.tag)
	}
}

impl PartialEq for Release {
	fn eq(&self, other: &Self) -> bool {
		self.coordinates() == other.coordinates()
	}
}

impl Eq for Release {}

impl std::hash::Hash for Release {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.coordinates().hash(state);
	}
}

impl std::fmt::Display for Release {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.coordinates())
	}
}

pub fn parse_tag(tag: &str) -> Option<semver::Version> {
	let tag = tag.strip_prefix(|c: char| c == 'v' || c == 'V').unwrap_or(tag);
	semver::Version::parse(tag).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModType {
	Client,
	Server,
	Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModTag {
	Mutator,
	Map,
	Cosmetic,
	Audio,
	Model,
	Weapon,
	Doodad,
	Library,
}

/// The last two path segments of a repository url, `(organization, repository)`.
fn repo_url_parts(repo_url: &str) -> (&str, &str) {
	let mut parts = repo_url.trim_end_matches('/').rsplit('/');
	let repo = parts.next().unwrap_or_default();
	let org = parts.next().unwrap_or_default();
	(org, repo)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
	pub repo_url: String,
	/// Informational, dependencies always resolve to the latest release.
	pub version: String,
}

impl Dependency {
	pub fn organization(&self) -> &str {
		repo_url_parts(&self.repo_url).0
	}
	pub fn repo_name(&self) -> &str {
		repo_url_parts(&self.repo_url).1
	}
	pub fn id(&self) -> ModIdentifier {
		ModIdentifier::from(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionFlags {
	pub actor_mod: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModManifest {
	pub repo_url: String,
	pub name: String,
	pub description: String,
	#[serde(default)]
	pub home_page: Option<String>,
	#[serde(default)]
	pub image_url: Option<String>,
	pub mod_type: ModType,
	pub authors: Vec<String>,
	pub dependencies: Vec<Dependency>,
	pub tags: Vec<ModTag>,
	pub maps: Vec<String>,
	pub options: OptionFlags,
}

impl ModManifest {
	pub fn organization(&self) -> &str {
		repo_url_parts(&self.repo_url).0
	}
	pub fn repo_name(&self) -> &str {
		repo_url_parts(&self.repo_url).1
	}
}

#[cfg(test)]
pub(crate) mod fixtures {
	use super::*;

	pub fn manifest(org: &str, module: &str, dependencies: &[(&str, &str)]) -> ModManifest {
		ModManifest {
			repo_url: format!("https://github.com/{}/{}", org, module),
			name: module.to_string(),
			description: String::new(),
			home_page: None,
			image_url: None,
			mod_type: ModType::Shared,
			authors: vec![],
			dependencies: dependencies.iter().map(|(o, m)| Dependency {
				repo_url: format!("https://github.com/{}/{}", o, m),
				version: "*".to_string(),
			}).collect(),
			tags: vec![],
			maps: vec![],
			options: OptionFlags { actor_mod: false },
		}
	}

	pub fn release(org: &str, module: &str, tag: &str, dependencies: &[(&str, &str)]) -> Release {
		Release {
			tag: tag.to_string(),
			hash: String::new(),
			pak_file_name: format!("{}.pak", module),
			release_date: chrono::DateTime::<chrono::Utc>::default(),
			manifest: manifest(org, module, dependencies),
		}
	}

	pub fn single(org: &str, module: &str, tag: &str, dependencies: &[(&str, &str)]) -> Mod {
		let release = release(org, module, tag, dependencies);
		Mod { latest_manifest: release.manifest.clone(), releases: vec![release] }
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use super::fixtures::*;

	#[test]
	fn parse_tag_with_v() { assert_eq!(parse_tag("v1.2.3"), Some(semver::Version::new(1, 2, 3))) }
	#[test]
	fn parse_tag_without_v() { assert_eq!(parse_tag("1.2.3"), Some(semver::Version::new(1, 2, 3))) }
	#[test]
	fn parse_tag_garbage() { assert_eq!(parse_tag("latest"), None) }
	#[test]
	fn org_from_repo_url() { assert_eq!(manifest("Chiv2-Community", "Unchained-Mods", &[]).organization(), "Chiv2-Community") }
	#[test]
	fn repo_from_trailing_slash_url() { assert_eq!(repo_url_parts("https://github.com/OrgX/Core/"), ("OrgX", "Core")) }

	#[test]
	fn latest_release_skips_prereleases() {
		let mut m = single("OrgX", "Core", "v1.0.0", &[]);
		m.releases.push(release("OrgX", "Core", "v1.2.0", &[]));
		m.releases.push(release("OrgX", "Core", "v2.0.0-beta.1", &[]));
		m.releases.push(release("OrgX", "Core", "nightly", &[]));
		assert_eq!(m.latest_release().map(|r| r.tag.as_str()), Some("v1.2.0"));
	}

	#[test]
	fn release_equality_uses_coordinates() {
		let a = release("OrgX", "Core", "v1.0.0", &[]);
		let mut b = a.clone();
		b.hash = "abc".to_string();
		assert_eq!(a, b);
	}

	#[test]
	fn deserialize_registry_json() {
		let json = r#"{
			"tag": "v1.0.0",
			"hash": "abc",
			"pak_file_name": "Core.pak",
			"release_date": "2024-01-01T00:00:00Z",
			"manifest": {
				"repo_url": "https://github.com/OrgX/Core",
				"name": "Core",
				"description": "core things",
				"mod_type": "Shared",
				"authors": ["someone"],
				"dependencies": [{ "repo_url": "https://github.com/OrgY/Lib", "version": "1.0.0" }],
				"tags": ["Library"],
				"maps": [],
				"options": { "actor_mod": true }
			}
		}"#;
		let release: Release = serde_json::from_str(json).unwrap();
		assert_eq!(release.coordinates(), ReleaseCoordinates::new("OrgX", "Core", "v1.0.0"));
		assert_eq!(release.manifest.dependencies[0].id(), ModIdentifier::new("OrgY", "Lib"));
	}
}
