use crate::error::{Result, UpdaterError};
use crate::source::{Downloader, UpdateSource};
use crate::utils::http;
use crate::utils::path_validator::PathValidator;
use regex::Regex;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";
const ZIP_CONTENT_TYPES: &[&str] = &["application/x-zip-compressed", "application/zip"];

/// Addons published as GitHub releases.
///
/// A release carrying exactly one zip asset is installed from that asset;
/// anything else falls back to the source archive of the tagged commit,
/// whose root folder is renamed after the repository.
pub struct GitHubSource {
    downloader: Downloader,
    api_base: String,
    url_regex: Regex,
}

#[derive(Debug, Clone, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    zipball_url: Option<String>,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
struct Asset {
    #[serde(default)]
    content_type: String,
    browser_download_url: String,
}

impl Release {
    /// Returns the URL to fetch and whether it is the repository source archive.
    fn archive_url(&self) -> Result<(&str, bool)> {
        if let [asset] = self.assets.as_slice() {
            if ZIP_CONTENT_TYPES.contains(&asset.content_type.as_str()) {
                return Ok((asset.browser_download_url.as_str(), false));
            }
        }

        self.zipball_url
            .as_deref()
            .map(|url| (url, true))
            .ok_or_else(|| {
                UpdaterError::Source(format!(
                    "release {} has neither a zip asset nor a source archive",
                    self.tag_name
                ))
            })
    }
}

impl GitHubSource {
    pub fn new(downloader: Downloader) -> Result<Self> {
        Self::with_api_base(downloader, GITHUB_API)
    }

    pub fn with_api_base(downloader: Downloader, api_base: impl Into<String>) -> Result<Self> {
        let url_regex = Regex::new(r"^(https?://)?github\.com/([A-Za-z0-9-]+)/([A-Za-z0-9_.-]+)/?$")
            .map_err(|e| UpdaterError::Source(format!("Invalid GitHub URL pattern: {e}")))?;

        Ok(Self {
            downloader,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            url_regex,
        })
    }

    fn owner_and_repository(&self, addon_url: &str) -> Result<(String, String)> {
        let captures = self.url_regex.captures(addon_url).ok_or_else(|| {
            UpdaterError::Source(format!(
                "the given url {addon_url} is invalid for a github repository"
            ))
        })?;
        Ok((captures[2].to_string(), captures[3].to_string()))
    }

    fn latest_release(&self, addon_url: &str) -> Result<Release> {
        let (owner, repo) = self.owner_and_repository(addon_url)?;
        let url = format!("{}/repos/{}/{}/releases/latest", self.api_base, owner, repo);
        debug!("Fetching: {}", url);

        let response = self
            .downloader
            .client()
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?;
        http::check_status(&url, response.status())?;

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl UpdateSource for GitHubSource {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn matches(&self, addon_url: &str) -> bool {
        self.url_regex.is_match(addon_url)
    }

    fn latest_version(&self, addon_url: &str) -> Result<String> {
        Ok(self.latest_release(addon_url)?.tag_name)
    }

    fn download(&self, addon_url: &str, dir: &Path) -> Result<()> {
        let release = self.latest_release(addon_url)?;
        let (url, source_archive) = release.archive_url()?;

        let files = self.downloader.install(url, dir)?;

        if source_archive {
            let (_, repo) = self.owner_and_repository(addon_url)?;
            rename_single_root(dir, &files, &repo)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.downloader.close()
    }
}

/// Renames the only top-level directory among `files` to `dir/name`,
/// replacing a previous installation.
fn rename_single_root(dir: &Path, files: &[PathBuf], name: &str) -> Result<PathBuf> {
    let base = PathValidator::clean(dir);
    let roots: BTreeSet<_> = files
        .iter()
        .filter_map(|f| f.strip_prefix(&base).ok())
        .filter_map(|rel| match rel.components().next() {
            Some(Component::Normal(first)) => Some(first.to_os_string()),
            _ => None,
        })
        .collect();

    let root = match (roots.len(), roots.first()) {
        (1, Some(root)) => dir.join(root),
        _ => {
            return Err(UpdaterError::Source(
                "the git archive does not have a single root directory".to_string(),
            ));
        }
    };

    if !root.is_dir() {
        return Err(UpdaterError::Source(format!(
            "the git archive root {} is not a directory",
            root.display()
        )));
    }

    let target = dir.join(name);
    if root == target {
        return Ok(target);
    }
    if target.exists() {
        debug!("Replacing existing {}", target.display());
        fs::remove_dir_all(&target)?;
    }
    fs::rename(&root, &target)?;
    Ok(target)
}
