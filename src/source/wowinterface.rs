use crate::error::{Result, UpdaterError};
use crate::source::{Downloader, UpdateSource};
use crate::utils::http;
use regex::Regex;
use std::path::Path;
use url::Url;

const WOWINTERFACE_BASE: &str = "https://www.wowinterface.com";
const VERSION_PREFIX: &str = "Version: ";

/// Addons hosted on wowinterface.com, scraped from the addon pages.
pub struct WowInterfaceSource {
    downloader: Downloader,
    base_url: String,
    url_regex: Regex,
    version_regex: Regex,
    manual_link_regex: Regex,
}

impl WowInterfaceSource {
    pub fn new(downloader: Downloader) -> Result<Self> {
        Self::with_base_url(downloader, WOWINTERFACE_BASE)
    }

    pub fn with_base_url(downloader: Downloader, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            downloader,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            url_regex: compile(r"^(https?://)?(www\.)?wowinterface\.com/downloads/info.+\.html$")?,
            version_regex: compile(r#"id="version"[^>]*>([^<]*)<"#)?,
            manual_link_regex: compile(r#"(?s)class="manuallink".*?<a[^>]*\shref="([^"]+)""#)?,
        })
    }

    /// The part of `info<id>.html` identifying the download page.
    fn download_id(addon_url: &str) -> Result<&str> {
        addon_url
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_prefix("info"))
            .and_then(|name| name.strip_suffix(".html"))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UpdaterError::Source(format!("no addon id to extract from: {addon_url}")))
    }

    fn download_link(&self, addon_url: &str) -> Result<String> {
        let page_url = format!("{}/downloads/download{}", self.base_url, Self::download_id(addon_url)?);
        let page = http::get_page(self.downloader.client(), &page_url)?;

        let href = self
            .manual_link_regex
            .captures(&page)
            .map(|c| c[1].to_string())
            .ok_or_else(|| {
                UpdaterError::Source(format!("failed to find download link for: {addon_url}"))
            })?;

        let base = Url::parse(&page_url)
            .map_err(|e| UpdaterError::Source(format!("invalid url {page_url}: {e}")))?;
        let link = base
            .join(&href)
            .map_err(|e| UpdaterError::Source(format!("invalid download link {href}: {e}")))?;
        Ok(link.into())
    }
}

impl UpdateSource for WowInterfaceSource {
    fn name(&self) -> &str {
        "WoWInterface"
    }

    fn matches(&self, addon_url: &str) -> bool {
        self.url_regex.is_match(addon_url)
    }

    fn latest_version(&self, addon_url: &str) -> Result<String> {
        let page = http::get_page(self.downloader.client(), addon_url)?;

        self.version_regex
            .captures(&page)
            .and_then(|c| c[1].trim().strip_prefix(VERSION_PREFIX).map(str::to_string))
            .ok_or_else(|| {
                UpdaterError::Source(format!("failed to find a version tag for: {addon_url}"))
            })
    }

    fn download(&self, addon_url: &str, dir: &Path) -> Result<()> {
        let link = self.download_link(addon_url)?;
        self.downloader.install(&link, dir)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.downloader.close()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| UpdaterError::Source(format!("Invalid pattern {pattern}: {e}")))
}
