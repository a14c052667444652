use crate::error::{Result, UpdaterError};
use crate::source::{Downloader, UpdateSource};
use crate::utils::http;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

const TUKUI_API: &str = "https://www.tukui.org";
const SUPPORTED_UIS: &[&str] = &["tukui", "elvui"];

/// Addons and the two flagship UIs hosted on tukui.org.
///
/// `addons.php?id=N` pages are scraped for their version; `download.php?ui=`
/// links are looked up through the site's JSON API.
pub struct TukuiSource {
    downloader: Downloader,
    api_base: String,
    url_regex: Regex,
    id_regex: Regex,
    ui_regex: Regex,
    version_regex: Regex,
}

/// Version and archive location of one addon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TukuiAddon {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TukuiSource {
    pub fn new(downloader: Downloader) -> Result<Self> {
        Self::with_api_base(downloader, TUKUI_API)
    }

    pub fn with_api_base(downloader: Downloader, api_base: impl Into<String>) -> Result<Self> {
        Ok(Self {
            downloader,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            url_regex: compile(
                r"^(https?://)?(www\.)?tukui\.org/(((classic-(tbc-)?)?addons\.php\?id=[0-9]+)|(download\.php\?ui=(tukui|elvui)))$",
            )?,
            id_regex: compile(r"id=[0-9]+")?,
            ui_regex: compile(r"ui=(.+)")?,
            version_regex: compile(r#"(?s)id="extras".*?<b class="VIP">([^<]*)</b>"#)?,
        })
    }

    fn addon(&self, addon_url: &str) -> Result<TukuiAddon> {
        if self.id_regex.is_match(addon_url) {
            return self.regular_addon(addon_url);
        }

        if let Some(captures) = self.ui_regex.captures(addon_url) {
            return self.ui_addon(&captures[1]);
        }

        Err(UpdaterError::Source(format!(
            "tukui.org url {addon_url} is not supported"
        )))
    }

    fn regular_addon(&self, addon_url: &str) -> Result<TukuiAddon> {
        let page = http::get_page(self.downloader.client(), addon_url)?;

        let version = self
            .version_regex
            .captures(&page)
            .map(|c| c[1].trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                UpdaterError::Source(format!("failed to query {addon_url} page for a version"))
            })?;

        Ok(TukuiAddon {
            version: Some(version),
            url: Some(addon_url.replacen("id", "download", 1)),
        })
    }

    fn ui_addon(&self, ui: &str) -> Result<TukuiAddon> {
        if !SUPPORTED_UIS.contains(&ui) {
            return Err(UpdaterError::Source(format!(
                "tukui.org ui {ui} is not supported"
            )));
        }

        let url = format!("{}/api.php?ui={}", self.api_base, ui);
        let body = http::get_page(self.downloader.client(), &url)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl UpdateSource for TukuiSource {
    fn name(&self) -> &str {
        "Tukui"
    }

    fn matches(&self, addon_url: &str) -> bool {
        self.url_regex.is_match(addon_url)
    }

    fn latest_version(&self, addon_url: &str) -> Result<String> {
        self.addon(addon_url)?.version.ok_or_else(|| {
            UpdaterError::Source("the api response did not contain a version".to_string())
        })
    }

    fn download(&self, addon_url: &str, dir: &Path) -> Result<()> {
        let url = self.addon(addon_url)?.url.ok_or_else(|| {
            UpdaterError::Source("the api response did not contain a download url".to_string())
        })?;

        self.downloader.install(&url, dir)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.downloader.close()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| UpdaterError::Source(format!("Invalid pattern {pattern}: {e}")))
}
