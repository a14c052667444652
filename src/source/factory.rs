use crate::error::Result;
use crate::source::github::GitHubSource;
use crate::source::tukui::TukuiSource;
use crate::source::wowinterface::WowInterfaceSource;
use crate::source::{Downloader, SourceRegistry, UpdateSource};
use crate::utils::http;
use reqwest::blocking::Client;
use tracing::debug;

pub struct SourceFactory;

impl SourceFactory {
    /// Every supported host, in the order URLs are matched against them.
    pub fn create_registry() -> Result<SourceRegistry> {
        let client = http::build_client()?;
        let registry = SourceRegistry::new(vec![
            Self::create_tukui(client.clone())?,
            Self::create_wowinterface(client.clone())?,
            Self::create_github(client)?,
        ]);
        debug!("Registered sources: {}", registry.names().join(", "));
        Ok(registry)
    }

    pub fn create_tukui(client: Client) -> Result<Box<dyn UpdateSource>> {
        Ok(Box::new(TukuiSource::new(Downloader::new(client)?)?))
    }

    pub fn create_wowinterface(client: Client) -> Result<Box<dyn UpdateSource>> {
        Ok(Box::new(WowInterfaceSource::new(Downloader::new(client)?)?))
    }

    pub fn create_github(client: Client) -> Result<Box<dyn UpdateSource>> {
        Ok(Box::new(GitHubSource::new(Downloader::new(client)?)?))
    }
}
