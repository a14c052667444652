use crate::error::{Result, UpdaterError};
use std::path::Path;
use tracing::{debug, warn};

pub mod downloader;
pub mod factory;
pub mod github;
pub mod tukui;
pub mod wowinterface;

#[cfg(test)]
pub(crate) mod test_server;

pub use downloader::Downloader;
pub use factory::SourceFactory;

/// A hosting site addons can be fetched from.
pub trait UpdateSource: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &str;

    /// Whether this source handles the given addon URL.
    fn matches(&self, addon_url: &str) -> bool;

    /// Latest published version of the addon; an opaque string.
    fn latest_version(&self, addon_url: &str) -> Result<String>;

    /// Downloads the latest version and unpacks it into `dir`.
    fn download(&self, addon_url: &str, dir: &Path) -> Result<()>;

    /// Releases resources such as scratch directories.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Ordered set of sources; the first one matching a URL wins.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn UpdateSource>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Box<dyn UpdateSource>>) -> Self {
        Self { sources }
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, addon_url: &str) -> Result<&dyn UpdateSource> {
        let source = self
            .sources
            .iter()
            .find(|source| source.matches(addon_url))
            .ok_or_else(|| UpdaterError::SourceNotSupported(addon_url.to_string()))?;

        debug!("Resolved {} to source {}", addon_url, source.name());
        Ok(source.as_ref())
    }

    /// Closes every source, even after a failure; the first error is returned.
    pub fn close_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for source in &mut self.sources {
            if let Err(e) = source.close() {
                warn!("Failed to close source {}: {}", source.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
