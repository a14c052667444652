use crate::error::{Result, UpdaterError};
use crate::utils::{archive, http};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Fetches addon archives into a private scratch directory.
pub struct Downloader {
    client: Client,
    scratch: Option<TempDir>,
}

impl Downloader {
    pub fn new(client: Client) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("wow-updater")
            .tempdir()?;
        debug!("Created scratch directory {}", scratch.path().display());

        Ok(Self {
            client,
            scratch: Some(scratch),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Downloads `url` into a new `.zip` file in the scratch directory.
    pub fn download_zip(&self, url: &str) -> Result<PathBuf> {
        let dir = self.scratch_dir().ok_or_else(|| {
            UpdaterError::Io(io::Error::other("the downloader has already been closed"))
        })?;

        let mut response = http::get(&self.client, url)?;
        let (mut file, path): (File, _) = tempfile::Builder::new()
            .suffix(".zip")
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| UpdaterError::Io(e.error))?;

        let bytes = io::copy(&mut response, &mut file)?;
        debug!("Downloaded {} bytes from {} to {}", bytes, url, path.display());
        Ok(path)
    }

    /// Downloads the archive at `url` and unpacks it into `dir`.
    ///
    /// The archive is deleted again whether or not extraction succeeds.
    pub fn install(&self, url: &str, dir: &Path) -> Result<Vec<PathBuf>> {
        let zip_path = self.download_zip(url)?;
        let extracted = archive::extract(&zip_path, dir);

        if let Err(e) = fs::remove_file(&zip_path) {
            warn!("Failed to remove {}: {}", zip_path.display(), e);
        }
        extracted
    }

    /// Removes the scratch directory and everything downloaded into it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(scratch) = self.scratch.take() {
            debug!("Removing scratch directory {}", scratch.path().display());
            scratch.close()?;
        }
        Ok(())
    }
}
