use crate::config::Profile;
use crate::error::{Result, UpdaterError};
use crate::utils::hidden;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// One installed addon as stored in the versions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonVersion {
    pub name: String,
    pub version: String,
}

/// On-disk layout of the versions file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionsFile {
    #[serde(default)]
    classic: Vec<AddonVersion>,
    #[serde(default)]
    retail: Vec<AddonVersion>,
}

/// Last installed version of every addon, per profile, keyed by addon URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    classic: BTreeMap<String, String>,
    retail: BTreeMap<String, String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the versions file. A missing file yields an empty ledger; a file
    /// that cannot be parsed is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No versions file at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(UpdaterError::Ledger(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let file: VersionsFile = serde_yaml::from_str(&content).map_err(|e| {
            UpdaterError::Ledger(format!("Failed to parse '{}': {}", path.display(), e))
        })?;

        let ledger = Self {
            classic: into_map(file.classic),
            retail: into_map(file.retail),
        };
        debug!(
            "Loaded {} version record(s) from {}",
            ledger.len(),
            path.display()
        );
        Ok(ledger)
    }

    /// Overwrites the versions file with the in-memory records.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = VersionsFile {
            classic: from_map(&self.classic),
            retail: from_map(&self.retail),
        };
        let out = serde_yaml::to_string(&file)?;
        hidden::write_hidden(path, out.as_bytes())?;
        debug!("Saved {} version record(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Recorded version, or `None` if the addon was never installed.
    pub fn get(&self, profile: Profile, addon_url: &str) -> Option<&str> {
        self.records(profile).get(addon_url).map(String::as_str)
    }

    /// Records a version, returning the previous one.
    pub fn set(
        &mut self,
        profile: Profile,
        addon_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Option<String> {
        self.records_mut(profile)
            .insert(addon_url.into(), version.into())
    }

    /// Records of one profile, ordered by addon URL.
    pub fn entries(&self, profile: Profile) -> impl Iterator<Item = (&str, &str)> {
        self.records(profile)
            .iter()
            .map(|(name, version)| (name.as_str(), version.as_str()))
    }

    pub fn len(&self) -> usize {
        self.classic.len() + self.retail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self, profile: Profile) -> &BTreeMap<String, String> {
        match profile {
            Profile::Classic => &self.classic,
            Profile::Retail => &self.retail,
        }
    }

    fn records_mut(&mut self, profile: Profile) -> &mut BTreeMap<String, String> {
        match profile {
            Profile::Classic => &mut self.classic,
            Profile::Retail => &mut self.retail,
        }
    }
}

fn into_map(records: Vec<AddonVersion>) -> BTreeMap<String, String> {
    records
        .into_iter()
        .map(|record| (record.name, record.version))
        .collect()
}

fn from_map(records: &BTreeMap<String, String>) -> Vec<AddonVersion> {
    records
        .iter()
        .map(|(name, version)| AddonVersion {
            name: name.clone(),
            version: version.clone(),
        })
        .collect()
}
