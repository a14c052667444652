use crate::error::{Result, UpdaterError};
use crate::utils::path_validator::PathValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One of the two independently managed game installations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Classic,
    Retail,
}

impl Profile {
    /// Order in which profiles are processed by an update run.
    pub const UPDATE_ORDER: [Profile; 2] = [Profile::Retail, Profile::Classic];
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Profile::Classic => "classic",
            Profile::Retail => "retail",
        };
        f.write_str(label)
    }
}

/// Install directory and addon URLs of a single profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub addons: Vec<String>,
}

/// Contents of `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classic: ProfileConfig,
    #[serde(default)]
    pub retail: ProfileConfig,
}

impl Config {
    /// Reads and parses the YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading configuration from {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            UpdaterError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            UpdaterError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    /// Writes an empty configuration skeleton for the user to fill in.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let out = serde_yaml::to_string(&Self::default())?;
        fs::write(path.as_ref(), out)?;
        Ok(())
    }

    pub fn profile(&self, profile: Profile) -> &ProfileConfig {
        match profile {
            Profile::Classic => &self.classic,
            Profile::Retail => &self.retail,
        }
    }

    fn profile_mut(&mut self, profile: Profile) -> &mut ProfileConfig {
        match profile {
            Profile::Classic => &mut self.classic,
            Profile::Retail => &mut self.retail,
        }
    }

    /// Checks that every profile listing addons points at a usable install
    /// directory and replaces that path with its canonical form.
    pub fn validate(mut self) -> Result<Self> {
        for profile in Profile::UPDATE_ORDER {
            let section = self.profile_mut(profile);
            if section.addons.is_empty() {
                continue;
            }

            if section.path.trim().is_empty() {
                return Err(UpdaterError::Config(format!(
                    "The {} profile lists {} addon(s) but has no path",
                    profile,
                    section.addons.len()
                )));
            }

            let dir = PathValidator::validate_install_dir(&section.path).map_err(|e| {
                UpdaterError::Config(format!("The {} profile path is invalid: {}", profile, e))
            })?;
            section.path = dir.to_string_lossy().into_owned();
        }
        Ok(self)
    }

    pub fn total_addons(&self) -> usize {
        self.classic.addons.len() + self.retail.addons.len()
    }
}
