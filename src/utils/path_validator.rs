use crate::error::{Result, UpdaterError};
use std::path::{Component, Path, PathBuf};

/// Path checks for install directories and archive entries.
pub struct PathValidator;

/// Directories addons are never unpacked into.
const SYSTEM_DIRS: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

impl PathValidator {
    /// Resolves an install directory to its canonical form, which is where
    /// addons are then unpacked.
    pub fn validate_install_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let dir = path.canonicalize().map_err(|e| {
            UpdaterError::Config(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !dir.is_dir() {
            return Err(UpdaterError::Config(format!(
                "Path '{}' is not a directory",
                dir.display()
            )));
        }

        let system_dir = SYSTEM_DIRS
            .iter()
            .find(|system| Self::is_under(path, system) || Self::is_under(&dir, system));
        if let Some(system) = system_dir {
            return Err(UpdaterError::Config(format!(
                "Installing into system directory '{}' is not allowed",
                system
            )));
        }

        Ok(dir)
    }

    fn is_under(path: &Path, system: &str) -> bool {
        let system = Path::new(system);
        path.starts_with(system)
            || system
                .canonicalize()
                .is_ok_and(|resolved| path.starts_with(resolved))
    }

    /// Joins an archive entry name onto `base_dir`, rejecting names that would
    /// land outside of it.
    ///
    /// The check is purely lexical because the target usually does not exist yet.
    /// `..` only survives cleaning as a leading component, so a remainder below
    /// the base that still holds one climbs above it.
    pub fn join_within(base_dir: impl AsRef<Path>, entry_name: &str) -> Result<PathBuf> {
        let base_dir = base_dir.as_ref();
        let base = Self::clean(base_dir);
        let joined = Self::clean(&base_dir.join(entry_name));

        let inside = !entry_name.is_empty()
            && joined.strip_prefix(&base).is_ok_and(|rest| {
                !rest
                    .components()
                    .any(|component| component == Component::ParentDir)
            });
        if !inside {
            return Err(UpdaterError::PathTraversal {
                entry: entry_name.to_string(),
                dest: base_dir.to_path_buf(),
            });
        }

        Ok(joined)
    }

    /// Resolves `.` and `..` components without touching the filesystem.
    pub fn clean(path: &Path) -> PathBuf {
        let mut cleaned = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    let last = cleaned.components().next_back();
                    match last {
                        Some(Component::Normal(_)) => {
                            cleaned.pop();
                        }
                        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                        _ => cleaned.push(".."),
                    }
                }
                other => cleaned.push(other.as_os_str()),
            }
        }
        cleaned
    }
}
