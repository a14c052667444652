//! Hidden-file handling for the versions file.
//!
//! POSIX hides dot-prefixed names; Windows uses the hidden file attribute.
//! Callers only see [`is_hidden_path`], [`ensure_hideable`] and [`write_hidden`].

use crate::error::{Result, UpdaterError};
use std::path::Path;

/// Returns whether the path, once written by [`write_hidden`], will be hidden.
pub fn is_hidden_path(path: impl AsRef<Path>) -> bool {
    platform::is_hidden_path(path.as_ref())
}

/// Fails if [`write_hidden`] could not produce a hidden file at `path`.
pub fn ensure_hideable(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if is_hidden_path(path) {
        Ok(())
    } else {
        Err(UpdaterError::HiddenFile(format!(
            "the path {} is not valid for a hidden file",
            path.display()
        )))
    }
}

/// Replaces the contents of `path` with `data`, keeping the file hidden.
pub fn write_hidden(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_hideable(path)?;
    platform::write_hidden(path, data)
}

#[cfg(not(windows))]
mod platform {
    use crate::error::Result;
    use std::fs;
    use std::path::Path;

    pub fn is_hidden_path(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.len() > 1 && name.starts_with('.') && name != "..")
    }

    pub fn write_hidden(path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(windows)]
mod platform {
    use crate::error::{Result, UpdaterError};
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::windows::fs::{MetadataExt, OpenOptionsExt};
    use std::path::Path;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    pub fn is_hidden_path(path: &Path) -> bool {
        path.file_name().is_some()
    }

    pub fn write_hidden(path: &Path, data: &[u8]) -> Result<()> {
        // CREATE_ALWAYS on a hidden file only succeeds when the hidden attribute is requested.
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .attributes(FILE_ATTRIBUTE_HIDDEN)
            .open(path)?;
        file.write_all(data)?;
        file.flush()?;

        let attributes = path.metadata()?.file_attributes();
        if attributes & FILE_ATTRIBUTE_HIDDEN == 0 {
            return Err(UpdaterError::HiddenFile(format!(
                "failed to set the hidden attribute on {}",
                path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_and_overwrites_hidden_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".versions");

        write_hidden(&path, b"old content").unwrap();
        write_hidden(&path, b"new content").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new content");
        assert!(is_hidden_path(&path));
    }

    #[test]
    fn writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".empty");
        write_hidden(&path, b"").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[cfg(not(windows))]
    #[test]
    fn rejects_visible_path_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions");

        let err = write_hidden(&path, b"i should not be there").unwrap_err();
        assert!(matches!(err, UpdaterError::HiddenFile(_)));
        assert!(!path.exists());
    }

    #[cfg(not(windows))]
    #[test]
    fn hidden_path_rules() {
        assert!(is_hidden_path(".versions"));
        assert!(is_hidden_path("some/dir/.file"));
        assert!(!is_hidden_path("file"));
        assert!(!is_hidden_path("."));
        assert!(!is_hidden_path(""));
        assert!(!is_hidden_path(".hidden/visible"));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_file_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(".readonly");
        fs::write(&path, b"keep").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o400)).unwrap();

        let result = write_hidden(&path, b"i should not be there");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        // root ignores permission bits
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read(&path).unwrap(), b"keep");
    }
}
