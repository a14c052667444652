use crate::error::{Result, UpdaterError};
use crate::utils::path_validator::PathValidator;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Unpacks the zip archive at `archive_path` into `dest`.
///
/// Returns every directory and file written, in archive order. An entry whose
/// name resolves outside of `dest` aborts the extraction; entries written
/// before it are left in place.
pub fn extract(archive_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let archive_path = archive_path.as_ref();
    let dest = dest.as_ref();

    let file = File::open(archive_path)?;
    if file.metadata()?.is_dir() {
        return Err(UpdaterError::Io(io::Error::other(format!(
            "{} is a directory, not an archive",
            archive_path.display()
        ))));
    }

    let mut archive = ZipArchive::new(BufReader::new(file))?;
    debug!(
        "Extracting {} ({} entries) into {}",
        archive_path.display(),
        archive.len(),
        dest.display()
    );

    let mut written = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let target = PathValidator::join_within(dest, entry.name())?;

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            written.push(target);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
        }

        written.push(target);
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) mod test_archives {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Builds a zip at `path`; entries ending in `/` become directories.
    pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    /// Same as [`write_zip`] but returns the archive bytes.
    pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        write_zip(&path, entries);
        std::fs::read(path).unwrap()
    }
}
