use crate::config::{Config, Profile};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::report::UpdateReport;
use crate::source::SourceRegistry;
use crate::utils::hidden;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Update,
    Check,
}

/// Drives the check, download and record cycle for every configured addon.
pub struct Updater<'a> {
    config: &'a Config,
    registry: &'a SourceRegistry,
    ledger: Ledger,
    ledger_path: PathBuf,
}

impl<'a> Updater<'a> {
    /// Loads the versions file at `ledger_path`. Fails before any network
    /// access if that path cannot hold a hidden file or the file is corrupt.
    pub fn new(
        config: &'a Config,
        registry: &'a SourceRegistry,
        ledger_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let ledger_path = ledger_path.into();
        hidden::ensure_hideable(&ledger_path)?;
        let ledger = Ledger::load(&ledger_path)?;

        Ok(Self {
            config,
            registry,
            ledger,
            ledger_path,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Updates retail, then classic, stopping at the first failing addon.
    ///
    /// The versions file is written afterwards whatever the outcome, so addons
    /// installed before a failure are not downloaded again. A failed save is
    /// returned only when the run itself succeeded.
    pub fn update_addons(&mut self) -> Result<UpdateReport> {
        let mut report = UpdateReport::new();
        let result = self.run(Mode::Update, &mut report);
        let saved = self.ledger.save(&self.ledger_path);

        match (result, saved) {
            (Ok(()), Ok(())) => Ok(report),
            (Ok(()), Err(save_err)) => Err(save_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(save_err)) => {
                error!(
                    "Failed to save versions to {}: {}",
                    self.ledger_path.display(),
                    save_err
                );
                Err(e)
            }
        }
    }

    /// Reports which addons have a newer version without installing anything
    /// or touching the versions file.
    pub fn check_addons(&mut self) -> Result<UpdateReport> {
        let mut report = UpdateReport::new();
        self.run(Mode::Check, &mut report)?;
        Ok(report)
    }

    fn run(&mut self, mode: Mode, report: &mut UpdateReport) -> Result<()> {
        for profile in Profile::UPDATE_ORDER {
            self.process_profile(profile, mode, report)?;
        }
        Ok(())
    }

    fn process_profile(
        &mut self,
        profile: Profile,
        mode: Mode,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let config = self.config;
        let section = config.profile(profile);
        if section.addons.is_empty() {
            debug!("No {} addons configured", profile);
            return Ok(());
        }

        let dir = Path::new(&section.path);
        let pb = progress_bar(section.addons.len());

        for addon_url in &section.addons {
            pb.set_message(format!("{} {}", profile, addon_url));
            if let Err(e) = self.process_addon(profile, addon_url, dir, mode, report) {
                pb.finish_and_clear();
                return Err(e);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    fn process_addon(
        &mut self,
        profile: Profile,
        addon_url: &str,
        dir: &Path,
        mode: Mode,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let registry = self.registry;
        let source = registry.resolve(addon_url)?;
        let latest = source.latest_version(addon_url)?;
        let current = self.ledger.get(profile, addon_url);

        if !needs_update(current, &latest) {
            debug!("{} is up to date at {}", addon_url, latest);
            report.add_up_to_date();
            return Ok(());
        }

        if latest.is_empty() {
            warn!(
                "{} reported no version for {}, installing it again",
                source.name(),
                addon_url
            );
        }

        let previous = current.map(str::to_string);
        if mode == Mode::Check {
            report.add_update(profile, addon_url, previous, latest);
            return Ok(());
        }

        info!(
            "Updating {} from {} to {}",
            addon_url,
            previous.as_deref().unwrap_or("nothing"),
            latest
        );
        source.download(addon_url, dir)?;
        self.ledger.set(profile, addon_url, latest.clone());
        report.add_update(profile, addon_url, previous, latest);
        Ok(())
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("  [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb
}

/// An empty latest version never counts as installed.
fn needs_update(recorded: Option<&str>, latest: &str) -> bool {
    latest.is_empty() || recorded != Some(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::error::UpdaterError;
    use crate::source::UpdateSource;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::{TempDir, tempdir};

    /// Serves versions from a shared table and records every download.
    #[derive(Clone, Default)]
    struct FakeSource {
        versions: Arc<Mutex<HashMap<String, String>>>,
        failing: Arc<Mutex<HashSet<String>>>,
        downloads: Arc<Mutex<Vec<(String, PathBuf)>>>,
    }

    impl FakeSource {
        fn publish(&self, url: &str, version: &str) {
            self.versions
                .lock()
                .unwrap()
                .insert(url.to_string(), version.to_string());
        }

        fn fail_download(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        fn downloaded(&self) -> Vec<String> {
            self.downloads
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }
    }

    impl UpdateSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        fn matches(&self, addon_url: &str) -> bool {
            addon_url.starts_with("fake.com/")
        }

        fn latest_version(&self, addon_url: &str) -> Result<String> {
            self.versions
                .lock()
                .unwrap()
                .get(addon_url)
                .cloned()
                .ok_or_else(|| UpdaterError::Source(format!("{addon_url} not found")))
        }

        fn download(&self, addon_url: &str, dir: &Path) -> Result<()> {
            self.downloads
                .lock()
                .unwrap()
                .push((addon_url.to_string(), dir.to_path_buf()));
            if self.failing.lock().unwrap().contains(addon_url) {
                return Err(UpdaterError::Source(format!("{addon_url} download failed")));
            }
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        source: FakeSource,
        registry: SourceRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let source = FakeSource::default();
            let registry = SourceRegistry::new(vec![Box::new(source.clone())]);
            Self {
                dir: tempdir().unwrap(),
                source,
                registry,
            }
        }

        fn config(&self, retail: &[&str], classic: &[&str]) -> Config {
            let section = |name: &str, addons: &[&str]| {
                let path = self.dir.path().join(name);
                fs::create_dir_all(&path).unwrap();
                ProfileConfig {
                    path: path.to_string_lossy().into_owned(),
                    addons: addons.iter().map(|a| a.to_string()).collect(),
                }
            };
            Config {
                classic: section("classic", classic),
                retail: section("retail", retail),
            }
        }

        fn ledger_path(&self) -> PathBuf {
            self.dir.path().join(".versions")
        }

        fn updater<'a>(&'a self, config: &'a Config) -> Updater<'a> {
            Updater::new(config, &self.registry, self.ledger_path()).unwrap()
        }
    }

    #[test]
    fn needs_update_compares_exactly() {
        assert!(needs_update(None, "1"));
        assert!(needs_update(Some("1"), "2"));
        assert!(needs_update(Some("v1"), "1"));
        assert!(!needs_update(Some("1"), "1"));
        assert!(needs_update(None, ""));
        assert!(needs_update(Some(""), ""));
    }

    #[test]
    fn first_run_creates_ledger_with_single_record() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1.0");
        let config = fx.config(&["fake.com/a"], &[]);
        assert!(!fx.ledger_path().exists());

        let mut updater = fx.updater(&config);
        assert!(updater.ledger().is_empty());
        let report = updater.update_addons().unwrap();

        assert_eq!(report.total_updates(), 1);
        assert_eq!(report.updates[0].old_version, None);
        let ledger = Ledger::load(fx.ledger_path()).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(Profile::Retail, "fake.com/a"), Some("1.0"));
    }

    #[test]
    fn second_run_without_changes_downloads_nothing() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1.0");
        fx.source.publish("fake.com/b", "2.0");
        let config = fx.config(&["fake.com/a"], &["fake.com/b"]);

        fx.updater(&config).update_addons().unwrap();
        assert_eq!(fx.source.downloaded().len(), 2);

        let report = fx.updater(&config).update_addons().unwrap();
        assert!(report.is_empty());
        assert_eq!(report.up_to_date, 2);
        assert_eq!(fx.source.downloaded().len(), 2);
    }

    #[test]
    fn new_remote_version_is_installed() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1.0");
        let config = fx.config(&[], &["fake.com/a"]);
        fx.updater(&config).update_addons().unwrap();

        fx.source.publish("fake.com/a", "1.1");
        let report = fx.updater(&config).update_addons().unwrap();

        assert_eq!(report.updates[0].old_version.as_deref(), Some("1.0"));
        assert_eq!(report.updates[0].new_version, "1.1");
        let ledger = Ledger::load(fx.ledger_path()).unwrap();
        assert_eq!(ledger.get(Profile::Classic, "fake.com/a"), Some("1.1"));
    }

    #[test]
    fn downloads_into_profile_directory_retail_first() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/c", "1");
        fx.source.publish("fake.com/r", "1");
        let config = fx.config(&["fake.com/r"], &["fake.com/c"]);

        fx.updater(&config).update_addons().unwrap();

        let downloads = fx.source.downloads.lock().unwrap().clone();
        assert_eq!(
            downloads,
            vec![
                ("fake.com/r".to_string(), PathBuf::from(&config.retail.path)),
                ("fake.com/c".to_string(), PathBuf::from(&config.classic.path)),
            ]
        );
    }

    #[test]
    fn partial_failure_keeps_earlier_progress() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/x", "1");
        fx.source.publish("fake.com/y", "1");
        fx.source.fail_download("fake.com/y");
        let config = fx.config(&["fake.com/x", "fake.com/y"], &[]);

        let err = fx.updater(&config).update_addons().unwrap_err();

        assert!(err.to_string().contains("fake.com/y"));
        let ledger = Ledger::load(fx.ledger_path()).unwrap();
        assert_eq!(ledger.get(Profile::Retail, "fake.com/x"), Some("1"));
        assert_eq!(ledger.get(Profile::Retail, "fake.com/y"), None);
    }

    #[test]
    fn first_failure_stops_the_run() {
        let fx = Fixture::new();
        for url in ["fake.com/y", "fake.com/z", "fake.com/c"] {
            fx.source.publish(url, "1");
        }
        fx.source.fail_download("fake.com/y");
        let config = fx.config(&["fake.com/y", "fake.com/z"], &["fake.com/c"]);

        assert!(fx.updater(&config).update_addons().is_err());
        assert_eq!(fx.source.downloaded(), vec!["fake.com/y"]);
    }

    #[test]
    fn unsupported_url_fails_after_recording_earlier_addons() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1");
        let config = fx.config(&["fake.com/a", "other.com/b"], &[]);

        let err = fx.updater(&config).update_addons().unwrap_err();

        assert!(matches!(&err, UpdaterError::SourceNotSupported(url) if url == "other.com/b"));
        let ledger = Ledger::load(fx.ledger_path()).unwrap();
        assert_eq!(ledger.get(Profile::Retail, "fake.com/a"), Some("1"));
    }

    #[test]
    fn version_lookup_failure_records_nothing() {
        let fx = Fixture::new();
        let config = fx.config(&["fake.com/unknown"], &[]);

        assert!(fx.updater(&config).update_addons().is_err());
        assert!(fx.source.downloaded().is_empty());
        assert!(Ledger::load(fx.ledger_path()).unwrap().is_empty());
    }

    #[test]
    fn empty_version_is_installed_every_run() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "");
        let config = fx.config(&["fake.com/a"], &[]);

        fx.updater(&config).update_addons().unwrap();
        fx.updater(&config).update_addons().unwrap();

        assert_eq!(fx.source.downloaded().len(), 2);
        let ledger = Ledger::load(fx.ledger_path()).unwrap();
        assert_eq!(ledger.get(Profile::Retail, "fake.com/a"), Some(""));
    }

    #[test]
    fn check_neither_downloads_nor_saves() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1");
        fx.source.publish("fake.com/b", "2");
        let config = fx.config(&["fake.com/a"], &["fake.com/b"]);

        let report = fx.updater(&config).check_addons().unwrap();

        assert_eq!(report.total_updates(), 2);
        assert!(fx.source.downloaded().is_empty());
        assert!(!fx.ledger_path().exists());
    }

    #[test]
    fn corrupt_ledger_fails_construction() {
        let fx = Fixture::new();
        fs::write(fx.ledger_path(), "blub").unwrap();
        let config = fx.config(&[], &[]);

        let err = Updater::new(&config, &fx.registry, fx.ledger_path())
            .err()
            .unwrap();
        assert!(matches!(err, UpdaterError::Ledger(_)));
    }

    #[test]
    #[cfg(not(windows))]
    fn visible_ledger_path_fails_construction() {
        let fx = Fixture::new();
        let config = fx.config(&[], &[]);

        let err = Updater::new(&config, &fx.registry, fx.dir.path().join("versions"))
            .err()
            .unwrap();
        assert!(matches!(err, UpdaterError::HiddenFile(_)));
    }

    #[test]
    fn save_failure_is_reported_after_successful_run() {
        let fx = Fixture::new();
        fx.source.publish("fake.com/a", "1");
        let config = fx.config(&["fake.com/a"], &[]);
        let ledger_path = fx.dir.path().join("missing").join(".versions");

        let mut updater = Updater::new(&config, &fx.registry, &ledger_path).unwrap();
        let err = updater.update_addons().unwrap_err();

        assert!(matches!(err, UpdaterError::Io(_)));
        assert_eq!(fx.source.downloaded().len(), 1);
    }

    #[test]
    fn save_failure_does_not_mask_run_failure() {
        let fx = Fixture::new();
        let config = fx.config(&["other.com/a"], &[]);
        let ledger_path = fx.dir.path().join("missing").join(".versions");

        let mut updater = Updater::new(&config, &fx.registry, &ledger_path).unwrap();
        let err = updater.update_addons().unwrap_err();

        assert!(matches!(err, UpdaterError::SourceNotSupported(_)));
    }
}
