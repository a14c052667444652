use crate::config::Profile;

/// A single addon installed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonUpdate {
    pub profile: Profile,
    pub addon_url: String,
    /// `None` when the addon had never been installed before.
    pub old_version: Option<String>,
    pub new_version: String,
}

/// Tracks what an update or check run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Addons that were (or, for a check, would be) installed, in processing order
    pub updates: Vec<AddonUpdate>,
    /// Addons whose recorded version already matched the latest one
    pub up_to_date: usize,
}

impl UpdateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update(
        &mut self,
        profile: Profile,
        addon_url: impl Into<String>,
        old_version: Option<String>,
        new_version: impl Into<String>,
    ) {
        self.updates.push(AddonUpdate {
            profile,
            addon_url: addon_url.into(),
            old_version,
            new_version: new_version.into(),
        });
    }

    pub fn add_up_to_date(&mut self) {
        self.up_to_date += 1;
    }

    /// Check if the report is empty (no updates)
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn total_updates(&self) -> usize {
        self.updates.len()
    }

    pub fn updates_for(&self, profile: Profile) -> impl Iterator<Item = &AddonUpdate> {
        self.updates.iter().filter(move |u| u.profile == profile)
    }
}
