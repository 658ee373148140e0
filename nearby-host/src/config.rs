use std::path::{Path, PathBuf};

use nearby_common::APP_ID;

use crate::transport::Strategy;

/// Settings controlling how a [`crate::NearbySettingsHost`] advertises and
/// persists.
///
/// Use [`HostConfig::default`] for an in-memory host or
/// [`HostConfig::persistent`] to keep values across restarts, then adjust
/// fields as needed.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Service identifier the handheld app discovers.
    pub app_id: String,
    /// Name shown to the user on the handheld while pairing.
    pub device_label: String,
    pub strategy: Strategy,
    /// Write every accepted change to `storage_dir`.
    pub enable_persistence: bool,
    /// Directory holding the persisted settings file.
    pub storage_dir: PathBuf,
    /// Begin advertising as soon as the host is created.
    pub auto_start: bool,
}

impl Default for HostConfig {
    /// Returns the in-memory preset:
    /// - point-to-point strategy
    /// - persistence disabled
    /// - no automatic start
    fn default() -> Self {
        Self {
            app_id: APP_ID.to_owned(),
            device_label: "Nearby Settings".to_owned(),
            strategy: Strategy::PointToPoint,
            enable_persistence: false,
            storage_dir: PathBuf::from("."),
            auto_start: false,
        }
    }
}

impl HostConfig {
    /// Preset that persists settings under `storage_dir`.
    pub fn persistent(storage_dir: &Path) -> Self {
        Self {
            enable_persistence: true,
            storage_dir: storage_dir.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_device_label(
        mut self,
        device_label: impl Into<String>,
    ) -> Self {
        self.device_label = device_label.into();
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}
