use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use data_error::{NearbyError, Result};
use data_settings::{SettingDefinition, SettingsSchema};

use crate::base_storage::SettingsStorage;
use crate::migration::carry_over_values;
use crate::{ENVELOPE_VERSION, SETTINGS_FILE};

/*
Note on the envelope version:

Nothing branches on `version` yet. It is there so that a later release can
change the layout of the stored document. Whatever version was read is
written back unchanged, so a store produced by a newer release keeps its
marker after an older release touched it.
*/

/// The unit written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEnvelope {
    pub schema_items: Vec<SettingDefinition>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    ENVELOPE_VERSION
}

/// Persists a settings schema as a single JSON file.
///
/// Writes overwrite the file in place. A crash in the middle of a write can
/// leave a truncated file behind, which the next [`SettingsStorage::load`]
/// treats as "nothing stored".
pub struct FileSettingsStore {
    label: String,
    path: PathBuf,
    version: u32,
}

impl FileSettingsStore {
    /// Create a new store with a diagnostic label and file path
    pub fn new(label: String, path: &Path) -> Self {
        Self {
            label,
            path: PathBuf::from(path),
            version: ENVELOPE_VERSION,
        }
    }

    /// Store backed by [`SETTINGS_FILE`] inside `dir`.
    pub fn in_dir(label: String, dir: &Path) -> Self {
        Self::new(label, &dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version that the next save will write.
    pub fn version(&self) -> u32 {
        self.version
    }

    fn read_envelope(&self) -> Result<PersistedEnvelope> {
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|err| {
            NearbyError::Storage(self.label.clone(), err.to_string())
        })
    }
}

impl SettingsStorage for FileSettingsStore {
    fn save(&mut self, schema: &SettingsSchema, enabled: bool) -> Result<()> {
        if !enabled {
            return Ok(());
        }

        if let Some(parent_dir) = self.path.parent() {
            if !parent_dir.as_os_str().is_empty() {
                fs::create_dir_all(parent_dir)?;
            }
        }

        let envelope = PersistedEnvelope {
            schema_items: schema.schema_items.clone(),
            version: self.version,
        };

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &envelope)?;
        writer.flush()?;

        log::info!(
            "{} {} settings have been written",
            self.label,
            envelope.schema_items.len()
        );
        Ok(())
    }

    fn load(
        &mut self,
        current: &SettingsSchema,
        enabled: bool,
    ) -> Option<SettingsSchema> {
        if !enabled || !self.path.exists() {
            return None;
        }

        match self.read_envelope() {
            Ok(envelope) => {
                log::info!(
                    "{} loaded {} stored settings (version {})",
                    self.label,
                    envelope.schema_items.len(),
                    envelope.version
                );
                self.version = envelope.version;
                Some(carry_over_values(current, &envelope.schema_items))
            }
            Err(err) => {
                log::warn!("{} ignoring unreadable store: {}", self.label, err);
                None
            }
        }
    }

    fn erase(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|err| {
            NearbyError::Storage(self.label.clone(), err.to_string())
        })
    }
}
