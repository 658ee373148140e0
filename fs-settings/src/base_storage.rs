use data_error::Result;
use data_settings::SettingsSchema;

pub trait SettingsStorage: Send {
    /// Persist the schema, replacing whatever was stored before.
    /// Does nothing when `enabled` is false.
    fn save(&mut self, schema: &SettingsSchema, enabled: bool) -> Result<()>;

    /// Read the stored values and apply them onto `current`, the schema the
    /// application declares now.
    ///
    /// Returns `None` when disabled, when nothing is stored, or when the
    /// stored data cannot be decoded.
    fn load(
        &mut self,
        current: &SettingsSchema,
        enabled: bool,
    ) -> Option<SettingsSchema>;

    /// Remove all persisted data.
    fn erase(&self) -> Result<()>;
}
