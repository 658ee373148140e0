use std::collections::HashMap;

use data_settings::{SettingDefinition, SettingsSchema};

/// Applies stored values onto the current schema.
///
/// The shape of `current` always wins. A stored value is carried over only
/// when its key still exists and the current definition accepts it; stored
/// keys that no longer exist are dropped.
pub fn carry_over_values(
    current: &SettingsSchema,
    stored: &[SettingDefinition],
) -> SettingsSchema {
    let stored_values: HashMap<&str, &str> = stored
        .iter()
        .filter_map(|setting| {
            setting
                .value
                .as_deref()
                .map(|value| (setting.key.as_str(), value))
        })
        .collect();

    let schema_items = current
        .schema_items
        .iter()
        .map(|setting| match stored_values.get(setting.key.as_str()) {
            Some(value) if setting.validate_value(value) => SettingDefinition {
                value: Some((*value).to_owned()),
                ..setting.clone()
            },
            Some(value) => {
                log::debug!(
                    "Dropping stored value {:?} for {}, it no longer validates",
                    value,
                    setting.key
                );
                setting.clone()
            }
            None => setting.clone(),
        })
        .collect();

    SettingsSchema::new(schema_items)
}
