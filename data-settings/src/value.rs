use crate::types::{SettingDefinition, SettingsSchema};

/// Boolean reading of a stored value: case-insensitive `"true"`, anything
/// else (including no value) is `false`.
pub(crate) fn parse_bool(value: Option<&str>) -> bool {
    value.map_or(false, |value| value.eq_ignore_ascii_case("true"))
}

impl SettingDefinition {
    /// The current value, falling back to the default.
    pub fn effective_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or(self.default_value.as_deref())
    }

    pub fn bool_value(&self) -> Option<bool> {
        self.effective_value()
            .map(|value| parse_bool(Some(value)))
    }

    pub fn int_value(&self) -> Option<i32> {
        self.effective_value()
            .and_then(|value| value.parse().ok())
    }

    pub fn string_value(&self) -> Option<&str> {
        self.effective_value()
    }

    /// Options picked in a multi-select value, trimmed. Empty entries are
    /// kept, so `"a,,b"` yields three options.
    pub fn selected_options(&self) -> Vec<String> {
        self.effective_value()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Types that can be read out of a setting's effective value.
pub trait FromSettingValue: Sized {
    fn from_setting(setting: &SettingDefinition) -> Option<Self>;
}

impl FromSettingValue for bool {
    fn from_setting(setting: &SettingDefinition) -> Option<Self> {
        setting.bool_value()
    }
}

impl FromSettingValue for i32 {
    fn from_setting(setting: &SettingDefinition) -> Option<Self> {
        setting.int_value()
    }
}

impl FromSettingValue for String {
    fn from_setting(setting: &SettingDefinition) -> Option<Self> {
        setting.string_value().map(str::to_owned)
    }
}

impl FromSettingValue for Vec<String> {
    fn from_setting(setting: &SettingDefinition) -> Option<Self> {
        Some(setting.selected_options())
    }
}

impl SettingsSchema {
    /// Reads the setting `key` as `T`.
    ///
    /// ```
    /// use data_settings::{SettingDefinition, SettingType, SettingsSchema};
    ///
    /// let schema = SettingsSchema::new(vec![
    ///     SettingDefinition::new("volume", "Volume", SettingType::Number)
    ///         .with_default("7"),
    /// ]);
    /// assert_eq!(schema.typed_value::<i32>("volume"), Some(7));
    /// assert_eq!(schema.typed_value::<i32>("missing"), None);
    /// ```
    pub fn typed_value<T: FromSettingValue>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_setting)
    }
}
