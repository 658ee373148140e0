use std::collections::HashSet;
use std::fmt;

use crate::types::{SettingDefinition, SettingType, SettingsSchema};
use crate::value::parse_bool;

/// First reason a schema document breaks its invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaViolation {
    DuplicateKey(String),
    InvalidValue { key: String, value: String },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::DuplicateKey(key) => {
                write!(f, "duplicate setting key `{key}`")
            }
            SchemaViolation::InvalidValue { key, value } => {
                write!(f, "value `{value}` is not valid for setting `{key}`")
            }
        }
    }
}

impl SettingsSchema {
    /// Looks up a setting by key.
    pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
        self.schema_items
            .iter()
            .find(|setting| setting.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema_items
            .iter()
            .map(|setting| setting.key.as_str())
    }

    /// Two documents are compatible when they share at least one key.
    pub fn is_compatible_with(&self, other: &SettingsSchema) -> bool {
        let keys: HashSet<&str> = self.keys().collect();
        other.keys().any(|key| keys.contains(key))
    }

    /// Returns whether the setting should be shown given its parent's
    /// current value.
    ///
    /// Fails closed: an unknown key, or a parent key missing from the
    /// document, yields `false`. Toggle parents are compared as booleans,
    /// select parents by exact string, and any other parent type leaves the
    /// setting visible.
    pub fn is_visible(&self, key: &str) -> bool {
        let Some(setting) = self.get(key) else {
            return false;
        };
        let Some(parent) = &setting.parent else {
            return true;
        };
        let Some(parent_setting) = self.get(&parent.key) else {
            return false;
        };

        let parent_value = parent_setting.effective_value();
        match parent_setting.setting_type {
            SettingType::Toggle => {
                Some(parse_bool(parent_value)) == parent.required_bool_value
            }
            SettingType::Select => {
                parent_value == parent.required_string_value.as_deref()
            }
            _ => true,
        }
    }

    /// All visible settings in document order.
    pub fn visible_settings(&self) -> Vec<&SettingDefinition> {
        self.schema_items
            .iter()
            .filter(|setting| self.is_visible(&setting.key))
            .collect()
    }

    /// Returns a copy of the document where the setting `key` holds
    /// `new_value`. Unknown keys leave the document unchanged.
    ///
    /// No validation happens here; check the value with
    /// [`SettingDefinition::validate_value`] first.
    pub fn update_setting(&self, key: &str, new_value: &str) -> SettingsSchema {
        SettingsSchema {
            schema_items: self
                .schema_items
                .iter()
                .map(|setting| {
                    if setting.key == key {
                        SettingDefinition {
                            value: Some(new_value.to_owned()),
                            ..setting.clone()
                        }
                    } else {
                        setting.clone()
                    }
                })
                .collect(),
        }
    }

    /// Checks key uniqueness and that every explicitly set value passes
    /// validation against its own definition.
    pub fn first_violation(&self) -> Option<SchemaViolation> {
        let mut seen = HashSet::new();
        for setting in &self.schema_items {
            if !seen.insert(setting.key.as_str()) {
                return Some(SchemaViolation::DuplicateKey(setting.key.clone()));
            }
            if let Some(value) = &setting.value {
                if !setting.validate_value(value) {
                    return Some(SchemaViolation::InvalidValue {
                        key: setting.key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.first_violation().is_none()
    }
}
