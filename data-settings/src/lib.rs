//! Typed settings schema shared between a host application and a paired
//! handheld device.
//!
//! A [`SettingsSchema`] is an ordered list of [`SettingDefinition`]s. Each
//! definition carries its current value as a string whose encoding depends on
//! its [`SettingType`]. Values are only ever changed through
//! [`SettingsSchema::update_setting`], and callers are expected to check a
//! candidate with [`SettingDefinition::validate_value`] before trusting it.
//!
//! Visibility of a setting may depend on the value of another setting (its
//! parent), see [`SettingsSchema::is_visible`].

mod schema;
mod types;
mod validate;
mod value;

pub use schema::SchemaViolation;
pub use types::{
    Constraints, GroupMetadata, ParentDependency, SettingDefinition,
    SettingType, SettingsSchema,
};
pub use value::FromSettingValue;
