use serde::{Deserialize, Serialize};

/// Kind of a setting. Decides which constraints apply and how the string
/// value is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    /// Free-form text.
    Text,
    /// Decimal integer.
    Number,
    /// `"true"` or `"false"`.
    Toggle,
    /// Exactly one of `Constraints::options`.
    Select,
    /// Comma separated subset of `Constraints::options`.
    MultiSelect,
}

/// Optional bounds attached to a setting.
///
/// `min` and `max` bound the integer for [`SettingType::Number`]. For
/// [`SettingType::Text`] they describe the string length and for
/// [`SettingType::MultiSelect`] the number of selected options, but in those
/// two cases they are advisory and are not checked by validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    /// Legal values, in display order. Required for [`SettingType::Select`]
    /// and [`SettingType::MultiSelect`], ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Constraints {
    pub fn range(min: i32, max: i32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            options: None,
        }
    }

    pub fn options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            min: None,
            max: None,
            options: Some(options.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_bounds(mut self, min: i32, max: i32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Makes a setting visible only while another setting holds a given value.
///
/// `required_bool_value` is used when the parent is a
/// [`SettingType::Toggle`], `required_string_value` when it is a
/// [`SettingType::Select`]. Parents of any other type never hide the child.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDependency {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_string_value: Option<String>,
}

impl ParentDependency {
    pub fn when_toggled(key: impl Into<String>, required: bool) -> Self {
        Self {
            key: key.into(),
            required_bool_value: Some(required),
            required_string_value: None,
        }
    }

    pub fn when_selected(
        key: impl Into<String>,
        required: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            required_bool_value: None,
            required_string_value: Some(required.into()),
        }
    }
}

/// Presentation-only clustering of related settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Markdown is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single configurable item of a [`SettingsSchema`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingDefinition {
    /// Stable identifier, unique within a schema.
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Current value. When unset the default value is in effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    /// Markdown is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentDependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupMetadata>,
}

impl SettingDefinition {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        setting_type: SettingType,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            setting_type,
            default_value: None,
            value: None,
            constraints: None,
            description: None,
            required: false,
            parent: None,
            group: None,
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent: ParentDependency) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_group(mut self, group: GroupMetadata) -> Self {
        self.group = Some(group);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The ordered collection of settings exchanged with the peer and persisted
/// as a unit. Order is only significant for presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSchema {
    pub schema_items: Vec<SettingDefinition>,
}

impl SettingsSchema {
    pub fn new(schema_items: Vec<SettingDefinition>) -> Self {
        Self { schema_items }
    }
}
