use crate::types::{Constraints, SettingDefinition, SettingType};

impl SettingDefinition {
    /// Checks `candidate` against the encoding of the setting's type and its
    /// constraints. Never fails, malformed input is simply invalid.
    ///
    /// The default value is always accepted. Length bounds on text and count
    /// bounds on multi-select are not enforced.
    pub fn validate_value(&self, candidate: &str) -> bool {
        if self.default_value.as_deref() == Some(candidate) {
            return true;
        }

        let constraints = self.constraints.as_ref();
        let valid = match self.setting_type {
            SettingType::Text => true,
            SettingType::Number => match candidate.parse::<i32>() {
                Ok(number) => within_bounds(number, constraints),
                Err(_) => false,
            },
            SettingType::Toggle => candidate == "true" || candidate == "false",
            SettingType::Select => is_option(constraints, candidate),
            SettingType::MultiSelect => candidate
                .split(',')
                .map(str::trim)
                .all(|option| is_option(constraints, option)),
        };

        if !valid {
            log::trace!(
                "Rejected value {:?} for {:?} setting {}",
                candidate,
                self.setting_type,
                self.key
            );
        }
        valid
    }
}

fn within_bounds(number: i32, constraints: Option<&Constraints>) -> bool {
    let Some(constraints) = constraints else {
        return true;
    };
    constraints.min.map_or(true, |min| min <= number)
        && constraints.max.map_or(true, |max| number <= max)
}

/// An absent options list allows anything.
fn is_option(constraints: Option<&Constraints>, candidate: &str) -> bool {
    match constraints.and_then(|c| c.options.as_ref()) {
        Some(options) => options.iter().any(|option| option == candidate),
        None => true,
    }
}
