use serde_json::Value;

/// Object-type choices offered by the type filter, read from the backend's
/// `vehicle_settings` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTypeOptions {
    pub types: Vec<String>,
}

impl ObjectTypeOptions {
    /// Builds the option list from a `/api/config` document. A missing
    /// `vehicle_classes` list yields no options; `unknown` is appended when
    /// YOLO validation is disabled, since unvalidated objects are logged as
    /// such.
    pub fn from_config(config: &Value) -> Self {
        let settings = &config["vehicle_settings"];
        let mut types: Vec<String> = settings["vehicle_classes"]
            .as_array()
            .map(|classes| {
                classes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if types.is_empty() {
            return Self::default();
        }

        if settings["ignore_yolo_validation"].as_bool().unwrap_or(false)
            && !types.iter().any(|t| t == "unknown")
        {
            types.push("unknown".into());
        }
        Self { types }
    }

    /// Display label: the type with its first letter upper-cased.
    pub fn label(object_type: &str) -> String {
        let mut chars = object_type.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_is_added_when_validation_is_ignored() {
        let config = json!({
            "vehicle_settings": {
                "vehicle_classes": ["car", "truck"],
                "ignore_yolo_validation": true
            }
        });
        let options = ObjectTypeOptions::from_config(&config);
        assert_eq!(options.types, vec!["car", "truck", "unknown"]);
    }

    #[test]
    fn missing_settings_yield_no_options() {
        assert!(ObjectTypeOptions::from_config(&json!({})).types.is_empty());
        assert_eq!(ObjectTypeOptions::label("motorcycle"), "Motorcycle");
    }
}
