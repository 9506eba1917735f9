//! Form definition files.

use datum::validation::Rule;
use datum::{FormOptions, Value};
use serde::Deserialize;

/// A form described in JSON.
///
/// ```json
/// {
///   "options": { "value": { "name": "Ada" }, "rules": { "name": [{ "required": true }] } },
///   "fields": [{ "name": "name" }, { "name": "age", "default": 36, "rules": [{ "min": 0 }] }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub options: FormOptions,
    pub fields: Vec<FieldDefinition>,
}

/// A field bound when the form is loaded.
#[derive(Debug, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub default: Option<Value>,
    /// Extra rules, appended to any configured in `options.rules`.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Definition {
    /// Form options with each field's inline rules merged in.
    pub fn form_options(&self) -> FormOptions {
        let mut options = self.options.clone();
        for field in &self.fields {
            if !field.rules.is_empty() {
                options
                    .rules
                    .entry(field.name.clone())
                    .or_default()
                    .extend(field.rules.iter().cloned());
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_inline_rules() {
        let definition: Definition = serde_json::from_str(
            r#"{
                "options": {"rules": {"age": [{"required": true}]}},
                "fields": [{"name": "age", "default": 3, "rules": [{"min": 0}]}]
            }"#,
        )
        .unwrap();
        let options = definition.form_options();
        assert_eq!(options.rules["age"], vec![Rule::required(), Rule::min(0.0)]);
        assert_eq!(definition.fields[0].default, Some(Value::from(3)));
    }
}
