//! Declarative validation rules.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::validator::{ValidateMode, Validator, Validity, validator_fn};
use crate::form::WeakForm;
use crate::value::Value;

/// Built-in value type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// A valid email address.
    Email,
    /// A number, or a string that parses as one.
    Number,
    /// A whole number, or a string that parses as one.
    Integer,
}

/// A declarative validation rule, as configured in
/// [`FormOptions::rules`](crate::FormOptions::rules).
///
/// Every check set on a rule must pass. Empty values (absent, null, blank
/// strings, empty arrays) pass every check except `required`.
///
/// `min`/`max` bound the character count of strings, the length of arrays,
/// and the value of numbers. `len` fixes the length of strings and arrays.
///
/// # Example
///
/// ```
/// use datum::validation::Rule;
///
/// let rules: Vec<Rule> = serde_json::from_str(
///     r#"[{"required": true, "message": "Name is required"}, {"min": 3}]"#,
/// ).unwrap();
/// assert!(rules[0].required);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub len: Option<usize>,
    #[serde(alias = "regExp")]
    pub pattern: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<RuleType>,
    /// Message reported instead of the generated one.
    pub message: Option<String>,
}

impl Rule {
    /// A rule requiring a non-empty value.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// A rule with a lower bound.
    pub fn min(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Default::default()
        }
    }

    /// A rule with an upper bound.
    pub fn max(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Default::default()
        }
    }

    /// A rule requiring an exact length.
    pub fn len(len: usize) -> Self {
        Self {
            len: Some(len),
            ..Default::default()
        }
    }

    /// A rule requiring strings to match a regex.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Default::default()
        }
    }

    /// A rule checking the value type.
    pub fn kind(kind: RuleType) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Sets the message reported when this rule fails.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Checks `value`, returning the failure message.
    pub fn check(&self, name: &str, value: Option<&Value>) -> Result<(), String> {
        let fail = |generated: String| Err(self.message.clone().unwrap_or(generated));

        let value = match value {
            Some(value) if !is_empty(value) => value,
            _ => {
                return if self.required {
                    fail(format!("{name} is required"))
                } else {
                    Ok(())
                };
            }
        };

        if let Some(kind) = self.kind
            && !matches_kind(kind, value)
        {
            let expected = match kind {
                RuleType::Email => "a valid email address",
                RuleType::Number => "a number",
                RuleType::Integer => "an integer",
            };
            return fail(format!("{name} must be {expected}"));
        }

        let measure = measure(value);
        if let (Some(min), Some((size, unit))) = (self.min, measure)
            && size < min
        {
            return fail(format!("{name} must be at least {min}{unit}"));
        }
        if let (Some(max), Some((size, unit))) = (self.max, measure)
            && size > max
        {
            return fail(format!("{name} must be at most {max}{unit}"));
        }
        if let Some(len) = self.len {
            let actual = match value {
                Value::String(s) => Some(s.chars().count()),
                Value::Array(items) => Some(items.len()),
                _ => None,
            };
            if actual.is_some_and(|actual| actual != len) {
                return fail(format!("{name} must have a length of {len}"));
            }
        }

        if let (Some(pattern), Value::String(s)) = (&self.pattern, value) {
            match regex::Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    return fail(format!("{name} does not match the required format"));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Ignoring invalid pattern for '{}': {}", name, e),
            }
        }

        Ok(())
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn matches_kind(kind: RuleType, value: &Value) -> bool {
    let number = match value {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match kind {
        RuleType::Email => value
            .as_str()
            .is_some_and(email_address::EmailAddress::is_valid),
        RuleType::Number => number.is_some_and(f64::is_finite),
        RuleType::Integer => number.is_some_and(|n| n.is_finite() && n.fract() == 0.0),
    }
}

/// Size used for `min`/`max`, with the unit for messages.
fn measure(value: &Value) -> Option<(f64, &'static str)> {
    match value {
        Value::String(s) => Some((s.chars().count() as f64, " characters")),
        Value::Array(items) => Some((items.len() as f64, " items")),
        Value::Number(n) => Some((*n, "")),
        _ => None,
    }
}

/// Runs `rules` in order and reports the first failure.
pub(crate) fn check_rules(name: &str, value: Option<&Value>, rules: &[Rule]) -> Validity {
    rules
        .iter()
        .find_map(|rule| rule.check(name, value).err())
        .map(Validity::invalid)
        .unwrap_or(Validity::Valid)
}

/// Builds a validator that checks `rules` and mirrors the verdict into the
/// form's error store.
pub(crate) fn rules_validator(form: WeakForm, name: String, rules: Vec<Rule>) -> Validator {
    let rules = Arc::new(rules);
    validator_fn(move |req| {
        let form = form.clone();
        let rules = Arc::clone(&rules);
        let name = name.clone();
        async move {
            if req.mode == ValidateMode::ForcePass {
                if let Some(form) = form.upgrade() {
                    form.set_error(&name, Value::Undefined);
                }
                return Ok(Validity::Valid);
            }

            let verdict = check_rules(&name, req.value.as_ref(), &rules);
            if req.mode == ValidateMode::Normal
                && let Some(form) = form.upgrade()
            {
                match &verdict {
                    Validity::Invalid(payload) => form.set_error(&name, payload.clone()),
                    Validity::Valid => form.set_error(&name, Value::Undefined),
                }
            }
            Ok(verdict)
        }
    })
}
