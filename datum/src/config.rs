//! Form configuration types.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::validation::Rule;
use crate::value::Value;

/// Callback invoked with the full form value after [`Form::set`](crate::Form::set).
pub type ChangeCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Configuration for a [`Form`](crate::Form).
///
/// Options can be built in code or deserialized; the JSON names follow the
/// camelCase style (`removeUndefined`).
///
/// # Example
///
/// ```
/// use datum::{FormOptions, Value};
/// use datum::validation::Rule;
///
/// let options = FormOptions::new()
///     .trim(true)
///     .rule("name", vec![Rule::required()])
///     .value(Value::object([("name", "Ada")]));
/// assert!(options.remove_undefined);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormOptions {
    /// Drop keys holding `Undefined` when reading the form value.
    pub remove_undefined: bool,

    /// Trim string values when reading the form value.
    pub trim: bool,

    /// Declarative rules per field name.
    pub rules: IndexMap<String, Vec<Rule>>,

    /// Initial form value.
    pub value: Option<Value>,

    /// Initial errors.
    pub error: Option<Value>,

    /// Called after every `set` with the current form value.
    #[serde(skip)]
    pub on_change: Option<ChangeCallback>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            remove_undefined: true,
            trim: false,
            rules: IndexMap::new(),
            value: None,
            error: None,
            on_change: None,
        }
    }
}

impl fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("remove_undefined", &self.remove_undefined)
            .field("trim", &self.trim)
            .field("rules", &self.rules)
            .field("value", &self.value)
            .field("error", &self.error)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl FormOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_undefined(mut self, remove: bool) -> Self {
        self.remove_undefined = remove;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Set the rules for one field.
    pub fn rule(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    pub fn rules(mut self, rules: IndexMap<String, Vec<Rule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn error(mut self, error: impl Into<Value>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the change callback.
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }
}
