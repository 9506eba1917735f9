//! Error types

use std::any::Any;

use crate::value::Value;

/// Boxed error returned by validators that fail to run.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by form validation and path parsing.
///
/// Validation distinguishes "a field reported invalid" ([`FormError::Invalid`])
/// from "a validator itself broke" ([`FormError::Validator`] and
/// [`FormError::ValidatorPanicked`]).
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A validator or validate hook resolved with an error payload.
    #[error("validation failed: {payload:?}")]
    Invalid { payload: Value },

    /// A validator returned an error instead of a verdict.
    #[error("validator for {} failed: {source}", field_label(.field))]
    Validator {
        field: Option<String>,
        #[source]
        source: BoxError,
    },

    /// A validator panicked while running.
    #[error("validator for {} panicked: {message}", field_label(.field))]
    ValidatorPanicked {
        field: Option<String>,
        message: String,
    },

    /// A field path could not be parsed.
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

fn field_label(field: &Option<String>) -> String {
    match field {
        Some(name) => format!("'{name}'"),
        None => "validate hook".to_string(),
    }
}

impl FormError {
    /// Creates an invalid-field error carrying `payload`.
    pub fn invalid(payload: impl Into<Value>) -> Self {
        Self::Invalid {
            payload: payload.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Returns `true` if a field reported invalid, as opposed to a validator
    /// failing to run.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// Returns the payload of an [`FormError::Invalid`] error.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Invalid { payload } => Some(payload),
            _ => None,
        }
    }
}

/// Extract a human-readable message from a panic payload.
///
/// Panics can contain either `&str` or `String` payloads. This function
/// attempts to extract either, falling back to a generic message.
pub fn extract_panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
