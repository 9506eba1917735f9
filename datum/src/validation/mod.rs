//! Field validation for forms.
//!
//! A [`Validator`] is an asynchronous function from a [`ValidateRequest`] to
//! a [`Validity`]. Validators are registered per field through
//! [`Form::bind`](crate::Form::bind); form-wide checks register a
//! [`ValidateHook`] with [`Form::subscribe_validate`](crate::Form::subscribe_validate).
//!
//! Declarative [`Rule`]s can be configured on the form and turned into a
//! validator with [`Form::rules_validator`](crate::Form::rules_validator).
//!
//! # Example
//!
//! ```ignore
//! use datum::validation::{validator_fn, Validity};
//!
//! let not_admin = validator_fn(|req| async move {
//!     if req.value.as_ref().and_then(|v| v.as_str()) == Some("admin") {
//!         Ok(Validity::invalid("That name is reserved"))
//!     } else {
//!         Ok(Validity::Valid)
//!     }
//! });
//! form.bind("username", on_update, None, Some(not_admin));
//! ```

mod rules;
mod validator;

pub use rules::{Rule, RuleType};
pub use validator::{
    FieldValidation, ValidateHook, ValidateMode, ValidateRequest, Validator, ValidatorResult,
    Validity, validate_hook, validator_fn, validator_sync,
};

pub(crate) use rules::rules_validator;
pub(crate) use validator::run_guarded;
