//! Reactive form state.
//!
//! `datum` provides [`Form`], a path-addressable store for form values and
//! errors. Fields bind to the form to receive notifications, register
//! validators, and take part in reset. The form is the single source of
//! truth; widgets mirror it through `get`, `set` and subscriptions.

pub mod config;
pub mod error;
pub mod event;
pub mod flat;
pub mod path;
pub mod validation;
pub mod value;

mod form;

pub use config::FormOptions;
pub use error::FormError;
pub use event::{Notification, Subscriber, Topic, UpdateSource, subscriber};
pub use form::{Form, WeakForm};
pub use path::FieldPath;
pub use value::{Map, Value};

pub mod prelude {
    pub use crate::config::FormOptions;
    pub use crate::error::FormError;
    pub use crate::event::{Notification, Subscriber, Topic, UpdateSource, subscriber};
    pub use crate::form::{Form, WeakForm};
    pub use crate::validation::{
        Rule, RuleType, ValidateMode, ValidateRequest, Validator, Validity, validate_hook,
        validator_fn, validator_sync,
    };
    pub use crate::value::Value;
}
