//! Validator function types.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{BoxError, FormError, extract_panic_message};
use crate::value::Value;

/// Verdict of a single validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Validity {
    /// The value is acceptable.
    #[default]
    Valid,
    /// The value is rejected with an error payload (usually a message).
    Invalid(Value),
}

impl Validity {
    /// Creates an invalid verdict.
    pub fn invalid(payload: impl Into<Value>) -> Self {
        Self::Invalid(payload.into())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// How a validator is being invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidateMode {
    /// User-driven check; validators should surface their errors.
    #[default]
    Normal,
    /// Check only; validators should not touch visible error state.
    Silent,
    /// Programmatic update; validators should pass and clear their error.
    ForcePass,
}

/// Arguments handed to a [`Validator`].
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    /// Name of the field being validated.
    pub name: String,
    /// Current value of the field.
    pub value: Option<Value>,
    /// Snapshot of the whole form value.
    pub values: Value,
    pub mode: ValidateMode,
}

/// Result type returned by validators. `Err` means the validator itself failed.
pub type ValidatorResult = Result<Validity, BoxError>;

/// Per-field validation function.
pub type Validator = Arc<dyn Fn(ValidateRequest) -> BoxFuture<'static, ValidatorResult> + Send + Sync>;

/// Form-wide validation callback run by [`Form::validate`](crate::Form::validate).
pub type ValidateHook = Arc<dyn Fn() -> BoxFuture<'static, ValidatorResult> + Send + Sync>;

/// Builds a [`Validator`] from an async closure.
pub fn validator_fn<F, Fut>(f: F) -> Validator
where
    F: Fn(ValidateRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidatorResult> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Builds a [`Validator`] from a synchronous check.
pub fn validator_sync<F>(f: F) -> Validator
where
    F: Fn(&ValidateRequest) -> Validity + Send + Sync + 'static,
{
    Arc::new(move |req| {
        let verdict = f(&req);
        async move { Ok(verdict) }.boxed()
    })
}

/// Builds a [`ValidateHook`] from an async closure.
pub fn validate_hook<F, Fut>(f: F) -> ValidateHook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidatorResult> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Outcome of validating one field via [`Form::validate_fields`](crate::Form::validate_fields).
#[derive(Debug)]
pub struct FieldValidation {
    pub name: String,
    pub result: Result<Validity, FormError>,
}

impl FieldValidation {
    /// Returns `true` if the validator ran and passed.
    pub fn is_valid(&self) -> bool {
        matches!(self.result, Ok(Validity::Valid))
    }
}

/// Runs a validator future, turning errors and panics into [`FormError`]s.
///
/// `call` is invoked inside the guarded future so a validator that panics
/// before returning its future is caught too.
pub(crate) async fn run_guarded<F, Fut>(field: Option<String>, call: F) -> Result<Validity, FormError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ValidatorResult>,
{
    let result = AssertUnwindSafe(async move { call().await })
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(verdict)) => Ok(verdict),
        Ok(Err(source)) => Err(FormError::Validator { field, source }),
        Err(panic) => Err(FormError::ValidatorPanicked {
            field,
            message: extract_panic_message(&panic),
        }),
    }
}
