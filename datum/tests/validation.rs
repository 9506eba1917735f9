//! Tests for form validation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use datum::prelude::*;

fn noop() -> Subscriber {
    subscriber(|_| {})
}

fn always_valid() -> Validator {
    validator_sync(|_| Validity::Valid)
}

fn always_invalid(message: &'static str) -> Validator {
    validator_sync(move |_| Validity::invalid(message))
}

#[tokio::test]
async fn test_validate_passes_when_all_valid() {
    let form = Form::default();
    form.bind("x", noop(), None, Some(always_valid()));
    form.bind("y", noop(), None, Some(always_valid()));
    assert!(form.validate(false).await.is_ok());
}

#[tokio::test]
async fn test_validate_rejects_with_first_payload() {
    let form = Form::default();
    form.bind("x", noop(), None, Some(always_valid()));
    form.bind("y", noop(), None, Some(always_invalid("bad")));
    form.bind("z", noop(), None, Some(always_invalid("worse")));

    let err = form.validate(false).await.unwrap_err();
    assert!(err.is_invalid());
    assert_eq!(err.payload(), Some(&Value::from("bad")));
}

#[tokio::test]
async fn test_validate_checks_fields_before_hooks() {
    let form = Form::default();
    form.subscribe_validate(validate_hook(|| async { Ok(Validity::invalid("hook")) }));
    form.bind("y", noop(), None, Some(always_invalid("field")));

    let err = form.validate(true).await.unwrap_err();
    assert_eq!(err.payload(), Some(&Value::from("field")));
}

#[tokio::test]
async fn test_validate_hook_alone_can_fail() {
    let form = Form::default();
    form.bind("x", noop(), None, Some(always_valid()));
    let hook = validate_hook(|| async { Ok(Validity::invalid("hook")) });
    form.subscribe_validate(Arc::clone(&hook));

    let err = form.validate(false).await.unwrap_err();
    assert_eq!(err.payload(), Some(&Value::from("hook")));

    form.unsubscribe_validate(&hook);
    assert!(form.validate(false).await.is_ok());
}

#[tokio::test]
async fn test_validate_passes_value_snapshot_and_mode() {
    let form = Form::new(FormOptions::new().value(Value::object([("a", 1), ("b", 2)])));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    form.bind(
        "a",
        noop(),
        None,
        Some(validator_sync(move |req| {
            seen_cb.lock().unwrap().push(req.clone());
            Validity::Valid
        })),
    );

    form.validate(false).await.unwrap();
    form.validate(true).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].name, "a");
    assert_eq!(seen[0].value, Some(Value::from(1)));
    assert_eq!(seen[0].values, Value::object([("a", 1), ("b", 2)]));
    assert_eq!(seen[0].mode, ValidateMode::Silent);
    assert_eq!(seen[1].mode, ValidateMode::Normal);
}

#[tokio::test]
async fn test_validator_error_is_wrapped() {
    let form = Form::default();
    form.bind("y", noop(), None, Some(always_invalid("bad")));
    form.bind(
        "x",
        noop(),
        None,
        Some(validator_fn(|_| async { Err("backend unavailable".into()) })),
    );

    let err = form.validate(false).await.unwrap_err();
    assert!(!err.is_invalid());
    match err {
        FormError::Validator { field, source } => {
            assert_eq!(field.as_deref(), Some("x"));
            assert_eq!(source.to_string(), "backend unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_validator_panic_is_wrapped() {
    let form = Form::default();
    form.bind(
        "x",
        noop(),
        None,
        Some(validator_sync(|_| panic!("validator exploded"))),
    );

    match form.validate(false).await {
        Err(FormError::ValidatorPanicked { field, message }) => {
            assert_eq!(field.as_deref(), Some("x"));
            assert_eq!(message, "validator exploded");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_validators_start_together() {
    let form = Form::default();
    let started = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = futures::channel::oneshot::channel::<()>();
    let rx = Arc::new(Mutex::new(Some(rx)));

    // The first validator waits until the second one has started.
    let started_a = Arc::clone(&started);
    form.bind(
        "a",
        noop(),
        None,
        Some(validator_fn(move |_| {
            started_a.fetch_add(1, Ordering::SeqCst);
            let rx = rx.lock().unwrap().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(Validity::Valid)
            }
        })),
    );
    let started_b = Arc::clone(&started);
    let tx = Arc::new(Mutex::new(Some(tx)));
    form.bind(
        "b",
        noop(),
        None,
        Some(validator_fn(move |_| {
            started_b.fetch_add(1, Ordering::SeqCst);
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
            async { Ok(Validity::Valid) }
        })),
    );

    assert!(form.validate(false).await.is_ok());
    assert_eq!(started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_validate_fields_collects_all_results() {
    let form = Form::default();
    form.bind("x", noop(), None, Some(always_valid()));
    form.bind("y", noop(), None, Some(always_invalid("bad")));
    form.bind(
        "z",
        noop(),
        None,
        Some(validator_fn(|_| async { Err("boom".into()) })),
    );
    form.bind("plain", noop(), None, None);

    let results = form.validate_fields(["x", "y", "z", "plain", "missing"]).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].name, "x");
    assert!(results[0].is_valid());
    assert!(matches!(&results[1].result, Ok(Validity::Invalid(p)) if p == &Value::from("bad")));
    assert!(results[2].result.is_err());
}

#[tokio::test]
async fn test_validate_fields_uses_normal_mode() {
    let form = Form::default();
    let mode = Arc::new(Mutex::new(None));
    let mode_cb = Arc::clone(&mode);
    form.bind(
        "x",
        noop(),
        None,
        Some(validator_sync(move |req| {
            *mode_cb.lock().unwrap() = Some(req.mode);
            Validity::Valid
        })),
    );

    form.validate_fields(["x"]).await;

    assert_eq!(*mode.lock().unwrap(), Some(ValidateMode::Normal));
}

#[tokio::test]
async fn test_validate_clear_resets_errors() {
    let form = Form::new(FormOptions::new().rule("name", vec![Rule::required().message("Required")]));
    form.bind_with_rules("name", noop(), None);
    form.set_error("other", "stale");

    assert!(form.validate(true).await.is_err());
    assert_eq!(form.get_error("name"), Some(Value::from("Required")));

    form.validate_clear().await;

    assert_eq!(form.get_error("name"), None);
    assert_eq!(form.get_error("other"), None);
}

#[tokio::test]
async fn test_validate_clear_runs_force_pass_and_swallows_failures() {
    let form = Form::default();
    let modes = Arc::new(Mutex::new(Vec::new()));
    let modes_cb = Arc::clone(&modes);
    form.bind(
        "x",
        noop(),
        None,
        Some(validator_sync(move |req| {
            modes_cb.lock().unwrap().push(req.mode);
            Validity::Valid
        })),
    );
    form.bind(
        "y",
        noop(),
        None,
        Some(validator_fn(|_| async { Err("boom".into()) })),
    );

    form.validate_clear().await;

    assert_eq!(*modes.lock().unwrap(), vec![ValidateMode::ForcePass]);
}

#[tokio::test]
async fn test_rules_validator_writes_errors_only_in_normal_mode() {
    let form = Form::new(
        FormOptions::new().rule(
            "email",
            vec![Rule::required(), Rule::kind(RuleType::Email).message("Bad email")],
        ),
    );
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_cb = Arc::clone(&errors);
    form.bind_with_rules(
        "email",
        subscriber(move |n| {
            if let Notification::Error { error } = n {
                errors_cb.lock().unwrap().push(error.clone());
            }
        }),
        Some(Value::from("nope")),
    );

    // Silent validation reports the failure without touching errors.
    let err = form.validate(false).await.unwrap_err();
    assert_eq!(err.payload(), Some(&Value::from("Bad email")));
    assert_eq!(form.get_error("email"), None);

    form.validate(true).await.unwrap_err();
    assert_eq!(form.get_error("email"), Some(Value::from("Bad email")));

    form.set("email", "ada@example.com");
    assert!(form.validate(true).await.is_ok());
    assert_eq!(form.get_error("email"), None);

    assert_eq!(
        *errors.lock().unwrap(),
        vec![Some(Value::from("Bad email")), None]
    );
}

#[tokio::test]
async fn test_unbind_drops_validator() {
    let form = Form::default();
    form.bind("y", noop(), None, Some(always_invalid("bad")));
    form.unbind("y");
    assert!(form.validate(false).await.is_ok());
}
