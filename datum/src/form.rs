//! The form state container.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};

use crate::config::{ChangeCallback, FormOptions};
use crate::error::FormError;
use crate::event::{EventRegistry, Notification, Subscriber, Topic, UpdateSource};
use crate::flat::{FlatMap, flatten, lookup, remove_path, shallow_equal, unflatten};
use crate::path::join_key;
use crate::validation::{
    FieldValidation, Rule, ValidateHook, ValidateMode, ValidateRequest, Validator, Validity,
    rules_validator, run_guarded,
};
use crate::value::{Map, Value};

/// Mutable form data, guarded by one lock.
#[derive(Default)]
struct Store {
    /// Flattened field values.
    values: FlatMap,
    /// Value each bound field was bound with, restored by `reset`.
    defaults: IndexMap<String, Value>,
    /// Flattened field errors.
    errors: FlatMap,
    /// Names of currently bound fields.
    bound: IndexSet<String>,
    /// Validators in registration order.
    validators: IndexMap<String, Validator>,
}

struct Shared {
    store: RwLock<Store>,
    events: RwLock<EventRegistry>,
    hooks: RwLock<Vec<ValidateHook>>,
    remove_undefined: bool,
    trim: bool,
    rules: IndexMap<String, Vec<Rule>>,
    on_change: Option<ChangeCallback>,
}

/// Path-addressable form state with subscriptions and validation.
///
/// `Form` is the single source of truth for a set of fields. Values and
/// errors are stored flattened by dotted path (`address.city`,
/// `contacts[0].email`). Fields [`bind`](Self::bind) themselves to receive
/// notifications and take part in validation and [`reset`](Self::reset).
///
/// `Form` is a cheap handle: clones share the same state. Subscribers are
/// called synchronously with no locks held, so they may call back into the
/// form.
///
/// # Example
///
/// ```
/// use datum::{Form, FormOptions, Value};
///
/// let form = Form::new(FormOptions::new().value(Value::object([("a", 1)])));
/// form.set("address.city", "Oslo");
///
/// assert_eq!(form.get("a"), Some(Value::from(1)));
/// assert_eq!(
///     form.get_value(),
///     Value::object([
///         ("a", Value::from(1)),
///         ("address", Value::object([("city", "Oslo")])),
///     ])
/// );
/// ```
#[derive(Clone)]
pub struct Form {
    shared: Arc<Shared>,
}

/// Non-owning handle to a [`Form`], held by validators the form owns.
#[derive(Clone)]
pub struct WeakForm {
    shared: Weak<Shared>,
}

impl WeakForm {
    /// Returns the form if it is still alive.
    pub fn upgrade(&self) -> Option<Form> {
        self.shared.upgrade().map(|shared| Form { shared })
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.store();
        f.debug_struct("Form")
            .field("values", &store.values)
            .field("errors", &store.errors)
            .field("bound", &store.bound)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Create a form from options, seeding initial values and errors.
    pub fn new(options: FormOptions) -> Self {
        let FormOptions {
            remove_undefined,
            trim,
            rules,
            value,
            error,
            on_change,
        } = options;

        let form = Self {
            shared: Arc::new(Shared {
                store: RwLock::new(Store::default()),
                events: RwLock::new(EventRegistry::default()),
                hooks: RwLock::new(Vec::new()),
                remove_undefined,
                trim,
                rules,
                on_change,
            }),
        };

        if let Some(value) = value {
            form.set_value(value);
        }
        if let Some(error) = error {
            form.set_errors(error);
        }
        form
    }

    /// Returns a non-owning handle to this form.
    pub fn downgrade(&self) -> WeakForm {
        WeakForm {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn store(&self) -> RwLockReadGuard<'_, Store> {
        self.shared
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, Store> {
        self.shared
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn events_mut(&self) -> RwLockWriteGuard<'_, EventRegistry> {
        self.shared
            .events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    /// Read the value at `name`.
    ///
    /// A stored leaf is returned directly; otherwise the subtree under `name`
    /// is rebuilt. Missing paths and `Undefined` leaves read as `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        lookup(&self.store().values, name)
    }

    /// Write `value` at `name`. Arrays are kept whole unless non-empty.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.set_with(name, value, true);
    }

    /// Write `value` at `name`, choosing whether arrays are stored whole.
    ///
    /// Non-empty arrays are always replaced entirely and expanded into
    /// indexed paths.
    pub fn set_with(&self, name: &str, value: impl Into<Value>, skip_array: bool) {
        let mut object = Map::new();
        object.insert(name.to_string(), value.into());
        self.set_many_with(Value::Object(object), skip_array);
    }

    /// Merge an object of `path -> value` pairs into the form.
    pub fn set_many(&self, values: Value) {
        self.set_many_with(values, true);
    }

    fn set_many_with(&self, values: Value, skip_array: bool) {
        let flat = flatten(&values, skip_array);
        for (name, value) in &flat {
            if matches!(value, Value::Array(items) if !items.is_empty()) {
                self.force_set(name, value.clone(), false);
            } else {
                self.store_mut().values.insert(name.clone(), value.clone());
            }
        }

        self.through_value("", &unflatten(&flat));
        self.dispatch(&Topic::Change, &Notification::Change);
        self.handle_change();
    }

    /// Notify bound fields found while walking a freshly written subtree.
    fn through_value(&self, path: &str, value: &Value) {
        let Value::Object(map) = value else {
            return;
        };
        for (key, child) in map {
            let name = join_key(path, key);
            if self.is_bound(&name) {
                self.notify_update(&name, UpdateSource::Field(name.clone()));
            } else {
                self.through_value(&name, child);
            }
        }
    }

    fn notify_update(&self, name: &str, source: UpdateSource) {
        let value = self.get(name);
        self.dispatch(&Topic::update(name), &Notification::Update { value, source });
        self.dispatch(&Topic::change(name), &Notification::Change);
    }

    fn handle_change(&self) {
        if let Some(on_change) = &self.shared.on_change {
            on_change(&self.get_value());
        }
    }

    /// Remove `name` and everything beneath it. No notifications are sent.
    pub fn remove(&self, name: &str) {
        remove_path(&mut self.store_mut().values, name);
    }

    /// Remove `name`, then write `value` there.
    pub fn force_set(&self, name: &str, value: impl Into<Value>, skip_array: bool) {
        self.remove(name);
        self.set_with(name, value, skip_array);
    }

    /// Return the whole form value as a tree.
    ///
    /// This also cleans the store in place: with `remove_undefined`, keys
    /// holding `Undefined` are dropped, and with `trim`, string values are
    /// trimmed.
    pub fn get_value(&self) -> Value {
        let remove_undefined = self.shared.remove_undefined;
        let trim = self.shared.trim;

        if remove_undefined || trim {
            let mut store = self.store_mut();
            if remove_undefined {
                store.values.retain(|_, value| !value.is_undefined());
            }
            if trim {
                for value in store.values.values_mut() {
                    if let Value::String(s) = value {
                        let trimmed = s.trim();
                        if trimmed.len() != s.len() {
                            *s = trimmed.to_string();
                        }
                    }
                }
            }
        }

        unflatten(&self.store().values)
    }

    /// Replace every value in the form.
    ///
    /// Does nothing if the flattened result equals the current values.
    /// Otherwise every bound field receives an update and a change
    /// notification, followed by one form-wide change.
    pub fn set_value(&self, value: Value) {
        self.replace_values(flatten(&value, false), false);
    }

    fn replace_values(&self, values: FlatMap, force_pass: bool) {
        let bound: Vec<String> = {
            let mut store = self.store_mut();
            if !force_pass && shallow_equal(&values, &store.values) {
                return;
            }
            store.values = values;
            store.bound.iter().cloned().collect()
        };

        for name in bound {
            let source = if force_pass {
                UpdateSource::ForcePass
            } else {
                UpdateSource::Field(name.clone())
            };
            self.notify_update(&name, source);
        }
        self.dispatch(&Topic::Change, &Notification::Change);
    }

    /// Restore every bound field to the value it was bound with.
    ///
    /// Subscribers of [`Topic::Reset`] run first. Every bound field is then
    /// notified with [`UpdateSource::ForcePass`], even if nothing changed.
    pub fn reset(&self) {
        self.dispatch(&Topic::Reset, &Notification::Reset);
        let defaults = Value::Object(self.store().defaults.clone());
        log::debug!("Resetting form to bound defaults");
        self.replace_values(flatten(&defaults, false), true);
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    /// Read the error at `name`.
    pub fn get_error(&self, name: &str) -> Option<Value> {
        lookup(&self.store().errors, name)
    }

    /// Write an error at `name`. Pass [`Value::Undefined`] to clear it.
    pub fn set_error(&self, name: &str, error: impl Into<Value>) {
        let mut object = Map::new();
        object.insert(name.to_string(), error.into());
        self.set_errors(Value::Object(object));
    }

    /// Merge an object of `path -> error` pairs into the error store.
    pub fn set_errors(&self, errors: Value) {
        let flat = flatten(&errors, false);
        {
            let mut store = self.store_mut();
            for (name, error) in &flat {
                store.errors.insert(name.clone(), error.clone());
            }
        }
        self.through_error("", &unflatten(&flat));
    }

    fn through_error(&self, path: &str, error: &Value) {
        let Value::Object(map) = error else {
            return;
        };
        for (key, child) in map {
            let name = join_key(path, key);
            if self.is_bound(&name) {
                let error = self.get_error(&name);
                self.dispatch(&Topic::error(name.as_str()), &Notification::Error { error });
            } else {
                self.through_error(&name, child);
            }
        }
    }

    /// Remove the error at `name` and beneath it. No notifications are sent.
    pub fn remove_error(&self, name: &str) {
        remove_path(&mut self.store_mut().errors, name);
    }

    /// Returns the rules configured for `name` (empty if none).
    pub fn get_rule(&self, name: &str) -> Vec<Rule> {
        self.shared.rules.get(name).cloned().unwrap_or_default()
    }

    /// Build a validator from the rules configured for `name`.
    ///
    /// The validator passes and clears the field error in
    /// [`ValidateMode::ForcePass`]. Otherwise it checks the rules in order;
    /// in [`ValidateMode::Normal`] it also writes the first failure (or
    /// clears the error) through [`set_error`](Self::set_error).
    pub fn rules_validator(&self, name: &str) -> Validator {
        rules_validator(self.downgrade(), name.to_string(), self.get_rule(name))
    }

    // -------------------------------------------------------------------------
    // Binding
    // -------------------------------------------------------------------------

    /// Attach a field.
    ///
    /// `callback` is subscribed to the field's update and error topics.
    /// `initial` is remembered for [`reset`](Self::reset), and seeds the
    /// value if the field has none yet. Binding a name twice logs an error
    /// and the later binding wins.
    pub fn bind(
        &self,
        name: &str,
        callback: Subscriber,
        initial: Option<Value>,
        validator: Option<Validator>,
    ) {
        {
            let mut store = self.store_mut();
            if store.bound.contains(name) {
                log::error!(
                    "There is already an item with name \"{}\". Field names must be unique.",
                    name
                );
            }
            store
                .defaults
                .insert(name.to_string(), initial.clone().unwrap_or_default());
            match validator {
                Some(validator) => {
                    store.validators.insert(name.to_string(), validator);
                }
                None => {
                    store.validators.shift_remove(name);
                }
            }
            store.bound.insert(name.to_string());
        }
        log::debug!("Bound field '{}'", name);

        if let Some(initial) = initial
            && self.get(name).is_none()
        {
            let mut object = Map::new();
            object.insert(name.to_string(), initial);
            let flat = flatten(&Value::Object(object), false);
            self.store_mut().values.extend(flat);

            self.dispatch(&Topic::change(name), &Notification::Change);
            self.dispatch(&Topic::Change, &Notification::Change);
        }

        self.subscribe(Topic::update(name), Arc::clone(&callback));
        self.subscribe(Topic::error(name), callback);
    }

    /// Attach a field validated by its configured rules.
    pub fn bind_with_rules(&self, name: &str, callback: Subscriber, initial: Option<Value>) {
        let validator = self.rules_validator(name);
        self.bind(name, callback, initial, Some(validator));
    }

    /// Detach a field, dropping its value, validator and subscriptions.
    ///
    /// The default captured at bind time is kept.
    pub fn unbind(&self, name: &str) {
        {
            let mut store = self.store_mut();
            store.values.shift_remove(name);
            store.bound.shift_remove(name);
            store.validators.shift_remove(name);
        }
        self.unsubscribe_all(&Topic::update(name));
        self.unsubscribe_all(&Topic::error(name));
        self.remove(name);
        log::debug!("Unbound field '{}'", name);
    }

    /// Detach several fields.
    pub fn unbind_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.unbind(name.as_ref());
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.store().bound.contains(name)
    }

    /// Names of bound fields, in bind order.
    pub fn bound_names(&self) -> Vec<String> {
        self.store().bound.iter().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Call every subscriber of `topic`, in subscription order.
    ///
    /// The subscriber list is captured before the first call; changes made by
    /// subscribers apply from the next dispatch.
    pub fn dispatch(&self, topic: &Topic, notification: &Notification) {
        let subscribers = self
            .shared
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(topic);
        if subscribers.is_empty() {
            return;
        }
        log::trace!("Dispatching {:?} to {} subscriber(s)", topic, subscribers.len());
        for subscriber in subscribers {
            subscriber(notification);
        }
    }

    /// Register `callback` on `topic`. Registering the same callback twice is a no-op.
    pub fn subscribe(&self, topic: Topic, callback: Subscriber) {
        self.events_mut().subscribe(topic, callback);
    }

    pub fn unsubscribe(&self, topic: &Topic, callback: &Subscriber) {
        self.events_mut().unsubscribe(topic, Some(callback));
    }

    /// Remove every subscriber of `topic`.
    pub fn unsubscribe_all(&self, topic: &Topic) {
        self.events_mut().unsubscribe(topic, None);
    }

    /// Register a form-wide check run by [`validate`](Self::validate).
    pub fn subscribe_validate(&self, hook: ValidateHook) {
        let mut hooks = self
            .shared
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !hooks.iter().any(|existing| Arc::ptr_eq(existing, &hook)) {
            hooks.push(hook);
        }
    }

    pub fn unsubscribe_validate(&self, hook: &ValidateHook) {
        self.shared
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|existing| !Arc::ptr_eq(existing, hook));
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    fn request(&self, name: &str, values: &Value, mode: ValidateMode) -> ValidateRequest {
        ValidateRequest {
            name: name.to_string(),
            value: self.get(name),
            values: values.clone(),
            mode,
        }
    }

    fn validators(&self) -> (Vec<(String, Validator)>, Value) {
        let store = self.store();
        let validators = store
            .validators
            .iter()
            .map(|(name, validator)| (name.clone(), Arc::clone(validator)))
            .collect();
        (validators, unflatten(&store.values))
    }

    /// Run every validator and validate hook.
    ///
    /// All checks start together and are awaited as a group. With
    /// `change_state` false, validators run in [`ValidateMode::Silent`].
    ///
    /// Returns `Ok(())` if every check passed. If any check failed to run,
    /// that error is returned. Otherwise the first invalid payload (field
    /// validators in bind order, then hooks in subscription order) is
    /// returned as [`FormError::Invalid`].
    pub async fn validate(&self, change_state: bool) -> Result<(), FormError> {
        let mode = if change_state {
            ValidateMode::Normal
        } else {
            ValidateMode::Silent
        };
        let (validators, values) = self.validators();
        let hooks: Vec<ValidateHook> = self
            .shared
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let fields = validators.into_iter().map(|(name, validator)| {
            let req = self.request(&name, &values, mode);
            run_guarded(Some(name), move || validator(req))
        });
        let hooks = hooks
            .into_iter()
            .map(|hook| run_guarded(None, move || hook()));

        let (fields, hooks) = futures::join!(join_all(fields), join_all(hooks));

        let mut first_invalid = None;
        for result in fields.into_iter().chain(hooks) {
            match result {
                Err(e) => return Err(e),
                Ok(Validity::Invalid(payload)) => {
                    first_invalid.get_or_insert(payload);
                }
                Ok(Validity::Valid) => {}
            }
        }

        match first_invalid {
            Some(payload) => Err(FormError::Invalid { payload }),
            None => Ok(()),
        }
    }

    /// Run the validators of the named fields and collect every result.
    ///
    /// Names without a validator are skipped. A failing validator does not
    /// stop the others; its error is reported in its own entry.
    pub async fn validate_fields<I, S>(&self, names: I) -> Vec<FieldValidation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (validators, values) = self.validators();
        let validators: IndexMap<String, Validator> = validators.into_iter().collect();

        let pending = names.into_iter().filter_map(|name| {
            let name = name.as_ref();
            let validator = Arc::clone(validators.get(name)?);
            let req = self.request(name, &values, ValidateMode::Normal);
            let name = name.to_string();
            Some(async move {
                let result = run_guarded(Some(name.clone()), move || validator(req)).await;
                FieldValidation { name, result }
            })
        });

        join_all(pending).await
    }

    /// Clear every error and re-run all validators in
    /// [`ValidateMode::ForcePass`]. Failures are logged, not returned.
    pub async fn validate_clear(&self) {
        self.store_mut().errors.clear();
        let (validators, values) = self.validators();

        let pending = validators.into_iter().map(|(name, validator)| {
            let req = self.request(&name, &values, ValidateMode::ForcePass);
            run_guarded(Some(name), move || validator(req))
        });

        for result in join_all(pending).await {
            if let Err(e) = result {
                log::warn!("Validator failed while clearing errors: {}", e);
            }
        }
    }
}
