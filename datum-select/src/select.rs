//! Select state backed by a form field.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use datum::{Form, Notification, Value, subscriber};

use crate::filter::filter_labels;

/// Turns an option into its display label.
pub type LabelFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Turns free text into a new option.
pub type CreateFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Focus change callback.
pub type FocusFn = Arc<dyn Fn() + Send + Sync>;

/// Unique identifier for a Select instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectId(usize);

impl SelectId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for SelectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "select_{}", self.0)
    }
}

/// Static configuration of a [`Select`].
#[derive(Clone, Default)]
pub struct SelectOptions {
    /// Form field holding the selection.
    pub name: String,
    /// Allow several options; the field then holds an array.
    pub multiple: bool,
    pub disabled: bool,
    pub clearable: bool,
    pub placeholder: String,
    /// Label used for display and filtering. Defaults to the string form of the option.
    pub label: Option<LabelFn>,
    /// Creates an option from typed text.
    pub on_create: Option<CreateFn>,
    pub on_focus: Option<FocusFn>,
    pub on_blur: Option<FocusFn>,
}

impl SelectOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn clearable(mut self) -> Self {
        self.clearable = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn label<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.label = Some(Arc::new(f));
        self
    }

    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.on_create = Some(Arc::new(f));
        self
    }

    pub fn on_focus<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_focus = Some(Arc::new(f));
        self
    }

    pub fn on_blur<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_blur = Some(Arc::new(f));
        self
    }
}

/// View state that does not belong in the form.
#[derive(Debug, Default)]
struct SelectInner {
    /// Whether the option list is open
    focus: bool,
    /// Current filter text
    filter: String,
    /// Hovered position within the visible options
    hover: Option<usize>,
    /// Last error reported for the field
    error: Option<Value>,
}

/// A dropdown selection whose value lives in a [`Form`] field.
///
/// The select binds its field on creation and unbinds it when dropped. It
/// keeps only view state (focus, filter text, hover); the selection itself
/// is read from and written to the form, so it always mirrors the form.
///
/// # Example
///
/// ```
/// use datum::{Form, Value};
/// use datum_select::{Select, SelectOptions};
///
/// let form = Form::default();
/// let colors = vec![Value::from("red"), Value::from("green")];
/// let select = Select::new(&form, SelectOptions::new("color"), colors);
///
/// select.click_option(1);
/// assert_eq!(form.get("color"), Some(Value::from("green")));
/// ```
pub struct Select {
    id: SelectId,
    form: Form,
    options: SelectOptions,
    items: Vec<Value>,
    inner: Arc<RwLock<SelectInner>>,
    /// Set when the form notifies the field; cleared by the renderer.
    dirty: Arc<AtomicBool>,
}

impl Select {
    /// Create a select over `items` and bind its field on `form`.
    pub fn new(form: &Form, options: SelectOptions, items: Vec<Value>) -> Self {
        let inner = Arc::new(RwLock::new(SelectInner::default()));
        let dirty = Arc::new(AtomicBool::new(false));

        let inner_cb = Arc::clone(&inner);
        let dirty_cb = Arc::clone(&dirty);
        let subscriber = subscriber(move |notification| {
            if let Notification::Error { error } = notification {
                inner_cb
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .error = error.clone();
            }
            dirty_cb.store(true, Ordering::SeqCst);
        });

        let initial = options.multiple.then(|| Value::Array(Vec::new()));
        form.bind(&options.name, subscriber, initial, None);

        Self {
            id: SelectId::new(),
            form: form.clone(),
            options,
            items,
            inner,
            dirty,
        }
    }

    pub fn id(&self) -> SelectId {
        self.id
    }

    /// Name of the bound form field.
    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn placeholder(&self) -> &str {
        &self.options.placeholder
    }

    pub fn is_disabled(&self) -> bool {
        self.options.disabled
    }

    fn inner(&self) -> RwLockReadGuard<'_, SelectInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn inner_mut(&self) -> RwLockWriteGuard<'_, SelectInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------------

    /// Check if the select needs to be redrawn.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Label of an option.
    pub fn label(&self, item: &Value) -> String {
        match &self.options.label {
            Some(label) => label(item),
            None => match item {
                Value::String(s) => s.clone(),
                other => serde_label(other),
            },
        }
    }

    /// Current field value.
    pub fn value(&self) -> Option<Value> {
        self.form.get(&self.options.name)
    }

    /// Selected options, in selection order.
    pub fn selected(&self) -> Vec<Value> {
        match self.value() {
            Some(Value::Array(items)) if self.options.multiple => items,
            Some(value) if !self.options.multiple => vec![value],
            _ => Vec::new(),
        }
    }

    /// Labels of the selected options.
    pub fn result(&self) -> Vec<String> {
        self.selected().iter().map(|item| self.label(item)).collect()
    }

    /// Error currently reported for the field.
    pub fn error(&self) -> Option<Value> {
        self.inner().error.clone()
    }

    /// Is `item` selected?
    pub fn check(&self, item: &Value) -> bool {
        self.selected().iter().any(|selected| selected == item)
    }

    fn write(&self, value: Value) {
        self.form.force_set(&self.options.name, value, false);
    }

    /// Toggle `item` (multiple) or select it and close (single).
    pub fn handle_change(&self, item: Value) {
        if self.options.disabled {
            return;
        }

        if self.options.multiple {
            let mut selected = self.selected();
            if let Some(pos) = selected.iter().position(|s| s == &item) {
                selected.remove(pos);
            } else {
                selected.push(item);
            }
            self.write(Value::Array(selected));
            self.inner_mut().filter.clear();
        } else {
            self.write(item);
            self.close();
        }
    }

    /// Click the option at `index` in [`items`](Self::items).
    ///
    /// Clicking the active option of a single select does nothing.
    pub fn click_option(&self, index: usize) {
        let Some(item) = self.items.get(index).cloned() else {
            return;
        };
        if !self.options.multiple && self.check(&item) {
            return;
        }
        self.handle_change(item);
    }

    /// Deselect `item`.
    pub fn remove(&self, item: &Value) {
        if self.options.disabled || !self.check(item) {
            return;
        }
        if self.options.multiple {
            let remaining: Vec<Value> = self
                .selected()
                .into_iter()
                .filter(|selected| selected != item)
                .collect();
            self.write(Value::Array(remaining));
        } else {
            self.write(Value::Undefined);
        }
    }

    /// Clear the selection and close the list.
    pub fn clear(&self) {
        if self.options.disabled || !self.options.clearable {
            return;
        }
        let empty = if self.options.multiple {
            Value::Array(Vec::new())
        } else {
            Value::Undefined
        };
        self.write(empty);
        self.close();
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Create an option from `text` and select it.
    pub fn create(&self, text: &str) {
        let Some(on_create) = &self.options.on_create else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let item = on_create(text);
        log::debug!("{} created option from '{}'", self.id, text);
        self.handle_change(item);
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.inner().focus
    }

    pub fn open(&self) {
        self.set_focus(true);
    }

    pub fn close(&self) {
        self.set_focus(false);
    }

    fn set_focus(&self, focus: bool) {
        if self.options.disabled {
            return;
        }
        {
            let mut inner = self.inner_mut();
            if inner.focus == focus {
                return;
            }
            inner.focus = focus;
            if !focus {
                inner.hover = None;
                inner.filter.clear();
            }
        }
        self.dirty.store(true, Ordering::SeqCst);

        let hook = if focus {
            &self.options.on_focus
        } else {
            &self.options.on_blur
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    // -------------------------------------------------------------------------
    // Filtering and hover
    // -------------------------------------------------------------------------

    pub fn filter(&self) -> String {
        self.inner().filter.clone()
    }

    /// Set the filter text. The hover resets to the first visible option.
    pub fn set_filter(&self, text: impl Into<String>) {
        let mut inner = self.inner_mut();
        inner.filter = text.into();
        inner.hover = None;
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Indices into [`items`](Self::items) matching the filter, best first.
    pub fn visible_items(&self) -> Vec<usize> {
        let labels: Vec<String> = self.items.iter().map(|item| self.label(item)).collect();
        filter_labels(&self.filter(), &labels)
    }

    /// Hovered position within [`visible_items`](Self::visible_items).
    pub fn hover_index(&self) -> Option<usize> {
        self.inner().hover
    }

    /// Move the hover by `delta`, wrapping around the visible options.
    pub fn hover_move(&self, delta: isize) {
        let count = self.visible_items().len();
        if count == 0 {
            return;
        }
        let mut inner = self.inner_mut();
        let next = match inner.hover {
            None if delta < 0 => count - 1,
            None => 0,
            Some(current) => (current as isize + delta).rem_euclid(count as isize) as usize,
        };
        inner.hover = Some(next);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Toggle the hovered option.
    pub fn select_hovered(&self) {
        let Some(hover) = self.hover_index() else {
            return;
        };
        if let Some(&index) = self.visible_items().get(hover) {
            let item = self.items[index].clone();
            self.handle_change(item);
        }
    }
}

impl Drop for Select {
    fn drop(&mut self) {
        self.form.unbind(&self.options.name);
    }
}

fn serde_label(value: &Value) -> String {
    match value {
        Value::Undefined => String::new(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}
