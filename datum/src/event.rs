//! Notification topics and the subscriber registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// A notification channel.
///
/// Field topics are keyed by the bound field name; `Reset` and `Change` are
/// form-wide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A bound field's value was written.
    FieldUpdate(String),
    /// A bound field's error was written.
    FieldError(String),
    /// A bound field changed (fired alongside `FieldUpdate`).
    FieldChange(String),
    /// The form is about to reset to its defaults.
    Reset,
    /// Any value in the form changed.
    Change,
}

impl Topic {
    pub fn update(name: impl Into<String>) -> Self {
        Self::FieldUpdate(name.into())
    }

    pub fn error(name: impl Into<String>) -> Self {
        Self::FieldError(name.into())
    }

    pub fn change(name: impl Into<String>) -> Self {
        Self::FieldChange(name.into())
    }
}

/// Where a value update came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSource {
    /// An ordinary write to the named field.
    Field(String),
    /// A programmatic write (reset) that validators should let through.
    ForcePass,
}

impl UpdateSource {
    pub fn is_force_pass(&self) -> bool {
        matches!(self, Self::ForcePass)
    }
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The field value now reads as `value`.
    Update {
        value: Option<Value>,
        source: UpdateSource,
    },
    /// The field error now reads as `error`.
    Error { error: Option<Value> },
    /// Something changed; re-read what you need.
    Change,
    /// The form is resetting.
    Reset,
}

/// Callback registered on a topic.
pub type Subscriber = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Wraps a closure as a [`Subscriber`].
pub fn subscriber<F>(f: F) -> Subscriber
where
    F: Fn(&Notification) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered subscriber lists per topic.
#[derive(Default)]
pub(crate) struct EventRegistry {
    topics: HashMap<Topic, Vec<Subscriber>>,
}

impl EventRegistry {
    /// Appends `callback` unless the same callback is already registered.
    pub(crate) fn subscribe(&mut self, topic: Topic, callback: Subscriber) {
        let list = self.topics.entry(topic).or_default();
        if list.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            return;
        }
        list.push(callback);
    }

    /// Removes one callback, or every callback when `callback` is `None`.
    pub(crate) fn unsubscribe(&mut self, topic: &Topic, callback: Option<&Subscriber>) {
        match callback {
            Some(callback) => {
                if let Some(list) = self.topics.get_mut(topic) {
                    list.retain(|existing| !Arc::ptr_eq(existing, callback));
                    if list.is_empty() {
                        self.topics.remove(topic);
                    }
                }
            }
            None => {
                self.topics.remove(topic);
            }
        }
    }

    /// Clones the current subscribers of `topic`.
    pub(crate) fn snapshot(&self, topic: &Topic) -> Vec<Subscriber> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }
}
