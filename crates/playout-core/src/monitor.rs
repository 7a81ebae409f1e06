//! Monitor event publication
//!
//! Fire-and-forget state-change events, fanned out to subscribers over
//! bounded channels. Subjects form a parent chain: a layer's subject
//! attaches to its stage's subject, and every event posted on the child is
//! re-delivered upward with the parent's path prefix applied. Slow
//! subscribers lose events rather than block the publisher.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Events buffered per subscriber before the publisher starts dropping
pub const DEFAULT_MONITOR_CAPACITY: usize = 256;

/// Primitive payload carried by a monitor event
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for EventValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for EventValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for EventValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A single published state change
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorEvent {
    /// Slash-separated path, e.g. `/layer/0/event/play`
    pub path: String,
    pub values: Vec<EventValue>,
}

struct SubjectInner {
    /// Path prefix applied to events passing through this subject
    path: String,
    capacity: usize,
    parent: Mutex<Option<MonitorSubject>>,
    subscribers: Mutex<Vec<Sender<MonitorEvent>>>,
}

/// An event sink handle. Cheap to clone; all clones share the same
/// subscriber list and parent pointer.
#[derive(Clone)]
pub struct MonitorSubject {
    inner: Arc<SubjectInner>,
}

impl MonitorSubject {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_capacity(path, DEFAULT_MONITOR_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                path: path.into(),
                capacity,
                parent: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Subscribe to every event passing through this subject. Events
    /// published while the subscriber's buffer is full are dropped.
    pub fn subscribe(&self) -> Receiver<MonitorEvent> {
        let (tx, rx) = bounded(self.inner.capacity);
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Route this subject's events through `parent`, replacing any
    /// previous parent.
    pub fn attach_parent(&self, parent: &MonitorSubject) {
        *self.inner.parent.lock() = Some(parent.clone());
    }

    pub fn detach_parent(&self) {
        *self.inner.parent.lock() = None;
    }

    /// Publish an event at `path` relative to this subject
    pub fn post(&self, path: &str, values: Vec<EventValue>) {
        self.deliver(MonitorEvent {
            path: format!("{}{}", self.inner.path, path),
            values,
        });
    }

    fn deliver(&self, event: MonitorEvent) {
        self.inner.subscribers.lock().retain(|tx| {
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                // Subscriber lagging; the event is lost for them.
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            }
        });

        let parent = self.inner.parent.lock().clone();
        if let Some(parent) = parent {
            let prefixed = MonitorEvent {
                path: format!("{}{}", parent.inner.path, event.path),
                values: event.values,
            };
            parent.deliver(prefixed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_reaches_subscriber() {
        let subject = MonitorSubject::new("");
        let rx = subject.subscribe();
        subject.post("/event/clear", vec![true.into()]);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, "/event/clear");
        assert_eq!(event.values, vec![EventValue::Bool(true)]);
    }

    #[test]
    fn test_child_events_propagate_with_prefix() {
        let stage = MonitorSubject::new("");
        let layer = MonitorSubject::new("/layer/3");
        layer.attach_parent(&stage);

        let rx = stage.subscribe();
        layer.post("/event/error", vec!["boom".into()]);
        assert_eq!(rx.try_recv().unwrap().path, "/layer/3/event/error");

        layer.detach_parent();
        layer.post("/event/error", vec!["lost".into()]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_subscriber_drops_events() {
        let subject = MonitorSubject::with_capacity("", 1);
        let rx = subject.subscribe();
        subject.post("/a", vec![]);
        subject.post("/b", vec![]);

        assert_eq!(rx.try_recv().unwrap().path, "/a");
        assert!(rx.try_recv().is_err());

        // Still subscribed for later events.
        subject.post("/c", vec![]);
        assert_eq!(rx.try_recv().unwrap().path, "/c");
    }

    #[test]
    fn test_disconnected_subscribers_are_pruned() {
        let subject = MonitorSubject::new("");
        drop(subject.subscribe());
        subject.post("/a", vec![]);
        assert!(subject.inner.subscribers.lock().is_empty());
    }
}
