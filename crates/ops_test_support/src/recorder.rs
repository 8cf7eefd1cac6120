use html::NodeId;
use ops::{Descriptor, EventBus, ListenerId, describe_node};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedEvent {
    pub name: String,
    pub target: NodeId,
    /// `#id`, tag name or `document`, resolved at dispatch time.
    pub label: String,
    pub canceled: bool,
    pub descriptor: Option<Descriptor>,
    pub detail: Option<Value>,
}

impl RecordedEvent {
    /// `before-setAttribute #x`
    pub fn line(&self) -> String {
        format!("{} {}", self.name, self.label)
    }
}

/// Captures every event that reaches the node it is attached to.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, bus: &mut EventBus, node: NodeId) -> ListenerId {
        let events = Rc::clone(&self.events);
        bus.add_wildcard_listener(node, move |event| {
            events.borrow_mut().push(RecordedEvent {
                name: event.name().to_string(),
                target: event.target(),
                label: describe_node(event.document(), event.target()),
                canceled: event.is_canceled(),
                descriptor: event.descriptor().cloned(),
                detail: event.detail().cloned(),
            });
        })
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.borrow().iter().map(RecordedEvent::line).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|e| e.name.clone()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.name == name).count()
    }

    /// Whether every kind seen has as many `before-` as `after-` events.
    pub fn is_paired(&self) -> bool {
        self.names()
            .iter()
            .filter_map(|n| n.strip_prefix("before-").or_else(|| n.strip_prefix("after-")))
            .all(|kind| self.count(&format!("before-{kind}")) == self.count(&format!("after-{kind}")))
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
