//! Lifecycle events. Listeners hang off a node and see every event dispatched
//! on that node or on a descendant (bubbling, target first, then ancestors up
//! to the document). Cancellation is a flag on the payload that the executor
//! reads once, right after the before-event returns.

use crate::batch::Descriptor;
use html::{Document, NodeId};
use serde_json::Value;
use std::fmt;

pub enum EventPayload<'a> {
    /// Lifecycle event: the descriptor being processed, mutable by listeners.
    Operation(&'a mut Descriptor),
    /// Event fired by a `dispatchEvent` operation.
    Custom {
        detail: &'a Value,
        default_prevented: bool,
    },
}

pub struct Event<'a> {
    name: &'a str,
    target: NodeId,
    current_target: NodeId,
    document: &'a Document,
    payload: EventPayload<'a>,
    propagation_stopped: bool,
}

impl<'a> Event<'a> {
    pub fn operation(
        name: &'a str,
        target: NodeId,
        document: &'a Document,
        descriptor: &'a mut Descriptor,
    ) -> Self {
        Self::new(name, target, document, EventPayload::Operation(descriptor))
    }

    pub fn custom(name: &'a str, target: NodeId, document: &'a Document, detail: &'a Value) -> Self {
        Self::new(
            name,
            target,
            document,
            EventPayload::Custom {
                detail,
                default_prevented: false,
            },
        )
    }

    fn new(name: &'a str, target: NodeId, document: &'a Document, payload: EventPayload<'a>) -> Self {
        Self {
            name,
            target,
            current_target: target,
            document,
            payload,
            propagation_stopped: false,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn document(&self) -> &Document {
        self.document
    }

    pub fn descriptor(&self) -> Option<&Descriptor> {
        match &self.payload {
            EventPayload::Operation(d) => Some(d),
            EventPayload::Custom { .. } => None,
        }
    }

    pub fn descriptor_mut(&mut self) -> Option<&mut Descriptor> {
        match &mut self.payload {
            EventPayload::Operation(d) => Some(d),
            EventPayload::Custom { .. } => None,
        }
    }

    pub fn detail(&self) -> Option<&Value> {
        match &self.payload {
            EventPayload::Operation(_) => None,
            EventPayload::Custom { detail, .. } => Some(detail),
        }
    }

    pub fn cancel(&mut self) {
        match &mut self.payload {
            EventPayload::Operation(d) => d.set_cancel(true),
            EventPayload::Custom {
                default_prevented, ..
            } => *default_prevented = true,
        }
    }

    pub fn is_canceled(&self) -> bool {
        match &self.payload {
            EventPayload::Operation(d) => d.is_canceled(),
            EventPayload::Custom {
                default_prevented, ..
            } => *default_prevented,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&mut Event<'_>)>;

struct Registration {
    id: ListenerId,
    node: NodeId,
    /// `None` listens to every event.
    name: Option<String>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.registrations.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        node: NodeId,
        name: &str,
        listener: impl FnMut(&mut Event<'_>) + 'static,
    ) -> ListenerId {
        self.register(node, Some(name.to_string()), Box::new(listener))
    }

    /// Listens to every event reaching `node`.
    pub fn add_wildcard_listener(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&mut Event<'_>) + 'static,
    ) -> ListenerId {
        self.register(node, None, Box::new(listener))
    }

    fn register(&mut self, node: NodeId, name: Option<String>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            node,
            name,
            listener,
        });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Drops listeners whose node fails `keep`. Returns how many were dropped.
    pub fn retain_nodes(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| keep(r.node));
        before - self.registrations.len()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Runs listeners from the target up through its ancestors.
    pub fn dispatch(&mut self, event: &mut Event<'_>) {
        let path: Vec<NodeId> = std::iter::once(event.target)
            .chain(event.document.ancestors(event.target))
            .collect();
        let name = event.name;
        log::trace!(target: "ops.events", "dispatch {name} on {:?}", event.target);
        for node in path {
            event.current_target = node;
            for registration in self
                .registrations
                .iter_mut()
                .filter(|r| r.node == node && r.name.as_deref().is_none_or(|n| n == name))
            {
                (registration.listener)(event);
            }
            if event.propagation_stopped {
                break;
            }
        }
    }
}
