//! Ordered predicate and callback chains consulted by merge operations.
//!
//! The registry is owned by the engine and read in place on every merge, so
//! a hook added between two batches applies to the next merge.

use html::{Document, NodeId};
use std::fmt;

/// What a predicate knows about the merge it is judging.
#[derive(Clone, Copy, Debug)]
pub struct MergeContext<'a> {
    /// Attribute marking subtrees that merges must leave alone.
    pub permanent_attribute: Option<&'a str>,
    pub children_only: bool,
}

pub type ShouldUpdate = Box<dyn Fn(&MergeContext<'_>, &Document, NodeId, NodeId) -> bool>;
pub type OnUpdated = Box<dyn FnMut(&mut Document, NodeId)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

pub struct HookRegistry {
    should_update: Vec<(HookId, ShouldUpdate)>,
    on_updated: Vec<(HookId, OnUpdated)>,
    next_id: u64,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("should_update", &self.should_update.len())
            .field("on_updated", &self.on_updated.len())
            .finish()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Registry holding the built-in predicates: [`skip_equal_nodes`] then
    /// [`skip_permanent`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.add_should_update(skip_equal_nodes);
        registry.add_should_update(skip_permanent);
        registry
    }

    pub fn empty() -> Self {
        Self {
            should_update: Vec::new(),
            on_updated: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_should_update(
        &mut self,
        predicate: impl Fn(&MergeContext<'_>, &Document, NodeId, NodeId) -> bool + 'static,
    ) -> HookId {
        let id = self.next_id();
        self.should_update.push((id, Box::new(predicate)));
        id
    }

    pub fn add_on_updated(&mut self, callback: impl FnMut(&mut Document, NodeId) + 'static) -> HookId {
        let id = self.next_id();
        self.on_updated.push((id, Box::new(callback)));
        id
    }

    /// Removes a hook from whichever chain holds it.
    pub fn remove(&mut self, id: HookId) -> bool {
        let before = self.should_update.len() + self.on_updated.len();
        self.should_update.retain(|(h, _)| *h != id);
        self.on_updated.retain(|(h, _)| *h != id);
        before != self.should_update.len() + self.on_updated.len()
    }

    pub fn should_update_len(&self) -> usize {
        self.should_update.len()
    }

    pub fn on_updated_len(&self) -> usize {
        self.on_updated.len()
    }

    /// True when every predicate accepts; stops at the first rejection.
    pub fn should_update(&self, context: &MergeContext<'_>, doc: &Document, from: NodeId, to: NodeId) -> bool {
        self.should_update
            .iter()
            .all(|(_, predicate)| predicate(context, doc, from, to))
    }

    pub fn node_updated(&mut self, doc: &mut Document, node: NodeId) {
        for (_, callback) in &mut self.on_updated {
            callback(doc, node);
        }
    }
}

/// Rejects pairs that are already structurally identical.
pub fn skip_equal_nodes(_: &MergeContext<'_>, doc: &Document, from: NodeId, to: NodeId) -> bool {
    !doc.is_equal_node(from, to)
}

/// Rejects nodes inside a subtree carrying the permanence marker.
pub fn skip_permanent(context: &MergeContext<'_>, doc: &Document, from: NodeId, _: NodeId) -> bool {
    match context.permanent_attribute {
        Some(attribute) => doc.closest_with_attribute(from, attribute).is_none(),
        None => true,
    }
}
