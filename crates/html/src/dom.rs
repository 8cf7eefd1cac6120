//! Mutable arena DOM.
//!
//! Invariants:
//! - Detaching a node only clears its `parent` link and removes it from the
//!   parent's children list; the node stays addressable until
//!   [`Document::collect_garbage`] frees everything the root no longer reaches.
//! - A freed slot is reused under the next generation, so stale handles fail
//!   lookups instead of reading the new occupant.
//! - A node has at most one parent and never becomes its own ancestor.
//! - Inserting a fragment moves the fragment's children, leaving it empty.
//! - Element and attribute names are stored ASCII-lowercase.

use crate::builder::build_into;
use crate::tokenizer::tokenize;
use crate::types::{DomError, FormState, NodeId, NodeKind, RawNodeId};

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    record: Option<NodeRecord>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Slot>,
    free: Vec<RawNodeId>,
    root: NodeId,
    pub(crate) focused: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                generation: 0,
                record: Some(NodeRecord {
                    kind: NodeKind::Document { doctype: None },
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            focused: None,
        }
    }

    /// Parses a whole document. No implied `html`/`body` elements are synthesized.
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        build_into(&mut doc, root, &tokenize(markup));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` names a live node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes
            .get(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.record.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.record.as_mut())
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        self.slot(id).ok_or(DomError::UnknownNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.slot_mut(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).map(|r| &r.kind)
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, DomError> {
        Ok(&mut self.record_mut(id)?.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    pub fn is_document(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Document { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text { .. }))
    }

    /// Lowercase tag name for elements, `None` for every other node kind.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        match self.kind(self.root)? {
            NodeKind::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_doctype(&mut self, value: String) {
        let root = self.root;
        if let Some(NodeKind::Document { doctype }) = self.slot_mut(root).map(|r| &mut r.kind) {
            *doctype = Some(value);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|r| r.parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Position of `id` among its parent's element children.
    pub fn element_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent)
            .iter()
            .filter(|c| self.is_element(**c))
            .position(|c| *c == id)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Returns true when `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let record = NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        };
        while let Some(index) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(index as usize) {
                slot.record = Some(record);
                return NodeId::new(index, slot.generation);
            }
        }
        let index = self.nodes.len() as RawNodeId;
        self.nodes.push(Slot {
            generation: 0,
            record: Some(record),
        });
        NodeId::new(index, 0)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_with_attributes(name, Vec::new())
    }

    pub fn create_element_with_attributes(
        &mut self,
        name: &str,
        attributes: Vec<(String, Option<String>)>,
    ) -> NodeId {
        let name = name.to_ascii_lowercase();
        let form = matches!(name.as_str(), "input" | "textarea" | "select")
            .then(FormState::default);
        self.push(NodeKind::Element {
            name,
            attributes,
            form,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    /// Parses markup into a detached fragment owned by this document.
    pub fn parse_fragment(&mut self, markup: &str) -> NodeId {
        let fragment = self.create_fragment();
        build_into(self, fragment, &tokenize(markup));
        fragment
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference` (or at the end).
    ///
    /// A child that already has a parent is moved. Fragments are spliced: their
    /// children are inserted in order and the fragment is left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.record(parent)?.kind.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        self.record(child)?;
        if let Some(before) = reference {
            if self.parent(before) != Some(parent) {
                return Err(DomError::InvalidSibling { parent, before });
            }
            if before == child {
                return Ok(());
            }
        }

        if matches!(self.record(child)?.kind, NodeKind::Fragment) {
            let moved = std::mem::take(&mut self.record_mut(child)?.children);
            for node in &moved {
                self.record_mut(*node)?.parent = None;
            }
            for node in moved {
                self.insert_before(parent, node, reference)?;
            }
            return Ok(());
        }

        if matches!(self.record(child)?.kind, NodeKind::Document { .. })
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(DomError::CycleDetected { parent, child });
        }

        self.unlink(child);
        let position = match reference {
            Some(before) => self
                .children(parent)
                .iter()
                .position(|c| *c == before)
                .ok_or(DomError::InvalidSibling { parent, before })?,
            None => self.children(parent).len(),
        };
        self.record_mut(parent)?.children.insert(position, child);
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(record) = self.slot_mut(parent) {
            record.children.retain(|c| *c != id);
        }
        if let Some(record) = self.slot_mut(id) {
            record.parent = None;
        }
    }

    /// Detaches `id` from its parent. Focus inside the removed subtree is dropped.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.record(id)?;
        if self.parent(id).is_none() {
            return Err(DomError::NoParent(id));
        }
        self.unlink(id);
        if let Some(focused) = self.focused {
            if self.is_inclusive_ancestor(id, focused) {
                self.focused = None;
            }
        }
        Ok(())
    }

    /// Replaces `id` with `replacement` (a node or a fragment) in its parent.
    pub fn replace_with(&mut self, id: NodeId, replacement: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::NoParent(id))?;
        self.insert_before(parent, replacement, Some(id))?;
        self.remove(id)
    }

    pub fn remove_children(&mut self, id: NodeId) -> Result<(), DomError> {
        let children = self.record(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, Option<String>)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Attribute value; valueless attributes read as the empty string.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id)
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    fn attributes_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut Vec<(String, Option<String>)>, DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let attributes = self.attributes_mut(id)?;
        match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = Some(value.to_string()),
            None => attributes.push((name, Some(value.to_string()))),
        }
        Ok(())
    }

    /// Replaces the whole attribute list, preserving the given order.
    pub fn set_attributes(
        &mut self,
        id: NodeId,
        attributes: Vec<(String, Option<String>)>,
    ) -> Result<(), DomError> {
        *self.attributes_mut(id)? = attributes;
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.attributes_mut(id)?
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(())
    }

    /// Character data of text and comment nodes.
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text),
            _ => None,
        }
    }

    pub fn set_node_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => {
                text.clear();
                text.push_str(value);
                Ok(())
            }
            _ => Err(DomError::NotCharacterData(id)),
        }
    }

    /// Concatenated descendant text (comments excluded), like `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.node_text(id) {
            if self.is_text(id) {
                out.push_str(text);
            }
            return out;
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text { text }) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        if self.node_text(id).is_some() {
            return self.set_node_text(id, text);
        }
        self.remove_children(id)?;
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    /// Live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Arena slots ever allocated, live or free.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Frees every node the root no longer reaches and returns how many were
    /// freed. Handles to freed nodes go stale.
    pub fn collect_garbage(&mut self) -> usize {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(flag) = reachable.get_mut(id.index()) {
                *flag = true;
            }
            stack.extend_from_slice(self.children(id));
        }
        let mut freed = 0;
        for (index, (slot, reachable)) in self.nodes.iter_mut().zip(&reachable).enumerate() {
            if *reachable || slot.record.is_none() {
                continue;
            }
            slot.record = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as RawNodeId);
            freed += 1;
        }
        if self.focused.is_some_and(|f| !self.contains(f)) {
            self.focused = None;
        }
        freed
    }
}
