use crate::dom::Document;
use crate::types::NodeId;

/// Pre-order (document order) walk over the descendants of a node, excluding the node itself.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        // Reverse push so children are yielded in original order.
        self.stack
            .extend(self.doc.children(node).iter().rev().copied());
        Some(node)
    }
}

/// Walk from a node's parent up to the root of its tree.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.next?;
        self.next = self.doc.parent(node);
        Some(node)
    }
}

impl Document {
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Nearest inclusive ancestor element satisfying `pred`.
    pub fn closest(&self, id: NodeId, mut pred: impl FnMut(&Document, NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|n| self.is_element(*n))
            .find(|n| pred(self, *n))
    }

    /// Nearest inclusive ancestor element carrying `attribute`.
    pub fn closest_with_attribute(&self, id: NodeId, attribute: &str) -> Option<NodeId> {
        self.closest(id, |doc, n| doc.has_attribute(n, attribute))
    }

    /// First descendant element (document order) satisfying `pred`.
    pub fn find_element(&self, scope: NodeId, mut pred: impl FnMut(&Document, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(scope)
            .find(|n| self.is_element(*n) && pred(self, *n))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_element(self.root(), |doc, n| doc.attribute(n, "id") == Some(id))
    }
}
