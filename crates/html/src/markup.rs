//! Markup-level mutations: `innerHTML`, `outerHTML`, and the `insertAdjacent*` family.

use crate::dom::Document;
use crate::types::{DomError, NodeId};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdjacentPosition {
    BeforeBegin,
    AfterBegin,
    #[default]
    BeforeEnd,
    AfterEnd,
}

impl FromStr for AdjacentPosition {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beforebegin" => Ok(Self::BeforeBegin),
            "afterbegin" => Ok(Self::AfterBegin),
            "beforeend" => Ok(Self::BeforeEnd),
            "afterend" => Ok(Self::AfterEnd),
            _ => Err(DomError::InvalidPosition(s.to_string())),
        }
    }
}

impl Document {
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), DomError> {
        if !self.kind(id).ok_or(DomError::UnknownNode(id))?.allows_children() {
            return Err(DomError::InvalidParent(id));
        }
        self.remove_children(id)?;
        let fragment = self.parse_fragment(markup);
        self.append_child(id, fragment)
    }

    /// Replaces the node with the parsed markup. The node must have a parent.
    pub fn set_outer_html(&mut self, id: NodeId, markup: &str) -> Result<(), DomError> {
        if self.parent(id).is_none() {
            return Err(DomError::NoParent(id));
        }
        let fragment = self.parse_fragment(markup);
        self.replace_with(id, fragment)
    }

    /// Inserts `node` (or a fragment's children) relative to `id`.
    pub fn insert_adjacent(
        &mut self,
        id: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> Result<(), DomError> {
        match position {
            AdjacentPosition::BeforeBegin => {
                let parent = self.parent(id).ok_or(DomError::NoParent(id))?;
                self.insert_before(parent, node, Some(id))
            }
            AdjacentPosition::AfterBegin => {
                let first = self.children(id).first().copied();
                self.insert_before(id, node, first)
            }
            AdjacentPosition::BeforeEnd => self.append_child(id, node),
            AdjacentPosition::AfterEnd => {
                let parent = self.parent(id).ok_or(DomError::NoParent(id))?;
                let next = self.next_sibling(id);
                self.insert_before(parent, node, next)
            }
        }
    }

    pub fn insert_adjacent_html(
        &mut self,
        id: NodeId,
        position: AdjacentPosition,
        markup: &str,
    ) -> Result<(), DomError> {
        let fragment = self.parse_fragment(markup);
        self.insert_adjacent(id, position, fragment)
    }

    pub fn insert_adjacent_text(
        &mut self,
        id: NodeId,
        position: AdjacentPosition,
        text: &str,
    ) -> Result<(), DomError> {
        let node = self.create_text(text);
        self.insert_adjacent(id, position, node)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(doc: &Document) -> NodeId {
        doc.element_by_id("t").unwrap()
    }

    #[test]
    fn adjacent_positions_place_markup() {
        let mut doc = Document::parse(r#"<main><p id="t">x</p></main>"#);
        let t = target(&doc);
        doc.insert_adjacent_html(t, AdjacentPosition::BeforeBegin, "<i>1</i>").unwrap();
        doc.insert_adjacent_html(t, AdjacentPosition::AfterBegin, "<i>2</i>").unwrap();
        doc.insert_adjacent_html(t, AdjacentPosition::BeforeEnd, "<i>3</i>").unwrap();
        doc.insert_adjacent_text(t, AdjacentPosition::AfterEnd, "4").unwrap();
        assert_eq!(
            doc.inner_html(doc.root()),
            r#"<main><i>1</i><p id="t"><i>2</i>x<i>3</i></p>4</main>"#
        );
    }

    #[test]
    fn position_parsing_is_case_insensitive_and_strict() {
        assert_eq!("afterEnd".parse::<AdjacentPosition>(), Ok(AdjacentPosition::AfterEnd));
        assert_eq!(
            "middle".parse::<AdjacentPosition>(),
            Err(DomError::InvalidPosition("middle".to_string()))
        );
    }

    #[test]
    fn outer_html_replaces_node_identity() {
        let mut doc = Document::parse(r#"<div><p id="t">old</p><p>after</p></div>"#);
        let t = target(&doc);
        doc.set_outer_html(t, r#"<p id="t">new</p>"#).unwrap();
        let replacement = target(&doc);
        assert_ne!(t, replacement);
        assert!(!doc.is_connected(t));
        assert_eq!(doc.element_index(replacement), Some(0));
    }

    #[test]
    fn outer_html_requires_parent() {
        let mut doc = Document::new();
        let orphan = doc.create_element("p");
        assert_eq!(doc.set_outer_html(orphan, "<b></b>"), Err(DomError::NoParent(orphan)));
    }

    #[test]
    fn inner_html_replaces_children() {
        let mut doc = Document::parse(r#"<div id="t"><span>old</span></div>"#);
        let t = target(&doc);
        doc.set_inner_html(t, "<b>hi</b>").unwrap();
        assert_eq!(doc.inner_html(t), "<b>hi</b>");
    }
}
