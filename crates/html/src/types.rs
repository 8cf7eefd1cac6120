use std::fmt;
use thiserror::Error;

pub type RawNodeId = u32;

/// Arena handle for a node inside a [`Document`](crate::Document).
///
/// A detached node keeps its handle until the document collects garbage.
/// Slots are then reused under a new generation, so a stale handle never
/// aliases the node that takes its place.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: RawNodeId,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: RawNodeId, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "NodeId({})", self.index),
            g => write!(f, "NodeId({}@{g})", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

/// Live state carried by form controls (`input`, `textarea`, `select`).
///
/// `value` is `None` until script assigns one; reads fall back to the
/// markup default in that case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub value: Option<String>,
    pub caret: Option<usize>,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document {
        doctype: Option<String>,
    },
    Fragment,
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        form: Option<FormState>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeKind {
    pub fn allows_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document { .. } | NodeKind::Fragment | NodeKind::Element { .. }
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} is not a text or comment node")]
    NotCharacterData(NodeId),
    #[error("node {0:?} has no parent")]
    NoParent(NodeId),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("{before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeId, before: NodeId },
    #[error("invalid insertion position `{0}`")]
    InvalidPosition(String),
}
