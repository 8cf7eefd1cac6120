//! Mutable HTML document model.
//!
//! A [`Document`] is an arena of nodes addressed by [`NodeId`]. Markup is
//! tokenized and built into the arena, either as the whole document or as a
//! detached fragment that can later be spliced into the tree.

mod attrs;
mod builder;
mod compare;
mod dom;
mod entities;
mod form;
mod markup;
mod properties;
mod serialize;
mod tokenizer;
pub mod traverse;
mod types;

pub use crate::attrs::dataset_attribute_name;
pub use crate::dom::Document;
pub use crate::entities::{escape_attribute, escape_text};
pub use crate::markup::AdjacentPosition;
pub use crate::properties::PropValue;
pub use crate::tokenizer::tokenize;
pub use crate::types::{DomError, FormState, NodeId, NodeKind, RawNodeId, Token};
