//! Merge ("morph") of a live subtree toward a target subtree.
//!
//! Contract:
//! - The engine patches `from` in place so that it reads like `to`, reusing
//!   existing nodes where they are compatible and moving/creating/removing
//!   the rest.
//! - Before an element pair is patched, [`MergeCallbacks::should_update`] is
//!   consulted; a `false` leaves that element and its whole subtree as is.
//! - After an element was patched in place, [`MergeCallbacks::on_updated`]
//!   runs for it.
//! - Nodes taken from `to` are moved, not copied; the target tree is consumed.
//! - The node now occupying `from`'s position is returned, since a root with
//!   an incompatible tag is replaced outright.
//!
//! The algorithm is swappable: callers depend on [`MergeEngine`] only.

mod keyed;

pub use keyed::KeyedMorph;

use html::{Document, DomError, NodeId};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Merge only the children of `from`, leaving `from` itself untouched.
    pub children_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Node at `from`'s original position after the merge.
    pub root: NodeId,
    pub patched: usize,
    pub inserted: usize,
    pub removed: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("node {0:?} cannot be replaced: it has no parent")]
    DetachedRoot(NodeId),
}

pub trait MergeCallbacks {
    /// Whether `from` may be patched toward `to`.
    fn should_update(&mut self, doc: &Document, from: NodeId, to: NodeId) -> bool;

    /// Runs after `node` was patched in place.
    fn on_updated(&mut self, doc: &mut Document, node: NodeId);
}

/// Callbacks that allow every update and observe nothing.
pub struct AllowAll;

impl MergeCallbacks for AllowAll {
    fn should_update(&mut self, _doc: &Document, _from: NodeId, _to: NodeId) -> bool {
        true
    }

    fn on_updated(&mut self, _doc: &mut Document, _node: NodeId) {}
}

pub trait MergeEngine {
    fn merge(
        &self,
        doc: &mut Document,
        from: NodeId,
        to: NodeId,
        options: MergeOptions,
        callbacks: &mut dyn MergeCallbacks,
    ) -> Result<MergeOutcome, MergeError>;
}
