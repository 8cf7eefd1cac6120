//! Bookkeeping around mutations that can move focus or swap node identity,
//! and the bridge from the hook registry to the merge engine.

use crate::batch::Descriptor;
use crate::catalog::Ctx;
use crate::error::OperationError;
use crate::hooks::{HookRegistry, MergeContext};
use html::{Document, DomError, NodeId};
use morph::{MergeCallbacks, MergeOptions};
use serde_json::Value;

/// Focus as it was before a mutation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FocusSnapshot {
    active: Option<NodeId>,
}

impl FocusSnapshot {
    pub(crate) fn capture(doc: &Document) -> Self {
        Self {
            active: doc.active_element(),
        }
    }

    /// Focuses the `focus_selector` match when a selector is given, else the
    /// previously focused node if it survived. A selector that matches
    /// nothing leaves focus as it is. A refocused text input gets its value
    /// written back so the caret lands at the end.
    pub(crate) fn restore(self, doc: &mut Document, focus_selector: Option<&str>) -> Result<(), DomError> {
        let target = match focus_selector.filter(|s| !s.is_empty()) {
            Some(s) => match css::query_selector(doc, doc.root(), s) {
                Ok(found) => found,
                Err(err) => {
                    log::debug!(target: "ops.reconcile", "focusSelector {s:?} unusable: {err}");
                    None
                }
            },
            None => self.active.filter(|a| doc.is_connected(*a)),
        };
        let Some(node) = target else {
            return Ok(());
        };
        if !doc.focus(node) {
            return Ok(());
        }
        if doc.is_text_input(node) {
            if let Some(value) = doc.value(node) {
                doc.set_value(node, "")?;
                doc.set_value(node, &value)?;
            }
        }
        Ok(())
    }
}

/// A node's position as an index into its parent's element children.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ordinal {
    parent: Option<NodeId>,
    index: Option<usize>,
}

impl Ordinal {
    pub(crate) fn capture(doc: &Document, node: NodeId) -> Self {
        Self {
            parent: doc.parent(node),
            index: doc.element_index(node),
        }
    }

    /// Whatever element now sits at the captured position, falling back to
    /// the parent, then to `fallback` for a node that had no parent.
    pub(crate) fn resolve(&self, doc: &Document, fallback: NodeId) -> NodeId {
        let Some(parent) = self.parent else {
            return fallback;
        };
        self.index
            .and_then(|i| doc.element_children(parent).get(i).copied())
            .unwrap_or(parent)
    }
}

struct RegistryCallbacks<'h, 'c> {
    hooks: &'h mut HookRegistry,
    context: MergeContext<'c>,
}

impl MergeCallbacks for RegistryCallbacks<'_, '_> {
    fn should_update(&mut self, doc: &Document, from: NodeId, to: NodeId) -> bool {
        self.hooks.should_update(&self.context, doc, from, to)
    }

    fn on_updated(&mut self, doc: &mut Document, node: NodeId) {
        self.hooks.node_updated(doc, node);
    }
}

/// Merges the descriptor's parsed fragment into `target`. The fragment's
/// first element is the merge target; with `childrenOnly` only its children
/// are merged into `target`'s.
pub(crate) fn merge_fragment(
    ctx: &mut Ctx<'_>,
    descriptor: &Descriptor,
    target: NodeId,
) -> Result<(), OperationError> {
    let no_element = || OperationError::InvalidField {
        kind: "morph",
        field: "html",
        reason: "contains no element".to_string(),
    };
    let fragment = descriptor.content.ok_or_else(no_element)?;
    let incoming = ctx
        .doc
        .element_children(fragment)
        .first()
        .copied()
        .ok_or_else(no_element)?;

    // A descriptor-level marker wins; an explicit empty one disables the check.
    let own_marker = descriptor.text("permanentAttributeName");
    let permanent_attribute = match own_marker.as_deref() {
        Some(marker) => Some(marker).filter(|m| !m.is_empty()),
        None => ctx.config.permanent_attribute(),
    };
    let children_only = descriptor
        .field("childrenOnly")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut callbacks = RegistryCallbacks {
        hooks: &mut *ctx.hooks,
        context: MergeContext {
            permanent_attribute,
            children_only,
        },
    };
    let outcome = ctx.merge.merge(
        &mut *ctx.doc,
        target,
        incoming,
        MergeOptions { children_only },
        &mut callbacks,
    )?;
    log::debug!(
        target: "ops.reconcile",
        "morph {target:?} -> {:?}: patched={} inserted={} removed={}",
        outcome.root,
        outcome.patched,
        outcome.inserted,
        outcome.removed
    );
    Ok(())
}
