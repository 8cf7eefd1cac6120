//! Default merge: children are matched by `id` when the target child has
//! one, otherwise positionally by node type and tag.
//!
//! Complexity: O(n * k) where k is the width of the widest child list.

use crate::{MergeCallbacks, MergeEngine, MergeError, MergeOptions, MergeOutcome};
use html::{Document, NodeId, NodeKind};

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyedMorph;

impl MergeEngine for KeyedMorph {
    fn merge(
        &self,
        doc: &mut Document,
        from: NodeId,
        to: NodeId,
        options: MergeOptions,
        callbacks: &mut dyn MergeCallbacks,
    ) -> Result<MergeOutcome, MergeError> {
        let mut pass = Pass {
            callbacks,
            patched: 0,
            inserted: 0,
            removed: 0,
        };
        let root = if options.children_only {
            pass.run(doc, Step::Children(from, to))?;
            from
        } else if same_type(doc, from, to) {
            pass.run(doc, Step::Enter(from, to))?;
            from
        } else {
            let parent = doc.parent(from).ok_or(MergeError::DetachedRoot(from))?;
            let index = doc
                .children(parent)
                .iter()
                .position(|c| *c == from)
                .unwrap_or_default();
            doc.replace_with(from, to)?;
            pass.inserted += 1;
            pass.removed += 1;
            doc.children(parent).get(index).copied().unwrap_or(parent)
        };
        log::trace!(
            target: "morph",
            "merged {from:?} -> {root:?}: patched={} inserted={} removed={}",
            pass.patched,
            pass.inserted,
            pass.removed
        );
        Ok(MergeOutcome {
            root,
            patched: pass.patched,
            inserted: pass.inserted,
            removed: pass.removed,
        })
    }
}

/// Work item of the merge. Depth lives on the heap, not the call stack.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// Patch `from` toward `to`; both have the same node type and tag.
    Enter(NodeId, NodeId),
    /// Reconcile the child list of `from` against that of `to`.
    Children(NodeId, NodeId),
    /// Every descendant of the node is done.
    Finish(NodeId),
}

struct Pass<'c> {
    callbacks: &'c mut dyn MergeCallbacks,
    patched: usize,
    inserted: usize,
    removed: usize,
}

impl Pass<'_> {
    fn run(&mut self, doc: &mut Document, first: Step) -> Result<(), MergeError> {
        let mut stack = vec![first];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(from, to) => self.enter(doc, from, to, &mut stack)?,
                Step::Children(from, to) => self.place_children(doc, from, to, &mut stack)?,
                Step::Finish(node) => {
                    self.patched += 1;
                    self.callbacks.on_updated(doc, node);
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, doc: &mut Document, from: NodeId, to: NodeId, stack: &mut Vec<Step>) -> Result<(), MergeError> {
        if !doc.is_element(from) {
            let want = doc.node_text(to).unwrap_or_default().to_string();
            if doc.node_text(from) != Some(want.as_str()) {
                doc.set_node_text(from, &want)?;
            }
            return Ok(());
        }
        if !self.callbacks.should_update(doc, from, to) {
            return Ok(());
        }
        sync_attributes(doc, from, to)?;
        sync_form_state(doc, from, to)?;
        stack.push(Step::Finish(from));
        self.place_children(doc, from, to, stack)
    }

    // Puts the children of `from` in target order, then queues each matched
    // pair so that the first child is merged first and finishes before its
    // parent does.
    fn place_children(
        &mut self,
        doc: &mut Document,
        from: NodeId,
        to: NodeId,
        stack: &mut Vec<Step>,
    ) -> Result<(), MergeError> {
        let wanted = doc.children(to).to_vec();
        let count = wanted.len();
        let mut pairs = Vec::new();
        for (index, to_child) in wanted.into_iter().enumerate() {
            let current = doc.children(from).get(index).copied();
            match find_match(doc, from, index, to_child) {
                Some(node) => {
                    if Some(node) != current {
                        doc.insert_before(from, node, current)?;
                    }
                    pairs.push(Step::Enter(node, to_child));
                }
                None => {
                    doc.insert_before(from, to_child, current)?;
                    self.inserted += 1;
                }
            }
        }
        // Positions [0, count) now mirror the target; anything after is stale.
        let leftovers = doc.children(from).get(count..).unwrap_or_default().to_vec();
        for node in leftovers {
            doc.remove(node)?;
            self.removed += 1;
        }
        stack.extend(pairs.into_iter().rev());
        Ok(())
    }
}

fn find_match(doc: &Document, parent: NodeId, index: usize, to_child: NodeId) -> Option<NodeId> {
    let candidates = doc.children(parent).get(index..)?;
    match key(doc, to_child) {
        Some(k) => candidates
            .iter()
            .copied()
            .find(|c| key(doc, *c) == Some(k) && same_type(doc, *c, to_child)),
        None => candidates
            .first()
            .copied()
            .filter(|c| key(doc, *c).is_none() && same_type(doc, *c, to_child)),
    }
}

fn key(doc: &Document, node: NodeId) -> Option<&str> {
    doc.attribute(node, "id").filter(|k| !k.is_empty())
}

fn same_type(doc: &Document, a: NodeId, b: NodeId) -> bool {
    match (doc.kind(a), doc.kind(b)) {
        (Some(NodeKind::Element { name: an, .. }), Some(NodeKind::Element { name: bn, .. })) => an == bn,
        (Some(NodeKind::Text { .. }), Some(NodeKind::Text { .. }))
        | (Some(NodeKind::Comment { .. }), Some(NodeKind::Comment { .. })) => true,
        _ => false,
    }
}

fn sync_attributes(doc: &mut Document, from: NodeId, to: NodeId) -> Result<(), MergeError> {
    let wanted = doc.attributes(to).to_vec();
    for (name, value) in &wanted {
        let value = value.as_deref().unwrap_or("");
        if doc.attribute(from, name) != Some(value) {
            doc.set_attribute(from, name, value)?;
        }
    }
    let stale: Vec<String> = doc
        .attributes(from)
        .iter()
        .filter(|(k, _)| !wanted.iter().any(|(w, _)| w == k))
        .map(|(k, _)| k.clone())
        .collect();
    for name in stale {
        doc.remove_attribute(from, &name)?;
    }
    Ok(())
}

// Live control state follows the target markup, like a fresh parse would.
fn sync_form_state(doc: &mut Document, from: NodeId, to: NodeId) -> Result<(), MergeError> {
    if !matches!(doc.tag_name(from), Some("input" | "textarea")) || !doc.is_form_control(from) {
        return Ok(());
    }
    if let Some(want) = doc.value(to) {
        if doc.value(from).as_deref() != Some(want.as_str()) {
            doc.set_value(from, &want)?;
        }
    }
    if let Some(checked) = doc.checked(to) {
        if doc.checked(from) != Some(checked) {
            doc.set_checked(from, checked)?;
        }
    }
    Ok(())
}
