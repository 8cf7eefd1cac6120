use crate::batch::Descriptor;
use css::SelectorError;
use html::{Document, NodeId};
use thiserror::Error;
use xpath::XPathError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    XPath(#[from] XPathError),
}

/// Targets for a descriptor, or the reason its selector could not be used.
///
/// - no selector: the document root
/// - `xpath`: the first node of the expression's result in document order
/// - `selectAll`: every CSS match in document order
/// - otherwise: the first CSS match
pub fn try_resolve(doc: &Document, descriptor: &Descriptor) -> Result<Vec<NodeId>, ResolveError> {
    let Some(selector) = descriptor.selector() else {
        return Ok(vec![doc.root()]);
    };
    if descriptor.is_xpath() {
        return Ok(xpath::first_node(doc, doc.root(), selector)?.into_iter().collect());
    }
    if descriptor.is_select_all() {
        return Ok(css::query_selector_all(doc, doc.root(), selector)?);
    }
    Ok(css::query_selector(doc, doc.root(), selector)?.into_iter().collect())
}

/// Like [`try_resolve`], folding malformed selectors into "nothing matched".
pub fn resolve(doc: &Document, descriptor: &Descriptor) -> Vec<NodeId> {
    try_resolve(doc, descriptor).unwrap_or_else(|err| {
        log::debug!(
            target: "ops.resolve",
            "selector {:?} unusable: {err}",
            descriptor.selector()
        );
        Vec::new()
    })
}

/// Short label for logs and traces: `#id`, the tag name, or `document`.
pub fn describe_node(doc: &Document, node: NodeId) -> String {
    if doc.is_document(node) {
        return "document".to_string();
    }
    match (doc.tag_name(node), doc.attribute(node, "id")) {
        (Some(_), Some(id)) if !id.is_empty() => format!("#{id}"),
        (Some(tag), _) => tag.to_string(),
        (None, _) if doc.is_text(node) => "#text".to_string(),
        (None, _) => format!("{node:?}"),
    }
}
