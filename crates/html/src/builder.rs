use crate::dom::Document;
use crate::types::{NodeId, Token};

/// Builds `tokens` as children of `parent`.
///
/// End tags close the innermost open element with the same name; an end tag
/// with no matching open element is ignored. Adjacent text tokens merge into
/// one text node. Doctype tokens only apply when building into the document root.
pub(crate) fn build_into(doc: &mut Document, parent: NodeId, tokens: &[Token]) {
    let mut open_elements: Vec<NodeId> = Vec::new();
    let mut last_text: Option<NodeId> = None;

    for token in tokens {
        let current = open_elements.last().copied().unwrap_or(parent);
        match token {
            Token::Doctype(s) => {
                if parent == doc.root() {
                    doc.set_doctype(s.clone());
                }
                continue;
            }
            Token::Comment(c) => {
                let node = doc.create_comment(c);
                attach(doc, current, node);
            }
            Token::Text(txt) => {
                if txt.is_empty() {
                    continue;
                }
                if let Some(text_node) = last_text {
                    let mut merged = doc.node_text(text_node).unwrap_or_default().to_string();
                    merged.push_str(txt);
                    let _ = doc.set_node_text(text_node, &merged);
                    continue;
                }
                let node = doc.create_text(txt);
                attach(doc, current, node);
                last_text = Some(node);
                continue;
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let node = doc.create_element_with_attributes(name, attributes.clone());
                attach(doc, current, node);
                if !*self_closing {
                    open_elements.push(node);
                }
            }
            Token::EndTag(name) => {
                let matching = open_elements
                    .iter()
                    .rposition(|open| doc.tag_name(*open) == Some(name.as_str()));
                match matching {
                    Some(index) => open_elements.truncate(index),
                    None => {
                        log::trace!(target: "html.builder", "ignoring stray end tag </{name}>");
                    }
                }
            }
        }
        last_text = None;
    }
}

fn attach(doc: &mut Document, parent: NodeId, node: NodeId) {
    // Freshly created nodes under a container cannot fail to attach.
    if let Err(err) = doc.append_child(parent, node) {
        log::debug!(target: "html.builder", "dropping node {node:?}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn build_handles_deep_nesting() {
        let depth: usize = 5_000;
        let markup = format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = Document::parse(&markup);

        let mut current = doc.root();
        let mut seen = 0usize;
        while let Some(&child) = doc.children(current).first() {
            assert_eq!(doc.tag_name(child), Some("div"));
            seen += 1;
            current = child;
        }
        assert_eq!(seen, depth);
    }

    #[test]
    fn stray_end_tags_do_not_close_outer_elements() {
        let doc = Document::parse("<section><p>a</span>b</p>c</section>");
        let section = doc.children(doc.root())[0];
        let p = doc.element_children(section)[0];
        assert_eq!(doc.text_content(p), "ab");
        assert_eq!(doc.text_content(section), "abc");
    }

    #[test]
    fn adjacent_text_merges_into_one_node() {
        let mut doc = Document::new();
        let fragment = doc.create_fragment();
        build_into(&mut doc, fragment, &tokenize("1 < 2"));
        assert_eq!(doc.children(fragment).len(), 1);
        assert_eq!(doc.text_content(fragment), "1 < 2");
    }

    #[test]
    fn doctype_only_applies_to_document_root() {
        let mut doc = Document::parse("<!DOCTYPE html><p>x</p>");
        assert_eq!(doc.doctype(), Some("DOCTYPE html"));
        let fragment = doc.parse_fragment("<!doctype other><b>y</b>");
        assert_eq!(doc.doctype(), Some("DOCTYPE html"));
        assert_eq!(doc.children(fragment).len(), 1);
    }
}
