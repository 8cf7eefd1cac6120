use crate::dom::Document;
use crate::entities::{escape_attribute, escape_text};
use crate::tokenizer::{is_raw_text_element, is_void_element};
use crate::types::{NodeId, NodeKind};

impl Document {
    /// Markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag_name(id).is_some_and(is_raw_text_element);
        for child in self.children(id) {
            write_node(self, *child, raw, &mut out);
        }
        out
    }

    /// Markup of the node itself including its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_node(self, id, false, &mut out);
        out
    }
}

fn write_node(doc: &Document, id: NodeId, raw_parent: bool, out: &mut String) {
    // Explicit stack keeps deeply nested trees off the call stack.
    enum Step {
        Open(NodeId, bool),
        Close(NodeId),
    }
    let mut stack = vec![Step::Open(id, raw_parent)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Close(node) => {
                if let Some(name) = doc.tag_name(node) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
            Step::Open(node, raw) => match doc.kind(node) {
                Some(NodeKind::Text { text }) => {
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text(text, out);
                    }
                }
                Some(NodeKind::Comment { text }) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Some(NodeKind::Element {
                    name, attributes, ..
                }) => {
                    out.push('<');
                    out.push_str(name);
                    for (key, value) in attributes {
                        out.push(' ');
                        out.push_str(key);
                        if let Some(value) = value {
                            out.push_str("=\"");
                            escape_attribute(value, out);
                            out.push('"');
                        }
                    }
                    out.push('>');
                    if is_void_element(name) {
                        continue;
                    }
                    stack.push(Step::Close(node));
                    let raw_children = is_raw_text_element(name);
                    for child in doc.children(node).iter().rev() {
                        stack.push(Step::Open(*child, raw_children));
                    }
                }
                Some(NodeKind::Document { doctype }) => {
                    if let Some(doctype) = doctype {
                        out.push_str("<!");
                        out.push_str(doctype);
                        out.push('>');
                    }
                    for child in doc.children(node).iter().rev() {
                        stack.push(Step::Open(*child, false));
                    }
                }
                Some(NodeKind::Fragment) => {
                    for child in doc.children(node).iter().rev() {
                        stack.push(Step::Open(*child, false));
                    }
                }
                None => {}
            },
        }
    }
}
