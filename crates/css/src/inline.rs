use crate::syntax::{Declaration, parse_declarations, serialize_declarations};
use html::{Document, DomError, NodeId};

/// Converts a script-style property name (`backgroundColor`) into CSS form
/// (`background-color`). Custom properties (`--x`) and names already in
/// kebab case pass through.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.trim().chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// If the element has an inline style attribute, return its declarations
pub fn inline_declarations(doc: &Document, element: NodeId) -> Vec<Declaration> {
    doc.attribute(element, "style")
        .map(parse_declarations)
        .unwrap_or_default()
}

pub fn style_property(doc: &Document, element: NodeId, name: &str) -> Option<String> {
    let name = css_property_name(name);
    inline_declarations(doc, element)
        .into_iter()
        .find(|d| d.name == name)
        .map(|d| d.value)
}

/// Sets one inline style property, keeping the position of an existing
/// declaration. An empty value removes the property.
pub fn set_style_property(
    doc: &mut Document,
    element: NodeId,
    name: &str,
    value: &str,
) -> Result<(), DomError> {
    if !doc.is_element(element) {
        return Err(DomError::NotAnElement(element));
    }
    let name = css_property_name(name);
    if name.is_empty() {
        return Ok(());
    }
    let value = value.trim();
    let mut declarations = inline_declarations(doc, element);
    match declarations.iter_mut().position(|d| d.name == name) {
        Some(i) if value.is_empty() => {
            declarations.remove(i);
        }
        Some(i) => declarations[i].value = value.to_string(),
        None if value.is_empty() => return Ok(()),
        None => declarations.push(Declaration {
            name,
            value: value.to_string(),
        }),
    }
    if declarations.is_empty() {
        doc.remove_attribute(element, "style")
    } else {
        doc.set_attribute(element, "style", &serialize_declarations(&declarations))
    }
}
