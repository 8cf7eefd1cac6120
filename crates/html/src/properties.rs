//! Reflected element properties (`element[name]` in script terms).
//!
//! Only properties the element actually defines are readable or writable;
//! unknown names are reported as absent and writes to them are refused.

use crate::dom::Document;
use crate::types::{DomError, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    fn truthy(&self) -> bool {
        match self {
            PropValue::Bool(b) => *b,
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::Text(s) => !s.is_empty(),
        }
    }

    fn into_text(self) -> String {
        match self {
            PropValue::Bool(b) => b.to_string(),
            PropValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", n as i64),
            PropValue::Number(n) => n.to_string(),
            PropValue::Text(s) => s,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Reflect {
    Attr(&'static str),
    BoolAttr(&'static str),
    Value,
    Checked,
    TabIndex,
    TextContent,
    InnerHtml,
}

fn reflect(tag: &str, property: &str) -> Option<Reflect> {
    let global = match property {
        "id" => Some(Reflect::Attr("id")),
        "className" => Some(Reflect::Attr("class")),
        "title" => Some(Reflect::Attr("title")),
        "lang" => Some(Reflect::Attr("lang")),
        "dir" => Some(Reflect::Attr("dir")),
        "hidden" => Some(Reflect::BoolAttr("hidden")),
        "tabIndex" => Some(Reflect::TabIndex),
        "textContent" => Some(Reflect::TextContent),
        "innerHTML" => Some(Reflect::InnerHtml),
        _ => None,
    };
    if global.is_some() {
        return global;
    }
    match (tag, property) {
        ("input" | "textarea" | "select", "value") => Some(Reflect::Value),
        ("input", "checked") => Some(Reflect::Checked),
        ("input" | "textarea" | "select" | "button" | "option" | "fieldset", "disabled") => {
            Some(Reflect::BoolAttr("disabled"))
        }
        ("input" | "textarea" | "select" | "button", "name") => Some(Reflect::Attr("name")),
        ("input" | "textarea", "placeholder") => Some(Reflect::Attr("placeholder")),
        ("input" | "textarea", "readOnly") => Some(Reflect::BoolAttr("readonly")),
        ("input" | "textarea" | "select", "required") => Some(Reflect::BoolAttr("required")),
        ("input" | "button", "type") => Some(Reflect::Attr("type")),
        ("option" | "button", "value") => Some(Reflect::Attr("value")),
        ("option", "selected") => Some(Reflect::BoolAttr("selected")),
        ("a" | "link" | "area", "href") => Some(Reflect::Attr("href")),
        ("a" | "form", "target") => Some(Reflect::Attr("target")),
        ("img" | "script" | "iframe" | "source", "src") => Some(Reflect::Attr("src")),
        ("img" | "area", "alt") => Some(Reflect::Attr("alt")),
        ("form", "action") => Some(Reflect::Attr("action")),
        ("form", "method") => Some(Reflect::Attr("method")),
        ("label", "htmlFor") => Some(Reflect::Attr("for")),
        _ => None,
    }
}

impl Document {
    pub fn has_property(&self, id: NodeId, property: &str) -> bool {
        self.tag_name(id)
            .and_then(|tag| reflect(tag, property))
            .is_some()
    }

    pub fn property(&self, id: NodeId, property: &str) -> Option<PropValue> {
        let reflected = reflect(self.tag_name(id)?, property)?;
        Some(match reflected {
            Reflect::Attr(name) => PropValue::Text(self.attribute(id, name).unwrap_or("").to_string()),
            Reflect::BoolAttr(name) => PropValue::Bool(self.has_attribute(id, name)),
            Reflect::Value => PropValue::Text(self.value(id).unwrap_or_default()),
            Reflect::Checked => PropValue::Bool(self.checked(id).unwrap_or(false)),
            Reflect::TabIndex => PropValue::Number(
                self.attribute(id, "tabindex")
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .unwrap_or(-1.0),
            ),
            Reflect::TextContent => PropValue::Text(self.text_content(id)),
            Reflect::InnerHtml => PropValue::Text(self.inner_html(id)),
        })
    }

    /// Assigns an existing property. Returns `Ok(false)` without touching the
    /// element when the property is not defined for it.
    pub fn set_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: PropValue,
    ) -> Result<bool, DomError> {
        let Some(tag) = self.tag_name(id) else {
            return Err(DomError::NotAnElement(id));
        };
        let Some(reflected) = reflect(tag, property) else {
            return Ok(false);
        };
        match reflected {
            Reflect::Attr(name) => self.set_attribute(id, name, &value.into_text())?,
            Reflect::BoolAttr(name) => {
                if value.truthy() {
                    if !self.has_attribute(id, name) {
                        self.set_attribute(id, name, "")?;
                    }
                } else {
                    self.remove_attribute(id, name)?;
                }
            }
            Reflect::Value => self.set_value(id, &value.into_text())?,
            Reflect::Checked => self.set_checked(id, value.truthy())?,
            Reflect::TabIndex => self.set_attribute(id, "tabindex", &value.into_text())?,
            Reflect::TextContent => self.set_text_content(id, &value.into_text())?,
            Reflect::InnerHtml => self.set_inner_html(id, &value.into_text())?,
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_property_is_refused_and_element_untouched() {
        let mut doc = Document::parse(r#"<div id="x"></div>"#);
        let div = doc.element_by_id("x").unwrap();
        let before = doc.outer_html(div);
        assert_eq!(doc.set_property(div, "bogus", PropValue::Text("1".into())), Ok(false));
        assert_eq!(doc.set_property(div, "value", PropValue::Text("1".into())), Ok(false));
        assert_eq!(doc.outer_html(div), before);
        assert_eq!(doc.property(div, "bogus"), None);
    }

    #[test]
    fn boolean_properties_toggle_attributes() {
        let mut doc = Document::parse(r#"<button id="b"></button>"#);
        let button = doc.element_by_id("b").unwrap();
        assert_eq!(doc.set_property(button, "disabled", PropValue::Bool(true)), Ok(true));
        assert!(doc.has_attribute(button, "disabled"));
        doc.set_property(button, "disabled", PropValue::Bool(false)).unwrap();
        assert!(!doc.has_attribute(button, "disabled"));
    }

    #[test]
    fn value_and_class_name_reflect() {
        let mut doc = Document::parse(r#"<input id="i">"#);
        let input = doc.element_by_id("i").unwrap();
        doc.set_property(input, "value", PropValue::Text("typed".into())).unwrap();
        doc.set_property(input, "className", PropValue::Text("wide".into())).unwrap();
        assert_eq!(doc.value(input).as_deref(), Some("typed"));
        assert_eq!(doc.attribute(input, "class"), Some("wide"));
        assert_eq!(doc.property(input, "checked"), Some(PropValue::Bool(false)));
    }
}
