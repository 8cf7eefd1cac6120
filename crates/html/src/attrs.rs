//! `classList` and `dataset` views over element attributes.

use crate::dom::Document;
use crate::types::{DomError, NodeId};

/// Converts a dataset key (`userId`) into its attribute name (`data-user-id`).
pub fn dataset_attribute_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 5);
    out.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

impl Document {
    pub fn class_names(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|v| v.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, name: &str) -> bool {
        self.class_names(id).contains(&name)
    }

    /// Adds each name not already present, keeping existing order.
    pub fn add_classes<'a>(
        &mut self,
        id: NodeId,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DomError> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        let mut classes: Vec<String> = self.class_names(id).into_iter().map(str::to_string).collect();
        for name in names {
            if !name.is_empty() && !classes.iter().any(|c| c == name) {
                classes.push(name.to_string());
            }
        }
        self.set_attribute(id, "class", &classes.join(" "))
    }

    pub fn remove_classes<'a>(
        &mut self,
        id: NodeId,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DomError> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        if !self.has_attribute(id, "class") {
            return Ok(());
        }
        let names: Vec<&str> = names.into_iter().collect();
        let classes: Vec<String> = self
            .class_names(id)
            .into_iter()
            .filter(|c| !names.contains(c))
            .map(str::to_string)
            .collect();
        self.set_attribute(id, "class", &classes.join(" "))
    }

    pub fn dataset(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attribute(id, &dataset_attribute_name(key))
    }

    pub fn set_dataset(&mut self, id: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        self.set_attribute(id, &dataset_attribute_name(key), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_keys_map_to_kebab_attributes() {
        assert_eq!(dataset_attribute_name("userId"), "data-user-id");
        assert_eq!(dataset_attribute_name("state"), "data-state");
    }

    #[test]
    fn class_list_add_and_remove_preserve_order() {
        let mut doc = Document::parse(r#"<p class="a  b"></p>"#);
        let p = doc.children(doc.root())[0];
        doc.add_classes(p, ["c", "a"]).unwrap();
        assert_eq!(doc.attribute(p, "class"), Some("a b c"));
        doc.remove_classes(p, ["a", "zz"]).unwrap();
        assert_eq!(doc.class_names(p), ["b", "c"]);
    }

    #[test]
    fn dataset_round_trips_through_attribute() {
        let mut doc = Document::parse("<p></p>");
        let p = doc.children(doc.root())[0];
        doc.set_dataset(p, "userId", "7").unwrap();
        assert_eq!(doc.attribute(p, "data-user-id"), Some("7"));
        assert_eq!(doc.dataset(p, "userId"), Some("7"));
    }
}
