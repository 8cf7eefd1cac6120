//! Focus and live form-control state.
//!
//! Value assignment follows input editing semantics: assigning a value that
//! differs from the current one places the caret at the end; assigning the
//! same value leaves the caret where it was.

use crate::dom::Document;
use crate::types::{DomError, FormState, NodeId, NodeKind};

const TEXT_INPUT_TYPES: &[&str] = &[
    "color",
    "date",
    "datetime",
    "datetime-local",
    "email",
    "month",
    "number",
    "password",
    "range",
    "search",
    "select-one",
    "select-multiple",
    "tel",
    "text",
    "textarea",
    "time",
    "url",
    "week",
];

impl Document {
    /// The `type` a form control reports: input `type` (default `text`),
    /// `textarea`, or `select-one`/`select-multiple`.
    pub fn control_type(&self, id: NodeId) -> Option<String> {
        match self.tag_name(id)? {
            "input" => Some(
                self.attribute(id, "type")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or("text")
                    .to_ascii_lowercase(),
            ),
            "textarea" => Some("textarea".to_string()),
            "select" if self.has_attribute(id, "multiple") => Some("select-multiple".to_string()),
            "select" => Some("select-one".to_string()),
            _ => None,
        }
    }

    /// True for controls whose value is edited as text with a caret.
    pub fn is_text_input(&self, id: NodeId) -> bool {
        self.control_type(id)
            .is_some_and(|ty| TEXT_INPUT_TYPES.contains(&ty.as_str()))
    }

    fn form_state(&self, id: NodeId) -> Option<&FormState> {
        match self.kind(id)? {
            NodeKind::Element { form, .. } => form.as_ref(),
            _ => None,
        }
    }

    fn form_state_mut(&mut self, id: NodeId) -> Result<&mut FormState, DomError> {
        match self.kind_mut(id)? {
            NodeKind::Element { form: Some(form), .. } => Ok(form),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn is_form_control(&self, id: NodeId) -> bool {
        self.form_state(id).is_some()
    }

    /// Current value: the assigned value, else the markup default.
    pub fn value(&self, id: NodeId) -> Option<String> {
        let state = self.form_state(id)?;
        if let Some(value) = &state.value {
            return Some(value.clone());
        }
        match self.tag_name(id)? {
            "textarea" => Some(self.text_content(id)),
            "select" => Some(self.default_select_value(id)),
            _ => Some(self.attribute(id, "value").unwrap_or("").to_string()),
        }
    }

    fn default_select_value(&self, id: NodeId) -> String {
        let options: Vec<NodeId> = self
            .descendants(id)
            .filter(|n| self.tag_name(*n) == Some("option"))
            .collect();
        let chosen = options
            .iter()
            .find(|o| self.has_attribute(**o, "selected"))
            .or(options.first());
        chosen
            .map(|o| {
                self.attribute(*o, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| self.text_content(*o))
            })
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let current = self.value(id);
        let state = self.form_state_mut(id)?;
        if current.as_deref() != Some(value) {
            state.caret = Some(value.len());
        }
        state.value = Some(value.to_string());
        Ok(())
    }

    /// Caret byte offset; defaults to the end of the value.
    pub fn caret(&self, id: NodeId) -> Option<usize> {
        let value_len = self.value(id)?.len();
        Some(
            self.form_state(id)?
                .caret
                .map_or(value_len, |c| c.min(value_len)),
        )
    }

    pub fn set_caret(&mut self, id: NodeId, caret: usize) -> Result<(), DomError> {
        let len = self.value(id).map(|v| v.len()).unwrap_or(0);
        self.form_state_mut(id)?.caret = Some(caret.min(len));
        Ok(())
    }

    pub fn checked(&self, id: NodeId) -> Option<bool> {
        let state = self.form_state(id)?;
        Some(state.checked.unwrap_or_else(|| self.has_attribute(id, "checked")))
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        self.form_state_mut(id)?.checked = Some(checked);
        Ok(())
    }

    /// Focuses a connected element. Returns false when the node cannot take focus.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_connected(id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// The focused element, if it is still connected.
    pub fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|f| self.is_connected(*f))
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn text_input_classification() {
        let doc = Document::parse(
            r#"<input id="a"><input id="b" type="checkbox"><textarea id="c"></textarea><select id="d"></select><div id="e"></div>"#,
        );
        let id = |s| doc.element_by_id(s).unwrap();
        assert!(doc.is_text_input(id("a")));
        assert!(!doc.is_text_input(id("b")));
        assert!(doc.is_text_input(id("c")));
        assert!(doc.is_text_input(id("d")));
        assert!(!doc.is_text_input(id("e")));
    }

    #[test]
    fn value_defaults_come_from_markup() {
        let doc = Document::parse(
            r#"<input id="a" value="x"><textarea id="b">body</textarea><select id="c"><option>1</option><option value="two" selected>2</option></select>"#,
        );
        assert_eq!(doc.value(doc.element_by_id("a").unwrap()).as_deref(), Some("x"));
        assert_eq!(doc.value(doc.element_by_id("b").unwrap()).as_deref(), Some("body"));
        assert_eq!(doc.value(doc.element_by_id("c").unwrap()).as_deref(), Some("two"));
    }

    #[test]
    fn reassigning_a_value_moves_the_caret_to_the_end() {
        let mut doc = Document::parse(r#"<input id="a" value="hello">"#);
        let input = doc.element_by_id("a").unwrap();
        doc.set_caret(input, 0).unwrap();
        doc.set_value(input, "hello").unwrap();
        assert_eq!(doc.caret(input), Some(0), "same value keeps the caret");
        doc.set_value(input, "").unwrap();
        doc.set_value(input, "hello").unwrap();
        assert_eq!(doc.caret(input), Some(5));
    }

    #[test]
    fn focus_requires_connected_element() {
        let mut doc = Document::parse(r#"<input id="a">"#);
        let input = doc.element_by_id("a").unwrap();
        let detached = doc.create_element("input");
        assert!(!doc.focus(detached));
        assert!(doc.focus(input));
        assert_eq!(doc.active_element(), Some(input));
        doc.remove(input).unwrap();
        assert_eq!(doc.active_element(), None);
    }
}
