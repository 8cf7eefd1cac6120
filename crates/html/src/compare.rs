use crate::dom::Document;
use crate::types::{NodeId, NodeKind};

impl Document {
    /// Structural equality in the sense of `Node.isEqualNode`.
    ///
    /// Same node kind, same tag name, same attribute set (order-insensitive),
    /// same character data, and pairwise-equal children. Node identity and
    /// connectedness are ignored.
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((left, right)) = pending.pop() {
            if !self.shallow_equal(left, right) {
                return false;
            }
            let (lc, rc) = (self.children(left), self.children(right));
            if lc.len() != rc.len() {
                return false;
            }
            pending.extend(lc.iter().copied().zip(rc.iter().copied()));
        }
        true
    }

    fn shallow_equal(&self, a: NodeId, b: NodeId) -> bool {
        match (self.kind(a), self.kind(b)) {
            (
                Some(NodeKind::Element {
                    name: an,
                    attributes: aa,
                    ..
                }),
                Some(NodeKind::Element {
                    name: bn,
                    attributes: ba,
                    ..
                }),
            ) => {
                an == bn
                    && aa.len() == ba.len()
                    && aa.iter().all(|(k, v)| {
                        ba.iter()
                            .any(|(bk, bv)| bk == k && bv.as_deref().unwrap_or("") == v.as_deref().unwrap_or(""))
                    })
            }
            (Some(NodeKind::Text { text: at }), Some(NodeKind::Text { text: bt }))
            | (Some(NodeKind::Comment { text: at }), Some(NodeKind::Comment { text: bt })) => {
                at == bt
            }
            (Some(NodeKind::Document { doctype: ad }), Some(NodeKind::Document { doctype: bd })) => {
                ad == bd
            }
            (Some(NodeKind::Fragment), Some(NodeKind::Fragment)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn equal_ignores_attribute_order_and_identity() {
        let mut doc = Document::new();
        let a = doc.parse_fragment(r#"<p class="x" id="1">hi<b>!</b></p>"#);
        let b = doc.parse_fragment(r#"<p id="1" class="x">hi<b>!</b></p>"#);
        let (pa, pb) = (doc.children(a)[0], doc.children(b)[0]);
        assert!(doc.is_equal_node(pa, pb));
    }

    #[test]
    fn differing_text_or_attributes_are_unequal() {
        let mut doc = Document::new();
        let a = doc.parse_fragment(r#"<p id="1">hi</p>"#);
        let b = doc.parse_fragment(r#"<p id="1">ho</p>"#);
        let c = doc.parse_fragment(r#"<p id="2">hi</p>"#);
        let (pa, pb, pc) = (doc.children(a)[0], doc.children(b)[0], doc.children(c)[0]);
        assert!(!doc.is_equal_node(pa, pb));
        assert!(!doc.is_equal_node(pa, pc));
    }
}
