//! XPath 1.0 subset for locating nodes in an [`html::Document`].
//!
//! ```
//! use html::Document;
//!
//! let doc = Document::parse(r#"<ul><li>a</li><li id="b">b</li></ul>"#);
//! let found = xpath::first_node(&doc, doc.root(), "//li[2]").unwrap();
//! assert_eq!(found, doc.element_by_id("b"));
//! ```

mod types;
pub use types::*;

mod parser;
pub use parser::{XPathError, XPathParser};

mod eval;
pub use eval::{Value, XNode, XPathEval};

use html::{Document, NodeId};

/// Parses and evaluates `expression`, returning the first node of the
/// resulting node-set in document order (`FIRST_ORDERED_NODE_TYPE`).
pub fn first_node(
    doc: &Document,
    context: NodeId,
    expression: &str,
) -> Result<Option<NodeId>, XPathError> {
    let expr = XPathParser::parse(expression)?;
    XPathEval::new(doc).first_node(&expr, context)
}
