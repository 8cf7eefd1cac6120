pub mod inline;
pub mod matching;
pub mod parser;
pub mod syntax;

// Re-exports so other crates can just use `css::...` nicely.
pub use inline::{css_property_name, inline_declarations, set_style_property, style_property};
pub use matching::{closest, element_matches, matches_list, query_selector, query_selector_all};
pub use parser::{SelectorError, SelectorParser};
pub use syntax::{Declaration, SelectorList, parse_declarations};
