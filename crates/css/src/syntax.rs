// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

// input: "color: red; font-size: 12px;"
// output: vec![Declaration { name: "color", value: "red" }, Declaration { name: "font-size", value: "12px" }]
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    input
        .split(';')
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = v.trim().to_string();
            Some(Declaration { name, value })
        })
        .collect()
}

pub fn serialize_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{}: {};", d.name, d.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `div.card > a[href^="http"]:first-child, #main`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compound selectors joined by combinators, stored left to right.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub head: Compound,
    pub tail: Vec<(Combinator, Compound)>,
}

impl ComplexSelector {
    /// Rightmost compound: the one the matched element itself must satisfy.
    pub fn subject(&self) -> &Compound {
        self.tail.last().map(|(_, c)| c).unwrap_or(&self.head)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,      // "a b"
    Child,           // "a > b"
    NextSibling,     // "a + b"
    SubsequentSibling, // "a ~ b"
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound(pub Vec<Simple>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Simple {
    Universal,
    Type(String),  // element/tag selector, lowercased
    Id(String),    // #id selector
    Class(String), // .class selector
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
        case_insensitive: bool,
    },
    Pseudo(PseudoClass),
    Not(Box<SelectorList>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrOp {
    Equals,    // [a=v]
    Includes,  // [a~=v]
    DashMatch, // [a|=v]
    Prefix,    // [a^=v]
    Suffix,    // [a$=v]
    Substring, // [a*=v]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    Empty,
    Root,
    Checked,
    Disabled,
    Enabled,
    NthChild { a: i32, b: i32 },
}
