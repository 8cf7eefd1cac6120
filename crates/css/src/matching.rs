use crate::parser::{SelectorError, SelectorParser};
use crate::syntax::{AttrOp, Combinator, ComplexSelector, Compound, PseudoClass, SelectorList, Simple};
use html::{Document, NodeId};

/// Every element under `scope` (exclusive) matching `selectors`, in document order.
pub fn query_selector_all(
    doc: &Document,
    scope: NodeId,
    selectors: &str,
) -> Result<Vec<NodeId>, SelectorError> {
    let list = parse(selectors)?;
    Ok(doc
        .descendants(scope)
        .filter(|n| matches_list(doc, *n, &list))
        .collect())
}

/// First element under `scope` (exclusive) matching `selectors`.
pub fn query_selector(
    doc: &Document,
    scope: NodeId,
    selectors: &str,
) -> Result<Option<NodeId>, SelectorError> {
    let list = parse(selectors)?;
    Ok(doc
        .descendants(scope)
        .find(|n| matches_list(doc, *n, &list)))
}

/// Nearest inclusive ancestor element matching `selectors`.
pub fn closest(
    doc: &Document,
    element: NodeId,
    selectors: &str,
) -> Result<Option<NodeId>, SelectorError> {
    let list = parse(selectors)?;
    Ok(doc.closest(element, |doc, n| matches_list(doc, n, &list)))
}

pub fn element_matches(
    doc: &Document,
    element: NodeId,
    selectors: &str,
) -> Result<bool, SelectorError> {
    let list = parse(selectors)?;
    Ok(matches_list(doc, element, &list))
}

fn parse(selectors: &str) -> Result<SelectorList, SelectorError> {
    SelectorParser::parse(selectors).inspect_err(|err| {
        log::debug!(target: "css.matching", "rejected selector {selectors:?}: {err}");
    })
}

pub fn matches_list(doc: &Document, element: NodeId, list: &SelectorList) -> bool {
    doc.is_element(element) && list.0.iter().any(|c| matches_complex(doc, element, c))
}

// Right-to-left: the element must satisfy the rightmost compound, then some
// chain of relatives must satisfy the compounds to its left.
fn matches_complex(doc: &Document, element: NodeId, selector: &ComplexSelector) -> bool {
    let mut compounds: Vec<&Compound> = Vec::with_capacity(selector.tail.len() + 1);
    compounds.push(&selector.head);
    let mut combinators = Vec::with_capacity(selector.tail.len());
    for (combinator, compound) in &selector.tail {
        combinators.push(*combinator);
        compounds.push(compound);
    }
    match_from(doc, element, &compounds, &combinators, compounds.len() - 1)
}

fn match_from(
    doc: &Document,
    element: NodeId,
    compounds: &[&Compound],
    combinators: &[Combinator],
    idx: usize,
) -> bool {
    if !matches_compound(doc, element, compounds[idx]) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    let next = |n: NodeId| match_from(doc, n, compounds, combinators, idx - 1);
    match combinators[idx - 1] {
        Combinator::Child => doc.parent_element(element).is_some_and(next),
        Combinator::Descendant => doc
            .ancestors(element)
            .filter(|a| doc.is_element(*a))
            .any(next),
        Combinator::NextSibling => previous_element_siblings(doc, element).next().is_some_and(next),
        Combinator::SubsequentSibling => previous_element_siblings(doc, element).any(next),
    }
}

fn previous_element_siblings(doc: &Document, element: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(doc.previous_sibling(element), |n| doc.previous_sibling(*n))
        .filter(|n| doc.is_element(*n))
}

fn matches_compound(doc: &Document, element: NodeId, compound: &Compound) -> bool {
    compound.0.iter().all(|simple| matches_simple(doc, element, simple))
}

fn matches_simple(doc: &Document, element: NodeId, simple: &Simple) -> bool {
    match simple {
        Simple::Universal => true,
        Simple::Type(t) => doc.tag_name(element) == Some(t.as_str()),
        Simple::Id(want) => doc.attribute(element, "id") == Some(want.as_str()),
        Simple::Class(want) => doc.has_class(element, want),
        Simple::Attribute {
            name,
            matcher,
            case_insensitive,
        } => {
            let Some(actual) = doc.attribute(element, name) else {
                return false;
            };
            match matcher {
                None => true,
                Some((op, expected)) => {
                    if *case_insensitive {
                        attr_matches(*op, &actual.to_lowercase(), &expected.to_lowercase())
                    } else {
                        attr_matches(*op, actual, expected)
                    }
                }
            }
        }
        Simple::Pseudo(pseudo) => matches_pseudo(doc, element, *pseudo),
        Simple::Not(list) => !matches_list(doc, element, list),
    }
}

fn attr_matches(op: AttrOp, actual: &str, expected: &str) -> bool {
    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_pseudo(doc: &Document, element: NodeId, pseudo: PseudoClass) -> bool {
    let siblings = || {
        doc.parent(element)
            .map(|p| doc.element_children(p))
            .unwrap_or_default()
    };
    let same_type = || {
        let tag = doc.tag_name(element);
        siblings()
            .into_iter()
            .filter(|s| doc.tag_name(*s) == tag)
            .collect::<Vec<_>>()
    };
    match pseudo {
        PseudoClass::FirstChild => siblings().first() == Some(&element),
        PseudoClass::LastChild => siblings().last() == Some(&element),
        PseudoClass::OnlyChild => siblings() == [element],
        PseudoClass::FirstOfType => same_type().first() == Some(&element),
        PseudoClass::LastOfType => same_type().last() == Some(&element),
        PseudoClass::Empty => doc
            .children(element)
            .iter()
            .all(|c| !doc.is_element(*c) && !doc.is_text(*c)),
        PseudoClass::Root => doc.parent(element).is_some_and(|p| doc.is_document(p)),
        PseudoClass::Checked => match doc.tag_name(element) {
            Some("input") => doc.checked(element).unwrap_or(false),
            Some("option") => doc.has_attribute(element, "selected"),
            _ => false,
        },
        PseudoClass::Disabled => is_disableable(doc, element) && doc.has_attribute(element, "disabled"),
        PseudoClass::Enabled => is_disableable(doc, element) && !doc.has_attribute(element, "disabled"),
        PseudoClass::NthChild { a, b } => siblings()
            .iter()
            .position(|s| *s == element)
            .is_some_and(|i| nth_matches(a, b, i as i32 + 1)),
    }
}

fn is_disableable(doc: &Document, element: NodeId) -> bool {
    matches!(
        doc.tag_name(element),
        Some("input" | "button" | "select" | "textarea" | "option" | "optgroup" | "fieldset")
    )
}

// Does some n >= 0 satisfy a*n + b == position?
fn nth_matches(a: i32, b: i32, position: i32) -> bool {
    if a == 0 {
        return position == b;
    }
    let diff = position - b;
    diff % a == 0 && diff / a >= 0
}
