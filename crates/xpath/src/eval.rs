//! XPath evaluator over [`html::Document`].

use crate::parser::XPathError;
use crate::types::*;
use html::{Document, NodeId, NodeKind};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A node reachable by XPath: a tree node or one attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XNode {
    Node(NodeId),
    Attribute(NodeId, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<XNode>),
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Clone, Copy)]
struct Context {
    node: XNode,
    position: usize,
    size: usize,
}

pub struct XPathEval<'d> {
    doc: &'d Document,
    order: HashMap<NodeId, usize>,
}

impl<'d> XPathEval<'d> {
    pub fn new(doc: &'d Document) -> Self {
        let root = doc.root();
        let order = std::iter::once(root)
            .chain(doc.descendants(root))
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        Self { doc, order }
    }

    /// Evaluates `expr` with `context` as the context node.
    pub fn evaluate(&self, expr: &Expr, context: NodeId) -> Result<Value, XPathError> {
        self.eval(
            expr,
            Context {
                node: XNode::Node(context),
                position: 1,
                size: 1,
            },
        )
    }

    /// First tree node of the result in document order.
    pub fn first_node(&self, expr: &Expr, context: NodeId) -> Result<Option<NodeId>, XPathError> {
        match self.evaluate(expr, context)? {
            Value::Nodes(nodes) => Ok(nodes.into_iter().find_map(|n| match n {
                XNode::Node(id) => Some(id),
                XNode::Attribute(..) => None,
            })),
            _ => Err(XPathError::NotANodeSet),
        }
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> Result<Value, XPathError> {
        Ok(match expr {
            Expr::Path(path) => {
                let start = if path.absolute {
                    XNode::Node(self.doc.root())
                } else {
                    ctx.node
                };
                Value::Nodes(self.apply_steps(vec![start], &path.steps)?)
            }
            Expr::Filter {
                base,
                predicates,
                steps,
            } => {
                let Value::Nodes(mut nodes) = self.eval(base, ctx)? else {
                    return Err(XPathError::NotANodeSet);
                };
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Value::Nodes(self.apply_steps(nodes, steps)?)
            }
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Number(n) => Value::Number(*n),
            Expr::Negate(inner) => Value::Number(-self.number(&self.eval(inner, ctx)?)),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, ctx)?,
            Expr::Function { name, args } => self.eval_function(name, args, ctx)?,
        })
    }

    fn apply_steps(&self, mut nodes: Vec<XNode>, steps: &[Step]) -> Result<Vec<XNode>, XPathError> {
        for step in steps {
            let mut next = Vec::new();
            for node in &nodes {
                let mut selected: Vec<XNode> = self
                    .axis(*node, step.axis)
                    .into_iter()
                    .filter(|n| self.node_test(*n, step))
                    .collect();
                for predicate in &step.predicates {
                    selected = self.filter(selected, predicate)?;
                }
                next.extend(selected);
            }
            nodes = self.document_order(next);
        }
        Ok(nodes)
    }

    // `nodes` are in axis order; positions are 1-based in that order.
    fn filter(&self, nodes: Vec<XNode>, predicate: &Expr) -> Result<Vec<XNode>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, ctx)? {
                Value::Number(n) => n == ctx.position as f64,
                other => self.boolean(&other),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let doc = self.doc;
        let id = match node {
            XNode::Node(id) => id,
            XNode::Attribute(owner, _) => {
                return match axis {
                    Axis::SelfNode => vec![node],
                    Axis::Parent => vec![XNode::Node(owner)],
                    Axis::Ancestor | Axis::AncestorOrSelf => {
                        let mut out = Vec::new();
                        if axis == Axis::AncestorOrSelf {
                            out.push(node);
                        }
                        out.push(XNode::Node(owner));
                        out.extend(doc.ancestors(owner).map(XNode::Node));
                        out
                    }
                    _ => Vec::new(),
                };
            }
        };
        let nodes: Vec<NodeId> = match axis {
            Axis::Child => doc.children(id).to_vec(),
            Axis::Descendant => doc.descendants(id).collect(),
            Axis::DescendantOrSelf => std::iter::once(id).chain(doc.descendants(id)).collect(),
            Axis::Parent => doc.parent(id).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(id).collect(),
            Axis::AncestorOrSelf => std::iter::once(id).chain(doc.ancestors(id)).collect(),
            Axis::FollowingSibling => siblings(doc, id, true),
            Axis::PrecedingSibling => siblings(doc, id, false),
            Axis::Following => {
                let mut out = Vec::new();
                for n in std::iter::once(id).chain(doc.ancestors(id)) {
                    for sibling in siblings(doc, n, true) {
                        out.push(sibling);
                        out.extend(doc.descendants(sibling));
                    }
                }
                out.sort_by_key(|n| self.order.get(n).copied().unwrap_or(usize::MAX));
                out
            }
            Axis::Preceding => {
                let Some(&own) = self.order.get(&id) else {
                    return Vec::new();
                };
                let ancestors: Vec<NodeId> = doc.ancestors(id).collect();
                let mut out: Vec<NodeId> = self
                    .order
                    .iter()
                    .filter(|&(n, &i)| i < own && !ancestors.contains(n))
                    .map(|(n, _)| *n)
                    .collect();
                out.sort_by_key(|n| std::cmp::Reverse(self.order.get(n).copied()));
                out
            }
            Axis::SelfNode => vec![id],
            Axis::Attribute => {
                return (0..doc.attributes(id).len())
                    .map(|i| XNode::Attribute(id, i))
                    .collect();
            }
        };
        nodes.into_iter().map(XNode::Node).collect()
    }

    fn node_test(&self, node: XNode, step: &Step) -> bool {
        let doc = self.doc;
        match (node, &step.test) {
            (XNode::Attribute(..), NodeTest::Node | NodeTest::Wildcard) => true,
            (XNode::Attribute(owner, i), NodeTest::Name(name)) => doc
                .attributes(owner)
                .get(i)
                .is_some_and(|(k, _)| k.eq_ignore_ascii_case(name)),
            (XNode::Attribute(..), _) => false,
            (XNode::Node(_), NodeTest::Node) => true,
            (XNode::Node(id), NodeTest::Text) => doc.is_text(id),
            (XNode::Node(id), NodeTest::Comment) => matches!(doc.kind(id), Some(NodeKind::Comment { .. })),
            // The principal node type of every tree axis is element.
            (XNode::Node(id), NodeTest::Wildcard) => doc.is_element(id),
            (XNode::Node(id), NodeTest::Name(name)) => doc
                .tag_name(id)
                .is_some_and(|tag| tag.eq_ignore_ascii_case(name)),
        }
    }

    fn document_order(&self, mut nodes: Vec<XNode>) -> Vec<XNode> {
        let key = |n: &XNode| match n {
            XNode::Node(id) => (self.order.get(id).copied().unwrap_or(usize::MAX), 0, *id),
            XNode::Attribute(owner, i) => (
                self.order.get(owner).copied().unwrap_or(usize::MAX),
                i + 1,
                *owner,
            ),
        };
        nodes.sort_by_key(key);
        nodes.dedup();
        nodes
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr, ctx: Context) -> Result<Value, XPathError> {
        match op {
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?;
                if self.boolean(&l) {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.boolean(&self.eval(right, ctx)?)))
            }
            BinaryOp::And => {
                let l = self.eval(left, ctx)?;
                if !self.boolean(&l) {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.boolean(&self.eval(right, ctx)?)))
            }
            BinaryOp::Union => {
                let (Value::Nodes(mut l), Value::Nodes(r)) = (self.eval(left, ctx)?, self.eval(right, ctx)?) else {
                    return Err(XPathError::NotANodeSet);
                };
                l.extend(r);
                Ok(Value::Nodes(self.document_order(l)))
            }
            BinaryOp::Add | BinaryOp::Sub => {
                let l = self.number(&self.eval(left, ctx)?);
                let r = self.number(&self.eval(right, ctx)?);
                Ok(Value::Number(if op == BinaryOp::Add { l + r } else { l - r }))
            }
            _ => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(op, &l, &r)))
            }
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
                let a = self.string_value(*a);
                r.iter()
                    .any(|b| self.compare_atoms(op, &Value::String(a.clone()), &Value::String(self.string_value(*b))))
            }),
            (Value::Nodes(nodes), other) => match other {
                Value::Boolean(_) => self.compare_atoms(op, &Value::Boolean(!nodes.is_empty()), other),
                _ => nodes
                    .iter()
                    .any(|n| self.compare_atoms(op, &Value::String(self.string_value(*n)), other)),
            },
            (other, Value::Nodes(nodes)) => match other {
                Value::Boolean(_) => self.compare_atoms(op, other, &Value::Boolean(!nodes.is_empty())),
                _ => nodes
                    .iter()
                    .any(|n| self.compare_atoms(op, other, &Value::String(self.string_value(*n)))),
            },
            _ => self.compare_atoms(op, left, right),
        }
    }

    fn compare_atoms(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
            let equal = match (left, right) {
                (Value::Boolean(_), _) | (_, Value::Boolean(_)) => self.boolean(left) == self.boolean(right),
                (Value::Number(_), _) | (_, Value::Number(_)) => self.number(left) == self.number(right),
                _ => self.string(left) == self.string(right),
            };
            return equal == (op == BinaryOp::Eq);
        }
        let ordering = self.number(left).partial_cmp(&self.number(right));
        match op {
            BinaryOp::Lt => ordering == Some(Ordering::Less),
            BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            BinaryOp::Gt => ordering == Some(Ordering::Greater),
            BinaryOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            _ => false,
        }
    }

    fn eval_function(&self, name: &str, args: &[Expr], ctx: Context) -> Result<Value, XPathError> {
        let arg = |i: usize| -> Result<Value, XPathError> { self.eval(&args[i], ctx) };
        // Optional single argument defaults to the context node.
        let arg_or_context = || -> Result<Value, XPathError> {
            if args.is_empty() {
                Ok(Value::Nodes(vec![ctx.node]))
            } else {
                arg(0)
            }
        };
        let string_arg = |i: usize| -> Result<String, XPathError> { Ok(self.string(&arg(i)?)) };
        Ok(match name {
            "last" => Value::Number(ctx.size as f64),
            "position" => Value::Number(ctx.position as f64),
            "count" => match arg(0)? {
                Value::Nodes(n) => Value::Number(n.len() as f64),
                _ => return Err(XPathError::NotANodeSet),
            },
            "name" | "local-name" => {
                let Value::Nodes(nodes) = arg_or_context()? else {
                    return Err(XPathError::NotANodeSet);
                };
                Value::String(nodes.first().map(|n| self.node_name(*n)).unwrap_or_default())
            }
            "string" => Value::String(self.string(&arg_or_context()?)),
            "concat" => {
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&string_arg(i)?);
                }
                Value::String(out)
            }
            "starts-with" => Value::Boolean(string_arg(0)?.starts_with(&string_arg(1)?)),
            "contains" => Value::Boolean(string_arg(0)?.contains(&string_arg(1)?)),
            "substring-before" => {
                let (s, pat) = (string_arg(0)?, string_arg(1)?);
                Value::String(s.split_once(&pat).map(|(a, _)| a.to_string()).unwrap_or_default())
            }
            "substring-after" => {
                let (s, pat) = (string_arg(0)?, string_arg(1)?);
                Value::String(s.split_once(&pat).map(|(_, b)| b.to_string()).unwrap_or_default())
            }
            "string-length" => Value::Number(self.string(&arg_or_context()?).chars().count() as f64),
            "normalize-space" => Value::String(
                self.string(&arg_or_context()?)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            "translate" => {
                let (s, from, to) = (string_arg(0)?, string_arg(1)?, string_arg(2)?);
                let to: Vec<char> = to.chars().collect();
                Value::String(
                    s.chars()
                        .filter_map(|c| match from.chars().position(|f| f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            "boolean" => Value::Boolean(self.boolean(&arg(0)?)),
            "not" => Value::Boolean(!self.boolean(&arg(0)?)),
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            "number" => Value::Number(self.number(&arg_or_context()?)),
            _ => return Err(XPathError::UnknownFunction(name.to_string())),
        })
    }

    fn node_name(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => self.doc.tag_name(id).unwrap_or_default().to_string(),
            XNode::Attribute(owner, i) => self
                .doc
                .attributes(owner)
                .get(i)
                .map(|(k, _)| k.clone())
                .unwrap_or_default(),
        }
    }

    fn string_value(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => match self.doc.node_text(id) {
                Some(text) => text.to_string(),
                None => self.doc.text_content(id),
            },
            XNode::Attribute(owner, i) => self
                .doc
                .attributes(owner)
                .get(i)
                .and_then(|(_, v)| v.clone())
                .unwrap_or_default(),
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(nodes) => nodes.first().map(|n| self.string_value(*n)).unwrap_or_default(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) if n.is_nan() => "NaN".to_string(),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            other => self.string(other).trim().parse::<f64>().unwrap_or(f64::NAN),
        }
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }
}

// Following siblings in document order, or preceding siblings nearest first.
fn siblings(doc: &Document, id: NodeId, following: bool) -> Vec<NodeId> {
    let Some(parent) = doc.parent(id) else {
        return Vec::new();
    };
    let all = doc.children(parent);
    let Some(index) = all.iter().position(|c| *c == id) else {
        return Vec::new();
    };
    if following {
        all[index + 1..].to_vec()
    } else {
        all[..index].iter().rev().copied().collect()
    }
}
