//! XPath 1.0 expression parser.
//!
//! Supported: absolute and relative location paths, `//`, all axes except
//! `namespace`, name/`*`/`node()`/`text()`/`comment()` tests, predicates,
//! `or`/`and`, comparisons, `+`/`-`, unions, literals, numbers, and a core
//! function library. Variables and `*`/`div`/`mod` arithmetic are not.

use crate::types::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum XPathError {
    #[error("unexpected character {found:?} at {position}")]
    UnexpectedChar { position: usize, found: char },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown axis {0:?}")]
    UnknownAxis(String),
    #[error("unsupported function {0}()")]
    UnknownFunction(String),
    #[error("{name}() does not take {got} arguments")]
    WrongArity { name: String, got: usize },
    #[error("unsupported syntax: {0}")]
    Unsupported(&'static str),
    #[error("expression nested too deeply")]
    TooDeep,
    #[error("expression does not evaluate to a node-set")]
    NotANodeSet,
}

const MAX_DEPTH: usize = 64;

// name, min args, max args
const FUNCTIONS: &[(&str, usize, usize)] = &[
    ("last", 0, 0),
    ("position", 0, 0),
    ("count", 1, 1),
    ("name", 0, 1),
    ("local-name", 0, 1),
    ("string", 0, 1),
    ("concat", 2, usize::MAX),
    ("starts-with", 2, 2),
    ("contains", 2, 2),
    ("substring-before", 2, 2),
    ("substring-after", 2, 2),
    ("string-length", 0, 1),
    ("normalize-space", 0, 1),
    ("translate", 3, 3),
    ("boolean", 1, 1),
    ("not", 1, 1),
    ("true", 0, 0),
    ("false", 0, 0),
    ("number", 0, 1),
];

pub struct XPathParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> XPathParser<'a> {
    pub fn parse(input: &'a str) -> Result<Expr, XPathError> {
        let mut parser = Self {
            input,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(expr),
            Some(found) => Err(XPathError::UnexpectedChar {
                position: parser.pos,
                found,
            }),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, XPathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(XPathError::TooDeep);
        }
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and()?;
        while self.keyword("or") {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality()?;
        while self.keyword("and") {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational()?;
        loop {
            self.skip_whitespace();
            let op = if self.eat("!=") {
                BinaryOp::NotEq
            } else if self.eat("=") {
                BinaryOp::Eq
            } else {
                return Ok(left);
            };
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_additive()?;
        loop {
            self.skip_whitespace();
            let op = if self.eat("<=") {
                BinaryOp::Le
            } else if self.eat(">=") {
                BinaryOp::Ge
            } else if self.eat("<") {
                BinaryOp::Lt
            } else if self.eat(">") {
                BinaryOp::Gt
            } else {
                return Ok(left);
            };
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            let op = if self.eat("+") {
                BinaryOp::Add
            } else if self.eat("-") {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        self.skip_whitespace();
        if self.eat("-") {
            let inner = self.parse_nested(Self::parse_unary)?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;
        loop {
            self.skip_whitespace();
            if !self.eat("|") {
                return Ok(left);
            }
            let right = self.parse_path_expr()?;
            left = binary(BinaryOp::Union, left, right);
        }
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        self.skip_whitespace();
        let primary = match self.peek() {
            None => return Err(XPathError::UnexpectedEnd),
            Some('/') => return self.parse_location_path().map(Expr::Path),
            Some('"' | '\'') => Expr::Literal(self.parse_literal()?),
            Some(c) if c.is_ascii_digit() => Expr::Number(self.parse_number()?),
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                Expr::Number(self.parse_number()?)
            }
            Some('(') => {
                self.advance();
                let inner = self.parse_expr()?;
                self.skip_whitespace();
                self.expect(')')?;
                inner
            }
            Some('$') => return Err(XPathError::Unsupported("variable references")),
            Some(_) if self.at_function_call() => self.parse_function_call()?,
            Some(_) => return self.parse_location_path().map(Expr::Path),
        };
        self.parse_filter_tail(primary)
    }

    fn parse_filter_tail(&mut self, base: Expr) -> Result<Expr, XPathError> {
        let predicates = self.parse_predicates()?;
        self.skip_whitespace();
        let mut steps = Vec::new();
        if self.peek() == Some('/') {
            self.parse_step_sequence(&mut steps)?;
        }
        if predicates.is_empty() && steps.is_empty() {
            return Ok(base);
        }
        Ok(Expr::Filter {
            base: Box::new(base),
            predicates,
            steps,
        })
    }

    fn parse_location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        if self.peek() != Some('/') {
            steps.push(self.parse_step()?);
            self.parse_step_sequence(&mut steps)?;
            return Ok(LocationPath {
                absolute: false,
                steps,
            });
        }
        if self.peek_at(1) == Some('/') {
            self.parse_step_sequence(&mut steps)?;
        } else {
            self.advance();
            self.skip_whitespace();
            if self.can_start_step() {
                steps.push(self.parse_step()?);
                self.parse_step_sequence(&mut steps)?;
            }
        }
        Ok(LocationPath {
            absolute: true,
            steps,
        })
    }

    // Zero or more `/step` or `//step` continuations.
    fn parse_step_sequence(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        loop {
            self.skip_whitespace();
            if self.eat("//") {
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
            } else if !self.eat("/") {
                return Ok(());
            }
            steps.push(self.parse_step()?);
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        self.skip_whitespace();
        if self.eat("..") {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        if self.eat(".") {
            return Ok(Step::new(Axis::SelfNode, NodeTest::Node));
        }
        let axis = if self.eat("@") {
            Axis::Attribute
        } else if self.at_axis_specifier() {
            let name = self.parse_name()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.expect(':')?;
            Axis::from_name(&name).ok_or(XPathError::UnknownAxis(name))?
        } else {
            Axis::Child
        };
        let test = self.parse_node_test()?;
        let mut step = Step::new(axis, test);
        step.predicates = self.parse_predicates()?;
        Ok(step)
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        self.skip_whitespace();
        if self.eat("*") {
            return Ok(NodeTest::Wildcard);
        }
        let name = self.parse_name()?;
        let save = self.pos;
        self.skip_whitespace();
        if self.peek() != Some('(') {
            self.pos = save;
            return Ok(NodeTest::Name(name));
        }
        let test = match name.as_str() {
            "node" => NodeTest::Node,
            "text" => NodeTest::Text,
            "comment" => NodeTest::Comment,
            "processing-instruction" => {
                return Err(XPathError::Unsupported("processing-instruction()"));
            }
            _ => return Err(XPathError::UnknownFunction(name)),
        };
        self.expect('(')?;
        self.skip_whitespace();
        self.expect(')')?;
        Ok(test)
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        loop {
            self.skip_whitespace();
            if !self.eat("[") {
                return Ok(predicates);
            }
            predicates.push(self.parse_expr()?);
            self.skip_whitespace();
            self.expect(']')?;
        }
    }

    fn parse_function_call(&mut self) -> Result<Expr, XPathError> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        self.expect('(')?;
        let mut args = Vec::new();
        self.skip_whitespace();
        if !self.eat(")") {
            loop {
                args.push(self.parse_expr()?);
                self.skip_whitespace();
                if self.eat(")") {
                    break;
                }
                self.expect(',')?;
            }
        }
        let Some(&(_, min, max)) = FUNCTIONS.iter().find(|(n, _, _)| *n == name) else {
            return Err(XPathError::UnknownFunction(name));
        };
        if args.len() < min || args.len() > max {
            return Err(XPathError::WrongArity {
                name,
                got: args.len(),
            });
        }
        Ok(Expr::Function { name, args })
    }

    fn parse_literal(&mut self) -> Result<String, XPathError> {
        let quote = self.peek().ok_or(XPathError::UnexpectedEnd)?;
        self.advance();
        let start = self.pos;
        let len = self.input[start..]
            .find(quote)
            .ok_or(XPathError::UnexpectedEnd)?;
        self.pos = start + len + quote.len_utf8();
        Ok(self.input[start..start + len].to_string())
    }

    fn parse_number(&mut self) -> Result<f64, XPathError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.advance();
        }
        self.input[start..self.pos]
            .parse::<f64>()
            .map_err(|_| XPathError::UnexpectedChar {
                position: start,
                found: '.',
            })
    }

    fn parse_name(&mut self) -> Result<String, XPathError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => self.advance(),
            Some(found) => {
                return Err(XPathError::UnexpectedChar {
                    position: self.pos,
                    found,
                });
            }
            None => return Err(XPathError::UnexpectedEnd),
        }
        while self.peek().is_some_and(is_name_char) {
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_nested(
        &mut self,
        f: fn(&mut Self) -> Result<Expr, XPathError>,
    ) -> Result<Expr, XPathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(XPathError::TooDeep);
        }
        let out = f(self);
        self.depth -= 1;
        out
    }

    // name '(' where name is not a node-type test
    fn at_function_call(&self) -> bool {
        let Some((name, rest)) = self.lookahead_name() else {
            return false;
        };
        rest.trim_start().starts_with('(')
            && !matches!(name, "node" | "text" | "comment" | "processing-instruction")
    }

    fn at_axis_specifier(&self) -> bool {
        self.lookahead_name()
            .is_some_and(|(_, rest)| rest.trim_start().starts_with("::"))
    }

    fn lookahead_name(&self) -> Option<(&'a str, &'a str)> {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(is_name_start) {
            return None;
        }
        let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        Some((&rest[..end], &rest[end..]))
    }

    fn can_start_step(&self) -> bool {
        matches!(self.peek(), Some(c) if c == '.' || c == '@' || c == '*' || is_name_start(c))
    }

    fn keyword(&mut self, kw: &str) -> bool {
        self.skip_whitespace();
        match self.lookahead_name() {
            Some((name, _)) if name == kw => {
                self.pos += kw.len();
                true
            }
            _ => false,
        }
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: char) -> Result<(), XPathError> {
        match self.peek() {
            Some(c) if c == want => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(XPathError::UnexpectedChar {
                position: self.pos,
                found,
            }),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}
