//! Selector parser (Selectors Level 3 subset plus `:not()` with a list argument).

use crate::syntax::{AttrOp, Combinator, ComplexSelector, Compound, PseudoClass, SelectorList, Simple};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid selector at byte {position}: {reason}")]
pub struct SelectorError {
    pub position: usize,
    pub reason: String,
}

pub struct SelectorParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

const MAX_NESTING: usize = 32;

impl<'a> SelectorParser<'a> {
    pub fn parse(input: &'a str) -> Result<SelectorList, SelectorError> {
        let mut parser = Self {
            input,
            pos: 0,
            depth: 0,
        };
        let list = parser.parse_list()?;
        parser.skip_whitespace();
        if !parser.is_at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(list)
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            if self.peek() == Some(',') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let head = self.parse_compound()?;
        let mut tail = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                None | Some(',') | Some(')') => break,
                Some(_) if had_space => {
                    tail.push((Combinator::Descendant, self.parse_compound()?));
                    continue;
                }
                Some(c) => return Err(self.error(format!("unexpected character {c:?}"))),
            };
            self.advance();
            self.skip_whitespace();
            tail.push((combinator, self.parse_compound()?));
        }
        Ok(ComplexSelector { head, tail })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut parts = Vec::new();
        match self.peek() {
            Some('*') => {
                self.advance();
                parts.push(Simple::Universal);
            }
            Some(c) if is_ident_start(c) => {
                parts.push(Simple::Type(self.parse_identifier()?.to_ascii_lowercase()));
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.advance();
                    parts.push(Simple::Id(self.parse_identifier()?));
                }
                Some('.') => {
                    self.advance();
                    parts.push(Simple::Class(self.parse_identifier()?));
                }
                Some('[') => parts.push(self.parse_attribute()?),
                Some(':') => parts.push(self.parse_pseudo()?),
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(Compound(parts))
    }

    fn parse_attribute(&mut self) -> Result<Simple, SelectorError> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self.parse_identifier()?.to_ascii_lowercase();
        self.skip_whitespace();
        let op = match self.peek() {
            Some(']') => {
                self.advance();
                return Ok(Simple::Attribute {
                    name,
                    matcher: None,
                    case_insensitive: false,
                });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('|') => AttrOp::DashMatch,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            _ => return Err(self.error("expected attribute operator")),
        };
        self.advance();
        if op != AttrOp::Equals {
            self.expect('=')?;
        }
        self.skip_whitespace();
        let value = match self.peek() {
            Some('"') | Some('\'') => self.parse_string()?,
            _ => self.parse_identifier()?,
        };
        self.skip_whitespace();
        let mut case_insensitive = false;
        if matches!(self.peek(), Some('i') | Some('I')) {
            self.advance();
            case_insensitive = true;
            self.skip_whitespace();
        } else if matches!(self.peek(), Some('s') | Some('S')) {
            self.advance();
            self.skip_whitespace();
        }
        self.expect(']')?;
        Ok(Simple::Attribute {
            name,
            matcher: Some((op, value)),
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> Result<Simple, SelectorError> {
        self.expect(':')?;
        if self.peek() == Some(':') {
            return Err(self.error("pseudo-elements never match elements"));
        }
        let start = self.pos;
        let name = self.parse_identifier()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "empty" => PseudoClass::Empty,
            "root" => PseudoClass::Root,
            "checked" => PseudoClass::Checked,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "nth-child" => {
                self.expect('(')?;
                let (a, b) = self.parse_nth()?;
                self.expect(')')?;
                PseudoClass::NthChild { a, b }
            }
            "not" => {
                self.expect('(')?;
                self.depth += 1;
                if self.depth > MAX_NESTING {
                    return Err(self.error("selector nested too deeply"));
                }
                let inner = self.parse_list()?;
                self.depth -= 1;
                self.skip_whitespace();
                self.expect(')')?;
                return Ok(Simple::Not(Box::new(inner)));
            }
            _ => {
                return Err(SelectorError {
                    position: start,
                    reason: format!("unsupported pseudo-class :{name}"),
                });
            }
        };
        Ok(Simple::Pseudo(pseudo))
    }

    // an+b, odd, even, or a bare integer
    fn parse_nth(&mut self) -> Result<(i32, i32), SelectorError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ')' {
                break;
            }
            self.advance();
        }
        let raw: String = self.input[start..self.pos]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || SelectorError {
            position: start,
            reason: format!("invalid nth expression {raw:?}"),
        };
        match raw.as_str() {
            "odd" => return Ok((2, 1)),
            "even" => return Ok((2, 0)),
            _ => {}
        }
        let Some((a_part, b_part)) = raw.split_once('n') else {
            return raw.parse::<i32>().map(|b| (0, b)).map_err(|_| invalid());
        };
        let a = match a_part {
            "" | "+" => 1,
            "-" => -1,
            other => other.parse::<i32>().map_err(|_| invalid())?,
        };
        let b = if b_part.is_empty() {
            0
        } else {
            b_part
                .strip_prefix('+')
                .unwrap_or(b_part)
                .parse::<i32>()
                .map_err(|_| invalid())?
        };
        Ok((a, b))
    }

    fn parse_identifier(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.advance();
                let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                self.advance();
                out.push(escaped);
            } else if is_ident_char(c) {
                self.advance();
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error("expected identifier"));
        }
        Ok(out)
    }

    fn parse_string(&mut self) -> Result<String, SelectorError> {
        let quote = self.peek().ok_or_else(|| self.error("expected string"))?;
        self.advance();
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unclosed string")),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(out);
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.peek() {
                        self.advance();
                        out.push(c);
                    }
                }
                Some(c) => {
                    self.advance();
                    out.push(c);
                }
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        if self.peek() == Some(want) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {want:?}")))
        }
    }

    /// Returns true when any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos != start
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError {
            position: self.pos,
            reason: reason.into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_with_combinators() {
        let list = SelectorParser::parse("ul.items > li[data-id='3']:first-child + li").unwrap();
        assert_eq!(list.0.len(), 1);
        let complex = &list.0[0];
        assert_eq!(
            complex.head,
            Compound(vec![Simple::Type("ul".into()), Simple::Class("items".into())])
        );
        assert_eq!(complex.tail[0].0, Combinator::Child);
        assert_eq!(
            complex.tail[0].1 .0[1],
            Simple::Attribute {
                name: "data-id".into(),
                matcher: Some((AttrOp::Equals, "3".into())),
                case_insensitive: false,
            }
        );
        assert_eq!(complex.tail[1].0, Combinator::NextSibling);
    }

    #[test]
    fn descendant_combinator_from_whitespace() {
        let list = SelectorParser::parse("  #a   input , p ").unwrap();
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0].tail[0].0, Combinator::Descendant);
        assert_eq!(list.0[0].subject(), &Compound(vec![Simple::Type("input".into())]));
    }

    #[test]
    fn nth_child_forms() {
        let parse_nth = |s: &str| match &SelectorParser::parse(s).unwrap().0[0].head.0[0] {
            Simple::Pseudo(PseudoClass::NthChild { a, b }) => (*a, *b),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(parse_nth(":nth-child(odd)"), (2, 1));
        assert_eq!(parse_nth(":nth-child(3)"), (0, 3));
        assert_eq!(parse_nth(":nth-child(-n + 2)"), (-1, 2));
        assert_eq!(parse_nth(":nth-child(2n)"), (2, 0));
    }

    #[test]
    fn malformed_selectors_report_position() {
        for bad in ["", "div >", "[x", "a..b", ":hover", "#1abc", "p,", "::before", "a)"] {
            assert!(SelectorParser::parse(bad).is_err(), "{bad:?} should fail");
        }
        let err = SelectorParser::parse("div $").unwrap_err();
        assert_eq!(err.position, 4);
    }
}
