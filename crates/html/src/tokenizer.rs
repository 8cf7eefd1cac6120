//! Fragment-oriented HTML tokenizer with a constrained tag-name character set.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names use the same ASCII character class.
//!
//! Known limitations (intentional):
//! - Not a full HTML5 tokenizer/state machine (no standard parse-error recovery).
//! - `script` and `style` bodies are raw text; `textarea` and `title` bodies are
//!   escapable raw text (entities decoded, no child tags).
//! - Raw-text close-tag scanning accepts only ASCII whitespace before `>`.
use crate::entities::decode_entities;
use crate::types::Token;
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

fn is_escapable_raw_text_element(name: &str) -> bool {
    matches!(name, "textarea" | "title")
}

/// Finds `</name` followed by optional ASCII whitespace and `>`.
///
/// Returns `(start_of_close_tag, end_after_gt)` relative to `haystack`.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let name = name.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        // `<` cannot appear inside a UTF-8 continuation byte.
        let rel = memchr(b'<', &bytes[i..])?;
        i += rel;
        if i + 2 + name.len() > len {
            return None;
        }
        if bytes[i + 1] == b'/' && starts_with_ignore_ascii_case_at(bytes, i + 2, name) {
            let mut k = i + 2 + name.len();
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_byte) {
            self.pos += 1;
        }
        // Names are ASCII-only, so both ends sit on char boundaries.
        &self.input[start..self.pos]
    }

    fn skip_past(&mut self, byte: u8) {
        match memchr(byte, &self.bytes[self.pos..]) {
            Some(rel) => self.pos += rel + 1,
            None => self.pos = self.bytes.len(),
        }
    }

    fn attribute_value(&mut self) -> String {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = memchr(quote, &self.bytes[start..])
                    .map(|rel| start + rel)
                    .unwrap_or(self.bytes.len());
                let raw = &self.input[start..end];
                self.pos = (end + 1).min(self.bytes.len());
                decode_entities(raw)
            }
            _ => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    if b == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>') {
                        break;
                    }
                    self.pos += 1;
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    /// Scans attributes up to and including the closing `>` of a start tag.
    fn attributes(&mut self) -> (Vec<(String, Option<String>)>, bool) {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else {
                return (attributes, false);
            };
            if b == b'>' {
                self.pos += 1;
                return (attributes, false);
            }
            if b == b'/' {
                if self.bytes.get(self.pos + 1) == Some(&b'>') {
                    self.pos += 2;
                    return (attributes, true);
                }
                self.pos += 1;
                continue;
            }
            let name = self.take_name();
            if name.is_empty() {
                self.pos += 1;
                continue;
            }
            let name = name.to_ascii_lowercase();
            self.skip_whitespace();
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                Some(self.attribute_value())
            } else {
                None
            };
            attributes.push((name, value));
        }
    }
}

/// Tokenizes markup into a flat token list.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut s = Scanner::new(input);

    while !s.at_end() {
        if s.peek() != Some(b'<') {
            let start = s.pos;
            s.pos = memchr(b'<', &s.bytes[start..])
                .map(|rel| start + rel)
                .unwrap_or(s.bytes.len());
            let decoded = decode_entities(&input[start..s.pos]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
            continue;
        }

        let rest = &input[s.pos..];
        if rest.starts_with(HTML_COMMENT_START) {
            let body_start = s.pos + HTML_COMMENT_START.len();
            match input[body_start..].find(HTML_COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    s.pos = body_start + end + HTML_COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    s.pos = s.bytes.len();
                }
            }
            continue;
        }

        if starts_with_ignore_ascii_case_at(s.bytes, s.pos, b"<!doctype") {
            match rest.find('>') {
                Some(end) => {
                    out.push(Token::Doctype(rest[2..end].trim().to_string()));
                    s.pos += end + 1;
                }
                None => s.pos = s.bytes.len(),
            }
            continue;
        }

        if s.bytes.get(s.pos + 1) == Some(&b'/') {
            s.pos += 2;
            let name = s.take_name().to_ascii_lowercase();
            s.skip_past(b'>');
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            continue;
        }

        if !s.bytes.get(s.pos + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            // A bare `<` that does not open a tag is text.
            out.push(Token::Text("<".to_string()));
            s.pos += 1;
            continue;
        }

        s.pos += 1;
        let name = s.take_name().to_ascii_lowercase();
        let (attributes, explicit_self_close) = s.attributes();
        let self_closing = explicit_self_close || is_void_element(&name);
        let raw = !self_closing && is_raw_text_element(&name);
        let escapable = !self_closing && is_escapable_raw_text_element(&name);
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if raw || escapable {
            let body = &input[s.pos..];
            let (text, consumed) = match find_close_tag(body, &name) {
                Some((close_start, close_end)) => (&body[..close_start], close_end),
                None => (body, body.len()),
            };
            if !text.is_empty() {
                let text = if escapable {
                    decode_entities(text)
                } else {
                    text.to_string()
                };
                out.push(Token::Text(text));
            }
            out.push(Token::EndTag(name));
            s.pos += consumed;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let tokens = tokenize("<p>120×32</p>");
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32")),
            "expected UTF-8 text token, got: {tokens:?}"
        );
    }

    #[test]
    fn tokenize_lowercases_tag_and_attribute_names() {
        let tokens = tokenize("<DiV ID=one Data-State='open'></DIV>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "div".to_string(),
                    attributes: vec![
                        ("id".to_string(), Some("one".to_string())),
                        ("data-state".to_string(), Some("open".to_string())),
                    ],
                    self_closing: false,
                },
                Token::EndTag("div".to_string()),
            ]
        );
    }

    #[test]
    fn tokenize_marks_void_elements_self_closing() {
        let tokens = tokenize("<input type=text disabled><br/>");
        assert!(matches!(
            &tokens[..],
            [
                Token::StartTag { name: a, attributes, self_closing: true },
                Token::StartTag { name: b, self_closing: true, .. },
            ] if a == "input"
                && b == "br"
                && attributes[1] == ("disabled".to_string(), None)
        ));
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let tokens = tokenize("<script>if (a < b) {}</ScRiPt >");
        assert!(
            matches!(
                &tokens[..],
                [
                    Token::StartTag { name, .. },
                    Token::Text(body),
                    Token::EndTag(end)
                ] if name == "script" && body == "if (a < b) {}" && end == "script"
            ),
            "expected raw script text and matching end tag, got: {tokens:?}"
        );
    }

    #[test]
    fn rawtext_close_tag_does_not_accept_near_matches() {
        let tokens = tokenize("<style>ok</stylex >no</style>");
        assert!(matches!(
            &tokens[..],
            [Token::StartTag { .. }, Token::Text(body), Token::EndTag(_)] if body == "ok</stylex >no"
        ));
    }

    #[test]
    fn textarea_body_decodes_entities_without_child_tags() {
        let tokens = tokenize("<textarea>a &amp; <b>b</b></textarea>");
        assert!(matches!(
            &tokens[..],
            [Token::StartTag { .. }, Token::Text(body), Token::EndTag(end)]
                if body == "a & <b>b</b>" && end == "textarea"
        ));
    }

    #[test]
    fn tokenize_decodes_attribute_entities() {
        let tokens = tokenize(r#"<a title="fish &amp; chips">x</a>"#);
        assert!(matches!(
            &tokens[0],
            Token::StartTag { attributes, .. }
                if attributes[0].1.as_deref() == Some("fish & chips")
        ));
    }

    #[test]
    fn tokenize_handles_comments_and_doctype() {
        let tokens = tokenize("<!DOCTYPE html><!-- note --><p>x</p><!-- open");
        assert_eq!(tokens[0], Token::Doctype("DOCTYPE html".to_string()));
        assert_eq!(tokens[1], Token::Comment(" note ".to_string()));
        assert_eq!(tokens.last(), Some(&Token::Comment(" open".to_string())));
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let tokens = tokenize("1 < 2");
        let text: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "1 < 2");
    }

    #[test]
    fn tokenize_handles_tons_of_angle_brackets() {
        let input = "<".repeat(50_000);
        let tokens = tokenize(&input);
        assert!(tokens.len() <= input.len());
    }

    #[test]
    fn tokenize_allows_custom_element_and_namespaced_tags() {
        let tokens = tokenize("<my-component></my-component><svg:rect></svg:rect>");
        let names: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StartTag { name, .. } | Token::EndTag(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["my-component", "my-component", "svg:rect", "svg:rect"]);
    }
}
