//! Entity decoding for parsed markup and escaping for serialized markup.
//!
//! Decoding contract:
//! - Named entities decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric entities decoded only when well-formed and semicolon-terminated:
//!   `&#123;` (decimal) and `&#x1F4A9;` (hex).
//! - Only valid Unicode scalar values decode; everything else passes through unchanged.

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Returns the index of the terminating `;` for a bounded digit run.
fn scan_numeric_entity(bytes: &[u8], start: usize, max_digits: usize, hex: bool) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        if j - start == max_digits {
            return None;
        }
        let ok = if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok {
            return None;
        }
        j += 1;
    }
    None
}

fn decode_numeric(s: &str, i: usize) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    let (digits_start, hex) = match bytes.get(i + 2) {
        Some(b'x' | b'X') => (i + 3, true),
        _ => (i + 2, false),
    };
    let max = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
    let end = scan_numeric_entity(bytes, digits_start, max, hex)?;
    let digits = &s[digits_start..end];
    let value = if hex {
        u32::from_str_radix(digits, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(value).map(|ch| (ch, end + 1))
}

pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr::memchr(b'&', bytes) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    let mut copy_start = first;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        // Flush up to '&' unchanged (preserves UTF-8).
        out.push_str(&s[copy_start..i]);

        if let Some((pattern, ch)) = NAMED
            .iter()
            .find(|(pattern, _)| bytes[i..].starts_with(pattern))
        {
            out.push(*ch);
            i += pattern.len();
        } else if bytes.get(i + 1) == Some(&b'#') {
            match decode_numeric(s, i) {
                Some((ch, next)) => {
                    out.push(ch);
                    i = next;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            }
        } else {
            out.push('&');
            i += 1;
        }
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}

/// Escapes character data for serialization inside an element.
pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for serialization inside double quotes.
pub fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_entities_decodes_common_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("&apos;x&apos;"), "'x'");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
    }

    #[test]
    fn decode_entities_decodes_numeric_entities() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
        assert_eq!(decode_entities("π &#x3C3; σ"), "π σ σ");
    }

    #[test]
    fn decode_entities_passes_through_unknown_and_malformed() {
        assert_eq!(
            decode_entities("before &notanentity; after"),
            "before &notanentity; after"
        );
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#11141111;"), "&#11141111;");
        assert_eq!(decode_entities("&#;"), "&#;");
    }

    #[test]
    fn malformed_entity_allows_following_entity() {
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
    }

    #[test]
    fn escaping_round_trips_through_decoding() {
        let raw = "a < b & \"c\" > d\u{00A0}";
        let mut text = String::new();
        escape_text(raw, &mut text);
        assert_eq!(decode_entities(&text), raw);
        let mut attr = String::new();
        escape_attribute(raw, &mut attr);
        assert!(!attr.contains('"'));
        assert_eq!(decode_entities(&attr), raw);
    }
}
