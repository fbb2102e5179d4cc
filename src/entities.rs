/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Write;

use crate::chars::is_valid_xml_char;

pub mod predefined {
    pub const LT: &str = "&lt;";
    pub const GT: &str = "&gt;";
    pub const AMP: &str = "&amp;";
    pub const APOS: &str = "&apos;";
    pub const QUOT: &str = "&quot;";
}

/// Longest reference the decoder waits for, `&` and `;` included.
pub const MAX_REFERENCE_LEN: usize = 12;

fn escaped(c: char) -> Option<&'static str> {
    match c {
        '<' => Some(predefined::LT),
        '>' => Some(predefined::GT),
        '&' => Some(predefined::AMP),
        '\'' => Some(predefined::APOS),
        '"' => Some(predefined::QUOT),
        _ => None,
    }
}

pub fn escaped_size(s: &str) -> usize {
    s.chars()
        .map(|c| escaped(c).map_or(c.len_utf8(), str::len))
        .sum()
}

pub fn escape_fmt<W: Write>(s: &str, f: &mut W) -> std::fmt::Result {
    let mut back = 0;
    for (pos, c) in s.char_indices() {
        if let Some(entity) = escaped(c) {
            f.write_str(&s[back..pos])?;
            f.write_str(entity)?;
            back = pos + 1;
        }
    }
    f.write_str(&s[back..])
}

/// Outcome of decoding a reference at the start of a byte slice.
#[derive(Debug, Eq, PartialEq)]
pub enum Reference {
    /// Decoded character and the number of bytes the reference took.
    Char(char, usize),
    /// Bytes end before the reference could be decided.
    Incomplete,
    Invalid,
}

fn parse_number(digits: &[u8], radix: u32) -> Option<u32> {
    let valid = match radix {
        16 => digits.iter().all(u8::is_ascii_hexdigit),
        _ => digits.iter().all(u8::is_ascii_digit),
    };
    if digits.is_empty() || !valid {
        return None;
    }
    let s = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(s, radix).ok()
}

fn decode_body(body: &[u8]) -> Option<char> {
    match body {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"apos" => Some('\''),
        b"quot" => Some('"'),
        [b'#', b'x', digits @ ..] => from_code_point(parse_number(digits, 16)?),
        [b'#', digits @ ..] => from_code_point(parse_number(digits, 10)?),
        _ => None,
    }
}

fn from_code_point(value: u32) -> Option<char> {
    if is_valid_xml_char(value) {
        char::from_u32(value)
    } else {
        None
    }
}

/// Decodes the predefined entity or character reference starting at `bytes[0]`,
/// which must be the `&` character.
pub fn decode_reference(bytes: &[u8]) -> Reference {
    debug_assert_eq!(bytes.first(), Some(&b'&'));
    for (pos, &c) in bytes.iter().enumerate().take(MAX_REFERENCE_LEN).skip(1) {
        match c {
            b';' => {
                return match decode_body(&bytes[1..pos]) {
                    Some(c) => Reference::Char(c, pos + 1),
                    None => Reference::Invalid,
                };
            }
            b'#' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => (),
            _ => return Reference::Invalid,
        }
    }
    if bytes.len() < MAX_REFERENCE_LEN {
        Reference::Incomplete
    } else {
        Reference::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(s: &str) -> String {
        let mut buf = String::new();
        escape_fmt(s, &mut buf).unwrap();
        buf
    }

    #[test]
    fn escape_size() {
        const NOESCAPE: &str = "abc$#@!%^*(){}[]=-+/.,;:FDSF3443";
        assert_eq!(escaped_size(NOESCAPE), NOESCAPE.len());
        assert_eq!(escaped_size("abc&def"), "abc&amp;def".len());
        assert_eq!(escaped_size("<>&'\""), "&lt;&gt;&amp;&apos;&quot;".len());
        assert_eq!(escaped_size("çğ<"), "çğ&lt;".len());
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a<b>c"), "a&lt;b&gt;c");
        assert_eq!(escape("'\"&"), "&apos;&quot;&amp;");
        assert_eq!(escape("Чингис & хан"), "Чингис &amp; хан");
    }

    #[test]
    fn predefined_references() {
        assert_eq!(decode_reference(b"&lt;"), Reference::Char('<', 4));
        assert_eq!(decode_reference(b"&gt;rest"), Reference::Char('>', 4));
        assert_eq!(decode_reference(b"&amp;lt;"), Reference::Char('&', 5));
        assert_eq!(decode_reference(b"&apos;"), Reference::Char('\'', 6));
        assert_eq!(decode_reference(b"&quot;"), Reference::Char('"', 6));
        assert_eq!(decode_reference(b"&nbsp;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&;"), Reference::Invalid);
    }

    #[test]
    fn character_references() {
        assert_eq!(decode_reference(b"&#65;"), Reference::Char('A', 5));
        assert_eq!(decode_reference(b"&#x3b;"), Reference::Char(';', 6));
        assert_eq!(decode_reference(b"&#x3B;"), Reference::Char(';', 6));
        assert_eq!(decode_reference(b"&#x900;"), Reference::Char('\u{900}', 7));
        assert_eq!(decode_reference(b"&#x10abc;"), Reference::Char('\u{10abc}', 9));
        assert_eq!(decode_reference(b"&#x10FFFF;"), Reference::Char('\u{10ffff}', 10));
        assert_eq!(decode_reference(b"&#x110000;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#xD800;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#xFFFE;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#8;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#1a;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#X41;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#x;"), Reference::Invalid);
        assert_eq!(decode_reference(b"&#;"), Reference::Invalid);
    }

    #[test]
    fn incomplete_references() {
        assert_eq!(decode_reference(b"&"), Reference::Incomplete);
        assert_eq!(decode_reference(b"&am"), Reference::Incomplete);
        assert_eq!(decode_reference(b"&#x10FF"), Reference::Incomplete);
        assert_eq!(decode_reference(b"&lt <"), Reference::Invalid);
        assert_eq!(decode_reference(b"&aaaaaaaaaaaaaaaa"), Reference::Invalid);
    }
}
