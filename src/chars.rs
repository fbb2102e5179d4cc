/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::DocumentError;
use crate::document::description;

/// Checks a code point against the XML `Char` production.
pub fn is_valid_xml_char(c: u32) -> bool {
    matches!(
        c,
        0x09 | 0x0a | 0x0d | 0x20..=0xd7ff | 0xe000..=0xfffd | 0x10000..=0x10ffff
    )
}

/// Quick check for bytes which can never appear in UTF-8 text.
///
/// Rejects the overlong lead bytes `0xC0` and `0xC1`, and every byte
/// from `0xF5` up. This is intentionally weaker than full UTF-8
/// validation; [text_from_bytes] does the complete check.
///
/// ```
/// assert!(ikstream::is_valid_text(b"plain ascii"));
/// assert!(!ikstream::is_valid_text(b"bad \xff byte"));
/// ```
pub fn is_valid_text(bytes: &[u8]) -> bool {
    !bytes.iter().any(|&b| b == 0xc0 || b == 0xc1 || b >= 0xf5)
}

/// Byte level check of the parser input.
///
/// Same as [is_valid_text] plus the ASCII control characters which are
/// not allowed anywhere in XML.
pub(crate) fn is_valid_byte(c: u8) -> bool {
    match c {
        b'\t' | b'\n' | b'\r' => true,
        0x00..0x20 | 0xc0 | 0xc1 | 0xf5..=0xff => false,
        _ => true,
    }
}

/// Converts raw bytes into text accepted by the [Document](crate::Document) API.
pub fn text_from_bytes(bytes: &[u8]) -> Result<&str, DocumentError> {
    if !is_valid_text(bytes) {
        return Err(DocumentError::BadXml(description::INVALID_TEXT));
    }
    let s = std::str::from_utf8(bytes)
        .map_err(|_| DocumentError::BadXml(description::INVALID_TEXT))?;
    check_text(s)?;
    Ok(s)
}

pub(crate) fn check_text(s: &str) -> Result<(), DocumentError> {
    if s.chars().all(|c| is_valid_xml_char(c as u32)) {
        Ok(())
    } else {
        Err(DocumentError::BadXml(description::INVALID_TEXT))
    }
}

pub(crate) fn is_name_char(c: char) -> bool {
    !matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | '<' | '>' | '&' | '/' | '=' | '\'' | '"' | ':'
    ) && is_valid_xml_char(c as u32)
}

pub(crate) fn check_name(s: &str) -> Result<(), DocumentError> {
    if !s.is_empty() && s.chars().all(is_name_char) {
        Ok(())
    } else {
        Err(DocumentError::BadXml(description::INVALID_NAME))
    }
}

/// Splits `prefix:local` into its parts, validating both.
pub(crate) fn split_qualified(name: &str) -> Result<(Option<&str>, &str), DocumentError> {
    match name.split_once(':') {
        Some((prefix, local)) => {
            check_name(prefix)?;
            check_name(local)?;
            Ok((Some(prefix), local))
        }
        None => {
            check_name(name)?;
            Ok((None, name))
        }
    }
}
