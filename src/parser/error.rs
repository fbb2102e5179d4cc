/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::error::Error;
use std::fmt::Display;

use crate::NoMemory;

use super::Location;

/// Error returned from the stream parser.
///
/// Both variants are fatal for the current stream: the parser has
/// already reset itself when [feed()](super::StreamParser::feed)
/// returns one, and can be reused for a fresh stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// Parser could not allocate the memory needed for parsing buffers.
    NoMemory,

    /// A syntax error is encountered in the input.
    ///
    /// The location points at the offending byte.
    BadXml {
        location: Location,
        description: &'static str,
    },
}

impl ParseError {
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::NoMemory => None,
            ParseError::BadXml { location, .. } => Some(*location),
        }
    }

    /// Byte offset of the offending byte in the stream.
    pub fn offset(&self) -> Option<usize> {
        self.location().map(|location| location.bytes)
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NoMemory => write!(f, "not enough memory"),
            ParseError::BadXml {
                location,
                description,
            } => write!(f, "invalid xml syntax at {}: {}", location, description),
        }
    }
}

impl Error for ParseError {}

impl From<NoMemory> for ParseError {
    fn from(_: NoMemory) -> Self {
        ParseError::NoMemory
    }
}

pub(super) mod description {
    pub(in super::super) const BYTE_INVALID: &str = "Invalid byte in the input";
    pub(in super::super) const UTF8_INVALID: &str = "Invalid UTF8 sequence";
    pub(in super::super) const DOC_NO_CONTENT: &str = "Document has no root tag";
    pub(in super::super) const DOC_OPEN_TAGS: &str = "Document has unclosed tags";
    pub(in super::super) const DOC_OPEN_MARKUP: &str = "Input ends inside a tag or markup";
    pub(in super::super) const DOC_OPEN_STREAM: &str = "Stream root is not closed";
    pub(in super::super) const DOC_CDATA_WITHOUT_PARENT: &str =
        "Character data not allowed outside of the root tag";
    pub(in super::super) const TAG_CLOSE_WITHOUT_OPEN: &str = "Close tag without open";
    pub(in super::super) const TAG_MISMATCH: &str = "Start and end tags have different names";
    pub(in super::super) const TAG_WHITESPACE_START: &str = "Tag cannot start with whitespace";
    pub(in super::super) const TAG_OUTSIDE_ROOT: &str = "Tags cannot be outside of the root tag";
    pub(in super::super) const TAG_EMPTY_NAME: &str = "Tag has no name";
    pub(in super::super) const TAG_BAD_NAME: &str = "Invalid character in a tag name";
    pub(in super::super) const TAG_DOUBLE_PREFIX: &str = "Name has more than one prefix";
    pub(in super::super) const TAG_DOUBLE_END: &str = "End tag has standalone ending too";
    pub(in super::super) const TAG_END_TAG_ATTRIBUTES: &str = "End tag cannot have attributes";
    pub(in super::super) const TAG_EMPTY_TAG_MISSING_END: &str =
        "Empty element tags must end after the '/'";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_EQUAL: &str =
        "Tag attributes must have '=' before the value";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_QUOTE: &str =
        "Tag attribute value must be double or single quotes";
    pub(in super::super) const TAG_ATTRIBUTE_BAD_NAME: &str =
        "Tag attribute names cannot have '/', '<' or '>'";
    pub(in super::super) const TAG_ATTRIBUTE_BAD_VALUE: &str =
        "Tag value cannot have '<' character without a reference";
    pub(in super::super) const TAG_ATTRIBUTE_NO_SPACE: &str =
        "Tag attributes must be separated with whitespace";
    pub(in super::super) const REFERENCE_INVALID: &str =
        "Invalid entity or character reference";
    pub(in super::super) const COMMENT_DOUBLE_DASH: &str =
        "Comments cannot contain a double dash";
    pub(in super::super) const MARKUP_CDATA_SECTION_OUTSIDE_ROOT: &str =
        "Character data sections cannot be outside of the root tag";
    pub(in super::super) const MARKUP_DOCTYPE_MISPLACED: &str =
        "Doctype can only appear before the root tag";
    pub(in super::super) const MARKUP_UNRECOGNIZED: &str =
        "Markup is not a comment, character data section, or document type declaration";
}
