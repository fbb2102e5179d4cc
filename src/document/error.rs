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
use crate::ParseError;

/// Error type of the tree editing and whole document parsing operations.
///
/// A failed edit leaves the document exactly as it was before the call.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum DocumentError {
    /// The node arena or a string buffer could not grow.
    NoMemory,
    /// The input was rejected. The argument describes why.
    BadXml(&'static str),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::NoMemory => write!(f, "not enough memory"),
            DocumentError::BadXml(msg) => write!(f, "invalid XML: {}", msg),
        }
    }
}

impl Error for DocumentError {}

impl From<ParseError> for DocumentError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::NoMemory => DocumentError::NoMemory,
            ParseError::BadXml { description, .. } => DocumentError::BadXml(description),
        }
    }
}

impl From<NoMemory> for DocumentError {
    fn from(_: NoMemory) -> Self {
        DocumentError::NoMemory
    }
}

pub(crate) mod description {
    pub(crate) const NO_DOCUMENT: &str = "no document parsed yet";
    pub(crate) const INVALID_TEXT: &str = "text contains characters not allowed in XML";
    pub(crate) const INVALID_NAME: &str = "invalid element or attribute name";
    pub(crate) const NOT_AN_ELEMENT: &str = "node is not an element of this document";
    pub(crate) const ROOT_REMOVE: &str = "root element cannot be removed";
    pub(crate) const DUPLICATE_ATTRIBUTE: &str = "attribute name already used in this tag";
    pub(crate) const UNBOUND_NAMESPACE: &str = "attribute namespace is not bound to its prefix";
}
