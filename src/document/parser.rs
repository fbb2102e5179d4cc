/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::Location;
use crate::ParserConfig;
use crate::StreamParser;

use super::Document;
use super::error::DocumentError;
use super::error::description;

/// Parses exactly one XML document, possibly given in several chunks.
///
/// ```
/// use ikstream::DocumentParser;
///
/// let mut parser = DocumentParser::new();
/// parser.parse_bytes(b"<doc><item id='1'/>")?;
/// parser.parse_bytes(b"<item id='2'/></doc>")?;
/// let doc = parser.into_document()?;
/// assert_eq!(doc.root().elements().count(), 2);
/// # Ok::<(), ikstream::DocumentError>(())
/// ```
pub struct DocumentParser {
    parser: StreamParser,
    document: Option<Document>,
}

impl DocumentParser {
    pub fn new() -> DocumentParser {
        DocumentParser {
            parser: StreamParser::with_config(ParserConfig::document()),
            document: None,
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<(), DocumentError> {
        let document = &mut self.document;
        let mut handler = |doc: Document| {
            *document = Some(doc);
        };
        Ok(self.parser.feed(&mut handler, bytes)?)
    }

    pub fn into_document(mut self) -> Result<Document, DocumentError> {
        self.take_document()
    }

    /// Returns the parsed document and makes the parser ready for the next one.
    pub fn take_document(&mut self) -> Result<Document, DocumentError> {
        self.parser.finish()?;
        self.parser.reset();
        self.document
            .take()
            .ok_or(DocumentError::BadXml(description::NO_DOCUMENT))
    }

    pub fn location(&self) -> Location {
        self.parser.location()
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}
