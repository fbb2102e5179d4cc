/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Incremental XML stream parsing for long lived protocol connections.
//!
//! The crate has three layers:
//!
//! * [Document] is an element tree with namespace aware attributes and
//!   mixed text and element content, read through [Cursor] views.
//! * [StreamParser] consumes arbitrarily chunked bytes and hands every
//!   completed top-level element to a [StreamHandler].
//! * [XPath] compiles a small path language and evaluates it against a
//!   cursor. The lenient [Cursor::find_all], [Cursor::find_first] and
//!   [Cursor::find_text] helpers wrap it for optional lookups.
//!
//! ```
//! use ikstream::{Document, StreamParser};
//!
//! let mut stanzas: Vec<Document> = Vec::new();
//! let mut parser = StreamParser::new();
//! let mut handler = |doc: Document| stanzas.push(doc);
//! parser.feed(&mut handler, b"<message to='romeo'><bo")?;
//! parser.feed(&mut handler, b"dy>hi</body></message>")?;
//! assert_eq!(stanzas.len(), 1);
//! assert_eq!(stanzas[0].root().find_text("body"), "hi");
//! # Ok::<(), ikstream::ParseError>(())
//! ```

mod arena;
mod chars;
mod document;
mod entities;
mod parser;
mod xpath;

pub use arena::ArenaStats;
pub use arena::NoMemory;
pub use arena::NodeId;

pub use chars::is_valid_text;
pub use chars::is_valid_xml_char;
pub use chars::text_from_bytes;

pub use document::AttributeRef;
pub use document::Attributes;
pub use document::Children;
pub use document::Content;
pub use document::Cursor;
pub use document::Descendants;
pub use document::Document;
pub use document::DocumentError;
pub use document::DocumentParser;
pub use document::Elements;

pub use parser::Location;
pub use parser::ParseError;
pub use parser::ParserConfig;
pub use parser::StreamHandler;
pub use parser::StreamParser;
pub use parser::constants;

pub use xpath::BadXPath;
pub use xpath::XPath;
