/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod config;
mod error;
mod location;

use std::borrow::Cow;

use tracing::debug;
use tracing::trace;

use crate::Document;
use crate::DocumentError;
use crate::NoMemory;
use crate::chars::is_valid_byte;
use crate::document::DocumentBuilder;
use crate::document::NamespaceScope;
use crate::entities::Reference;
use crate::entities::decode_reference;

pub use config::ParserConfig;
pub use config::constants;
pub use error::ParseError;
use error::description;
pub use location::Location;

/// Receiver of the parsed elements.
///
/// Any `FnMut(Document)` closure is a handler which ignores the end of
/// the stream.
pub trait StreamHandler {
    /// Called with each completed top-level element, and with the
    /// streaming root as soon as its start tag is parsed.
    fn handle_element(&mut self, element: Document);

    /// Called when the end tag of the streaming root is parsed.
    fn handle_stream_end(&mut self) {}
}

impl<F: FnMut(Document)> StreamHandler for F {
    fn handle_element(&mut self, element: Document) {
        self(element)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum State {
    #[default]
    Initial,
    Content,
    TagOpening,
    TagName,
    TagInside,
    AttributeName,
    AttributeNameComplete,
    AttributeEqual,
    AttributeValue,
    AttributeValueComplete,
    EmptyTagEnd,
    EndTagStart,
    EndTagName,
    EndTagWhitespace,
    CDataSection,
    Comment,
    ProcessingInstruction,
    Doctype,
}

enum Step {
    Consume(usize),
    NeedMore,
}

enum Scan {
    Found,
    NotFound,
    Insufficient,
}

/// Checks whether `needle` starts at `data[pos]`.
///
/// Insufficient means the input ends with a proper prefix of the needle.
fn forward_scan(data: &[u8], pos: usize, needle: &[u8]) -> Scan {
    let rest = &data[pos..];
    if rest.len() >= needle.len() {
        if rest.starts_with(needle) {
            Scan::Found
        } else {
            Scan::NotFound
        }
    } else if needle.starts_with(rest) {
        Scan::Insufficient
    } else {
        Scan::NotFound
    }
}

const CDATA_START: &[u8] = b"![CDATA[";
const CDATA_END: &[u8] = b"]]>";
const COMMENT_START: &[u8] = b"!--";
const COMMENT_END: &[u8] = b"-->";
const DOCTYPE_START: &[u8] = b"!DOCTYPE";
const PI_END: &[u8] = b"?>";

macro_rules! whitespace {
    () => {
        b' ' | b'\t' | b'\r' | b'\n'
    };
}

macro_rules! name_breaker {
    () => {
        b'<' | b'&' | b'=' | b'\'' | b'"'
    };
}

macro_rules! xml_error {
    ($self:ident, $a:ident) => {
        return Err($self.bad_xml(description::$a))
    };
}

fn push_bytes(buffer: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ParseError> {
    if buffer.capacity() - buffer.len() < bytes.len() {
        let diff = std::cmp::max(bytes.len(), buffer.capacity());
        buffer.try_reserve_exact(diff).map_err(NoMemory::from)?;
    }
    buffer.extend_from_slice(bytes);
    Ok(())
}

fn tree_error(err: DocumentError, location: Location) -> ParseError {
    match err {
        DocumentError::NoMemory => ParseError::NoMemory,
        DocumentError::BadXml(description) => ParseError::BadXml {
            location,
            description,
        },
    }
}

#[derive(Debug)]
struct OpenStream {
    name: String,
    scope: NamespaceScope,
}

#[derive(Debug)]
struct ParserState {
    state: State,
    name: Vec<u8>,
    attr_name: Vec<u8>,
    attr_value: Vec<u8>,
    quote: u8,
    attributes: Vec<(String, String)>,
    text: Vec<u8>,
    backbuffer: Vec<u8>,
    builder: DocumentBuilder,
    stream: Option<OpenStream>,
    seen_root: bool,
    in_subset: bool,
    name_location: Location,
    location: Location,
}

impl ParserState {
    fn new(config: &ParserConfig) -> ParserState {
        ParserState {
            state: State::Initial,
            name: Vec::with_capacity(config.buffer_capacity),
            attr_name: Vec::with_capacity(config.buffer_capacity),
            attr_value: Vec::with_capacity(config.buffer_capacity),
            quote: b'\'',
            attributes: Vec::new(),
            text: Vec::with_capacity(config.buffer_capacity),
            backbuffer: Vec::new(),
            builder: DocumentBuilder::new(),
            stream: None,
            seen_root: false,
            in_subset: false,
            name_location: Location::new(),
            location: Location::new(),
        }
    }
}

/// Incremental XML parser for endless streams of elements.
///
/// Bytes can be fed in chunks of any size, split at any position, even
/// inside a multi-byte character or a reference. Every completed
/// top-level element is delivered to the handler as a [Document].
///
/// When the configured streaming root (`<stream:stream>` in the
/// `http://etherx.jabber.org/streams` namespace by default) is seen,
/// it is delivered right after its start tag, and its children become
/// the top-level elements. Those children inherit the namespace
/// bindings of the root.
///
/// ```
/// use ikstream::{Document, StreamParser};
///
/// let mut elements: Vec<Document> = Vec::new();
/// let mut parser = StreamParser::new();
/// let mut handler = |doc: Document| elements.push(doc);
/// parser.feed(
///     &mut handler,
///     b"<stream:stream xmlns='jabber:client' \
///       xmlns:stream='http://etherx.jabber.org/streams'><presence/>",
/// )?;
/// assert_eq!(elements.len(), 2);
/// assert_eq!(elements[0].root().name(), "stream");
/// assert_eq!(elements[1].root().namespace(), "jabber:client");
/// # Ok::<(), ikstream::ParseError>(())
/// ```
///
/// Errors are fatal for the stream. The parser resets itself before
/// returning one, so the next call starts a fresh stream.
#[derive(Debug)]
pub struct StreamParser {
    config: ParserConfig,
    state: ParserState,
}

impl StreamParser {
    /// Creates a parser with the default configuration.
    pub fn new() -> StreamParser {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> StreamParser {
        let state = ParserState::new(&config);
        StreamParser { config, state }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Discards all partial state and starts over at the stream beginning.
    pub fn reset(&mut self) {
        self.state = ParserState::new(&self.config);
    }

    /// Position of the next byte to be parsed.
    pub fn location(&self) -> Location {
        self.state.location
    }

    /// Number of currently open elements, excluding the streaming root.
    pub fn depth(&self) -> usize {
        self.state.builder.depth()
    }

    pub fn is_stream_open(&self) -> bool {
        self.state.stream.is_some()
    }

    /// Parses the next chunk of the stream.
    ///
    /// Elements completed by this chunk are delivered to `handler` in
    /// document order before the call returns. Trailing bytes which
    /// cannot be decided yet are kept for the next call.
    pub fn feed(
        &mut self,
        handler: &mut impl StreamHandler,
        bytes: &[u8],
    ) -> Result<(), ParseError> {
        let result = self.parse(handler, bytes);
        if let Err(err) = &result {
            debug!(%err, "stream parse failed, resetting");
            self.reset();
        }
        result
    }

    /// Checks that the input ended at a clean boundary.
    ///
    /// Does not reset the parser, call [reset()](StreamParser::reset)
    /// to reuse it for another stream.
    pub fn finish(&self) -> Result<(), ParseError> {
        let fail = |description| {
            Err(ParseError::BadXml {
                location: self.state.location,
                description,
            })
        };
        if self.state.builder.is_open() {
            return fail(description::DOC_OPEN_TAGS);
        }
        if self.state.state != State::Initial || !self.state.backbuffer.is_empty() {
            return fail(description::DOC_OPEN_MARKUP);
        }
        if self.state.stream.is_some() {
            return fail(description::DOC_OPEN_STREAM);
        }
        if self.config.single_document && !self.state.seen_root {
            return fail(description::DOC_NO_CONTENT);
        }
        Ok(())
    }

    fn bad_xml(&self, description: &'static str) -> ParseError {
        ParseError::BadXml {
            location: self.state.location,
            description,
        }
    }

    fn parse(&mut self, handler: &mut impl StreamHandler, bytes: &[u8]) -> Result<(), ParseError> {
        let data: Cow<[u8]> = if self.state.backbuffer.is_empty() {
            Cow::Borrowed(bytes)
        } else {
            let mut joined = std::mem::take(&mut self.state.backbuffer);
            push_bytes(&mut joined, bytes)?;
            Cow::Owned(joined)
        };

        let mut pos = 0;
        while pos < data.len() {
            if !is_valid_byte(data[pos]) {
                xml_error!(self, BYTE_INVALID);
            }
            match self.step(handler, &data, pos)? {
                Step::Consume(len) => {
                    for &c in &data[pos..pos + len] {
                        self.state.location.advance(c);
                    }
                    pos += len;
                }
                Step::NeedMore => {
                    trace!(bytes = data.len() - pos, "waiting for more input");
                    push_bytes(&mut self.state.backbuffer, &data[pos..])?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn step(
        &mut self,
        handler: &mut impl StreamHandler,
        data: &[u8],
        pos: usize,
    ) -> Result<Step, ParseError> {
        let c = data[pos];
        match self.state.state {
            State::Initial => match c {
                whitespace!() => (),
                b'<' => self.state.state = State::TagOpening,
                _ => xml_error!(self, DOC_CDATA_WITHOUT_PARENT),
            },
            State::Content => match c {
                b'<' => {
                    self.flush_text()?;
                    self.state.state = State::TagOpening;
                }
                b'&' => return self.reference(data, pos, false),
                _ => push_bytes(&mut self.state.text, &[c])?,
            },
            State::TagOpening => match c {
                b'/' => {
                    if !self.state.builder.is_open() && self.state.stream.is_none() {
                        xml_error!(self, TAG_CLOSE_WITHOUT_OPEN);
                    }
                    self.state.state = State::EndTagStart;
                }
                b'?' => self.state.state = State::ProcessingInstruction,
                b'!' => return self.markup(data, pos),
                whitespace!() => xml_error!(self, TAG_WHITESPACE_START),
                b'>' => xml_error!(self, TAG_EMPTY_NAME),
                name_breaker!() | b':' => xml_error!(self, TAG_BAD_NAME),
                _ => {
                    if self.config.single_document
                        && self.state.seen_root
                        && !self.state.builder.is_open()
                    {
                        xml_error!(self, TAG_OUTSIDE_ROOT);
                    }
                    self.state.name.clear();
                    self.state.attributes.clear();
                    push_bytes(&mut self.state.name, &[c])?;
                    self.state.state = State::TagName;
                }
            },
            State::TagName => match c {
                whitespace!() => self.state.state = State::TagInside,
                b'/' => self.state.state = State::EmptyTagEnd,
                b'>' => self.open_tag(handler)?,
                b':' => {
                    if self.state.name.contains(&b':') {
                        xml_error!(self, TAG_DOUBLE_PREFIX);
                    }
                    push_bytes(&mut self.state.name, &[c])?;
                }
                name_breaker!() => xml_error!(self, TAG_BAD_NAME),
                _ => push_bytes(&mut self.state.name, &[c])?,
            },
            State::TagInside => match c {
                whitespace!() => (),
                b'/' => self.state.state = State::EmptyTagEnd,
                b'>' => self.open_tag(handler)?,
                name_breaker!() | b':' => xml_error!(self, TAG_ATTRIBUTE_BAD_NAME),
                _ => {
                    self.state.attr_name.clear();
                    push_bytes(&mut self.state.attr_name, &[c])?;
                    self.state.state = State::AttributeName;
                }
            },
            State::AttributeName => match c {
                whitespace!() => self.state.state = State::AttributeNameComplete,
                b'=' => self.state.state = State::AttributeEqual,
                b':' => {
                    if self.state.attr_name.contains(&b':') {
                        xml_error!(self, TAG_DOUBLE_PREFIX);
                    }
                    push_bytes(&mut self.state.attr_name, &[c])?;
                }
                b'/' | b'>' | b'<' | b'&' | b'\'' | b'"' => {
                    xml_error!(self, TAG_ATTRIBUTE_BAD_NAME)
                }
                _ => push_bytes(&mut self.state.attr_name, &[c])?,
            },
            State::AttributeNameComplete => match c {
                whitespace!() => (),
                b'=' => self.state.state = State::AttributeEqual,
                _ => xml_error!(self, TAG_ATTRIBUTE_WITHOUT_EQUAL),
            },
            State::AttributeEqual => match c {
                whitespace!() => (),
                b'\'' | b'"' => {
                    self.state.quote = c;
                    self.state.attr_value.clear();
                    self.state.state = State::AttributeValue;
                }
                _ => xml_error!(self, TAG_ATTRIBUTE_WITHOUT_QUOTE),
            },
            State::AttributeValue => match c {
                _ if c == self.state.quote => {
                    self.finish_attribute()?;
                    self.state.state = State::AttributeValueComplete;
                }
                b'<' => xml_error!(self, TAG_ATTRIBUTE_BAD_VALUE),
                b'&' => return self.reference(data, pos, true),
                _ => push_bytes(&mut self.state.attr_value, &[c])?,
            },
            State::AttributeValueComplete => match c {
                whitespace!() => self.state.state = State::TagInside,
                b'/' => self.state.state = State::EmptyTagEnd,
                b'>' => self.open_tag(handler)?,
                _ => xml_error!(self, TAG_ATTRIBUTE_NO_SPACE),
            },
            State::EmptyTagEnd => match c {
                b'>' => {
                    self.open_tag(handler)?;
                    self.close_element(handler);
                }
                _ => xml_error!(self, TAG_EMPTY_TAG_MISSING_END),
            },
            State::EndTagStart => match c {
                whitespace!() | b'>' => xml_error!(self, TAG_EMPTY_NAME),
                b'/' | name_breaker!() | b':' => xml_error!(self, TAG_BAD_NAME),
                _ => {
                    self.state.name.clear();
                    push_bytes(&mut self.state.name, &[c])?;
                    self.state.name_location = self.state.location;
                    self.state.state = State::EndTagName;
                }
            },
            State::EndTagName => match c {
                whitespace!() => self.state.state = State::EndTagWhitespace,
                b'>' => self.end_tag(handler)?,
                b'/' => xml_error!(self, TAG_DOUBLE_END),
                b':' => {
                    if self.state.name.contains(&b':') {
                        xml_error!(self, TAG_DOUBLE_PREFIX);
                    }
                    push_bytes(&mut self.state.name, &[c])?;
                }
                name_breaker!() => xml_error!(self, TAG_BAD_NAME),
                _ => push_bytes(&mut self.state.name, &[c])?,
            },
            State::EndTagWhitespace => match c {
                whitespace!() => (),
                b'>' => self.end_tag(handler)?,
                _ => xml_error!(self, TAG_END_TAG_ATTRIBUTES),
            },
            State::CDataSection => match c {
                b']' => match forward_scan(data, pos, CDATA_END) {
                    Scan::Found => {
                        self.state.state = State::Content;
                        return Ok(Step::Consume(CDATA_END.len()));
                    }
                    Scan::Insufficient => return Ok(Step::NeedMore),
                    Scan::NotFound => push_bytes(&mut self.state.text, &[c])?,
                },
                _ => push_bytes(&mut self.state.text, &[c])?,
            },
            State::Comment => {
                if c == b'-' {
                    match forward_scan(data, pos, COMMENT_END) {
                        Scan::Found => {
                            self.state.state = self.after_markup();
                            return Ok(Step::Consume(COMMENT_END.len()));
                        }
                        Scan::Insufficient => return Ok(Step::NeedMore),
                        Scan::NotFound => {
                            if data.get(pos + 1) == Some(&b'-') {
                                xml_error!(self, COMMENT_DOUBLE_DASH);
                            }
                        }
                    }
                }
            }
            State::ProcessingInstruction => {
                if c == b'?' {
                    match forward_scan(data, pos, PI_END) {
                        Scan::Found => {
                            self.state.state = self.after_markup();
                            return Ok(Step::Consume(PI_END.len()));
                        }
                        Scan::Insufficient => return Ok(Step::NeedMore),
                        Scan::NotFound => (),
                    }
                }
            }
            State::Doctype => match c {
                b'[' => self.state.in_subset = true,
                b']' => self.state.in_subset = false,
                b'>' if !self.state.in_subset => self.state.state = State::Initial,
                _ => (),
            },
        }
        Ok(Step::Consume(1))
    }

    fn after_markup(&self) -> State {
        if self.state.builder.is_open() {
            State::Content
        } else {
            State::Initial
        }
    }

    fn markup(&mut self, data: &[u8], pos: usize) -> Result<Step, ParseError> {
        let mut undecided = false;
        for needle in [CDATA_START, COMMENT_START, DOCTYPE_START] {
            match forward_scan(data, pos, needle) {
                Scan::Found => {
                    self.start_markup(needle)?;
                    return Ok(Step::Consume(needle.len()));
                }
                Scan::Insufficient => undecided = true,
                Scan::NotFound => (),
            }
        }
        if undecided {
            return Ok(Step::NeedMore);
        }
        xml_error!(self, MARKUP_UNRECOGNIZED);
    }

    fn start_markup(&mut self, needle: &[u8]) -> Result<(), ParseError> {
        if needle == CDATA_START {
            if !self.state.builder.is_open() {
                xml_error!(self, MARKUP_CDATA_SECTION_OUTSIDE_ROOT);
            }
            self.state.state = State::CDataSection;
        } else if needle == COMMENT_START {
            self.state.state = State::Comment;
        } else {
            if self.state.builder.is_open()
                || self.state.stream.is_some()
                || self.state.seen_root
            {
                xml_error!(self, MARKUP_DOCTYPE_MISPLACED);
            }
            self.state.in_subset = false;
            self.state.state = State::Doctype;
        }
        Ok(())
    }

    fn reference(&mut self, data: &[u8], pos: usize, in_value: bool) -> Result<Step, ParseError> {
        match decode_reference(&data[pos..]) {
            Reference::Char(c, len) => {
                let mut buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut buf);
                let target = if in_value {
                    &mut self.state.attr_value
                } else {
                    &mut self.state.text
                };
                push_bytes(target, encoded.as_bytes())?;
                Ok(Step::Consume(len))
            }
            Reference::Incomplete => Ok(Step::NeedMore),
            Reference::Invalid => Err(self.bad_xml(description::REFERENCE_INVALID)),
        }
    }

    fn utf8(&self, bytes: &[u8]) -> Result<String, ParseError> {
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(self.bad_xml(description::UTF8_INVALID)),
        }
    }

    fn flush_text(&mut self) -> Result<(), ParseError> {
        if self.state.text.is_empty() {
            return Ok(());
        }
        let text = self.utf8(&self.state.text)?;
        let location = self.state.location;
        self.state
            .builder
            .add_text(&text)
            .map_err(|err| tree_error(err, location))?;
        self.state.text.clear();
        Ok(())
    }

    fn finish_attribute(&mut self) -> Result<(), ParseError> {
        let name = self.utf8(&self.state.attr_name)?;
        let value = self.utf8(&self.state.attr_value)?;
        self.state
            .attributes
            .try_reserve(1)
            .map_err(NoMemory::from)?;
        self.state.attributes.push((name, value));
        self.state.attr_name.clear();
        self.state.attr_value.clear();
        Ok(())
    }

    fn open_tag(&mut self, handler: &mut impl StreamHandler) -> Result<(), ParseError> {
        let name = self.utf8(&self.state.name)?;
        self.state.name.clear();
        let attributes = std::mem::take(&mut self.state.attributes);
        let top_level = !self.state.builder.is_open();
        let location = self.state.location;

        let scope = self.state.stream.as_ref().map(|open| &open.scope);
        self.state
            .builder
            .open_tag(&name, &attributes, scope)
            .map_err(|err| tree_error(err, location))?;
        self.state.state = State::Content;

        if top_level && self.state.stream.is_none() {
            let opens_stream = self.state.builder.peek().map(|doc| {
                let root = doc.root();
                self.config.is_stream_root(root.name(), root.namespace())
            });
            if opens_stream == Some(true) {
                if let Some(doc) = self.state.builder.take() {
                    let scope = NamespaceScope::of(doc.root());
                    debug!(name = %name, namespace = doc.root().namespace(), "stream opened");
                    self.state.stream = Some(OpenStream { name, scope });
                    self.state.seen_root = true;
                    handler.handle_element(doc);
                }
                self.state.state = State::Initial;
            }
        }
        Ok(())
    }

    fn end_tag(&mut self, handler: &mut impl StreamHandler) -> Result<(), ParseError> {
        let name = self.utf8(&self.state.name)?;
        self.state.name.clear();
        let matches = match self.state.builder.current_name() {
            Some(current) => current == name,
            None => self
                .state
                .stream
                .as_ref()
                .is_some_and(|open| open.name == name),
        };
        if !matches {
            return Err(ParseError::BadXml {
                location: self.state.name_location,
                description: description::TAG_MISMATCH,
            });
        }
        self.close_element(handler);
        Ok(())
    }

    fn close_element(&mut self, handler: &mut impl StreamHandler) {
        if self.state.builder.is_open() {
            if let Some(doc) = self.state.builder.close_tag() {
                debug!(name = %doc.root().qualified_name(), "element completed");
                self.state.seen_root = true;
                handler.handle_element(doc);
            }
        } else if self.state.stream.take().is_some() {
            debug!("stream closed");
            handler.handle_stream_end();
        }
        self.state.state = self.after_markup();
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
