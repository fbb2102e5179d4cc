/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// Protocol names the parser knows about.
pub mod constants {
    /// Local name of the streaming root element.
    pub const STREAM_TAG: &str = "stream";

    /// Namespace of the streaming root element.
    pub const XMLNS_STREAM: &str = "http://etherx.jabber.org/streams";

    pub const XMLNS_CLIENT: &str = "jabber:client";

    pub const XMLNS_SERVER: &str = "jabber:server";
}

const INITIAL_BUFFER_CAPACITY: usize = 128;

/// Settings of a [StreamParser](super::StreamParser).
///
/// The default configuration recognizes the Jabber/XMPP stream root.
/// Options are set builder style:
///
/// ```
/// use ikstream::{ParserConfig, StreamParser};
///
/// let config = ParserConfig::default()
///     .stream_tag("session")
///     .stream_namespace(Some("urn:example:session"));
/// let parser = StreamParser::with_config(config);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParserConfig {
    pub(super) stream_tag: String,
    pub(super) stream_namespace: Option<String>,
    pub(super) emit_stream_root: bool,
    pub(super) single_document: bool,
    pub(super) buffer_capacity: usize,
}

impl ParserConfig {
    /// Configuration for parsing one standalone document.
    ///
    /// There is no streaming root and anything but whitespace, comments
    /// and processing instructions after the root element is an error.
    pub fn document() -> Self {
        ParserConfig {
            emit_stream_root: false,
            single_document: true,
            ..Self::default()
        }
    }

    /// Local name of the streaming root element.
    pub fn stream_tag(mut self, name: &str) -> Self {
        self.stream_tag = name.to_string();
        self
    }

    /// Required namespace of the streaming root, None accepts any.
    pub fn stream_namespace(mut self, namespace: Option<&str>) -> Self {
        self.stream_namespace = namespace.map(str::to_string);
        self
    }

    /// Whether the streaming root is delivered as soon as its open tag ends.
    ///
    /// When disabled, the root is an ordinary element delivered on close.
    pub fn emit_stream_root(mut self, emit: bool) -> Self {
        self.emit_stream_root = emit;
        self
    }

    /// Initial capacity of the name, value and text buffers.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub(super) fn is_stream_root(&self, name: &str, namespace: &str) -> bool {
        self.emit_stream_root
            && name == self.stream_tag
            && self
                .stream_namespace
                .as_deref()
                .is_none_or(|expected| expected == namespace)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            stream_tag: constants::STREAM_TAG.to_string(),
            stream_namespace: Some(constants::XMLNS_STREAM.to_string()),
            emit_stream_root: true,
            single_document: false,
            buffer_capacity: INITIAL_BUFFER_CAPACITY,
        }
    }
}
