/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::borrow::Cow;
use std::slice::Iter;

use crate::arena::NodeId;

use super::Attribute;
use super::Cursor;
use super::Document;
use super::Payload;

/// One entry of an element's content list.
#[derive(Clone, Copy, Debug)]
pub enum Content<'a> {
    Element(Cursor<'a>),
    Text(&'a str),
}

impl<'a> Content<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Content<'a> {
        match &doc.arena[id].payload {
            Payload::Tag(_) => Content::Element(Cursor::new(doc, id)),
            Payload::Text(text) => Content::Text(text),
        }
    }
}

pub struct Children<'a> {
    doc: &'a Document,
    inner: Iter<'a, NodeId>,
}

impl<'a> Children<'a> {
    pub(super) fn new(doc: &'a Document, children: &'a [NodeId]) -> Self {
        Children {
            doc,
            inner: children.iter(),
        }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Content<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|id| Content::new(self.doc, *id))
    }
}

pub struct Elements<'a> {
    inner: Children<'a>,
}

impl<'a> Elements<'a> {
    pub(super) fn new(children: Children<'a>) -> Self {
        Elements { inner: children }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(|content| match content {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }
}

/// Pre-order walk over the elements below a starting element.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<Iter<'a, NodeId>>,
}

impl<'a> Descendants<'a> {
    pub(super) fn new(doc: &'a Document, children: &'a [NodeId]) -> Self {
        Descendants {
            doc,
            stack: vec![children.iter()],
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc: &'a Document = self.doc;
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(id) => {
                    if let Payload::Tag(tag) = &doc.arena[*id].payload {
                        self.stack.push(tag.children.iter());
                        return Some(Cursor::new(doc, *id));
                    }
                }
            }
        }
    }
}

/// An attribute together with the element owning it.
#[derive(Clone, Copy)]
pub struct AttributeRef<'a> {
    element: Cursor<'a>,
    attr: &'a Attribute,
}

impl<'a> AttributeRef<'a> {
    pub fn name(&self) -> &'a str {
        &self.attr.name
    }

    pub fn prefix(&self) -> Option<&'a str> {
        self.attr.prefix.as_deref()
    }

    pub fn qualified_name(&self) -> Cow<'a, str> {
        match &self.attr.prefix {
            None => Cow::Borrowed(&self.attr.name),
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.attr.name)),
        }
    }

    pub fn value(&self) -> &'a str {
        &self.attr.value
    }

    /// Explicit namespace of the attribute, or the one its prefix
    /// resolves to through the owning element.
    pub fn namespace(&self) -> &'a str {
        self.element.attribute_namespace(self.attr)
    }

    pub fn element(&self) -> Cursor<'a> {
        self.element
    }
}

impl std::fmt::Debug for AttributeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.qualified_name(), self.value())
    }
}

pub struct Attributes<'a> {
    element: Cursor<'a>,
    inner: Iter<'a, Attribute>,
}

impl<'a> Attributes<'a> {
    pub(super) fn new(element: Cursor<'a>, attributes: &'a [Attribute]) -> Self {
        Attributes {
            element,
            inner: attributes.iter(),
        }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = AttributeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.element;
        self.inner.next().map(|attr| AttributeRef { element, attr })
    }
}
