/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod builder;
mod error;
mod iterators;
mod parser;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Write;
use std::str::FromStr;

use crate::NoMemory;
use crate::arena::Arena;
use crate::arena::ArenaStats;
use crate::arena::NodeId;
use crate::chars::check_name;
use crate::chars::check_text;
use crate::chars::split_qualified;
use crate::entities::escape_fmt;
use crate::entities::escaped_size;

pub(crate) use builder::DocumentBuilder;
pub use error::DocumentError;
pub(crate) use error::description;
pub use iterators::AttributeRef;
pub use iterators::Attributes;
pub use iterators::Children;
pub use iterators::Content;
pub use iterators::Descendants;
pub use iterators::Elements;
pub use parser::DocumentParser;

const XMLNS: &str = "xmlns";

#[derive(Clone, Debug)]
struct Attribute {
    prefix: Option<String>,
    name: String,
    value: String,
}

impl Attribute {
    fn is_named(&self, prefix: Option<&str>, name: &str) -> bool {
        self.prefix.as_deref() == prefix && self.name == name
    }

    fn is_default_namespace_declaration(&self) -> bool {
        self.is_named(None, XMLNS)
    }

    fn is_declaration(&self) -> bool {
        is_declaration(self.prefix.as_deref(), &self.name)
    }
}

fn is_declaration(prefix: Option<&str>, name: &str) -> bool {
    match prefix {
        None => name == XMLNS,
        Some(prefix) => prefix == XMLNS,
    }
}

#[derive(Clone, Debug)]
struct Tag {
    prefix: Option<String>,
    name: String,
    xmlns: String,
    namespaces: BTreeMap<String, String>,
    attributes: Vec<Attribute>,
    children: Vec<NodeId>,
}

impl Tag {
    fn new(prefix: Option<&str>, name: &str) -> Tag {
        Tag {
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
            xmlns: String::new(),
            namespaces: BTreeMap::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn write_name<W: Write>(prefix: Option<&str>, name: &str, w: &mut W) -> std::fmt::Result {
        if let Some(prefix) = prefix {
            w.write_str(prefix)?;
            w.write_char(':')?;
        }
        w.write_str(name)
    }

    fn name_size(prefix: Option<&str>, name: &str) -> usize {
        prefix.map_or(0, |prefix| prefix.len() + 1) + name.len()
    }

    /// Records `xmlns` and `xmlns:prefix` attributes as bindings.
    fn declare(&mut self, prefix: Option<&str>, name: &str, value: &str) {
        match prefix {
            None if name == XMLNS => self.xmlns = value.to_string(),
            Some(XMLNS) => {
                self.namespaces.insert(name.to_string(), value.to_string());
            }
            _ => (),
        }
    }
}

#[derive(Clone, Debug)]
enum Payload {
    Tag(Tag),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<NodeId>,
    payload: Payload,
}

/// Namespace bindings visible at an element.
///
/// Used to carry the context of an enclosing element over to a
/// detached copy, so that names keep resolving the same way.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct NamespaceScope {
    default: String,
    prefixes: BTreeMap<String, String>,
}

impl NamespaceScope {
    pub(crate) fn of(cursor: Cursor) -> NamespaceScope {
        let mut prefixes = BTreeMap::new();
        let chain: Vec<Cursor> = cursor.ancestors_or_self().collect();
        for element in chain.iter().rev() {
            for (prefix, uri) in &element.tag().namespaces {
                prefixes.insert(prefix.clone(), uri.clone());
            }
        }
        NamespaceScope {
            default: cursor.default_namespace().to_string(),
            prefixes,
        }
    }
}

enum VisitorStep<'a> {
    StartTag(&'a Tag),
    EndTag(&'a Tag),
    Text(&'a str),
}

struct Visitor<'a> {
    doc: &'a Document,
    start: Option<&'a Tag>,
    stack: Vec<(&'a Tag, usize)>,
}

impl<'a> Visitor<'a> {
    fn new(cursor: Cursor<'a>) -> Visitor<'a> {
        Visitor {
            doc: cursor.doc,
            start: Some(cursor.tag()),
            stack: Vec::new(),
        }
    }

    fn next(&mut self) -> Option<VisitorStep<'a>> {
        if let Some(tag) = self.start.take() {
            self.stack.push((tag, 0));
            return Some(VisitorStep::StartTag(tag));
        }
        let doc: &'a Document = self.doc;
        let top = self.stack.last_mut()?;
        let tag: &'a Tag = top.0;
        if top.1 < tag.children.len() {
            let child = tag.children[top.1];
            top.1 += 1;
            match &doc.arena[child].payload {
                Payload::Text(text) => Some(VisitorStep::Text(text)),
                Payload::Tag(child_tag) => {
                    self.stack.push((child_tag, 0));
                    Some(VisitorStep::StartTag(child_tag))
                }
            }
        } else {
            self.stack.pop();
            Some(VisitorStep::EndTag(tag))
        }
    }
}

/// An XML element tree.
///
/// Every node lives in an arena owned by the document, and is
/// addressed with a [NodeId]. Edits are document methods taking the
/// id of the element to change; reading and querying goes through
/// [Cursor] views returned by [root()](Document::root) and
/// [cursor()](Document::cursor).
///
/// ```
/// use ikstream::Document;
///
/// let mut doc = Document::new("message")?;
/// let root = doc.root_id();
/// doc.set_namespace(root, "jabber:client", None)?;
/// doc.set_attribute(root, "to", "juliet@capulet.lit", None)?;
/// let body = doc.append_child(root, "body")?;
/// doc.set_text(body, "Art thou not Romeo?")?;
///
/// assert_eq!(
///     doc.to_string(),
///     "<message xmlns='jabber:client' to='juliet@capulet.lit'><body>Art thou not Romeo?</body></message>"
/// );
/// assert_eq!(doc.root().find_text("body"), "Art thou not Romeo?");
/// # Ok::<(), ikstream::DocumentError>(())
/// ```
#[derive(Clone)]
pub struct Document {
    arena: Arena<Node>,
    root: NodeId,
}

impl Document {
    /// Creates a document with a single, empty root element.
    ///
    /// The name can have a namespace prefix as in `stream:features`.
    pub fn new(name: &str) -> Result<Document, DocumentError> {
        let (prefix, local) = split_qualified(name)?;
        let mut arena = Arena::new();
        let root = arena.alloc(Node {
            parent: None,
            payload: Payload::Tag(Tag::new(prefix, local)),
        })?;
        Ok(Document { arena, root })
    }

    pub fn root(&self) -> Cursor<'_> {
        Cursor::new(self, self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Returns a cursor for the element, or None if the id does not
    /// belong to a live element of this document.
    pub fn cursor(&self, id: NodeId) -> Option<Cursor<'_>> {
        match self.arena.get(id) {
            Some(Node {
                payload: Payload::Tag(_),
                ..
            }) => Some(Cursor::new(self, id)),
            _ => None,
        }
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    fn tag_mut(&mut self, id: NodeId) -> Result<&mut Tag, DocumentError> {
        match self.arena.get_mut(id) {
            Some(Node {
                payload: Payload::Tag(tag),
                ..
            }) => Ok(tag),
            _ => Err(DocumentError::BadXml(description::NOT_AN_ELEMENT)),
        }
    }

    fn checked_cursor(&self, id: NodeId) -> Result<Cursor<'_>, DocumentError> {
        self.cursor(id)
            .ok_or(DocumentError::BadXml(description::NOT_AN_ELEMENT))
    }

    fn alloc_child(&mut self, parent: NodeId, payload: Payload) -> Result<NodeId, DocumentError> {
        self.tag_mut(parent)?
            .children
            .try_reserve(1)
            .map_err(NoMemory::from)?;
        let id = self.arena.alloc(Node {
            parent: Some(parent),
            payload,
        })?;
        self.tag_mut(parent)?.children.push(id);
        Ok(id)
    }

    //
    // Edit methods
    //

    /// Appends a new child element to the content of `parent`.
    pub fn append_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, DocumentError> {
        let (prefix, local) = split_qualified(name)?;
        self.alloc_child(parent, Payload::Tag(Tag::new(prefix, local)))
    }

    /// Replaces every text run of the element with the given text.
    ///
    /// Child elements are kept in place. An empty text just removes
    /// the existing runs.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DocumentError> {
        check_text(text)?;
        let children = self.checked_cursor(id)?.tag().children.clone();
        let (texts, mut kept): (Vec<NodeId>, Vec<NodeId>) = children
            .into_iter()
            .partition(|child| matches!(self.arena[*child].payload, Payload::Text(_)));
        if !text.is_empty() {
            kept.try_reserve(1).map_err(NoMemory::from)?;
            let run = self.arena.alloc(Node {
                parent: Some(id),
                payload: Payload::Text(text.to_string()),
            })?;
            kept.push(run);
        }
        for run in texts {
            self.arena.free(run);
        }
        self.tag_mut(id)?.children = kept;
        Ok(())
    }

    /// Appends a new text run after the existing content.
    pub fn add_text(&mut self, id: NodeId, text: &str) -> Result<(), DocumentError> {
        check_text(text)?;
        self.checked_cursor(id)?;
        if text.is_empty() {
            return Ok(());
        }
        self.alloc_child(id, Payload::Text(text.to_string()))?;
        Ok(())
    }

    /// Inserts or replaces an attribute.
    ///
    /// The name can be prefixed (`xml:lang`). An existing attribute with
    /// the same local name and either the same namespace or the same
    /// prefix is replaced in place, keeping its position. Setting
    /// `xmlns` or `xmlns:prefix` also declares the namespace on the
    /// element, and such declarations only replace one of the same name.
    ///
    /// The namespace of an attribute always comes from its prefix. A
    /// given `namespace` must be the one that prefix is bound to here.
    /// An unprefixed name takes an in-scope prefix bound to it instead.
    /// Any other namespace is rejected.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<(), DocumentError> {
        let (prefix, local) = split_qualified(name)?;
        check_text(value)?;
        if let Some(namespace) = namespace {
            check_text(namespace)?;
        }
        let declaration = is_declaration(prefix, local);
        let (prefix, existing) = {
            let cursor = self.checked_cursor(id)?;
            let prefix = match namespace {
                Some(namespace) if namespace != cursor.lookup(prefix) => {
                    let bound = match prefix {
                        None if !declaration => cursor.prefix_for_namespace(namespace),
                        _ => None,
                    };
                    match bound {
                        Some(bound) if cursor.namespace_for_prefix(bound) == Some(namespace) => {
                            Some(bound.to_string())
                        }
                        _ => return Err(DocumentError::BadXml(description::UNBOUND_NAMESPACE)),
                    }
                }
                _ => prefix.map(str::to_string),
            };
            let resolved = cursor.lookup(prefix.as_deref());
            let existing = cursor.tag().attributes.iter().position(|attr| {
                attr.name == local
                    && (attr.prefix == prefix
                        || (!declaration
                            && !attr.is_declaration()
                            && cursor.attribute_namespace(attr) == resolved))
            });
            (prefix, existing)
        };

        let tag = self.tag_mut(id)?;
        if existing.is_none() {
            tag.attributes.try_reserve(1).map_err(NoMemory::from)?;
        }
        tag.declare(prefix.as_deref(), local, value);
        let attribute = Attribute {
            prefix,
            name: local.to_string(),
            value: value.to_string(),
        };
        match existing {
            Some(index) => tag.attributes[index] = attribute,
            None => tag.attributes.push(attribute),
        }
        Ok(())
    }

    /// Appends the attributes of a start tag as they were written.
    ///
    /// Nothing is merged, so attributes which only differ by a prefix
    /// declared later in the same tag are all kept.
    pub(crate) fn push_attributes(
        &mut self,
        id: NodeId,
        attributes: &[(String, String)],
    ) -> Result<(), DocumentError> {
        let mut parsed = Vec::new();
        parsed
            .try_reserve(attributes.len())
            .map_err(NoMemory::from)?;
        for (name, value) in attributes {
            let (prefix, local) = split_qualified(name)?;
            check_text(value)?;
            parsed.push(Attribute {
                prefix: prefix.map(str::to_string),
                name: local.to_string(),
                value: value.to_string(),
            });
        }

        let tag = self.tag_mut(id)?;
        tag.attributes
            .try_reserve(parsed.len())
            .map_err(NoMemory::from)?;
        for attr in parsed {
            tag.declare(attr.prefix.as_deref(), &attr.name, &attr.value);
            tag.attributes.push(attr);
        }
        Ok(())
    }

    /// Removes an attribute by its possibly prefixed name.
    ///
    /// Returns whether the attribute existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DocumentError> {
        let (prefix, local) = split_qualified(name)?;
        let tag = self.tag_mut(id)?;
        let Some(index) = tag
            .attributes
            .iter()
            .position(|attr| attr.is_named(prefix, local))
        else {
            return Ok(false);
        };
        tag.attributes.remove(index);
        match prefix {
            None if local == XMLNS => tag.xmlns.clear(),
            Some(XMLNS) => {
                tag.namespaces.remove(local);
            }
            _ => (),
        }
        Ok(true)
    }

    /// Declares a namespace on the element.
    ///
    /// Without a prefix this sets the default namespace and writes an
    /// `xmlns` attribute, otherwise it binds the prefix and writes an
    /// `xmlns:prefix` attribute.
    pub fn set_namespace(
        &mut self,
        id: NodeId,
        uri: &str,
        prefix: Option<&str>,
    ) -> Result<(), DocumentError> {
        match prefix.filter(|prefix| !prefix.is_empty()) {
            None => self.set_attribute(id, XMLNS, uri, None),
            Some(prefix) => {
                check_name(prefix)?;
                self.set_attribute(id, &format!("{XMLNS}:{prefix}"), uri, None)
            }
        }
    }

    pub fn set_prefix(&mut self, id: NodeId, prefix: Option<&str>) -> Result<(), DocumentError> {
        if let Some(prefix) = prefix {
            check_name(prefix)?;
        }
        self.tag_mut(id)?.prefix = prefix.map(str::to_string);
        Ok(())
    }

    /// Detaches the element from its parent and frees its subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DocumentError> {
        if id == self.root {
            return Err(DocumentError::BadXml(description::ROOT_REMOVE));
        }
        let parent = self
            .checked_cursor(id)?
            .parent()
            .map(|parent| parent.id)
            .ok_or(DocumentError::BadXml(description::NOT_AN_ELEMENT))?;
        self.tag_mut(parent)?.children.retain(|child| *child != id);

        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(Node {
                payload: Payload::Tag(tag),
                ..
            }) = self.arena.free(node)
            {
                stack.extend(tag.children);
            }
        }
        Ok(())
    }

    pub(crate) fn inherit_scope(&mut self, id: NodeId, scope: &NamespaceScope) -> Result<(), DocumentError> {
        let tag = self.tag_mut(id)?;
        if tag.xmlns.is_empty() {
            tag.xmlns = scope.default.clone();
        }
        for (prefix, uri) in &scope.prefixes {
            tag.namespaces
                .entry(prefix.clone())
                .or_insert_with(|| uri.clone());
        }
        Ok(())
    }

    fn copy_children(&mut self, dest: NodeId, source: Cursor) -> Result<(), DocumentError> {
        let mut stack = vec![(dest, source)];
        while let Some((dest, source)) = stack.pop() {
            for content in source.children() {
                match content {
                    Content::Text(text) => {
                        self.alloc_child(dest, Payload::Text(text.to_string()))?;
                    }
                    Content::Element(element) => {
                        let mut tag = element.tag().clone();
                        tag.children.clear();
                        let id = self.alloc_child(dest, Payload::Tag(tag))?;
                        stack.push((id, element));
                    }
                }
            }
        }
        Ok(())
    }

    //
    // Convenience functions to avoid typing .root() all the time
    //

    pub fn str_size(&self) -> usize {
        self.root().str_size()
    }

    #[allow(
        clippy::inherent_to_string_shadow_display,
        reason = "prereserving exact capacity makes this function significantly faster"
    )]
    pub fn to_string(&self) -> String {
        self.root().to_string()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.root(), f)
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document({})", self.root())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root().deep_eq(&other.root())
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = DocumentParser::new();
        parser.parse_bytes(s.as_bytes())?;
        parser.into_document()
    }
}

/// Read-only view of one element of a [Document].
///
/// Cursors are cheap to copy and borrow the document, so they cannot
/// outlive it or coexist with edits.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    doc: &'a Document,
    id: NodeId,
}

enum Flat<'a> {
    Text(Cow<'a, str>),
    Element(Cursor<'a>),
}

impl<'a> Cursor<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Cursor<'a> {
        Cursor { doc, id }
    }

    fn tag(&self) -> &'a Tag {
        match &self.doc.arena[self.id].payload {
            Payload::Tag(tag) => tag,
            Payload::Text(_) => unreachable!("cursor on a text node"),
        }
    }

    fn visitor(&self) -> Visitor<'a> {
        Visitor::new(*self)
    }

    fn ancestors_or_self(&self) -> impl Iterator<Item = Cursor<'a>> + use<'a> {
        std::iter::successors(Some(*self), |cursor| cursor.parent())
    }

    /// Namespace of a prefix, or the default namespace without one.
    fn lookup(&self, prefix: Option<&str>) -> &'a str {
        match prefix {
            None => self.default_namespace(),
            Some(prefix) => self.namespace_for_prefix(prefix).unwrap_or(""),
        }
    }

    fn attribute_namespace(&self, attr: &'a Attribute) -> &'a str {
        self.lookup(attr.prefix.as_deref())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Checks if both cursors point to the same element of the same document.
    pub fn is_same(&self, other: &Cursor) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }

    //
    // Navigation methods
    //

    pub fn parent(&self) -> Option<Cursor<'a>> {
        self.doc.arena[self.id]
            .parent
            .map(|parent| Cursor::new(self.doc, parent))
    }

    pub fn root(&self) -> Cursor<'a> {
        self.doc.root()
    }

    pub fn children(&self) -> Children<'a> {
        Children::new(self.doc, &self.tag().children)
    }

    pub fn elements(&self) -> Elements<'a> {
        Elements::new(self.children())
    }

    /// Iterates over every element below this one in document order.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants::new(self.doc, &self.tag().children)
    }

    pub fn attributes(&self) -> Attributes<'a> {
        Attributes::new(*self, &self.tag().attributes)
    }

    /// First child element with the given name.
    ///
    /// A prefixed name matches the prefixed element name, a plain name
    /// matches the local name.
    pub fn find_child(&self, name: &str) -> Option<Cursor<'a>> {
        self.elements().find(|element| element.has_name(name))
    }

    /// Child elements with the given name, optionally restricted to a namespace.
    pub fn find_children(&self, name: &str, namespace: Option<&str>) -> Vec<Cursor<'a>> {
        self.elements()
            .filter(|element| element.has_name(name))
            .filter(|element| namespace.is_none_or(|namespace| element.namespace() == namespace))
            .collect()
    }

    /// First child element with the given name which has the attribute,
    /// and if a value is given, which has that value.
    pub fn find_child_with_attribute(
        &self,
        name: &str,
        attribute: &str,
        value: Option<&str>,
    ) -> Option<Cursor<'a>> {
        self.elements().find(|element| {
            element.has_name(name)
                && match (element.attribute(attribute), value) {
                    (Some(found), Some(value)) => found == value,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
        })
    }

    //
    // Node property methods
    //

    pub fn name(&self) -> &'a str {
        &self.tag().name
    }

    pub fn prefix(&self) -> Option<&'a str> {
        self.tag().prefix.as_deref()
    }

    pub fn qualified_name(&self) -> Cow<'a, str> {
        let tag = self.tag();
        match &tag.prefix {
            None => Cow::Borrowed(&tag.name),
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, tag.name)),
        }
    }

    pub(crate) fn has_name(&self, name: &str) -> bool {
        match name.split_once(':') {
            Some((prefix, local)) => self.prefix() == Some(prefix) && self.name() == local,
            None => self.name() == name,
        }
    }

    /// Resolved namespace of the element name.
    ///
    /// Prefixed names resolve through the prefix declarations of this
    /// element and its ancestors. Plain names use the default namespace.
    /// Unresolvable names have the empty namespace.
    pub fn namespace(&self) -> &'a str {
        self.lookup(self.prefix())
    }

    /// The default namespace in effect at this element.
    pub fn default_namespace(&self) -> &'a str {
        for element in self.ancestors_or_self() {
            let tag = element.tag();
            if let Some(attr) = tag
                .attributes
                .iter()
                .find(|attr| attr.is_default_namespace_declaration())
            {
                return &attr.value;
            }
            if !tag.xmlns.is_empty() {
                return &tag.xmlns;
            }
        }
        ""
    }

    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&'a str> {
        self.ancestors_or_self()
            .find_map(|element| element.tag().namespaces.get(prefix))
            .map(String::as_str)
    }

    pub fn prefix_for_namespace(&self, uri: &str) -> Option<&'a str> {
        self.ancestors_or_self().find_map(|element| {
            element
                .tag()
                .namespaces
                .iter()
                .find(|(_, namespace)| namespace.as_str() == uri)
                .map(|(prefix, _)| prefix.as_str())
        })
    }

    /// Value of the attribute with the given, possibly prefixed, name.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };
        self.tag()
            .attributes
            .iter()
            .find(|attr| attr.is_named(prefix, local))
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Concatenated text runs of the element, not including descendants.
    pub fn text(&self) -> Cow<'a, str> {
        let mut result = Cow::Borrowed("");
        for content in self.children() {
            if let Content::Text(text) = content {
                if result.is_empty() {
                    result = Cow::Borrowed(text);
                } else {
                    result.to_mut().push_str(text);
                }
            }
        }
        result
    }

    /// Content list with adjacent text runs merged, empty runs skipped.
    fn flat_content(&self) -> Vec<Flat<'a>> {
        let mut flat: Vec<Flat<'a>> = Vec::new();
        for content in self.children() {
            match content {
                Content::Text("") => (),
                Content::Text(text) => match flat.last_mut() {
                    Some(Flat::Text(last)) => last.to_mut().push_str(text),
                    _ => flat.push(Flat::Text(Cow::Borrowed(text))),
                },
                Content::Element(element) => flat.push(Flat::Element(element)),
            }
        }
        flat
    }

    /// Deep structural equality.
    ///
    /// Compares names with their resolved namespaces, attributes as a
    /// set keyed by name and namespace, and the ordered content with
    /// adjacent text runs treated as one.
    pub fn deep_eq(&self, other: &Cursor) -> bool {
        if self.name() != other.name() || self.namespace() != other.namespace() {
            return false;
        }

        let attributes = &self.tag().attributes;
        let other_attributes = &other.tag().attributes;
        if attributes.len() != other_attributes.len() {
            return false;
        }
        let same_attributes = attributes.iter().all(|attr| {
            let namespace = self.attribute_namespace(attr);
            other_attributes.iter().any(|other_attr| {
                other_attr.name == attr.name
                    && other_attr.value == attr.value
                    && other.attribute_namespace(other_attr) == namespace
            })
        });
        if !same_attributes {
            return false;
        }

        let content = self.flat_content();
        let other_content = other.flat_content();
        content.len() == other_content.len()
            && content
                .iter()
                .zip(other_content.iter())
                .all(|pair| match pair {
                    (Flat::Text(a), Flat::Text(b)) => a == b,
                    (Flat::Element(a), Flat::Element(b)) => a.deep_eq(b),
                    _ => false,
                })
    }

    /// Copies the element and its subtree into a new document.
    ///
    /// Namespace bindings inherited from the ancestors are copied onto the
    /// new root, so the copy compares equal to this element.
    pub fn to_document(&self) -> Result<Document, DocumentError> {
        let mut doc = Document::new(&self.qualified_name())?;
        let root = doc.root;
        doc.tag_mut(root)?.attributes = self.tag().attributes.clone();
        doc.inherit_scope(root, &NamespaceScope::of(*self))?;
        doc.copy_children(root, *self)?;
        Ok(doc)
    }

    //
    // Serialization
    //

    fn write_xml<W: Write>(&self, w: &mut W) -> std::fmt::Result {
        let mut visitor = self.visitor();
        while let Some(step) = visitor.next() {
            match step {
                VisitorStep::StartTag(tag) => {
                    w.write_char('<')?;
                    Tag::write_name(tag.prefix.as_deref(), &tag.name, w)?;
                    for attr in &tag.attributes {
                        w.write_char(' ')?;
                        Tag::write_name(attr.prefix.as_deref(), &attr.name, w)?;
                        w.write_str("='")?;
                        escape_fmt(&attr.value, w)?;
                        w.write_char('\'')?;
                    }
                    if tag.children.is_empty() {
                        w.write_str("/>")?;
                    } else {
                        w.write_char('>')?;
                    }
                }
                VisitorStep::EndTag(tag) => {
                    if !tag.children.is_empty() {
                        w.write_str("</")?;
                        Tag::write_name(tag.prefix.as_deref(), &tag.name, w)?;
                        w.write_char('>')?;
                    }
                }
                VisitorStep::Text(text) => escape_fmt(text, w)?,
            }
        }
        Ok(())
    }

    pub fn str_size(&self) -> usize {
        let mut size = 0;
        let mut visitor = self.visitor();
        while let Some(step) = visitor.next() {
            match step {
                VisitorStep::StartTag(tag) => {
                    size += 1; // '<'
                    size += Tag::name_size(tag.prefix.as_deref(), &tag.name);
                    for attr in &tag.attributes {
                        size += 1; // space
                        size += Tag::name_size(attr.prefix.as_deref(), &attr.name);
                        size += 2; // ='
                        size += escaped_size(&attr.value);
                        size += 1; // '
                    }
                    if tag.children.is_empty() {
                        size += 2; // '/>'
                    } else {
                        size += 1;
                    }
                }
                VisitorStep::EndTag(tag) => {
                    if !tag.children.is_empty() {
                        size += 3; // '</' and '>'
                        size += Tag::name_size(tag.prefix.as_deref(), &tag.name);
                    }
                }
                VisitorStep::Text(text) => size += escaped_size(text),
            }
        }
        size
    }

    #[allow(
        clippy::inherent_to_string_shadow_display,
        reason = "prereserving exact capacity makes this function significantly faster"
    )]
    pub fn to_string(&self) -> String {
        let mut buf = String::with_capacity(self.str_size());
        // Writing into a String cannot fail
        let _ = self.write_xml(&mut buf);
        buf
    }
}

impl Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cursor({:?} <{}>)", self.id, self.qualified_name())
    }
}

impl Display for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_xml(f)
    }
}

#[cfg(test)]
mod tests;

mod nocompile;
