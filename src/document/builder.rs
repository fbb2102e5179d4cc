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

use crate::arena::NodeId;

use super::Document;
use super::DocumentError;
use super::NamespaceScope;
use super::description;

/// Assembles one top-level element from parser events.
#[derive(Debug, Default)]
pub(crate) struct DocumentBuilder {
    doc: Option<Document>,
    stack: Vec<NodeId>,
}

impl DocumentBuilder {
    pub(crate) fn new() -> Self {
        DocumentBuilder {
            doc: None,
            stack: Vec::new(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens an element with all of its attributes.
    ///
    /// A new top-level element starts with the bindings of `scope`,
    /// which its own declarations then override.
    pub(crate) fn open_tag(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
        scope: Option<&NamespaceScope>,
    ) -> Result<(), DocumentError> {
        for (i, (attr_name, _)) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|(other, _)| other == attr_name) {
                return Err(DocumentError::BadXml(description::DUPLICATE_ATTRIBUTE));
            }
        }

        let (doc, id) = match (&mut self.doc, self.stack.last()) {
            (Some(doc), Some(parent)) => {
                let id = doc.append_child(*parent, name)?;
                (doc, id)
            }
            (slot, _) => {
                let mut doc = Document::new(name)?;
                let root = doc.root_id();
                if let Some(scope) = scope {
                    doc.inherit_scope(root, scope)?;
                }
                (slot.insert(doc), root)
            }
        };
        doc.push_attributes(id, attributes)?;
        self.stack.push(id);
        Ok(())
    }

    pub(crate) fn add_text(&mut self, text: &str) -> Result<(), DocumentError> {
        match (&mut self.doc, self.stack.last()) {
            (Some(doc), Some(id)) => doc.add_text(*id, text),
            _ => Err(DocumentError::BadXml(description::NO_DOCUMENT)),
        }
    }

    pub(crate) fn peek(&self) -> Option<&Document> {
        self.doc.as_ref()
    }

    /// Qualified name of the innermost open element.
    pub(crate) fn current_name(&self) -> Option<Cow<'_, str>> {
        let doc = self.doc.as_ref()?;
        let id = self.stack.last()?;
        doc.cursor(*id).map(|cursor| cursor.qualified_name())
    }

    /// Closes the innermost element, returning the document once the
    /// top-level element is closed.
    pub(crate) fn close_tag(&mut self) -> Option<Document> {
        self.stack.pop();
        if self.stack.is_empty() {
            self.doc.take()
        } else {
            None
        }
    }

    /// Hands over the document with its elements still open.
    pub(crate) fn take(&mut self) -> Option<Document> {
        self.stack.clear();
        self.doc.take()
    }
}
