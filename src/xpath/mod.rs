/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! A small path language for locating elements.
//!
//! Supported syntax:
//!
//! | Form | Selects |
//! |------|---------|
//! | `name`, `prefix:name` | child elements with that name |
//! | `*` | all child elements |
//! | `.`, `..` | the element itself, its parent |
//! | `@name`, `@*` | the element itself if it has the attribute |
//! | `a/b`, `a//b` | children, descendants or self of previous matches |
//! | `/a` | starts at the root element |
//! | `//a` | starts at the context element and everything below it |
//! | `a[2]` | second match, positions start at 1 |
//! | `a[@x='v']`, `a[b='v']`, `a[@x=@y]` | equality filters |
//! | `a[b]` | matches that have a `b` child |
//! | `a \| b`, `(a \| b)` | union, first occurrence wins |

mod ast;
mod error;
mod eval;
mod parser;

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::Cursor;

pub use error::BadXPath;

/// A compiled path expression.
///
/// ```
/// use std::str::FromStr;
/// use ikstream::{Document, XPath};
///
/// let doc = Document::from_str("<a><b id='1'/><b id='2'/></a>")?;
/// let path = XPath::new("b[@id='2']")?;
/// let found = path.apply(doc.root());
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].attribute("id"), Some("2"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct XPath {
    source: String,
    expr: ast::Expr,
}

impl XPath {
    pub fn new(expression: &str) -> Result<XPath, BadXPath> {
        let expr = parser::parse(expression)?;
        Ok(XPath {
            source: expression.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression with the cursor as the context element.
    ///
    /// Expressions which compute a value rather than select elements,
    /// like a bare `'x'` or `a='x'`, select nothing.
    pub fn apply<'a>(&self, context: Cursor<'a>) -> Vec<Cursor<'a>> {
        eval::select(&self.expr, context)
    }

    pub fn first<'a>(&self, context: Cursor<'a>) -> Option<Cursor<'a>> {
        self.apply(context).into_iter().next()
    }
}

impl FromStr for XPath {
    type Err = BadXPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XPath::new(s)
    }
}

impl Display for XPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

//
// Lenient query helpers
//

impl<'a> Cursor<'a> {
    /// Elements selected by the expression, or nothing if it does not compile.
    pub fn find_all(&self, expression: &str) -> Vec<Cursor<'a>> {
        match XPath::new(expression) {
            Ok(path) => path.apply(*self),
            Err(err) => {
                debug!(expression, %err, "ignoring malformed path expression");
                Vec::new()
            }
        }
    }

    pub fn find_first(&self, expression: &str) -> Option<Cursor<'a>> {
        self.find_all(expression).into_iter().next()
    }

    /// Text of the first selected element, or empty.
    pub fn find_text(&self, expression: &str) -> Cow<'a, str> {
        self.find_first(expression)
            .map_or(Cow::Borrowed(""), |element| element.text())
    }
}

#[cfg(test)]
mod tests;
