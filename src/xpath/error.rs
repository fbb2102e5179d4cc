/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::error::Error;
use std::fmt::Display;

/// Syntax error in a path expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BadXPath {
    /// Byte offset in the expression where the error is found.
    pub position: usize,
    pub description: &'static str,
}

impl BadXPath {
    pub(super) fn new(position: usize, description: &'static str) -> BadXPath {
        BadXPath {
            position,
            description,
        }
    }
}

impl Display for BadXPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "XPath syntax error at {}: {}",
            self.position, self.description
        )
    }
}

impl Error for BadXPath {}

pub(super) mod description {
    pub(in super::super) const EMPTY: &str = "Expression is empty";
    pub(in super::super) const UNEXPECTED_CHAR: &str = "Unexpected character";
    pub(in super::super) const UNTERMINATED_LITERAL: &str = "String literal is not terminated";
    pub(in super::super) const INTEGER_TOO_BIG: &str = "Integer is too big";
    pub(in super::super) const STEP_EXPECTED: &str = "Expected a name, '*', '.', '..', '@' or '('";
    pub(in super::super) const ATTRIBUTE_NAME_EXPECTED: &str = "Expected an attribute name or '*'";
    pub(in super::super) const PREDICATE_NOT_CLOSED: &str = "Predicate is missing ']'";
    pub(in super::super) const GROUP_NOT_CLOSED: &str = "Group is missing ')'";
    pub(in super::super) const TRAILING_INPUT: &str = "Unexpected input after the expression";
    pub(in super::super) const TOO_DEEP: &str = "Expression nesting is too deep";
}
