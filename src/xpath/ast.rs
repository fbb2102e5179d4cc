/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Expr {
    Union(Vec<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    Path(Path),
    Literal(String),
    Integer(usize),
}

/// Where the first step of a path starts looking.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Anchor {
    /// Children of the context element.
    Context,
    /// The topmost ancestor of the context element itself.
    Root,
    /// The context element and everything below it.
    Subtree,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Path {
    pub(super) anchor: Anchor,
    pub(super) steps: Vec<Step>,
}

impl Path {
    /// Name of the attribute selected by the last step, `Some(None)`
    /// for `@*`, and None if the path ends with an element step.
    pub(super) fn attribute_test(&self) -> Option<Option<&str>> {
        match self.steps.last() {
            Some(Step {
                test: NodeTest::Attribute(name),
                ..
            }) => Some(name.as_deref()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Step {
    /// Step follows a `//`.
    pub(super) descendant: bool,
    pub(super) test: NodeTest,
    pub(super) predicates: Vec<Expr>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum NodeTest {
    Name(String),
    Any,
    SelfNode,
    Parent,
    Attribute(Option<String>),
    Group(Box<Expr>),
}
