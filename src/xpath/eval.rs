/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::borrow::Cow;
use std::collections::HashSet;

use crate::Cursor;
use crate::NodeId;

use super::ast::Anchor;
use super::ast::Expr;
use super::ast::NodeTest;
use super::ast::Path;

#[derive(Clone, Copy)]
enum Item<'a> {
    /// Stands above the element, whose only child is the element.
    Above(Cursor<'a>),
    Node(Cursor<'a>),
}

impl<'a> Item<'a> {
    fn cursor(&self) -> Cursor<'a> {
        match self {
            Item::Above(cursor) | Item::Node(cursor) => *cursor,
        }
    }

    fn children(&self) -> Vec<Cursor<'a>> {
        match self {
            Item::Above(cursor) => vec![*cursor],
            Item::Node(cursor) => cursor.elements().collect(),
        }
    }
}

/// Ordered set of elements, the first occurrence wins.
struct NodeSet<'a> {
    nodes: Vec<Cursor<'a>>,
    seen: HashSet<NodeId>,
}

impl<'a> NodeSet<'a> {
    fn new() -> Self {
        NodeSet {
            nodes: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, cursor: Cursor<'a>) {
        if self.seen.insert(cursor.id()) {
            self.nodes.push(cursor);
        }
    }
}

/// Evaluates the expression as a node set in document order of discovery.
pub(super) fn select<'a>(expr: &Expr, context: Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut set = NodeSet::new();
    select_into(expr, context, &mut set);
    set.nodes
}

fn select_into<'a>(expr: &Expr, context: Cursor<'a>, set: &mut NodeSet<'a>) {
    match expr {
        Expr::Union(parts) => {
            for part in parts {
                select_into(part, context, set);
            }
        }
        Expr::Path(path) => {
            for node in evaluate_path(path, context) {
                set.push(node);
            }
        }
        // Values are not node sets
        Expr::Equals(..) | Expr::Literal(_) | Expr::Integer(_) => (),
    }
}

fn evaluate_path<'a>(path: &Path, context: Cursor<'a>) -> Vec<Cursor<'a>> {
    // A bare '/' names no element
    if path.steps.is_empty() {
        return Vec::new();
    }
    let start = match path.anchor {
        Anchor::Context => Item::Node(context),
        Anchor::Root => Item::Above(context.root()),
        Anchor::Subtree => Item::Above(context),
    };

    let mut current = vec![start];
    for step in &path.steps {
        let bases = if step.descendant {
            descendants_or_self(&current)
        } else {
            current
        };
        let mut next = NodeSet::new();
        for base in bases {
            let matched = apply_test(&step.test, base);
            for node in filter(matched, &step.predicates) {
                next.push(node);
            }
        }
        if next.nodes.is_empty() {
            return Vec::new();
        }
        current = next.nodes.into_iter().map(Item::Node).collect();
    }
    current.iter().map(Item::cursor).collect()
}

fn descendants_or_self<'a>(items: &[Item<'a>]) -> Vec<Item<'a>> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        if let Item::Above(_) = item {
            result.push(*item);
        }
        let cursor = item.cursor();
        for node in std::iter::once(cursor).chain(cursor.descendants()) {
            if seen.insert(node.id()) {
                result.push(Item::Node(node));
            }
        }
    }
    result
}

fn has_attribute(cursor: Cursor, name: Option<&str>) -> bool {
    match name {
        Some(name) => cursor.has_attribute(name),
        None => cursor.attributes().next().is_some(),
    }
}

fn apply_test<'a>(test: &NodeTest, base: Item<'a>) -> Vec<Cursor<'a>> {
    match test {
        NodeTest::Name(name) => base
            .children()
            .into_iter()
            .filter(|child| child.has_name(name))
            .collect(),
        NodeTest::Any => base.children(),
        NodeTest::SelfNode => vec![base.cursor()],
        NodeTest::Parent => match base {
            Item::Above(_) => Vec::new(),
            Item::Node(cursor) => cursor.parent().into_iter().collect(),
        },
        NodeTest::Attribute(name) => {
            let cursor = base.cursor();
            if has_attribute(cursor, name.as_deref()) {
                vec![cursor]
            } else {
                Vec::new()
            }
        }
        NodeTest::Group(expr) => select(expr, base.cursor()),
    }
}

fn filter<'a>(mut nodes: Vec<Cursor<'a>>, predicates: &[Expr]) -> Vec<Cursor<'a>> {
    for predicate in predicates {
        nodes = match predicate {
            Expr::Integer(position) => position
                .checked_sub(1)
                .and_then(|index| nodes.get(index))
                .copied()
                .into_iter()
                .collect(),
            _ => nodes
                .into_iter()
                .filter(|node| is_true(predicate, *node))
                .collect(),
        };
        if nodes.is_empty() {
            break;
        }
    }
    nodes
}

fn is_true(expr: &Expr, node: Cursor) -> bool {
    match expr {
        Expr::Equals(left, right) => equals(left, right, node),
        Expr::Literal(value) => !value.is_empty(),
        Expr::Integer(_) => false,
        Expr::Path(_) | Expr::Union(_) => !select(expr, node).is_empty(),
    }
}

enum Operand<'s> {
    /// Literal or attribute values.
    Values(Vec<Cow<'s, str>>),
    /// Text of the first element matched by a nested path.
    Nested(Option<Cow<'s, str>>),
}

fn operand<'s>(expr: &'s Expr, node: Cursor<'s>) -> Option<Operand<'s>> {
    match expr {
        Expr::Literal(value) => Some(Operand::Values(vec![Cow::Borrowed(value.as_str())])),
        Expr::Integer(value) => Some(Operand::Values(vec![Cow::Owned(value.to_string())])),
        Expr::Path(path) => match path.attribute_test() {
            Some(name) => {
                let mut values = Vec::new();
                for element in evaluate_path(path, node) {
                    match name {
                        Some(name) => values.extend(element.attribute(name).map(Cow::Borrowed)),
                        None => values.extend(element.attributes().map(|attr| Cow::Borrowed(attr.value()))),
                    }
                }
                Some(Operand::Values(values))
            }
            None => Some(Operand::Nested(
                evaluate_path(path, node).first().map(|first| first.text()),
            )),
        },
        Expr::Union(_) | Expr::Equals(..) => None,
    }
}

fn equals(left: &Expr, right: &Expr, node: Cursor) -> bool {
    match (operand(left, node), operand(right, node)) {
        (Some(Operand::Values(left)), Some(Operand::Values(right))) => {
            left.iter().any(|value| right.contains(value))
        }
        (Some(Operand::Values(values)), Some(Operand::Nested(text)))
        | (Some(Operand::Nested(text)), Some(Operand::Values(values))) => {
            text.is_some_and(|text| values.contains(&text))
        }
        _ => false,
    }
}
