/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::str::FromStr;

use crate::Document;

use super::error::description;
use super::*;

fn check_path(context: Cursor, expression: &str, expected: &[&str]) {
    let path = XPath::new(expression).unwrap();
    let found = path.apply(context);
    let found: Vec<String> = found.iter().map(|cursor| cursor.to_string()).collect();
    assert_eq!(found, expected, "expression {expression}");
}

fn check_bad(expression: &str, position: usize, expected: &'static str) {
    let err = XPath::new(expression).unwrap_err();
    assert_eq!(err.description, expected, "expression {expression}");
    assert_eq!(err.position, position, "expression {expression}");
}

#[test]
fn simple_steps() {
    let doc = Document::from_str(
        "<a><b><b/></b><d><e>123</e><f>456<b i=\"1\"/>789</f><b>abc</b></d></a>",
    )
    .unwrap();
    let all = "<a><b><b/></b><d><e>123</e><f>456<b i='1'/>789</f><b>abc</b></d></a>";

    check_path(doc.root(), "/*", &[all]);
    check_path(doc.root(), "/a", &[all]);
    check_path(doc.root(), "/", &[]);
    check_path(doc.root(), "/x", &[]);
    check_path(doc.root(), "/a/b", &["<b><b/></b>"]);
    check_path(doc.root(), "/a/d/f/b", &["<b i='1'/>"]);
    check_path(
        doc.root(),
        "/a/d/*",
        &["<e>123</e>", "<f>456<b i='1'/>789</f>", "<b>abc</b>"],
    );
    check_path(
        doc.root(),
        "//b",
        &["<b><b/></b>", "<b/>", "<b i='1'/>", "<b>abc</b>"],
    );
    check_path(doc.root(), "/a/d//b", &["<b i='1'/>", "<b>abc</b>"]);
    check_path(doc.root(), "//b/b", &["<b/>"]);
    check_path(doc.root(), "//a", &[all]);
}

#[test]
fn relative_steps() {
    let doc = Document::from_str("<a><b><c>1</c></b><b><c>2</c><c>3</c></b></a>").unwrap();
    let root = doc.root();

    check_path(root, "b/c", &["<c>1</c>", "<c>2</c>", "<c>3</c>"]);
    check_path(root, "a", &[]);
    check_path(root, ".", &[root.to_string().as_str()]);
    check_path(root, "..", &[]);
    check_path(root, "b/c/..", &["<b><c>1</c></b>", "<b><c>2</c><c>3</c></b>"]);
    check_path(root, "*/*", &["<c>1</c>", "<c>2</c>", "<c>3</c>"]);
    check_path(root, "b//c", &["<c>1</c>", "<c>2</c>", "<c>3</c>"]);

    let second = root.find_all("b")[1];
    check_path(second, "c", &["<c>2</c>", "<c>3</c>"]);
    check_path(second, "/a/b/c", &["<c>1</c>", "<c>2</c>", "<c>3</c>"]);
    check_path(second, "//c", &["<c>2</c>", "<c>3</c>"]);
    check_path(second, "../b[1]/c", &["<c>1</c>"]);
}

#[test]
fn predicates() {
    let doc = Document::from_str("<a><b id='1'/><b id='2'/></a>").unwrap();
    let root = doc.root();

    let found = root.find_all("b");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].attribute("id"), Some("1"));
    assert_eq!(found[1].attribute("id"), Some("2"));

    let found = root.find_all("b[2]");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].attribute("id"), Some("2"));

    let found = root.find_all("b[@id='2']");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].attribute("id"), Some("2"));

    assert!(root.find_first("c").is_none());

    check_path(root, "b[0]", &[]);
    check_path(root, "b[3]", &[]);
    check_path(root, "b[@id=2]", &["<b id='2'/>"]);
    check_path(root, "b[\"1\"=@id]", &["<b id='1'/>"]);
    check_path(root, "b[@id]", &["<b id='1'/>", "<b id='2'/>"]);
    check_path(root, "b[@*]", &["<b id='1'/>", "<b id='2'/>"]);
    check_path(root, "b[@x]", &[]);
    check_path(root, "b[@id='3']", &[]);
    check_path(root, "b[@id='2'][1]", &["<b id='2'/>"]);
    check_path(root, "b[1][@id='2']", &[]);
    check_path(root, "b['x']", &["<b id='1'/>", "<b id='2'/>"]);
    check_path(root, "b['']", &[]);
    check_path(root, ".[b]", &[root.to_string().as_str()]);
    check_path(root, ".[c]", &[]);
}

#[test]
fn nested_equality() {
    let doc = Document::from_str(
        "<roster><item jid='a@x' sub='both'><group>friends</group></item>\
         <item jid='b@x' sub='to' ask='to'><group>work</group></item></roster>",
    )
    .unwrap();
    let root = doc.root();

    let found = root.find_all("item[group='work']");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].attribute("jid"), Some("b@x"));

    check_path(root, "item[@sub=@ask]/group", &["<group>work</group>"]);
    check_path(root, "item[group=group]", &[]);
    check_path(
        root,
        "item[(group)='friends']",
        &["<item jid='a@x' sub='both'><group>friends</group></item>"],
    );
    check_path(
        root,
        "item[@*='both']/@jid",
        &["<item jid='a@x' sub='both'><group>friends</group></item>"],
    );
    check_path(root, "item/group[.='friends']", &["<group>friends</group>"]);
    check_path(root, "'friends'", &[]);
    check_path(root, "item='x'", &[]);
}

#[test]
fn unions() {
    let doc = Document::from_str("<a><b/><c/><d><b/></d></a>").unwrap();
    let root = doc.root();

    check_path(root, "c | b", &["<c/>", "<b/>"]);
    check_path(root, "b | b | c", &["<b/>", "<c/>"]);
    check_path(root, "(c|b)[2]", &["<b/>"]);
    check_path(root, "(//b)[2]", &["<b/>"]);
    check_path(root, "d/(b | ..)", &["<b/>", root.to_string().as_str()]);

    let found = root.find_all("//b | b");
    assert_eq!(found.len(), 2);
    assert!(found[0].parent().unwrap().is_same(&root));
    assert_eq!(found[1].parent().unwrap().name(), "d");
}

#[test]
fn prefixed_names() {
    let doc = Document::from_str(
        "<iq xmlns:q='jabber:iq:roster'><q:query><item/></q:query><query/></iq>",
    )
    .unwrap();
    let root = doc.root();

    check_path(root, "q:query/item", &["<item/>"]);
    check_path(root, "query", &["<q:query><item/></q:query>", "<query/>"]);
    check_path(root, "x:query", &[]);
    check_path(root, ".[@xmlns:q='jabber:iq:roster']", &[root.to_string().as_str()]);
}

#[test]
fn literals() {
    let doc = Document::from_str("<a><b v=\"it's\"/><b v='say \"hi\"'/></a>").unwrap();
    let root = doc.root();

    assert_eq!(root.find_all("b[@v='it\\'s']").len(), 1);
    assert_eq!(root.find_all("b[@v=\"it's\"]").len(), 1);
    assert_eq!(root.find_all("b[@v='say \"hi\"']").len(), 1);
    assert_eq!(root.find_all("b[@v=\"say \\\"hi\\\"\"]").len(), 1);
    assert_eq!(root.find_all("b[@v='a\\b']").len(), 0);
}

#[test]
fn text_helpers() {
    let doc = Document::from_str(
        "<message><body>hel<x/>lo</body><thread>t1</thread></message>",
    )
    .unwrap();
    let root = doc.root();

    assert_eq!(root.find_text("body"), "hello");
    assert_eq!(root.find_text("thread"), "t1");
    assert_eq!(root.find_text("subject"), "");
    assert_eq!(root.find_text("body["), "");
    assert!(root.find_all("[").is_empty());
    assert!(root.find_first("").is_none());
    assert!(root.find_all("/").is_empty());
    assert!(root.find_all("//").is_empty());
    assert_eq!(root.find_first("body/x").unwrap().name(), "x");
}

#[test]
fn compiled_paths() {
    let path = XPath::from_str(" /a // b [ 1 ] ").unwrap();
    assert_eq!(path.as_str(), " /a // b [ 1 ] ");
    assert_eq!(path.to_string(), " /a // b [ 1 ] ");

    let doc = Document::from_str("<a><c><b>1</b></c><b>2</b></a>").unwrap();
    let first = path.first(doc.root()).unwrap();
    // Predicates apply per step base, a's own child comes first
    assert_eq!(first.text(), "2");
    assert_eq!(path.apply(doc.root()).len(), 2);

    let cloned = path.clone();
    assert_eq!(cloned.apply(doc.root()).len(), 2);
}

#[test]
fn bad_paths() {
    check_bad("", 0, description::EMPTY);
    check_bad("   ", 0, description::EMPTY);
    check_bad("a/", 2, description::STEP_EXPECTED);
    check_bad("a//", 3, description::STEP_EXPECTED);
    check_bad("a/=", 2, description::STEP_EXPECTED);
    check_bad("//", 2, description::STEP_EXPECTED);
    check_bad("a/2", 2, description::STEP_EXPECTED);
    check_bad("a[1", 3, description::PREDICATE_NOT_CLOSED);
    check_bad("a[]", 2, description::STEP_EXPECTED);
    check_bad("(a", 2, description::GROUP_NOT_CLOSED);
    check_bad("@", 0, description::ATTRIBUTE_NAME_EXPECTED);
    check_bad("a[@/b]", 2, description::ATTRIBUTE_NAME_EXPECTED);
    check_bad("a b", 2, description::TRAILING_INPUT);
    check_bad("a]", 1, description::TRAILING_INPUT);
    check_bad("a='x'='y'", 5, description::TRAILING_INPUT);
    check_bad("a[@x='v]", 5, description::UNTERMINATED_LITERAL);
    check_bad("a[99999999999999999999999]", 2, description::INTEGER_TOO_BIG);
    check_bad("a!", 1, description::UNEXPECTED_CHAR);
    check_bad("a[$x]", 2, description::UNEXPECTED_CHAR);

    let deep = "(".repeat(100) + "a" + &")".repeat(100);
    assert_eq!(XPath::new(&deep).unwrap_err().description, description::TOO_DEEP);
    let fine = "(".repeat(10) + "a" + &")".repeat(10);
    assert!(XPath::new(&fine).is_ok());

    let err = XPath::new("a[").unwrap_err();
    assert_eq!(
        err.to_string(),
        "XPath syntax error at 2: Expected a name, '*', '.', '..', '@' or '('"
    );
}
