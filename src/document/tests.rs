/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::error::description::*;
use super::*;

fn check_doc_xml(doc: &Document, expected: &str) {
    let xml = doc.to_string();
    assert_eq!(xml, expected);
    // Verify that the capacity is measured correctly
    assert_eq!(xml.len(), xml.capacity());
    // Verify that the Display and to_string are same
    let xml2 = format!("{}", doc);
    assert_eq!(xml2, expected);
}

fn parse(xml: &str) -> Document {
    Document::from_str(xml).unwrap()
}

#[test]
fn it_works() {
    let mut doc = Document::new("html").unwrap();
    let root = doc.root_id();
    let p = doc.append_child(root, "p").unwrap();
    let b = doc.append_child(p, "b").unwrap();
    let blink = doc.append_child(b, "blink").unwrap();
    doc.add_text(blink, "lala").unwrap();
    doc.add_text(root, "foo&").unwrap();
    doc.append_child(root, "p3").unwrap();
    doc.add_text(root, "bar").unwrap();
    doc.append_child(root, "p2").unwrap();

    check_doc_xml(
        &doc,
        "<html><p><b><blink>lala</blink></b></p>foo&amp;<p3/>bar<p2/></html>",
    );
    assert_eq!(doc.root().text(), "foo&bar");
    assert_eq!(doc.arena_stats().nr_nodes, 9);
}

#[test]
fn attributes() {
    let mut doc = Document::new("doc").unwrap();
    let root = doc.root_id();
    let a = doc.append_child(root, "a").unwrap();
    doc.set_attribute(a, "i", "1", None).unwrap();
    doc.set_attribute(a, "j", "2", None).unwrap();
    // Replacing keeps the position
    doc.set_attribute(a, "i", "3", None).unwrap();
    doc.set_attribute(a, "xml:lang", "en", None).unwrap();
    check_doc_xml(&doc, "<doc><a i='3' j='2' xml:lang='en'/></doc>");

    let a = doc.cursor(a).unwrap();
    assert_eq!(a.attribute("i"), Some("3"));
    assert_eq!(a.attribute("xml:lang"), Some("en"));
    assert_eq!(a.attribute("lang"), None);
    assert!(a.has_attribute("j"));
    assert!(!a.has_attribute("k"));
    let names: Vec<String> = a
        .attributes()
        .map(|attr| attr.qualified_name().into_owned())
        .collect();
    assert_eq!(names, ["i", "j", "xml:lang"]);

    let a = a.id();
    assert_eq!(doc.remove_attribute(a, "j"), Ok(true));
    assert_eq!(doc.remove_attribute(a, "j"), Ok(false));
    check_doc_xml(&doc, "<doc><a i='3' xml:lang='en'/></doc>");

    doc.set_attribute(root, "quote", "'\"<&>", None).unwrap();
    check_doc_xml(
        &doc,
        "<doc quote='&apos;&quot;&lt;&amp;&gt;'><a i='3' xml:lang='en'/></doc>",
    );
}

#[test]
fn attribute_namespaces() {
    let mut doc = parse("<a xmlns:x='urn:x' xmlns:y='urn:x'><b x:id='1'/></a>");
    let b = doc.root().find_child("b").unwrap();
    let attr = b.attributes().next().unwrap();
    assert_eq!(attr.name(), "id");
    assert_eq!(attr.prefix(), Some("x"));
    assert_eq!(attr.namespace(), "urn:x");
    assert_eq!(attr.value(), "1");
    assert!(attr.element().is_same(&b));

    // Same local name and same resolved namespace replaces
    let b = b.id();
    doc.set_attribute(b, "y:id", "2", None).unwrap();
    let b = doc.cursor(b).unwrap();
    assert_eq!(b.attributes().count(), 1);
    assert_eq!(b.attribute("y:id"), Some("2"));

    // An explicit namespace must match the prefix binding
    let b = b.id();
    let before = doc.to_string();
    assert_eq!(
        doc.set_attribute(b, "id", "3", Some("urn:other")),
        Err(DocumentError::BadXml(UNBOUND_NAMESPACE))
    );
    assert_eq!(
        doc.set_attribute(b, "z:id", "3", Some("urn:x")),
        Err(DocumentError::BadXml(UNBOUND_NAMESPACE))
    );
    assert_eq!(doc.to_string(), before);

    doc.set_attribute(b, "x:id", "4", Some("urn:x")).unwrap();
    doc.set_attribute(b, "id", "5", Some("")).unwrap();
    let b = doc.cursor(b).unwrap();
    assert_eq!(b.attributes().count(), 2);
    assert_eq!(b.attribute("x:id"), Some("4"));
    let attr = b.attributes().find(|attr| attr.value() == "5").unwrap();
    assert_eq!(attr.namespace(), "");
}

#[test]
fn explicit_namespaces_survive_reparsing() {
    let mut doc = Document::new("a").unwrap();
    let root = doc.root_id();
    assert!(doc.set_attribute(root, "x", "1", Some("urn:q")).is_err());

    doc.set_namespace(root, "urn:q", Some("q")).unwrap();
    doc.set_attribute(root, "q:x", "1", Some("urn:q")).unwrap();
    let child = doc.append_child(root, "b").unwrap();
    // An unprefixed name picks up the prefix bound to the namespace
    doc.set_attribute(child, "y", "2", Some("urn:q")).unwrap();
    assert_eq!(doc.cursor(child).unwrap().attribute("q:y"), Some("2"));
    assert!(doc.set_attribute(child, "y", "2", Some("urn:r")).is_err());
    // Rebinding the prefix moves the attributes along with it
    doc.set_namespace(root, "urn:r", Some("q")).unwrap();
    let xml = doc.to_string();
    assert_eq!(xml, "<a xmlns:q='urn:r' q:x='1'><b q:y='2'/></a>");
    let back = parse(&xml);
    assert_eq!(back, doc);
    let attr = back.root().attributes().find(|attr| attr.name() == "x").unwrap();
    assert_eq!(attr.namespace(), "urn:r");
}

#[test]
fn declarations_are_not_merged() {
    let mut doc = Document::new("a").unwrap();
    let root = doc.root_id();
    doc.set_namespace(root, "urn:p", Some("p")).unwrap();
    // Unbound q resolves to the same empty namespace as xmlns:p
    doc.set_attribute(root, "q:p", "1", None).unwrap();
    check_doc_xml(&doc, "<a xmlns:p='urn:p' q:p='1'/>");

    let mut doc = Document::new("a").unwrap();
    let root = doc.root_id();
    doc.set_attribute(root, "q:p", "1", None).unwrap();
    doc.set_namespace(root, "urn:p", Some("p")).unwrap();
    check_doc_xml(&doc, "<a q:p='1' xmlns:p='urn:p'/>");
    assert_eq!(parse(&doc.to_string()), doc);
}

#[test]
fn empty_attribute_values() {
    let mut doc = Document::new("a").unwrap();
    let root = doc.root_id();
    doc.set_attribute(root, "x", "", None).unwrap();
    check_doc_xml(&doc, "<a x=''/>");
    assert_eq!(doc.root().attribute("x"), Some(""));
    assert_eq!(parse("<a x=''/>"), doc);
}

#[test]
fn namespaces() {
    let mut doc = Document::new("iq").unwrap();
    let root = doc.root_id();
    doc.set_namespace(root, "jabber:client", None).unwrap();
    doc.set_namespace(root, "urn:x", Some("x")).unwrap();
    let query = doc.append_child(root, "query").unwrap();
    let item = doc.append_child(query, "x:item").unwrap();
    let other = doc.append_child(query, "y:item").unwrap();
    check_doc_xml(
        &doc,
        "<iq xmlns='jabber:client' xmlns:x='urn:x'><query><x:item/><y:item/></query></iq>",
    );

    let item = doc.cursor(item).unwrap();
    assert_eq!(item.name(), "item");
    assert_eq!(item.prefix(), Some("x"));
    assert_eq!(item.qualified_name(), "x:item");
    assert_eq!(item.namespace(), "urn:x");
    assert_eq!(item.default_namespace(), "jabber:client");
    assert_eq!(item.namespace_for_prefix("x"), Some("urn:x"));
    assert_eq!(item.prefix_for_namespace("urn:x"), Some("x"));
    assert_eq!(item.prefix_for_namespace("urn:none"), None);
    assert_eq!(doc.cursor(query).unwrap().namespace(), "jabber:client");
    // Unbound prefixes resolve to the empty namespace
    assert_eq!(doc.cursor(other).unwrap().namespace(), "");

    doc.set_namespace(query, "jabber:iq:roster", None).unwrap();
    assert_eq!(doc.cursor(query).unwrap().namespace(), "jabber:iq:roster");
    assert_eq!(doc.root().namespace(), "jabber:client");

    doc.set_prefix(query, Some("x")).unwrap();
    let query_cursor = doc.cursor(query).unwrap();
    assert_eq!(query_cursor.qualified_name(), "x:query");
    assert_eq!(query_cursor.namespace(), "urn:x");
    doc.set_prefix(query, None).unwrap();
    assert_eq!(doc.cursor(query).unwrap().qualified_name(), "query");

    assert_eq!(doc.remove_attribute(root, "xmlns"), Ok(true));
    assert_eq!(doc.root().namespace(), "");
}

#[test]
fn text() {
    let mut doc = parse("<a>one<b/>two<c/>three</a>");
    let root = doc.root_id();
    assert_eq!(doc.root().text(), "onetwothree");

    doc.set_text(root, "new").unwrap();
    check_doc_xml(&doc, "<a><b/><c/>new</a>");
    doc.add_text(root, " more").unwrap();
    doc.add_text(root, "").unwrap();
    assert_eq!(doc.root().children().count(), 4);
    assert_eq!(doc.root().text(), "new more");

    doc.set_text(root, "").unwrap();
    check_doc_xml(&doc, "<a><b/><c/></a>");
    assert_eq!(doc.root().text(), "");
}

#[test]
fn validation() {
    let mut doc = Document::new("a").unwrap();
    let root = doc.root_id();
    assert_eq!(Document::new("").unwrap_err(), DocumentError::BadXml(INVALID_NAME));
    assert_eq!(Document::new("a b").unwrap_err(), DocumentError::BadXml(INVALID_NAME));
    assert_eq!(
        doc.append_child(root, "a:b:c"),
        Err(DocumentError::BadXml(INVALID_NAME))
    );
    assert_eq!(
        doc.add_text(root, "nul\u{0}"),
        Err(DocumentError::BadXml(INVALID_TEXT))
    );
    assert_eq!(
        doc.set_attribute(root, "x", "\u{fffe}", None),
        Err(DocumentError::BadXml(INVALID_TEXT))
    );
    assert_eq!(
        doc.set_attribute(root, "", "1", None),
        Err(DocumentError::BadXml(INVALID_NAME))
    );
    assert_eq!(
        doc.set_prefix(root, Some("")),
        Err(DocumentError::BadXml(INVALID_NAME))
    );
    // Failed edits leave no trace
    check_doc_xml(&doc, "<a/>");

    assert!(crate::text_from_bytes(b"\xff").is_err());
    assert_eq!(crate::text_from_bytes(b"ascii"), Ok("ascii"));
}

#[test]
fn navigation() {
    let doc = parse("<a><b id='1'><c/>x<d><e/></d></b><b id='2'/><f/></a>");
    let root = doc.root();
    assert!(root.parent().is_none());

    let names: Vec<&str> = root.elements().map(|element| element.name()).collect();
    assert_eq!(names, ["b", "b", "f"]);
    let names: Vec<&str> = root.descendants().map(|element| element.name()).collect();
    assert_eq!(names, ["b", "c", "d", "e", "b", "f"]);

    let b = root.find_child("b").unwrap();
    assert_eq!(b.attribute("id"), Some("1"));
    let contents: Vec<String> = b
        .children()
        .map(|content| match content {
            Content::Element(element) => element.name().to_string(),
            Content::Text(text) => format!("'{}'", text),
        })
        .collect();
    assert_eq!(contents, ["c", "'x'", "d"]);

    let e = b.find_child("d").unwrap().find_child("e").unwrap();
    assert!(e.parent().unwrap().parent().unwrap().is_same(&b));
    assert!(e.root().is_same(&root));

    assert_eq!(root.find_children("b", None).len(), 2);
    assert_eq!(root.find_children("b", Some("urn:x")).len(), 0);
    let second = root.find_child_with_attribute("b", "id", Some("2")).unwrap();
    assert_eq!(second.to_string(), "<b id='2'/>");
    assert!(root.find_child_with_attribute("b", "id", None).unwrap().is_same(&b));
    assert!(root.find_child_with_attribute("f", "id", None).is_none());
    assert!(root.find_child("x").is_none());
}

#[test]
fn prefixed_lookup() {
    let doc = parse("<a xmlns:s='urn:s'><s:b/><b/></a>");
    let root = doc.root();
    assert_eq!(root.find_child("s:b").unwrap().namespace(), "urn:s");
    assert_eq!(root.find_child("b").unwrap().prefix(), Some("s"));
    assert_eq!(root.find_children("b", Some("urn:s")).len(), 1);
}

#[test]
fn doc_parser() {
    let doc = parse("<a><b>123<c/>456</b><d x='1' y='2'>lala<e/></d></a>");
    check_doc_xml(&doc, "<a><b>123<c/>456</b><d x='1' y='2'>lala<e/></d></a>");

    let mut parser = DocumentParser::new();
    parser.parse_bytes(b"<a><b>12").unwrap();
    parser.parse_bytes(b"3</b></a>").unwrap();
    let first = parser.take_document().unwrap();
    check_doc_xml(&first, "<a><b>123</b></a>");
    parser.parse_bytes(b"<other/>").unwrap();
    assert_eq!(parser.take_document().unwrap().to_string(), "<other/>");
}

#[test]
fn bad_doc_parser() {
    assert!(Document::from_str("").is_err());
    assert!(Document::from_str("<a>").is_err());
    assert!(Document::from_str("<a></b>").is_err());
    assert!(Document::from_str("<a/><b/>").is_err());
    assert_eq!(
        Document::from_str("<a x='1' x='2'/>").unwrap_err(),
        DocumentError::BadXml(DUPLICATE_ATTRIBUTE)
    );
    let mut parser = DocumentParser::new();
    assert!(parser.parse_bytes(b"<a>&bad;</a>").is_err());
    assert_eq!(parser.location().bytes, 0);
    // The failed document is gone, nothing to take
    assert!(parser.take_document().is_err());
    parser.parse_bytes(b"<a>&amp;</a>").unwrap();
    assert_eq!(parser.take_document().unwrap().root().text(), "&");
}

#[test]
fn removals() {
    let mut doc = parse("<a><b><c/><d/></b><e/>text</a>");
    let b = doc.root().find_child("b").unwrap().id();
    let c = doc.cursor(b).unwrap().find_child("c").unwrap().id();
    let before = doc.arena_stats();

    doc.remove(b).unwrap();
    check_doc_xml(&doc, "<a><e/>text</a>");
    assert!(doc.cursor(b).is_none());
    assert!(doc.cursor(c).is_none());
    let after = doc.arena_stats();
    assert_eq!(after.nr_nodes, before.nr_nodes - 3);
    assert_eq!(after.nr_free_slots, 3);

    assert_eq!(doc.remove(b), Err(DocumentError::BadXml(NOT_AN_ELEMENT)));
    assert_eq!(
        doc.append_child(c, "x"),
        Err(DocumentError::BadXml(NOT_AN_ELEMENT))
    );
    let root = doc.root_id();
    assert_eq!(doc.remove(root), Err(DocumentError::BadXml(ROOT_REMOVE)));

    // Freed slots are reused without reviving the old ids
    let f = doc.append_child(root, "f").unwrap();
    assert_ne!(f, b);
    assert!(doc.cursor(b).is_none());
    assert_eq!(doc.arena_stats().nr_free_slots, 2);
}

#[test]
fn equality() {
    assert_eq!(parse("<a x='1' y='2'/>"), parse("<a y='2' x='1'/>"));
    assert_ne!(parse("<a x='1'/>"), parse("<a x='2'/>"));
    assert_ne!(parse("<a x='1'/>"), parse("<a x='1' y='2'/>"));
    assert_ne!(parse("<a><b/><c/></a>"), parse("<a><c/><b/></a>"));
    assert!(!parse("<a xmlns='urn:1'/>").root().deep_eq(&parse("<a/>").root()));

    // Prefixed attributes compare by resolved namespace
    let one = parse("<r xmlns:p='urn:x'><a p:id='1'/></r>");
    let two = parse("<r xmlns:q='urn:x'><a q:id='1'/></r>");
    assert!(
        one.root()
            .find_child("a")
            .unwrap()
            .deep_eq(&two.root().find_child("a").unwrap())
    );

    // Text run boundaries are invisible
    let mut split = Document::new("a").unwrap();
    let root = split.root_id();
    split.add_text(root, "hello ").unwrap();
    split.add_text(root, "world").unwrap();
    assert_eq!(split, parse("<a>hello world</a>"));
}

#[test]
fn clones() {
    let doc = parse("<a xmlns='urn:a' xmlns:p='urn:p'><p:b x='1'><c>text</c></p:b></a>");
    let mut copy = doc.clone();
    assert_eq!(copy, doc);
    let root = copy.root_id();
    copy.add_text(root, "changed").unwrap();
    assert_ne!(copy, doc);
    assert_eq!(doc.root().text(), "");

    let b = doc.root().find_child("b").unwrap();
    let sub = b.to_document().unwrap();
    assert!(sub.root().deep_eq(&b));
    assert_eq!(sub.root().namespace(), "urn:p");
    assert_eq!(sub.root().find_child("c").unwrap().namespace(), "urn:a");
    check_doc_xml(&sub, "<p:b x='1'><c>text</c></p:b>");
}

#[test]
fn serialize_subset() {
    let doc = parse("<a><b><c/><d>lala</d></b><e x='&lt;'/></a>");
    let b = doc.root().find_child("b").unwrap();
    let xml = b.to_string();
    assert_eq!(xml, "<b><c/><d>lala</d></b>");
    assert_eq!(xml.len(), xml.capacity());
    assert_eq!(b.str_size(), xml.len());
    assert_eq!(format!("{}", doc.root().find_child("e").unwrap()), "<e x='&lt;'/>");
    assert_eq!(format!("{:?}", doc), "Document(<a><b><c/><d>lala</d></b><e x='&lt;'/></a>)");
}

#[test]
fn cursor_copies() {
    let doc = parse("<a><b/></a>");
    let c1 = doc.root();
    let c2 = c1;
    let c3 = c1.find_child("b").unwrap();
    assert!(c1.is_same(&c2));
    assert!(!c1.is_same(&c3));
    let other = parse("<a><b/></a>");
    assert!(!c1.is_same(&other.root()));
    assert!(c1.deep_eq(&other.root()));
    assert!(std::ptr::eq(c3.document(), &doc));
}

#[test]
fn send_documents() {
    fn assert_send<T: Send>() {}
    assert_send::<Document>();

    let doc = parse("<a>moved</a>");
    let text = std::thread::spawn(move || doc.root().text().into_owned())
        .join()
        .unwrap();
    assert_eq!(text, "moved");
}
