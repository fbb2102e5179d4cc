/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// # Must not compile tests
///
/// Returned Cursor cannot outlive the Document:
/// ```compile_fail
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::str::FromStr;
/// use ikstream::Cursor;
/// use ikstream::Document;
/// let c: Cursor;
/// {
///     let doc = Document::from_str("<a><b/></a>")?;
///     c = doc.root();
/// }
/// println!("{}", c);
/// # Ok(())
/// # }
/// ```
///
/// Cursor copy cannot outlive the Document:
/// ```compile_fail
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::str::FromStr;
/// use ikstream::Cursor;
/// use ikstream::Document;
/// let c2: Cursor;
/// {
///     let doc = Document::from_str("<a><b/></a>")?;
///     let c1 = doc.root().find_child("b").unwrap();
///     c2 = c1;
/// }
/// println!("{}", c2);
/// # Ok(())
/// # }
/// ```
///
/// Document cannot be edited while a Cursor is alive:
/// ```compile_fail
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::str::FromStr;
/// use ikstream::Document;
/// let mut doc = Document::from_str("<a><b/></a>")?;
/// let b = doc.root().find_child("b").unwrap();
/// doc.set_text(doc.root_id(), "lala")?;
/// println!("{}", b);
/// # Ok(())
/// # }
/// ```
///
/// Query results cannot outlive the Document:
/// ```compile_fail
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::str::FromStr;
/// use ikstream::Document;
/// let found;
/// {
///     let doc = Document::from_str("<a><b/></a>")?;
///     found = doc.root().find_all("/a/b");
/// }
/// println!("{}", found.len());
/// # Ok(())
/// # }
/// ```
#[cfg(doctest)]
struct MustNotCompileTests;
