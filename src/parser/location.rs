/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;

/// A position in the parser input byte stream.
///
/// Positions count from the last reset of the parser and do not depend
/// on how the input was split into chunks. Errors carry the location of
/// the offending byte, and [location()](crate::StreamParser::location)
/// gives the position of the next byte to parse.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Location {
    /// Offset from the first byte of the stream.
    pub bytes: usize,
    /// Newline characters seen so far, so the first line is zero.
    pub lines: usize,
    /// Offset from the byte after the most recent newline.
    pub column: usize,
}

impl Location {
    /// The position of the first byte of a stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// One based line and column numbers, as editors show them.
    pub fn line_and_column(&self) -> (usize, usize) {
        (self.lines + 1, self.column + 1)
    }

    pub(super) fn advance(&mut self, c: u8) {
        self.bytes += 1;
        match c {
            b'\n' => {
                self.lines += 1;
                self.column = 0;
            }
            _ => self.column += 1,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, column) = self.line_and_column();
        write!(f, "line {line}, column {column} (byte {})", self.bytes)
    }
}
