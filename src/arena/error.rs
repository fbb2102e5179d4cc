/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::Display;

/// Error type for memory allocation failures.
///
/// Tree and parser operations return this error when a buffer or the
/// node arena cannot grow. Best action is to abort the current
/// operation and drop the parser or document.
///
/// Details about the failed allocation are not included to keep the
/// error as lightweight as possible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoMemory;

impl Display for NoMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "not enough memory")
    }
}

impl Error for NoMemory {}

impl From<TryReserveError> for NoMemory {
    fn from(_: TryReserveError) -> Self {
        NoMemory
    }
}
