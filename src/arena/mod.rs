/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;

use std::ops::Index;
use std::ops::IndexMut;

pub use error::NoMemory;

const MIN_SLOTS: usize = 8;

/// Handle of a node stored in a [Document](crate::Document).
///
/// Handles are plain indices with a generation counter. They do not
/// keep anything alive, and a handle of a removed node is rejected by
/// the document instead of silently pointing at whatever reused its
/// slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Memory usage statistics of a document arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArenaStats {
    /// Number of live nodes.
    pub nr_nodes: usize,
    /// Number of freed slots waiting for reuse.
    pub nr_free_slots: usize,
    /// Number of slots the arena can hold without growing.
    pub capacity: usize,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena owning every node of one tree.
///
/// Nodes refer to each other with [NodeId] handles, so parent links
/// never take part in ownership. Growing the arena goes through
/// `try_reserve` and reports [NoMemory] instead of aborting.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Arena<T> {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, value: T) -> Result<NodeId, NoMemory> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return Ok(NodeId {
                index,
                generation: slot.generation,
            });
        }
        if self.slots.len() == self.slots.capacity() {
            let extra = self.slots.capacity().max(MIN_SLOTS);
            self.slots.try_reserve(extra)?;
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Ok(NodeId {
            index,
            generation: 0,
        })
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index) {
            Some(slot) if slot.generation == id.generation => slot.value.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation => slot.value.as_mut(),
            _ => None,
        }
    }

    /// Releases the slot and returns the value it held.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn stats(&self) -> ArenaStats {
        ArenaStats {
            nr_nodes: self.len(),
            nr_free_slots: self.free.len(),
            capacity: self.slots.capacity(),
        }
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale node id {:?}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale node id {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests;
