/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;

#[test]
fn it_works() {
    let mut arena = Arena::new();
    assert_eq!(arena.len(), 0);

    let a = arena.alloc("test".to_string()).unwrap();
    let b = arena.alloc("moretest".to_string()).unwrap();
    assert_eq!(arena.len(), 2);
    assert_eq!(arena[a], "test");
    assert_eq!(arena[b], "moretest");

    arena[a].push_str("ing");
    assert_eq!(arena.get(a).map(String::as_str), Some("testing"));
}

#[test]
fn many_allocs() {
    let mut arena = Arena::new();
    let ids: Vec<NodeId> = (0..10000).map(|i| arena.alloc(i).unwrap()).collect();
    assert_eq!(arena.len(), 10000);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(arena[*id], i);
    }
    assert!(arena.stats().capacity >= 10000);
}

#[test]
fn free_reuses_slots() {
    let mut arena = Arena::new();
    let a = arena.alloc(1).unwrap();
    let _b = arena.alloc(2).unwrap();
    assert_eq!(arena.free(a), Some(1));
    assert_eq!(arena.stats().nr_free_slots, 1);

    let c = arena.alloc(3).unwrap();
    assert_eq!(arena.stats().nr_free_slots, 0);
    assert_eq!(arena.len(), 2);
    assert_eq!(arena[c], 3);
}

#[test]
fn stale_ids_are_rejected() {
    let mut arena = Arena::new();
    let a = arena.alloc('a').unwrap();
    assert!(arena.get(a).is_some());
    arena.free(a);
    assert!(arena.get(a).is_none());
    assert_eq!(arena.free(a), None);

    // Same slot, new generation
    let b = arena.alloc('b').unwrap();
    assert_ne!(a, b);
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.get_mut(a), None);
    assert_eq!(arena.get(b), Some(&'b'));
}

#[test]
#[should_panic(expected = "stale node id")]
fn stale_index_panics() {
    let mut arena = Arena::new();
    let a = arena.alloc(0u8).unwrap();
    arena.free(a);
    let _ = arena[a];
}

#[test]
fn clone_is_independent() {
    let mut arena = Arena::new();
    let a = arena.alloc(vec![1, 2]).unwrap();
    let mut copy = arena.clone();
    copy[a].push(3);
    assert_eq!(arena[a], vec![1, 2]);
    assert_eq!(copy[a], vec![1, 2, 3]);
}
