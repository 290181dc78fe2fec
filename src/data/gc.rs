//! Compacting collector for the temporaries region.
//!
//! ## Mark pass
//!
//! Gather every root that points into the temporaries: stack slots and
//! registered safe pointers. Walk the temporaries object by object, using the
//! Size handler to skip each one blind, and mark an object live if any root
//! points at or into it. Roots into the middle of an object are the children
//! of a composite, which are stored in place; they keep their parent alive.
//!
//! ## Compact pass
//!
//! Walk again, sliding each marked object down to the end of the previous
//! live one. Objects only ever move down, so an object is always sized
//! before anything is written over it.
//!
//! ## Fixup pass
//!
//! Rewrite every root through the relocation table. The scratchpad follows
//! the temporaries down, and roots into it move with it.
//!
//! Nothing below the end of the permanent region moves.

use std::ops::Range;

use super::arena::Arena;
use super::bitset::BitSet;
use super::roots::Registry;
use crate::dispatch;

/// What a collection pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    /// Bytes returned to the free space.
    pub reclaimed: usize,
    /// Objects that survived.
    pub live: usize,
    /// Objects that changed position.
    pub moved: usize,
    /// Roots that pointed into the temporaries.
    pub roots: usize,
}

/// An object's old and new position.
#[derive(Debug, Clone, Copy)]
struct Relocation {
    old: usize,
    new: usize,
    len: usize,
}

pub(super) fn collect(arena: &mut Arena, registry: &mut Registry) -> Collection {
    let base = arena.globals;
    let end = arena.temporaries;

    let roots = gather(arena, registry, base..end);
    let live = mark(arena, base..end, &roots);
    let relocations = compact(arena, base..end, &live);

    let new_end = relocations.last().map(|r| r.new + r.len).unwrap_or(base);
    let reclaimed = end - new_end;

    // The scratchpad sits right above the temporaries.
    let scratch_len = arena.scratch - end;
    if reclaimed > 0 && scratch_len > 0 {
        arena.memory.copy_within(end..arena.scratch, new_end);
    }
    arena.temporaries = new_end;
    arena.scratch = new_end + scratch_len;

    let fix = |offset: usize| -> usize {
        if offset < base {
            offset
        } else if offset < end {
            relocate(&relocations, offset)
        } else {
            offset - reclaimed
        }
    };
    for level in 0..arena.depth() {
        let offset = arena.slot(level);
        arena.set_slot(level, fix(offset));
    }
    let patched: Vec<(usize, usize)> = registry.live().collect();
    for (slot, offset) in patched {
        registry.set(slot, fix(offset));
    }

    arena.collections += 1;
    arena.check_invariants();

    Collection {
        reclaimed,
        live: relocations.len(),
        moved: relocations.iter().filter(|r| r.old != r.new).count(),
        roots: roots.len(),
    }
}

/// Sorted, deduplicated root offsets inside `range`.
fn gather(arena: &Arena, registry: &Registry, range: Range<usize>) -> Vec<usize> {
    let mut roots: Vec<usize> = (0..arena.depth())
        .map(|level| arena.slot(level))
        .chain(registry.live().map(|(_, offset)| offset))
        .filter(|offset| range.contains(offset))
        .collect();
    roots.sort_unstable();
    roots.dedup();
    roots
}

/// Mark each object in `range` that has a root at or inside it.
/// Bits are indexed by position relative to the start of the range.
fn mark(arena: &Arena, range: Range<usize>, roots: &[usize]) -> BitSet {
    let mut live = BitSet::with_capacity(range.len());
    let mut roots = roots.iter().peekable();
    let mut at = range.start;
    while at < range.end {
        let size = dispatch::size(&arena.memory[at..range.end]);
        let next = at + size;
        let mut hit = false;
        while let Some(&&root) = roots.peek() {
            if root >= next {
                break;
            }
            hit = true;
            roots.next();
        }
        if hit {
            live.set(at - range.start);
        }
        at = next;
    }
    debug_assert_eq!(at, range.end, "objects overran the temporaries");
    live
}

fn compact(arena: &mut Arena, range: Range<usize>, live: &BitSet) -> Vec<Relocation> {
    let mut relocations = Vec::with_capacity(live.count());
    let mut at = range.start;
    let mut to = range.start;
    while at < range.end {
        let len = dispatch::size(&arena.memory[at..range.end]);
        if live.get(at - range.start) {
            if to != at {
                arena.memory.copy_within(at..at + len, to);
            }
            relocations.push(Relocation { old: at, new: to, len });
            to += len;
        }
        at += len;
    }
    relocations
}

/// New position for a root into a live object.
fn relocate(relocations: &[Relocation], offset: usize) -> usize {
    let idx = relocations.partition_point(|r| r.old <= offset);
    match idx.checked_sub(1).map(|i| relocations[i]) {
        Some(r) if offset < r.old + r.len => r.new + (offset - r.old),
        _ => unreachable!("root {offset} is not inside any live object"),
    }
}

/// Move every root in `range` so that `range.start` lands on `to`.
/// Used when the permanent region grows or shrinks under the temporaries.
pub(super) fn move_roots(arena: &mut Arena, registry: &mut Registry, range: Range<usize>, to: usize) {
    let moved = |offset: usize| {
        if range.contains(&offset) {
            Some(to + (offset - range.start))
        } else {
            None
        }
    };
    for level in 0..arena.depth() {
        if let Some(offset) = moved(arena.slot(level)) {
            arena.set_slot(level, offset);
        }
    }
    let slots: Vec<(usize, usize)> = registry.live().collect();
    for (slot, offset) in slots {
        if let Some(offset) = moved(offset) {
            registry.set(slot, offset);
        }
    }
}
