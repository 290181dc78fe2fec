//! Safe pointers: tracked references that survive collection.
//!
//! A `Ptr` does not hold an address. It holds a slot in the runtime's
//! registry, and the registry holds the object's current offset.
//! The collector rewrites registry slots when it moves objects,
//! so a `Ptr` always denotes the same logical object.
//!
//! Registration follows lexical nesting, so the registry is a vector
//! with a high-water mark: releasing the last slot pops it (and any vacant
//! slots below it); releasing an inner slot leaves a hole until the slots
//! above it are released.
//!
//! Object bytes are only reachable through `Ptr::with_bytes`, which borrows
//! the arena for the duration of the closure. Allocating inside that closure
//! panics on the arena's `RefCell` rather than reading moved memory.

use super::{Offset, Runtime};
use crate::data::objects::{self, Object};
use crate::data::Tag;
use crate::dispatch;
use crate::eval::Error;

const VACANT: u32 = u32::MAX;

#[derive(Default)]
pub struct Registry {
    slots: Vec<u32>,
    high_water: usize,
}

impl Registry {
    pub fn register(&mut self, offset: usize) -> usize {
        let slot = self.slots.len();
        self.slots.push(offset as u32);
        self.high_water = self.high_water.max(self.slots.len());
        slot
    }

    pub fn release(&mut self, slot: usize) {
        self.slots[slot] = VACANT;
        while self.slots.last() == Some(&VACANT) {
            self.slots.pop();
        }
    }

    pub fn get(&self, slot: usize) -> usize {
        let raw = self.slots[slot];
        debug_assert_ne!(raw, VACANT, "read from a released safe pointer");
        raw as usize
    }

    pub fn set(&mut self, slot: usize, offset: usize) {
        self.slots[slot] = offset as u32;
    }

    /// Live slots and their offsets.
    pub fn live(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, &o)| o != VACANT)
            .map(|(slot, &o)| (slot, o as usize))
    }

    /// Number of live safe pointers.
    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

/// A tracked reference to an object in the arena.
pub struct Ptr<'rt> {
    rt: &'rt Runtime,
    slot: usize,
}

impl<'rt> Ptr<'rt> {
    pub(crate) fn new(rt: &'rt Runtime, offset: usize) -> Self {
        let slot = rt.roots.borrow_mut().register(offset);
        Ptr { rt, slot }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.rt
    }

    /// Current position of the object. Only valid until the next allocation.
    pub fn offset(&self) -> Offset {
        Offset(self.rt.roots.borrow().get(self.slot) as u32)
    }

    pub(crate) fn position(&self) -> usize {
        self.rt.roots.borrow().get(self.slot)
    }

    /// The registry slot, for code that already holds the registry borrowed.
    pub(super) fn slot(&self) -> usize {
        self.slot
    }

    /// Run `f` over the object's bytes, from its tag to its last payload byte.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let at = self.position();
        let arena = self.rt.arena.borrow();
        let size = dispatch::size(&arena.memory[at..]);
        f(&arena.memory[at..at + size])
    }

    pub fn tag(&self) -> Tag {
        self.with_bytes(objects::tag_of)
    }

    /// Bytes taken by the object.
    pub fn size(&self) -> usize {
        self.with_bytes(|b| b.len())
    }

    /// A copy of the object's bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.with_bytes(|b| b.to_vec())
    }

    /// Decode the object into a value that does not borrow the arena.
    pub fn get(&self) -> Result<Object, Error> {
        self.with_bytes(Object::decode)
    }

    /// A pointer to a position `relative` bytes into this object.
    /// Used for the children of composites, which are stored in place.
    pub fn at(&self, relative: usize) -> Ptr<'rt> {
        Ptr::new(self.rt, self.position() + relative)
    }

    /// Children of a length-prefixed composite, in order.
    /// Empty for any other kind of object.
    pub fn children(&self) -> Vec<Ptr<'rt>> {
        let base = self.position();
        let spans = self.with_bytes(objects::children);
        spans
            .into_iter()
            .map(|(relative, _)| Ptr::new(self.rt, base + relative))
            .collect()
    }
}

impl Clone for Ptr<'_> {
    fn clone(&self) -> Self {
        Ptr::new(self.rt, self.position())
    }
}

impl Drop for Ptr<'_> {
    fn drop(&mut self) {
        self.rt.roots.borrow_mut().release(self.slot);
    }
}

impl PartialEq for Ptr<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.rt, other.rt) && self.position() == other.position()
    }
}

impl Eq for Ptr<'_> {}

impl core::fmt::Debug for Ptr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ptr")
            .field("slot", &self.slot)
            .field("offset", &self.offset())
            .finish()
    }
}

impl core::fmt::Display for Ptr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.tag(), self.offset())
    }
}
