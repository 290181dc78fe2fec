//! The byte arena holding every object, the scratchpad, and the stack.
//!
//! Layout, from low to high addresses:
//!
//! ```text
//! 0          globals      temporaries    scratch        stack       capacity
//! |-- permanent --|-- temporaries --|-- scratch --|-- free --|-- stack --|
//! ```
//!
//! - The permanent region holds global bindings; the collector never moves it.
//! - Temporaries are bump-allocated objects; the collector compacts them.
//! - The scratchpad holds work-in-progress bytes that are not yet objects.
//!   It always sits directly above the temporaries and moves with them.
//! - The stack is an array of 32-bit little-endian offsets growing down
//!   from the top of the arena. Level 1 (the top) is at the lowest address.
//!
//! The arena only knows about bytes and positions. Offsets returned here
//! are plain positions, valid until the next allocation or collection.

/// Bytes taken by one stack slot.
pub const STACK_SLOT: usize = core::mem::size_of::<u32>();

pub struct Arena {
    pub(super) memory: Box<[u8]>,
    /// End of the permanent region.
    pub(super) globals: usize,
    /// End of the temporaries; start of the scratchpad.
    pub(super) temporaries: usize,
    /// End of the scratchpad: the free pointer.
    pub(super) scratch: usize,
    /// Lowest address of the stack.
    pub(super) stack: usize,
    pub(super) collections: usize,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity <= u32::MAX as usize,
            "arena offsets are 32 bits; {capacity} bytes is too large"
        );
        Arena {
            memory: vec![0u8; capacity].into_boxed_slice(),
            globals: 0,
            temporaries: 0,
            scratch: 0,
            stack: capacity,
            collections: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Bytes between the scratchpad free pointer and the stack.
    pub fn free(&self) -> usize {
        self.stack - self.scratch
    }

    pub fn check_invariants(&self) {
        debug_assert!(self.globals <= self.temporaries);
        debug_assert!(self.temporaries <= self.scratch);
        debug_assert!(self.scratch <= self.stack);
        debug_assert!(self.stack <= self.capacity());
        debug_assert_eq!((self.capacity() - self.stack) % STACK_SLOT, 0);
    }

    /// Reserve `n` bytes at the end of the temporaries.
    /// The scratchpad moves up to make room.
    /// Returns None if there is not enough free space; this never collects.
    pub fn bump(&mut self, n: usize) -> Option<usize> {
        if n > self.free() {
            return None;
        }
        let at = self.temporaries;
        if self.scratch > self.temporaries {
            self.memory
                .copy_within(self.temporaries..self.scratch, self.temporaries + n);
        }
        self.temporaries += n;
        self.scratch += n;
        self.check_invariants();
        Some(at)
    }

    /// Release the last `n` bytes of the temporaries (LIFO).
    pub fn release(&mut self, n: usize) {
        assert!(
            n <= self.temporaries - self.globals,
            "released {n} bytes, only {} allocated",
            self.temporaries - self.globals
        );
        let new_end = self.temporaries - n;
        if self.scratch > self.temporaries {
            self.memory
                .copy_within(self.temporaries..self.scratch, new_end);
        }
        self.temporaries = new_end;
        self.scratch -= n;
        self.check_invariants();
    }

    /// Bytes currently held in the scratchpad.
    pub fn scratch_len(&self) -> usize {
        self.scratch - self.temporaries
    }

    /// Grow the scratchpad by `n` bytes, returning the absolute position of the new bytes.
    pub fn scratch_grow(&mut self, n: usize) -> Option<usize> {
        if n > self.free() {
            return None;
        }
        let at = self.scratch;
        self.scratch += n;
        Some(at)
    }

    /// Shrink the scratchpad back to `len` bytes.
    pub fn scratch_truncate(&mut self, len: usize) {
        assert!(len <= self.scratch_len(), "scratchpad mark is past its end");
        self.scratch = self.temporaries + len;
    }

    /// The scratchpad bytes from a relative mark to the end.
    pub fn scratch_from(&self, mark: usize) -> &[u8] {
        &self.memory[self.temporaries + mark..self.scratch]
    }

    pub fn depth(&self) -> usize {
        (self.capacity() - self.stack) / STACK_SLOT
    }

    fn slot_position(&self, level: usize) -> usize {
        debug_assert!(level < self.depth());
        self.stack + level * STACK_SLOT
    }

    /// The object offset held at `level` (0 is the top of the stack).
    pub fn slot(&self, level: usize) -> usize {
        let at = self.slot_position(level);
        let mut raw = [0u8; STACK_SLOT];
        raw.copy_from_slice(&self.memory[at..at + STACK_SLOT]);
        u32::from_le_bytes(raw) as usize
    }

    pub fn set_slot(&mut self, level: usize, offset: usize) {
        let at = self.slot_position(level);
        self.memory[at..at + STACK_SLOT].copy_from_slice(&(offset as u32).to_le_bytes());
    }

    /// Push an offset; false if there is no room for another slot.
    pub fn push_slot(&mut self, offset: usize) -> bool {
        if self.free() < STACK_SLOT {
            return false;
        }
        self.stack -= STACK_SLOT;
        self.set_slot(0, offset);
        true
    }

    /// Remove `n` slots from the top of the stack.
    pub fn drop_slots(&mut self, n: usize) {
        assert!(n <= self.depth(), "dropped {n} of {} stack levels", self.depth());
        self.stack += n * STACK_SLOT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_moves_scratchpad() {
        let mut arena = Arena::new(64);
        let at = arena.scratch_grow(3).unwrap();
        arena.memory[at..at + 3].copy_from_slice(b"abc");

        assert_eq!(arena.bump(4), Some(0));
        assert_eq!(arena.scratch_len(), 3);
        assert_eq!(arena.scratch_from(0), b"abc");

        arena.release(4);
        assert_eq!(arena.temporaries, 0);
        assert_eq!(arena.scratch_from(1), b"bc");
    }

    #[test]
    fn bump_exactly_to_capacity() {
        let mut arena = Arena::new(32);
        assert!(arena.push_slot(0));
        assert_eq!(arena.free(), 28);
        assert_eq!(arena.bump(29), None);
        assert_eq!(arena.bump(28), Some(0));
        assert_eq!(arena.free(), 0);
        assert!(!arena.push_slot(0));
    }

    #[test]
    fn stack_slots_grow_down() {
        let mut arena = Arena::new(32);
        assert!(arena.push_slot(7));
        assert!(arena.push_slot(9));
        assert_eq!(arena.depth(), 2);
        assert_eq!(arena.slot(0), 9);
        assert_eq!(arena.slot(1), 7);
        arena.drop_slots(1);
        assert_eq!(arena.slot(0), 7);
    }
}
