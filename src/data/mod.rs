//! The object runtime: one arena, its roots, and the operations that allocate.
//!
//! All objects live in a single fixed-size byte arena (see `arena`).
//! Anything that must survive an allocating call is held through a [`Ptr`],
//! which is registered with the runtime and patched by the collector.
//! Raw positions ([`Offset`]) are only valid until the next allocation.
//!
//! The runtime is used through `&self`: the arena and the registry sit in
//! `RefCell`s, so a `Ptr` can be created, cloned and dropped while other
//! pointers into the same runtime are alive.

mod arena;
mod bitset;
mod gc;
mod globals;
pub mod leb128;
pub mod objects;
mod roots;
mod tag;

#[cfg(feature = "render")]
mod graphviz;

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::eval::Error;
use crate::Config;
use arena::{Arena, STACK_SLOT};
use objects::Construct;
use roots::Registry;

pub use gc::Collection;
#[cfg(feature = "render")]
pub use graphviz::render_arena;
pub use roots::Ptr;
pub use tag::Tag;

/// A raw position in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(pub(crate) u32);

impl Offset {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A cooperative cancellation flag.
///
/// Clones share the flag, so a host can keep one and raise it from another
/// thread (e.g. a signal handler) while the runtime runs a long loop.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Err(Interrupted) if the flag is raised. The flag is left set.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_raised() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    /// Bytes in the permanent region.
    pub globals: usize,
    /// Bytes in the temporaries region.
    pub temporaries: usize,
    /// Bytes in the scratchpad.
    pub scratch: usize,
    /// Stack depth, in entries.
    pub stack: usize,
    /// Bytes between the scratchpad and the stack.
    pub free: usize,
    pub collections: usize,
    /// Live safe pointers.
    pub roots: usize,
}

impl MemoryStats {
    fn max(self, other: MemoryStats) -> MemoryStats {
        MemoryStats {
            globals: self.globals.max(other.globals),
            temporaries: self.temporaries.max(other.temporaries),
            scratch: self.scratch.max(other.scratch),
            stack: self.stack.max(other.stack),
            free: self.free.max(other.free),
            collections: self.collections.max(other.collections),
            roots: self.roots.max(other.roots),
        }
    }
}

/// Deepest nesting of evaluation, parsing, and rendering.
const MAX_NESTING: usize = 256;

pub struct Runtime {
    arena: RefCell<Arena>,
    roots: RefCell<Registry>,
    interrupt: Interrupt,
    nesting: Cell<usize>,
    high_water: Cell<MemoryStats>,
}

/// Held while one level of nesting is active; see [`Runtime::nest`].
pub struct Nesting<'rt>(&'rt Runtime);

impl Drop for Nesting<'_> {
    fn drop(&mut self) {
        self.0.nesting.set(self.0.nesting.get() - 1);
    }
}

impl Runtime {
    pub fn new(config: &Config) -> Self {
        Runtime {
            arena: RefCell::new(Arena::new(config.memory)),
            roots: Default::default(),
            interrupt: Default::default(),
            nesting: Cell::new(0),
            high_water: Default::default(),
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Enter one more level of recursion, failing if it goes too deep.
    pub fn nest(&self) -> Result<Nesting<'_>, Error> {
        let depth = self.nesting.get();
        if depth >= MAX_NESTING {
            return Err(Error::RecursionLimit);
        }
        self.nesting.set(depth + 1);
        Ok(Nesting(self))
    }

    pub fn stats(&self) -> MemoryStats {
        let arena = self.arena.borrow();
        let stats = MemoryStats {
            globals: arena.globals,
            temporaries: arena.temporaries - arena.globals,
            scratch: arena.scratch_len(),
            stack: arena.depth(),
            free: arena.free(),
            collections: arena.collections,
            roots: self.roots.borrow().len(),
        };
        self.high_water.set(self.high_water.get().max(stats));
        stats
    }

    /// High-water marks of every statistic seen so far.
    /// `free` is the most free space seen.
    pub fn max_stats(&self) -> MemoryStats {
        self.stats();
        MemoryStats {
            roots: self.high_water.get().roots.max(self.roots.borrow().high_water()),
            ..self.high_water.get()
        }
    }

    pub fn capacity(&self) -> usize {
        self.arena.borrow().capacity()
    }

    /// Run a collection now.
    pub fn collect(&self) -> Collection {
        self.stats();
        let mut arena = self.arena.borrow_mut();
        let mut roots = self.roots.borrow_mut();
        let before = arena.temporaries;
        let collection = gc::collect(&mut arena, &mut roots);
        tracing::debug!(
            before,
            after = arena.temporaries,
            reclaimed = collection.reclaimed,
            live = collection.live,
            moved = collection.moved,
            roots = collection.roots,
            "collected temporaries"
        );
        collection
    }

    /// Make sure `n` bytes are free, collecting if they are not.
    fn reserve(&self, n: usize) -> Result<(), Error> {
        if self.arena.borrow().free() >= n {
            return Ok(());
        }
        self.collect();
        let free = self.arena.borrow().free();
        if free >= n {
            Ok(())
        } else {
            tracing::warn!(requested = n, free, "out of memory after collection");
            Err(Error::OutOfMemory { requested: n })
        }
    }

    /// Reserve `n` bytes at the end of the temporaries.
    ///
    /// May collect. The returned offset is not tracked: it is only valid
    /// until the next allocation. On failure nothing is written.
    pub fn allocate(&self, n: usize) -> Result<Offset, Error> {
        self.reserve(n)?;
        match self.arena.borrow_mut().bump(n) {
            Some(at) => {
                tracing::trace!(at, n, "allocated");
                Ok(Offset(at as u32))
            }
            None => unreachable!("reserved space vanished"),
        }
    }

    /// Release the last `n` bytes allocated. Only valid LIFO, and only when
    /// nothing refers to those bytes any more.
    pub fn free(&self, n: usize) {
        tracing::trace!(n, "freed");
        self.arena.borrow_mut().release(n)
    }

    /// Construct an object in the temporaries.
    pub fn make(&self, ctor: &impl Construct) -> Result<Ptr<'_>, Error> {
        let n = ctor.required_memory();
        let at = self.allocate(n)?.get();
        ctor.write(&mut self.arena.borrow_mut().memory[at..at + n]);
        Ok(Ptr::new(self, at))
    }

    /// Turn the scratchpad bytes above `mark` into the payload of a new
    /// length-prefixed object, then release them.
    pub fn make_from_scratch(&self, tag: Tag, mark: usize) -> Result<Ptr<'_>, Error> {
        let length = self.arena.borrow().scratch_len() - mark;
        let header = tag.encoded_len() + leb128::encoded_len(length as u64);
        // Allocating moves the scratchpad up, but marks are relative to it.
        let at = match self.allocate(header + length) {
            Ok(at) => at.get(),
            Err(e) => {
                self.scratch_release(mark);
                return Err(e);
            }
        };
        let mut arena = self.arena.borrow_mut();
        let from = arena.temporaries + mark;
        arena
            .memory
            .copy_within(from..from + length, at + header);
        let n = leb128::write(tag.value(), &mut arena.memory[at..]);
        leb128::write(length as u64, &mut arena.memory[at + n..]);
        arena.scratch_truncate(mark);
        drop(arena);
        Ok(Ptr::new(self, at))
    }

    /// The current end of the scratchpad, to return to later.
    pub fn scratch_mark(&self) -> usize {
        self.arena.borrow().scratch_len()
    }

    /// Drop everything written to the scratchpad since `mark`.
    pub fn scratch_release(&self, mark: usize) {
        self.arena.borrow_mut().scratch_truncate(mark)
    }

    /// A copy of the scratchpad bytes since `mark`.
    pub fn scratch_bytes(&self, mark: usize) -> Vec<u8> {
        self.arena.borrow().scratch_from(mark).to_vec()
    }

    /// Append bytes to the scratchpad. May collect.
    pub fn scratch_append(&self, bytes: &[u8]) -> Result<(), Error> {
        self.reserve(bytes.len())?;
        let mut arena = self.arena.borrow_mut();
        match arena.scratch_grow(bytes.len()) {
            Some(at) => arena.memory[at..at + bytes.len()].copy_from_slice(bytes),
            None => unreachable!("reserved space vanished"),
        }
        tracing::trace!(len = bytes.len(), "scratchpad append");
        Ok(())
    }

    /// Append a copy of an object to the scratchpad. May collect.
    pub fn scratch_append_object(&self, object: &Ptr) -> Result<(), Error> {
        let size = object.size();
        self.reserve(size)?;
        // Only read the position after any collection.
        let from = object.position();
        let mut arena = self.arena.borrow_mut();
        match arena.scratch_grow(size) {
            Some(at) => arena.memory.copy_within(from..from + size, at),
            None => unreachable!("reserved space vanished"),
        }
        Ok(())
    }

    /// Number of objects on the stack.
    pub fn depth(&self) -> usize {
        self.arena.borrow().depth()
    }

    /// Fail with TooFewArguments unless the stack holds at least `n` objects.
    pub fn args(&self, n: usize) -> Result<(), Error> {
        let depth = self.depth();
        if depth < n {
            Err(Error::TooFewArguments { needed: n, depth })
        } else {
            Ok(())
        }
    }

    pub fn push(&self, object: &Ptr) -> Result<(), Error> {
        self.reserve(STACK_SLOT)?;
        let at = object.position();
        if !self.arena.borrow_mut().push_slot(at) {
            unreachable!("reserved space vanished");
        }
        Ok(())
    }

    pub fn pop(&self) -> Result<Ptr<'_>, Error> {
        let top = self.peek(0)?;
        self.arena.borrow_mut().drop_slots(1);
        Ok(top)
    }

    /// The object at `level`, where 0 is the top of the stack.
    pub fn peek(&self, level: usize) -> Result<Ptr<'_>, Error> {
        self.args(level + 1)?;
        let at = self.arena.borrow().slot(level);
        Ok(Ptr::new(self, at))
    }

    /// Replace the object at `level`.
    pub fn set(&self, level: usize, object: &Ptr) -> Result<(), Error> {
        self.args(level + 1)?;
        let at = object.position();
        self.arena.borrow_mut().set_slot(level, at);
        Ok(())
    }

    /// Remove `n` objects from the top of the stack.
    pub fn discard(&self, n: usize) -> Result<(), Error> {
        self.args(n)?;
        self.arena.borrow_mut().drop_slots(n);
        Ok(())
    }

    pub fn clear(&self) {
        let mut arena = self.arena.borrow_mut();
        let depth = arena.depth();
        arena.drop_slots(depth);
    }

    pub fn swap(&self) -> Result<(), Error> {
        self.roll(2)
    }

    /// Move the object at `level` n-1 to the top, shifting the ones above it down.
    pub fn roll(&self, n: usize) -> Result<(), Error> {
        if n == 0 {
            return Ok(());
        }
        self.args(n)?;
        let mut arena = self.arena.borrow_mut();
        let moved = arena.slot(n - 1);
        for level in (1..n).rev() {
            let above = arena.slot(level - 1);
            arena.set_slot(level, above);
        }
        arena.set_slot(0, moved);
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(&Config::default())
    }
}
