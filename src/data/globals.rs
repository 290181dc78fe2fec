//! Named global variables, stored in the permanent region.
//!
//! The permanent region is a flat run of bindings: a `Symbol` object naming
//! the variable, immediately followed by its value. Bindings never move
//! during collection. Adding or removing one shifts everything above the
//! permanent region, and every root above the edit point shifts with it.

use std::ops::Range;

use super::gc::move_roots;
use super::objects::{self, Construct, Text};
use super::{Ptr, Runtime};
use crate::dispatch;
use crate::eval::Error;

/// Position of one binding.
struct Binding {
    /// The name and the value.
    range: Range<usize>,
    /// Where the value starts.
    value: usize,
}

impl Runtime {
    fn find_binding(&self, name: &str) -> Option<Binding> {
        let arena = self.arena.borrow();
        let memory = &arena.memory[..arena.globals];
        let mut at = 0;
        while at < memory.len() {
            let name_size = dispatch::size(&memory[at..]);
            let value = at + name_size;
            let end = value + dispatch::size(&memory[value..]);
            let (header, length) = objects::prefix(&memory[at..]);
            if memory[at + header..at + header + length] == *name.as_bytes() {
                return Some(Binding {
                    range: at..end,
                    value,
                });
            }
            at = end;
        }
        None
    }

    /// The value bound to `name`. The pointer refers into the permanent
    /// region; nothing is copied.
    pub fn lookup(&self, name: &str) -> Option<Ptr<'_>> {
        let binding = self.find_binding(name)?;
        Some(Ptr::new(self, binding.value))
    }

    /// Names of every global, in the order they were stored.
    pub fn globals(&self) -> Vec<String> {
        let arena = self.arena.borrow();
        let memory = &arena.memory[..arena.globals];
        let mut names = Vec::new();
        let mut at = 0;
        while at < memory.len() {
            let name_size = dispatch::size(&memory[at..]);
            let (header, length) = objects::prefix(&memory[at..]);
            let name = &memory[at + header..at + header + length];
            names.push(String::from_utf8_lossy(name).into_owned());
            let value = at + name_size;
            at = value + dispatch::size(&memory[value..]);
        }
        names
    }

    /// Bind `name` to a copy of `value`, replacing any previous binding.
    pub fn store(&self, name: &str, value: &Ptr) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        let symbol = Text::symbol(name);
        let name_size = symbol.required_memory();
        let value_size = value.size();
        let total = name_size + value_size;

        // Nothing changes until the new binding is known to fit. A referenced
        // old binding is copied out before it is removed.
        let needed = match self.find_binding(name) {
            Some(Binding { range, .. }) if self.referenced(&range) => total.max(range.len()),
            Some(Binding { range, .. }) => total.saturating_sub(range.len()),
            None => total,
        };
        self.reserve(needed)?;

        // `value` may be the old binding; purging redirects it to a copy.
        self.purge(name)?;
        self.reserve(total)?;

        let mut arena = self.arena.borrow_mut();
        let mut roots = self.roots.borrow_mut();
        let at = arena.globals;
        let scratch = arena.scratch;
        arena.memory.copy_within(at..scratch, at + total);
        arena.temporaries += total;
        arena.scratch += total;
        move_roots(&mut arena, &mut roots, at..scratch, at + total);

        symbol.write(&mut arena.memory[at..at + name_size]);
        let from = roots.get(value.slot());
        arena
            .memory
            .copy_within(from..from + value_size, at + name_size);
        arena.globals += total;
        arena.check_invariants();

        tracing::debug!(name, bytes = total, "stored global");
        Ok(())
    }

    /// Whether a stack slot or safe pointer refers into `range`.
    fn referenced(&self, range: &Range<usize>) -> bool {
        let arena = self.arena.borrow();
        let roots = self.roots.borrow();
        let hit = (0..arena.depth())
            .map(|level| arena.slot(level))
            .chain(roots.live().map(|(_, offset)| offset))
            .any(|offset| range.contains(&offset));
        hit
    }

    /// Remove the binding for `name`. Returns false if there was none.
    ///
    /// Anything still referring into the binding is redirected to a copy
    /// of it in the temporaries.
    pub fn purge(&self, name: &str) -> Result<bool, Error> {
        let Some(Binding { range, .. }) = self.find_binding(name) else {
            return Ok(false);
        };
        let len = range.len();

        let referenced = self.referenced(&range);
        if referenced {
            // Collection never moves the permanent region, so `range` stays valid.
            let copy = self.allocate(len)?.get();
            let mut arena = self.arena.borrow_mut();
            let mut roots = self.roots.borrow_mut();
            arena.memory.copy_within(range.clone(), copy);
            move_roots(&mut arena, &mut roots, range.clone(), copy);
        }

        let mut arena = self.arena.borrow_mut();
        let mut roots = self.roots.borrow_mut();
        let scratch = arena.scratch;
        arena.memory.copy_within(range.end..scratch, range.start);
        move_roots(&mut arena, &mut roots, range.end..scratch, range.start);
        arena.globals -= len;
        arena.temporaries -= len;
        arena.scratch -= len;
        arena.check_invariants();

        tracing::debug!(name, bytes = len, copied = referenced, "purged global");
        Ok(true)
    }
}
