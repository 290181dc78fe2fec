//! Stack manipulation.

use crate::data::objects::{self, Object};
use crate::data::{Ptr, Runtime};
use crate::eval::Error;

/// A count or level taken from the stack.
fn count(object: &Ptr) -> Result<usize, Error> {
    match object.get()? {
        Object::Integer(i) if i >= 0 => {
            usize::try_from(i).map_err(|_| Error::BadArgumentType("a stack level"))
        }
        _ => Err(Error::BadArgumentType("a non-negative integer")),
    }
}

pub fn dup(rt: &Runtime) -> Result<(), Error> {
    rt.push(&rt.peek(0)?)
}

pub fn drop(rt: &Runtime) -> Result<(), Error> {
    rt.discard(1)
}

pub fn swap(rt: &Runtime) -> Result<(), Error> {
    rt.swap()
}

pub fn over(rt: &Runtime) -> Result<(), Error> {
    rt.push(&rt.peek(1)?)
}

pub fn rot(rt: &Runtime) -> Result<(), Error> {
    rt.roll(3)
}

pub fn depth(rt: &Runtime) -> Result<(), Error> {
    let depth = rt.make(&objects::Integer::from(rt.depth() as i64))?;
    rt.push(&depth)
}

pub fn clear(rt: &Runtime) -> Result<(), Error> {
    rt.clear();
    Ok(())
}

/// `n PICK`: copy level n (counted after removing n) to the top.
pub fn pick(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let n = count(&rt.peek(0)?)?;
    if n == 0 {
        return Err(Error::BadArgumentType("a level of at least 1"));
    }
    rt.args(n.saturating_add(1))?;
    rt.set(0, &rt.peek(n)?)
}

/// `n DROPN`: remove n objects, and n itself.
pub fn drop_n(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let n = count(&rt.peek(0)?)?;
    rt.args(n.saturating_add(1))?;
    rt.discard(n + 1)
}

pub fn dup2(rt: &Runtime) -> Result<(), Error> {
    rt.args(2)?;
    rt.push(&rt.peek(1)?)?;
    if let Err(e) = rt.push(&rt.peek(1)?) {
        rt.discard(1)?;
        return Err(e);
    }
    Ok(())
}

pub fn drop2(rt: &Runtime) -> Result<(), Error> {
    rt.discard(2)
}
