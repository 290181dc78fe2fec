//! Evaluation, global variables and memory.

use crate::data::objects::{self, Object};
use crate::data::{Ptr, Runtime, Tag};
use crate::dispatch;
use crate::eval::Error;

/// The variable name an object stands for: a symbol, or a quoted symbol.
fn name(object: &Ptr) -> Result<String, Error> {
    let named = match object.tag() {
        Tag::Quote => object.children().into_iter().next(),
        _ => Some(object.clone()),
    };
    match named.map(|p| p.get()).transpose()? {
        Some(Object::Symbol(s)) => Ok(s),
        _ => Err(Error::BadArgumentType("a name")),
    }
}

/// `obj EVAL`: remove `obj` and execute it.
///
/// The object is gone before it runs, so what it does to the stack starts
/// from the levels below it. It stays gone if execution fails.
pub fn eval(rt: &Runtime) -> Result<(), Error> {
    let object = rt.pop()?;
    dispatch::execute(&object)
}

/// `value 'name' STO`
pub fn sto(rt: &Runtime) -> Result<(), Error> {
    rt.args(2)?;
    let name = name(&rt.peek(0)?)?;
    rt.store(&name, &rt.peek(1)?)?;
    rt.discard(2)
}

/// `'name' RCL`
pub fn rcl(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let name = name(&rt.peek(0)?)?;
    match rt.lookup(&name) {
        Some(value) => rt.set(0, &value),
        None => Err(Error::Undefined(name)),
    }
}

/// `'name' PURGE`
pub fn purge(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let name = name(&rt.peek(0)?)?;
    if !rt.purge(&name)? {
        return Err(Error::Undefined(name));
    }
    rt.discard(1)
}

/// Free bytes, after a collection.
pub fn mem(rt: &Runtime) -> Result<(), Error> {
    rt.collect();
    let free = rt.stats().free;
    let free = rt.make(&objects::Integer::from(free as i64))?;
    rt.push(&free)
}

pub fn gc(rt: &Runtime) -> Result<(), Error> {
    rt.collect();
    Ok(())
}
