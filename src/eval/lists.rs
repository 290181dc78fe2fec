//! Lists and text conversion.

use crate::data::objects::{self, Object};
use crate::data::{Runtime, Tag};
use crate::eval::Error;
use crate::render;

fn count(rt: &Runtime) -> Result<usize, Error> {
    match rt.peek(0)?.get()? {
        Object::Integer(i) if i >= 0 => {
            usize::try_from(i).map_err(|_| Error::BadArgumentType("a count"))
        }
        _ => Err(Error::BadArgumentType("a non-negative integer")),
    }
}

/// `obj1 ... objn n →LIST`
pub fn to_list(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let n = count(rt)?;
    rt.args(n.saturating_add(1))?;
    let mark = rt.scratch_mark();
    let copied = (1..=n)
        .rev()
        .try_for_each(|level| rt.scratch_append_object(&rt.peek(level)?));
    if let Err(e) = copied {
        rt.scratch_release(mark);
        return Err(e);
    }
    let list = rt.make_from_scratch(Tag::List, mark)?;
    rt.set(n, &list)?;
    rt.discard(n)
}

/// `{ obj1 ... objn } LIST→`: the elements, then their count.
pub fn from_list(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let list = rt.peek(0)?;
    if list.tag() != Tag::List {
        return Err(Error::BadArgumentType("a list"));
    }
    let children = list.children();
    let n = rt.make(&objects::Integer::from(children.len() as i64))?;
    let mut pushed = 0;
    for object in children.iter().chain(std::iter::once(&n)) {
        if let Err(e) = rt.push(object) {
            rt.discard(pushed)?;
            return Err(e);
        }
        pushed += 1;
    }
    // Bring the list up from under its contents and drop it.
    rt.roll(pushed + 1)?;
    rt.discard(1)
}

/// Elements of a list, or characters of a text.
pub fn size(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let object = rt.peek(0)?;
    let size = match object.get()? {
        Object::Composite(Tag::List, n) => n,
        Object::Text(s) => s.chars().count(),
        _ => return Err(Error::BadArgumentType("a list or text")),
    };
    let size = rt.make(&objects::Integer::from(size as i64))?;
    rt.set(0, &size)
}

/// `obj →STR`
pub fn to_text(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let text = render::to_text(&rt.peek(0)?)?;
    rt.set(0, &text)
}
