//! Handlers for each kind of object.

pub mod command;
pub mod composite;
pub mod control;
pub mod number;
pub mod text;

use crate::data::Ptr;
use crate::dispatch;
use crate::eval::Error;
use crate::reader::{Parsed, Parser, Token};
use crate::render::Renderer;

/// Evaluate handler for values: put the object itself on the stack.
pub fn push_self(object: &Ptr) -> Result<(), Error> {
    object.runtime().push(object)
}

/// The next token, or the outcome a grammar should return without one.
fn next_token<'rt, 's>(parser: &mut Parser<'rt, 's>) -> Result<Token<'s>, Parsed<'rt>> {
    match parser.token() {
        Ok(Some(t)) => Ok(t),
        Ok(None) => Err(Parsed::Skip),
        Err(e) => Err(Parsed::Fail(e)),
    }
}

/// Render objects separated by single spaces.
fn sequence(children: &[Ptr], r: &mut Renderer) -> Result<(), Error> {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            r.put(" ")?;
        }
        dispatch::render(child, r)?;
    }
    Ok(())
}
