//! RPL evaluator.
//!
//! Evaluation is direct: each object's Evaluate handler does its work on the
//! runtime's stack, and composites recurse through [`crate::dispatch`].
//! Commands live in the submodules below, grouped by what they act on;
//! every one of them checks its arguments before touching the stack, so a
//! failed command leaves the stack as it found it. `EVAL` is the exception:
//! its argument is consumed before it runs.

pub mod arith;
pub mod lists;
pub mod stack;
pub mod store;

#[cfg(test)]
mod commands_test;

use crate::data::objects::Object;
use crate::data::Ptr;
use crate::dispatch;
use crate::reader::ReadErr;

/// Errors reported by the runtime and its commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No room left in the arena, even after a collection.
    OutOfMemory { requested: usize },
    TooFewArguments { needed: usize, depth: usize },
    BadArgumentType(&'static str),
    DivideByZero,
    /// A decimal result that is infinite or not a number.
    Overflow,
    /// No handler in the kind's chain answers the operation.
    NotImplemented { op: &'static str, tag: &'static str },
    InvalidObject(String),
    Undefined(String),
    InvalidName,
    /// A condition left the stack at the wrong depth.
    BadStackDepth { expected: usize, got: usize },
    Interrupted,
    RecursionLimit,
    Read(ReadErr),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutOfMemory { requested } => {
                write!(f, "out of memory ({requested} bytes requested)")
            }
            Error::TooFewArguments { needed, depth } => {
                write!(f, "too few arguments: need {needed}, stack has {depth}")
            }
            Error::BadArgumentType(expected) => write!(f, "bad argument type: expected {expected}"),
            Error::DivideByZero => write!(f, "divide by zero"),
            Error::Overflow => write!(f, "numeric overflow"),
            Error::NotImplemented { op, tag } => write!(f, "{op} is not implemented for {tag}"),
            Error::InvalidObject(why) => write!(f, "invalid object: {why}"),
            Error::Undefined(name) => write!(f, "undefined name {name}"),
            Error::InvalidName => write!(f, "invalid name"),
            Error::BadStackDepth { expected, got } => {
                write!(f, "bad stack depth: expected {expected}, got {got}")
            }
            Error::Interrupted => write!(f, "interrupted"),
            Error::RecursionLimit => write!(f, "too many nested objects"),
            Error::Read(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReadErr> for Error {
    fn from(value: ReadErr) -> Self {
        Error::Read(value)
    }
}

/// Evaluate each child of a list or program, in order.
pub fn run(sequence: &Ptr) -> Result<(), Error> {
    let rt = sequence.runtime();
    for child in sequence.children() {
        rt.interrupt().check()?;
        dispatch::evaluate(&child)?;
    }
    Ok(())
}

/// Run a condition clause and pop its truth value.
pub fn test(condition: &Ptr) -> Result<bool, Error> {
    let rt = condition.runtime();
    let before = rt.depth();
    run(condition)?;
    let after = rt.depth();
    if after != before + 1 {
        return Err(Error::BadStackDepth {
            expected: before + 1,
            got: after,
        });
    }
    truth(&rt.pop()?)
}

/// Non-zero numbers are true.
pub fn truth(value: &Ptr) -> Result<bool, Error> {
    match value.get()? {
        Object::Integer(i) => Ok(i != 0),
        Object::Decimal(d) => Ok(d != 0.0),
        _ => Err(Error::BadArgumentType("a number as a condition")),
    }
}
