//! Arithmetic, comparison and logic.
//!
//! Integers stay integers while the result is exact and fits the object
//! encoding; anything else falls back to a decimal.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

use crate::data::objects::{self, Object};
use crate::data::{Ptr, Runtime};
use crate::eval::{truth, Error};

/// A numeric argument, decoded from the stack.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i128),
    Decimal(f64),
}

impl Number {
    pub fn from_ptr(object: &Ptr) -> Result<Number, Error> {
        match object.get()? {
            Object::Integer(i) => Ok(Number::Integer(i)),
            Object::Decimal(d) => Ok(Number::Decimal(d)),
            _ => Err(Error::BadArgumentType("a number")),
        }
    }

    /// Allocate the number as an object. Decimals must be finite.
    pub fn make(self, rt: &Runtime) -> Result<Ptr<'_>, Error> {
        match self {
            Number::Integer(i) => match objects::Integer::from_wide(i) {
                Some(integer) => rt.make(&integer),
                None => rt.make(&objects::Decimal(i as f64)),
            },
            Number::Decimal(d) if d.is_finite() => rt.make(&objects::Decimal(d)),
            Number::Decimal(_) => Err(Error::Overflow),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Decimal(d) => d,
        }
    }

    pub fn is_negative(self) -> bool {
        match self {
            Number::Integer(i) => i < 0,
            Number::Decimal(d) => d < 0.0,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Decimal(d) => d == 0.0,
        }
    }

    /// Exact quotients stay integers.
    pub fn divide(self, divisor: Number) -> Result<Number, Error> {
        if divisor.is_zero() {
            return Err(Error::DivideByZero);
        }
        match (self, divisor) {
            (Number::Integer(a), Number::Integer(b)) if a % b == 0 => Ok(Number::Integer(a / b)),
            (a, b) => Ok(Number::Decimal(a.as_f64() / b.as_f64())),
        }
    }

    pub fn abs(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(i.abs()),
            Number::Decimal(d) => Number::Decimal(d.abs()),
        }
    }
}

macro_rules! integer_or_decimal {
    ($trait:ident, $method:ident, $checked:ident, $op:tt) => {
        impl $trait for Number {
            type Output = Number;

            fn $method(self, rhs: Number) -> Number {
                match (self, rhs) {
                    (Number::Integer(a), Number::Integer(b)) => a
                        .$checked(b)
                        .map(Number::Integer)
                        .unwrap_or(Number::Decimal(a as f64 $op b as f64)),
                    (a, b) => Number::Decimal(a.as_f64() $op b.as_f64()),
                }
            }
        }
    };
}

integer_or_decimal!(Add, add, checked_add, +);
integer_or_decimal!(Sub, sub, checked_sub, -);
integer_or_decimal!(Mul, mul, checked_mul, *);

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(-i),
            Number::Decimal(d) => Number::Decimal(-d),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.partial_cmp(b),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Replace the top `n` entries with `result`.
/// Nothing is removed until the result exists.
fn replace(rt: &Runtime, n: usize, result: &Ptr) -> Result<(), Error> {
    rt.set(n - 1, result)?;
    rt.discard(n - 1)
}

fn binary(rt: &Runtime, op: impl FnOnce(Number, Number) -> Result<Number, Error>) -> Result<(), Error> {
    rt.args(2)?;
    let x = Number::from_ptr(&rt.peek(1)?)?;
    let y = Number::from_ptr(&rt.peek(0)?)?;
    let result = op(x, y)?.make(rt)?;
    replace(rt, 2, &result)
}

fn unary(rt: &Runtime, op: impl FnOnce(Number) -> Number) -> Result<(), Error> {
    rt.args(1)?;
    let x = Number::from_ptr(&rt.peek(0)?)?;
    let result = op(x).make(rt)?;
    replace(rt, 1, &result)
}

pub fn add(rt: &Runtime) -> Result<(), Error> {
    binary(rt, |x, y| Ok(x + y))
}

pub fn sub(rt: &Runtime) -> Result<(), Error> {
    binary(rt, |x, y| Ok(x - y))
}

pub fn mul(rt: &Runtime) -> Result<(), Error> {
    binary(rt, |x, y| Ok(x * y))
}

pub fn div(rt: &Runtime) -> Result<(), Error> {
    binary(rt, Number::divide)
}

pub fn neg(rt: &Runtime) -> Result<(), Error> {
    unary(rt, Number::neg)
}

pub fn abs(rt: &Runtime) -> Result<(), Error> {
    unary(rt, Number::abs)
}

fn flag(rt: &Runtime, value: bool) -> Result<Ptr<'_>, Error> {
    rt.make(&objects::Integer::from(value as i64))
}

/// Numbers compare by value, text by content.
fn order(x: &Ptr, y: &Ptr) -> Result<Option<Ordering>, Error> {
    match (x.get()?, y.get()?) {
        (Object::Text(a), Object::Text(b)) => Ok(Some(a.cmp(&b))),
        _ => Ok(Number::from_ptr(x)?.partial_cmp(&Number::from_ptr(y)?)),
    }
}

fn compare(rt: &Runtime, test: fn(Ordering) -> bool) -> Result<(), Error> {
    rt.args(2)?;
    let ordering = order(&rt.peek(1)?, &rt.peek(0)?)?;
    let result = flag(rt, ordering.is_some_and(test))?;
    replace(rt, 2, &result)
}

/// Numbers are equal by value; anything else is equal when its bytes are.
fn same(x: &Ptr, y: &Ptr) -> Result<bool, Error> {
    match (Number::from_ptr(x), Number::from_ptr(y)) {
        (Ok(a), Ok(b)) => Ok(a == b),
        _ => Ok(x.to_bytes() == y.to_bytes()),
    }
}

fn equality(rt: &Runtime, equal: bool) -> Result<(), Error> {
    rt.args(2)?;
    let result = same(&rt.peek(1)?, &rt.peek(0)?)?;
    let result = flag(rt, result == equal)?;
    replace(rt, 2, &result)
}

pub fn eq(rt: &Runtime) -> Result<(), Error> {
    equality(rt, true)
}

pub fn ne(rt: &Runtime) -> Result<(), Error> {
    equality(rt, false)
}

pub fn lt(rt: &Runtime) -> Result<(), Error> {
    compare(rt, Ordering::is_lt)
}

pub fn gt(rt: &Runtime) -> Result<(), Error> {
    compare(rt, Ordering::is_gt)
}

pub fn le(rt: &Runtime) -> Result<(), Error> {
    compare(rt, Ordering::is_le)
}

pub fn ge(rt: &Runtime) -> Result<(), Error> {
    compare(rt, Ordering::is_ge)
}

fn logic(rt: &Runtime, op: fn(bool, bool) -> bool) -> Result<(), Error> {
    rt.args(2)?;
    let x = truth(&rt.peek(1)?)?;
    let y = truth(&rt.peek(0)?)?;
    let result = flag(rt, op(x, y))?;
    replace(rt, 2, &result)
}

pub fn and(rt: &Runtime) -> Result<(), Error> {
    logic(rt, |x, y| x && y)
}

pub fn or(rt: &Runtime) -> Result<(), Error> {
    logic(rt, |x, y| x || y)
}

pub fn not(rt: &Runtime) -> Result<(), Error> {
    rt.args(1)?;
    let x = truth(&rt.peek(0)?)?;
    let result = flag(rt, !x)?;
    replace(rt, 1, &result)
}
