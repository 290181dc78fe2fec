//! Integers and decimals.
//!
//! Integers carry their sign in the tag and a LEB128 magnitude, so small
//! values take two bytes. Decimals are IEEE-754 doubles; the arithmetic
//! behind them is the host's.

use crate::data::objects::{self, Decimal, Integer, Object};
use crate::data::{Ptr, Tag};
use crate::dispatch::{Handlers, ALGEBRAIC};
use crate::eval::Error;
use crate::reader::token::{is_decimal, is_integer};
use crate::reader::{Parsed, Parser};
use crate::render::Renderer;

use super::next_token;

pub static INTEGER: Handlers = Handlers {
    name: "integer",
    base: Some(&ALGEBRAIC),
    size: Some(objects::varint_size),
    parse: Some(parse_integer),
    render: Some(render_number),
    help: Some("Integers"),
    ..Handlers::NONE
};

pub static DECIMAL: Handlers = Handlers {
    name: "decimal",
    base: Some(&ALGEBRAIC),
    size: Some(objects::word_size),
    parse: Some(parse_decimal),
    render: Some(render_number),
    help: Some("Decimal numbers"),
    marker: Some('.'),
    ..Handlers::NONE
};

fn parse_integer<'rt>(tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    // Both signs come from one grammar; a permissive pass wants decimals.
    if tag != Tag::Integer || parser.permissive() {
        return Parsed::Skip;
    }
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !is_integer(token.text) {
        return Parsed::Skip;
    }
    let (negative, digits) = match token.text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, token.text),
    };
    let Ok(magnitude) = digits.parse::<u64>() else {
        return Parsed::Warn(format!("{} does not fit in an integer", token.text));
    };
    parser.accept(token);
    parser.make(&Integer {
        negative,
        magnitude,
    })
}

fn parse_decimal<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !(is_decimal(token.text) || parser.permissive() && is_integer(token.text)) {
        return Parsed::Skip;
    }
    match token.text.parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            Parsed::Fail(parser.error(format!("{} is out of range", token.text)))
        }
        Ok(value) => {
            parser.accept(token);
            parser.make(&Decimal(value))
        }
        Err(e) => Parsed::Fail(parser.error(format!("bad decimal {:?}: {e}", token.text))),
    }
}

/// Canonical text for a decimal: always has a `.` so it reads back as one.
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-5..1e15).contains(&magnitude) {
        let text = format!("{value:e}");
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                format!("{mantissa}.e{exponent}")
            }
            _ => text,
        };
    }
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        text + "."
    }
}

fn render_number(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    match object.get()? {
        Object::Integer(i) => r.put(&i.to_string()),
        Object::Decimal(d) => r.put(&format_decimal(d)),
        v => Err(Error::InvalidObject(format!("{v:?} is not a number"))),
    }
}
