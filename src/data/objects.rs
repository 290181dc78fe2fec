//! Object encoding.
//!
//! Every object is `[tag: LEB128][payload]`. The payload layouts are:
//!
//! - Integer, NegInteger: LEB128 magnitude.
//! - Decimal: 8 bytes, IEEE-754 binary64, little-endian.
//! - Text, Symbol: LEB128 byte length, then UTF-8 bytes.
//! - Quote, List, Program and the control structures: LEB128 payload length,
//!   then the children, each starting right after the previous one.
//! - Commands: nothing.
//!
//! There are no addresses inside objects, so any object can be moved by
//! copying its bytes, and its size can always be computed from the bytes.

use super::leb128;
use super::Tag;
use crate::eval::Error;

/// The tag at the start of an object.
///
/// The arena only ever holds objects written by `Construct`,
/// so an unknown tag means the arena is corrupted.
pub fn tag_of(bytes: &[u8]) -> Tag {
    match Tag::read(bytes) {
        Ok((tag, _)) => tag,
        Err(v) => unreachable!("invalid tag value {v}, possible arena corruption"),
    }
}

/// Size of an object whose payload is empty.
pub fn tag_only_size(bytes: &[u8]) -> usize {
    leb128::skip(bytes)
}

/// Size of an object whose payload is a single LEB128 value.
pub fn varint_size(bytes: &[u8]) -> usize {
    let tag = leb128::skip(bytes);
    tag + leb128::skip(&bytes[tag..])
}

/// Size of an object whose payload is eight bytes.
pub fn word_size(bytes: &[u8]) -> usize {
    leb128::skip(bytes) + 8
}

/// Size of an object whose payload is length-prefixed.
pub fn prefixed_size(bytes: &[u8]) -> usize {
    let (header, length) = prefix(bytes);
    header + length
}

/// For a length-prefixed object: (bytes before the payload, payload length).
pub fn prefix(bytes: &[u8]) -> (usize, usize) {
    let tag = leb128::skip(bytes);
    match leb128::read(&bytes[tag..]) {
        Some((length, len)) => (tag + len, length as usize),
        None => unreachable!("unterminated length prefix, possible arena corruption"),
    }
}

/// Children of a length-prefixed composite: (position relative to the object, size).
/// Sizes come from the dispatch table, so each child is skipped without being decoded.
pub fn children(bytes: &[u8]) -> Vec<(usize, usize)> {
    if !tag_of(bytes).is_composite() {
        return Vec::new();
    }
    let (header, length) = prefix(bytes);
    let end = header + length;
    let mut result = Vec::new();
    let mut at = header;
    while at < end {
        let size = crate::dispatch::size(&bytes[at..end]);
        result.push((at, size));
        at += size;
    }
    debug_assert_eq!(at, end, "children overran their composite");
    result
}

/// A constructor: something that knows how much memory its object needs,
/// and how to write it into memory reserved for it.
pub trait Construct {
    fn tag(&self) -> Tag;

    fn payload_len(&self) -> usize;

    /// Write the payload into exactly `payload_len` bytes.
    fn write_payload(&self, out: &mut [u8]);

    fn required_memory(&self) -> usize {
        self.tag().encoded_len() + self.payload_len()
    }

    /// Write the whole object into exactly `required_memory` bytes.
    fn write(&self, out: &mut [u8]) {
        let n = leb128::write(self.tag().value(), out);
        self.write_payload(&mut out[n..]);
    }
}

/// An integer: sign in the tag, magnitude in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integer {
    pub negative: bool,
    pub magnitude: u64,
}

impl Integer {
    /// Convert from a wide value; None if the magnitude needs more than 64 bits.
    pub fn from_wide(value: i128) -> Option<Self> {
        let magnitude = u64::try_from(value.unsigned_abs()).ok()?;
        Some(Integer {
            negative: value < 0,
            magnitude,
        })
    }

    pub fn value(&self) -> i128 {
        if self.negative {
            -(self.magnitude as i128)
        } else {
            self.magnitude as i128
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            negative: value < 0,
            magnitude: value.unsigned_abs(),
        }
    }
}

impl Construct for Integer {
    fn tag(&self) -> Tag {
        // There is no negative zero.
        if self.negative && self.magnitude != 0 {
            Tag::NegInteger
        } else {
            Tag::Integer
        }
    }

    fn payload_len(&self) -> usize {
        leb128::encoded_len(self.magnitude)
    }

    fn write_payload(&self, out: &mut [u8]) {
        leb128::write(self.magnitude, out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal(pub f64);

impl Construct for Decimal {
    fn tag(&self) -> Tag {
        Tag::Decimal
    }

    fn payload_len(&self) -> usize {
        8
    }

    fn write_payload(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.0.to_le_bytes());
    }
}

/// Text and symbols: a length-prefixed UTF-8 string.
#[derive(Debug, Clone, Copy)]
pub struct Text<'s> {
    pub tag: Tag,
    pub content: &'s str,
}

impl<'s> Text<'s> {
    pub fn text(content: &'s str) -> Self {
        Text {
            tag: Tag::Text,
            content,
        }
    }

    pub fn symbol(name: &'s str) -> Self {
        Text {
            tag: Tag::Symbol,
            content: name,
        }
    }
}

impl Construct for Text<'_> {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn payload_len(&self) -> usize {
        let n = self.content.len();
        leb128::encoded_len(n as u64) + n
    }

    fn write_payload(&self, out: &mut [u8]) {
        let n = leb128::write(self.content.len() as u64, out);
        out[n..].copy_from_slice(self.content.as_bytes());
    }
}

/// A command: the tag is the whole object.
#[derive(Debug, Clone, Copy)]
pub struct Command(pub Tag);

impl Construct for Command {
    fn tag(&self) -> Tag {
        debug_assert!(self.0.is_command());
        self.0
    }

    fn payload_len(&self) -> usize {
        0
    }

    fn write_payload(&self, _out: &mut [u8]) {}
}

/// A composite built from already-encoded children.
#[derive(Debug, Clone, Copy)]
pub struct Composite<'b> {
    pub tag: Tag,
    pub payload: &'b [u8],
}

impl Construct for Composite<'_> {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn payload_len(&self) -> usize {
        let n = self.payload.len();
        leb128::encoded_len(n as u64) + n
    }

    fn write_payload(&self, out: &mut [u8]) {
        let n = leb128::write(self.payload.len() as u64, out);
        out[n..].copy_from_slice(self.payload);
    }
}

/// Decoded view of an object, detached from the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i128),
    Decimal(f64),
    Text(String),
    Symbol(String),
    /// A length-prefixed composite and the number of children it holds.
    Composite(Tag, usize),
    Command(Tag),
}

impl Object {
    pub fn decode(bytes: &[u8]) -> Result<Object, Error> {
        let tag = tag_of(bytes);
        let tag_len = tag.encoded_len();
        let payload = &bytes[tag_len..];
        let object = match tag {
            Tag::Integer | Tag::NegInteger => {
                let (magnitude, _) = leb128::read(payload)
                    .ok_or_else(|| Error::InvalidObject("integer magnitude".to_owned()))?;
                let integer = Integer {
                    negative: tag == Tag::NegInteger,
                    magnitude,
                };
                Object::Integer(integer.value())
            }
            Tag::Decimal => {
                let raw: [u8; 8] = payload
                    .get(..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| Error::InvalidObject("decimal payload".to_owned()))?;
                Object::Decimal(f64::from_le_bytes(raw))
            }
            Tag::Text | Tag::Symbol => {
                let (header, length) = prefix(bytes);
                let content = core::str::from_utf8(&bytes[header..header + length])
                    .map_err(|_| Error::InvalidObject(format!("{tag} is not UTF-8")))?;
                if tag == Tag::Text {
                    Object::Text(content.to_owned())
                } else {
                    Object::Symbol(content.to_owned())
                }
            }
            t if t.is_composite() => Object::Composite(t, children(bytes).len()),
            t => Object::Command(t),
        };
        Ok(object)
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Object::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

impl Tag {
    /// Kinds laid out as a length prefix followed by children.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Tag::Quote
                | Tag::List
                | Tag::Program
                | Tag::IfThen
                | Tag::IfThenElse
                | Tag::DoUntil
                | Tag::WhileRepeat
                | Tag::StartNext
                | Tag::StartStep
        )
    }
}
