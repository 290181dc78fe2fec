//! Reading RPL source into objects.
//!
//! The reader is recursive descent over the source text. At each position,
//! every object kind is offered the input in tag order through its Parse
//! handler, until one claims it. Composite kinds parse their children by
//! calling back into [`Parser::object`].
//!
//! Parsing a child allocates, and allocating can collect, so a composite
//! never holds the address of its partial contents. Each finished child is
//! copied into the scratchpad right away; when the composite closes, the
//! scratchpad bytes become its payload and the scratchpad is released back
//! to where it was.

pub mod token;

use crate::data::objects::Construct;
use crate::data::{Ptr, Runtime, Tag};
use crate::dispatch;
use crate::eval::Error;
pub use token::Token;

/// Error type if a read does not complete.
///
/// A reader may experience a true parsing error, e.g. `}`, that no additional
/// input can fix. This is distinct from an unexpected end of input, e.g. `{ 1`:
/// it may be that more input will fix the issue.
///
/// If input is coming in interactively, this is a useful distinction;
/// in the first case, we'd want to indicate an error to the user,
/// while in the latter we'd like to prompt the user for more input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadErr {
    Error { message: String, position: usize },
    Incomplete { message: String, position: usize },
}

impl std::fmt::Display for ReadErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadErr::Error { message, position } => {
                write!(f, "error in input at byte {position}: {message}")
            }
            ReadErr::Incomplete { message, position } => {
                write!(f, "incomplete input at byte {position}: {message}")
            }
        }
    }
}

impl std::error::Error for ReadErr {}

impl ReadErr {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        match self {
            ReadErr::Error { message, position } => ReadErr::Error {
                message: format!("{}: {}", more.as_ref(), message),
                position,
            },
            ReadErr::Incomplete { message, position } => ReadErr::Incomplete {
                message: format!("{}: {}", more.as_ref(), message),
                position,
            },
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, ReadErr::Incomplete { .. })
    }

    pub fn position(&self) -> usize {
        match self {
            ReadErr::Error { position, .. } | ReadErr::Incomplete { position, .. } => *position,
        }
    }
}

/// The main result type for this module.
pub type ReadResult<T> = Result<T, ReadErr>;

/// Outcome of offering the input to one object kind.
#[derive(Debug)]
pub enum Parsed<'rt> {
    /// The kind claimed the input and built an object.
    Done(Ptr<'rt>),
    /// Not this kind; try the next one.
    Skip,
    /// This kind applies but cannot represent the input;
    /// try again with more permissive grammars.
    Warn(String),
    /// Malformed input.
    Fail(ReadErr),
}

impl<'rt> From<ReadResult<Ptr<'rt>>> for Parsed<'rt> {
    fn from(value: ReadResult<Ptr<'rt>>) -> Self {
        match value {
            Ok(p) => Parsed::Done(p),
            Err(e) => Parsed::Fail(e),
        }
    }
}

pub struct Parser<'rt, 's> {
    rt: &'rt Runtime,
    source: &'s str,
    position: usize,
    permissive: bool,
}

impl<'rt, 's> Parser<'rt, 's> {
    pub fn new(rt: &'rt Runtime, source: &'s str) -> Self {
        Parser {
            rt,
            source,
            position: 0,
            permissive: false,
        }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.rt
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Set after a grammar warned; grammars may then accept more.
    pub fn permissive(&self) -> bool {
        self.permissive
    }

    /// The next token, without consuming it.
    pub fn token(&mut self) -> ReadResult<Option<Token<'s>>> {
        self.position += token::space(&self.source[self.position..]);
        token::next(self.source, self.position)
    }

    /// Consume a token returned by `token`.
    pub fn accept(&mut self, token: Token<'s>) {
        debug_assert_eq!(token.start, self.position);
        self.position = token.end;
    }

    pub fn error(&self, message: impl Into<String>) -> ReadErr {
        ReadErr::Error {
            message: message.into(),
            position: self.position,
        }
    }

    pub fn incomplete(&self, message: impl Into<String>) -> ReadErr {
        ReadErr::Incomplete {
            message: message.into(),
            position: self.position,
        }
    }

    fn runtime_error(&self, e: Error) -> ReadErr {
        match e {
            Error::Read(e) => e,
            e => self.error(e.to_string()),
        }
    }

    /// Construct an object for a grammar that has claimed the input.
    pub fn make(&self, ctor: &impl Construct) -> Parsed<'rt> {
        match self.rt.make(ctor) {
            Ok(p) => Parsed::Done(p),
            Err(e) => Parsed::Fail(self.runtime_error(e)),
        }
    }

    /// Parse one object at the current position.
    pub fn object(&mut self) -> ReadResult<Ptr<'rt>> {
        let _nesting = self.rt.nest().map_err(|e| self.runtime_error(e))?;
        let start = match self.token()? {
            Some(t) => t,
            None => return Err(self.incomplete("expected an object")),
        };
        for _pass in 0..2 {
            let mut warned = None;
            for &tag in Tag::ALL {
                self.position = start.start;
                match dispatch::parse(tag, self) {
                    Parsed::Done(p) => {
                        self.permissive = false;
                        tracing::trace!(%tag, at = start.start, "parsed");
                        return Ok(p);
                    }
                    Parsed::Skip => (),
                    Parsed::Warn(message) => {
                        tracing::trace!(%tag, message, "retrying with permissive grammars");
                        warned = Some(message);
                        break;
                    }
                    Parsed::Fail(e) => {
                        self.permissive = false;
                        return Err(e);
                    }
                }
            }
            match warned {
                Some(message) if self.permissive => {
                    self.permissive = false;
                    self.position = start.start;
                    return Err(self.error(message));
                }
                Some(_) => self.permissive = true,
                None => break,
            }
        }
        self.permissive = false;
        self.position = start.start;
        Err(self.error(format!("unexpected {:?}", start.text)))
    }

    /// Copy a finished child into the scratchpad.
    pub fn append(&self, child: &Ptr) -> ReadResult<()> {
        self.rt
            .scratch_append_object(child)
            .map_err(|e| self.runtime_error(e))
    }

    /// Parse children into the scratchpad until one of `terminators`,
    /// returning which terminator closed the sequence.
    fn children(&mut self, terminators: &[&str]) -> ReadResult<usize> {
        loop {
            let token = match self.token()? {
                Some(t) => t,
                None => {
                    return Err(self.incomplete(format!("expected {}", terminators.join(" or "))))
                }
            };
            let closing = terminators.iter().position(|&t| {
                token.is(t) || (t == "»" && token.closes_program())
            });
            if let Some(which) = closing {
                self.accept(token);
                return Ok(which);
            }
            let child = self.object()?;
            self.append(&child)?;
        }
    }

    /// Run `body` with a scratchpad mark, then turn everything it appended
    /// into one object of the tag it returns.
    /// On error the scratchpad is released back to the mark.
    pub fn structure(
        &mut self,
        body: impl FnOnce(&mut Self) -> ReadResult<Tag>,
    ) -> ReadResult<Ptr<'rt>> {
        let mark = self.rt.scratch_mark();
        match body(self) {
            Ok(tag) => self
                .rt
                .make_from_scratch(tag, mark)
                .map_err(|e| self.runtime_error(e)),
            Err(e) => {
                self.rt.scratch_release(mark);
                Err(e)
            }
        }
    }

    /// Parse children until a terminator into an object of kind `tag`.
    /// Returns the object and the index of the terminator that closed it.
    pub fn build(&mut self, tag: Tag, terminators: &[&str]) -> ReadResult<(Ptr<'rt>, usize)> {
        let mut which = 0;
        let object = self.structure(|p| {
            which = p.children(terminators)?;
            Ok(tag)
        })?;
        Ok((object, which))
    }

    /// Parse a program body until a terminator and append it to the scratchpad.
    pub fn clause(&mut self, terminators: &[&str]) -> ReadResult<usize> {
        let (body, which) = self.build(Tag::Program, terminators)?;
        self.append(&body)?;
        Ok(which)
    }

    /// Parse everything left in the source as the contents of a program.
    fn rest(&mut self) -> ReadResult<Ptr<'rt>> {
        self.structure(|p| {
            while p.token()?.is_some() {
                let child = p.object()?;
                p.append(&child)?;
            }
            Ok(Tag::Program)
        })
    }
}

/// Parse a single object; the whole input must be consumed.
pub fn parse<'rt>(rt: &'rt Runtime, source: &str) -> ReadResult<Ptr<'rt>> {
    let mut parser = Parser::new(rt, source);
    let object = parser.object()?;
    match parser.token()? {
        None => Ok(object),
        Some(t) => Err(parser.error(format!("unexpected {:?} after object", t.text))),
    }
}

/// Parse the input as a sequence of objects, returned as a program.
pub fn parse_body<'rt>(rt: &'rt Runtime, source: &str) -> ReadResult<Ptr<'rt>> {
    Parser::new(rt, source).rest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::objects::Object;

    #[test]
    fn list_payload_is_its_children() {
        let rt = Runtime::default();
        let list = parse(&rt, "{ 1 2 3 }").unwrap();
        assert_eq!(list.tag(), Tag::List);
        let bytes = list.to_bytes();
        // Tag, length prefix, three two-byte integers.
        assert_eq!(bytes.len(), 2 + 6);
        assert_eq!(bytes[1], 6);
        assert_eq!(rt.stats().scratch, 0);
    }

    #[test]
    fn nested_composites() {
        let rt = Runtime::default();
        let program = parse(&rt, "« { 1 { 2 } } 'X' »").unwrap();
        let children = program.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag(), Tag::List);
        assert_eq!(children[1].tag(), Tag::Quote);
        match children[1].children()[0].get().unwrap() {
            Object::Symbol(s) => assert_eq!(s, "X"),
            v => panic!("unexpected quoted object: {v:?}"),
        };
    }

    #[test]
    fn unterminated_list_is_incomplete() {
        let rt = Runtime::default();
        match parse(&rt, "{ 1 2") {
            Err(ReadErr::Incomplete { .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        }
        // Nothing is left behind in the scratchpad.
        assert_eq!(rt.stats().scratch, 0);
    }

    #[test]
    fn stray_terminator_is_an_error() {
        let rt = Runtime::default();
        match parse_body(&rt, "1 }") {
            Err(ReadErr::Error { position: 2, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        }
        match parse_body(&rt, "1 END") {
            Err(ReadErr::Error { .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        };
    }

    #[test]
    fn bad_child_aborts_composite() {
        let rt = Runtime::default();
        match parse(&rt, "{ 1 » 2 }") {
            Err(ReadErr::Error { position: 4, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        }
        assert_eq!(rt.stats().scratch, 0);
    }

    #[test]
    fn overflowing_integer_becomes_decimal() {
        let rt = Runtime::default();
        let big = parse(&rt, "123456789012345678901234567890").unwrap();
        match big.get().unwrap() {
            Object::Decimal(d) => {
                assert_eq!(d, "123456789012345678901234567890".parse::<f64>().unwrap())
            }
            v => panic!("unexpected object: {v:?}"),
        }
        // The next integer is strict again.
        let small = parse(&rt, "12").unwrap();
        assert_eq!(small.tag(), Tag::Integer);
    }

    #[test]
    fn parse_survives_collection() {
        let rt = Runtime::new(&crate::Config {
            memory: 64,
            ..Default::default()
        });
        // Leave garbage behind so parsing has to collect partway.
        for _ in 0..8 {
            rt.make(&crate::data::objects::Integer::from(100_000)).unwrap();
        }
        let list = parse(&rt, "{ 10 20 { 30 40 } 50 }").unwrap();
        assert!(rt.stats().collections > 0);
        assert_eq!(crate::render::to_string(&list, true).unwrap(), "{ 10 20 { 30 40 } 50 }");
    }

    #[test]
    fn trailing_input_is_an_error() {
        let rt = Runtime::default();
        match parse(&rt, "1 2") {
            Err(ReadErr::Error { position: 2, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        };
    }
}
