//! Per-tag handler tables.
//!
//! Every tag maps to one static [`Handlers`] record. A record answers the
//! operations it fills in and delegates the rest to its `base`, so a family
//! of kinds shares behavior the way a class hierarchy would:
//!
//! ```text
//! integer, decimal ─┐
//!                   ├─> algebraic ─> command ─> object
//! DUP, +, STO ... ──┘          (commands sit on `command` directly)
//! ```
//!
//! `object` answers nothing, so an operation no record in the chain handles
//! is reported as not implemented.
//!
//! Size is the one operation the arena depends on: it must be answered for
//! every tag, from the bytes alone, without side effects.

use crate::data::{Ptr, Runtime, Tag};
use crate::eval::Error;
use crate::objects;
use crate::reader::{Parsed, Parser};
use crate::render::Renderer;

/// The operations a handler record can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Evaluate,
    Execute,
    Size,
    Parse,
    Render,
    Help,
    Marker,
    /// Run a command's stack effect. Only the command family has these.
    Command,
}

impl Op {
    pub fn name(self) -> &'static str {
        match self {
            Op::Evaluate => "evaluate",
            Op::Execute => "execute",
            Op::Size => "size",
            Op::Parse => "parse",
            Op::Render => "render",
            Op::Help => "help",
            Op::Marker => "marker",
            Op::Command => "command",
        }
    }
}

pub type SizeFn = fn(&[u8]) -> usize;
pub type EvalFn = for<'rt> fn(&Ptr<'rt>) -> Result<(), Error>;
pub type ParseFn = for<'p, 'rt, 's> fn(Tag, &'p mut Parser<'rt, 's>) -> Parsed<'rt>;
pub type RenderFn = fn(&Ptr, &mut Renderer) -> Result<(), Error>;
pub type CommandFn = fn(&Runtime) -> Result<(), Error>;

/// Handlers for one kind of object, or for a family of kinds.
pub struct Handlers {
    pub name: &'static str,
    /// Where unanswered operations go.
    pub base: Option<&'static Handlers>,
    pub size: Option<SizeFn>,
    pub evaluate: Option<EvalFn>,
    pub execute: Option<EvalFn>,
    pub parse: Option<ParseFn>,
    pub render: Option<RenderFn>,
    /// Help topic.
    pub help: Option<&'static str>,
    /// Character marking the kind in compact displays.
    pub marker: Option<char>,
    pub command: Option<CommandFn>,
}

impl Handlers {
    /// A record that answers nothing; fill in what a kind needs.
    pub const NONE: Handlers = Handlers {
        name: "",
        base: None,
        size: None,
        evaluate: None,
        execute: None,
        parse: None,
        render: None,
        help: None,
        marker: None,
        command: None,
    };

    fn answers(&self, op: Op) -> bool {
        match op {
            Op::Evaluate => self.evaluate.is_some(),
            Op::Execute => self.execute.is_some(),
            Op::Size => self.size.is_some(),
            Op::Parse => self.parse.is_some(),
            Op::Render => self.render.is_some(),
            Op::Help => self.help.is_some(),
            Op::Marker => self.marker.is_some(),
            Op::Command => self.command.is_some(),
        }
    }

    /// Follow the delegation chain to the first record that has `get`.
    pub fn resolve<T>(&'static self, get: impl Fn(&'static Handlers) -> Option<T>) -> Option<T> {
        let mut at = Some(self);
        while let Some(h) = at {
            if let Some(v) = get(h) {
                return Some(v);
            }
            at = h.base;
        }
        None
    }
}

/// The root of every chain. Answers nothing.
pub static OBJECT: Handlers = Handlers {
    name: "object",
    help: Some("Objects"),
    ..Handlers::NONE
};

/// Named things: parsed and rendered by name, sized by tag alone,
/// evaluated by running their stack effect.
pub static COMMAND: Handlers = Handlers {
    name: "command",
    base: Some(&OBJECT),
    size: Some(crate::data::objects::tag_only_size),
    evaluate: Some(objects::command::evaluate),
    parse: Some(objects::command::parse),
    render: Some(objects::command::render),
    help: Some("Commands"),
    ..Handlers::NONE
};

/// Values that evaluate to themselves.
pub static ALGEBRAIC: Handlers = Handlers {
    name: "algebraic",
    base: Some(&COMMAND),
    evaluate: Some(objects::push_self),
    help: Some("Algebraics"),
    ..Handlers::NONE
};

/// The handler record for a tag.
pub fn handlers(tag: Tag) -> &'static Handlers {
    match tag {
        Tag::Integer | Tag::NegInteger => &objects::number::INTEGER,
        Tag::Decimal => &objects::number::DECIMAL,
        Tag::Text => &objects::text::TEXT,
        Tag::Symbol => &objects::text::SYMBOL,
        Tag::Quote => &objects::composite::QUOTE,
        Tag::List => &objects::composite::LIST,
        Tag::Program => &objects::composite::PROGRAM,
        Tag::IfThen | Tag::IfThenElse => &objects::control::CONDITIONAL,
        Tag::DoUntil => &objects::control::DO_UNTIL,
        Tag::WhileRepeat => &objects::control::WHILE_REPEAT,
        Tag::StartNext | Tag::StartStep => &objects::control::START,
        command => objects::command::handlers(command),
    }
}

/// Whether anything in the tag's chain answers `op`.
pub fn handles(tag: Tag, op: Op) -> bool {
    owner(tag, op).is_some()
}

/// Name of the record in the tag's chain that answers `op`.
pub fn owner(tag: Tag, op: Op) -> Option<&'static str> {
    handlers(tag).resolve(|h| h.answers(op).then_some(h.name))
}

/// Size of the object at the start of `bytes`.
///
/// Every kind answers this; an unanswered Size means the tag table is wrong,
/// and the arena cannot be walked past the object.
pub fn size(bytes: &[u8]) -> usize {
    let tag = crate::data::objects::tag_of(bytes);
    match handlers(tag).resolve(|h| h.size) {
        Some(size) => size(bytes),
        None => unreachable!("{tag} has no size handler"),
    }
}

fn not_implemented(op: Op, tag: Tag) -> Error {
    Error::NotImplemented {
        op: op.name(),
        tag: tag.name(),
    }
}

/// Evaluate an object: what happens when it is met inside a program.
pub fn evaluate(object: &Ptr) -> Result<(), Error> {
    let _nesting = object.runtime().nest()?;
    let tag = object.tag();
    match handlers(tag).resolve(|h| h.evaluate) {
        Some(f) => f(object),
        None => Err(not_implemented(Op::Evaluate, tag)),
    }
}

/// Execute an object: what EVAL does to it.
/// Kinds without an Execute handler are evaluated.
pub fn execute(object: &Ptr) -> Result<(), Error> {
    let tag = object.tag();
    match handlers(tag).resolve(|h| h.execute) {
        Some(f) => {
            let _nesting = object.runtime().nest()?;
            f(object)
        }
        None => evaluate(object),
    }
}

/// Offer the parser's input to one kind.
pub fn parse<'rt>(tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    match handlers(tag).resolve(|h| h.parse) {
        Some(f) => f(tag, parser),
        None => Parsed::Skip,
    }
}

pub fn render(object: &Ptr, renderer: &mut Renderer) -> Result<(), Error> {
    let tag = object.tag();
    match handlers(tag).resolve(|h| h.render) {
        Some(f) => f(object, renderer),
        None => Err(not_implemented(Op::Render, tag)),
    }
}

pub fn help(tag: Tag) -> &'static str {
    handlers(tag).resolve(|h| h.help).unwrap_or("Objects")
}

pub fn marker(tag: Tag) -> Option<char> {
    handlers(tag).resolve(|h| h.marker)
}

/// The stack effect of a command.
pub fn command(tag: Tag) -> Result<CommandFn, Error> {
    handlers(tag)
        .resolve(|h| h.command)
        .ok_or_else(|| not_implemented(Op::Command, tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_a_size() {
        for &tag in Tag::ALL {
            assert!(handles(tag, Op::Size), "{tag:?} cannot be sized");
        }
    }

    #[test]
    fn numbers_delegate_to_algebraic() {
        assert_eq!(owner(Tag::Integer, Op::Evaluate), Some("algebraic"));
        assert_eq!(owner(Tag::Integer, Op::Size), Some("integer"));
        assert_eq!(owner(Tag::Decimal, Op::Help), Some("decimal"));
        assert_eq!(owner(Tag::Integer, Op::Execute), None);
    }

    #[test]
    fn commands_share_a_family() {
        for &tag in Tag::ALL.iter().filter(|t| t.is_command()) {
            assert_eq!(owner(tag, Op::Size), Some("command"));
            assert_eq!(owner(tag, Op::Parse), Some("command"));
            assert!(handles(tag, Op::Command), "{tag:?} has no stack effect");
        }
    }

    #[test]
    fn text_has_no_stack_effect() {
        match command(Tag::Text) {
            Err(Error::NotImplemented { op: "command", tag: "text" }) => (),
            v => panic!("unexpected result: {:?}", v.map(|_| ())),
        };
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Tag::ALL
            .iter()
            .filter(|t| !matches!(t, Tag::NegInteger | Tag::IfThenElse | Tag::StartStep))
            .map(|t| t.name().to_ascii_uppercase())
            .collect();
        names.sort();
        let count = names.len();
        names.dedup();
        assert_eq!(names.len(), count, "{names:?}");
    }
}
