//! Commands: objects that are nothing but a tag.
//!
//! Each command has its own handler record, carrying its name and stack
//! effect, and shares parsing, rendering and evaluation with the rest of
//! the family through [`COMMAND`].

use crate::data::objects::Command;
use crate::data::{Ptr, Tag};
use crate::dispatch::{self, Handlers, COMMAND, OBJECT};
use crate::eval::{arith, lists, stack, store, Error};
use crate::reader::{Parsed, Parser};
use crate::render::Renderer;

use super::next_token;

macro_rules! command {
    ($name:literal, $run:path, $help:literal) => {
        Handlers {
            name: $name,
            base: Some(&COMMAND),
            command: Some($run),
            help: Some($help),
            ..Handlers::NONE
        }
    };
}

/// One record per command, in tag order from `Tag::Dup`.
static COMMANDS: [Handlers; 36] = [
    command!("DUP", stack::dup, "Stack"),
    command!("DROP", stack::drop, "Stack"),
    command!("SWAP", stack::swap, "Stack"),
    command!("OVER", stack::over, "Stack"),
    command!("ROT", stack::rot, "Stack"),
    command!("DEPTH", stack::depth, "Stack"),
    command!("CLEAR", stack::clear, "Stack"),
    command!("PICK", stack::pick, "Stack"),
    command!("DROPN", stack::drop_n, "Stack"),
    command!("DUP2", stack::dup2, "Stack"),
    command!("DROP2", stack::drop2, "Stack"),
    command!("+", arith::add, "Arithmetic"),
    command!("-", arith::sub, "Arithmetic"),
    command!("*", arith::mul, "Arithmetic"),
    command!("/", arith::div, "Arithmetic"),
    command!("NEG", arith::neg, "Arithmetic"),
    command!("ABS", arith::abs, "Arithmetic"),
    command!("==", arith::eq, "Tests"),
    command!("!=", arith::ne, "Tests"),
    command!("<", arith::lt, "Tests"),
    command!(">", arith::gt, "Tests"),
    command!("<=", arith::le, "Tests"),
    command!(">=", arith::ge, "Tests"),
    command!("AND", arith::and, "Logic"),
    command!("OR", arith::or, "Logic"),
    command!("NOT", arith::not, "Logic"),
    command!("EVAL", store::eval, "Evaluation"),
    command!("STO", store::sto, "Variables"),
    command!("RCL", store::rcl, "Variables"),
    command!("PURGE", store::purge, "Variables"),
    command!("→LIST", lists::to_list, "Lists"),
    command!("LIST→", lists::from_list, "Lists"),
    command!("SIZE", lists::size, "Lists"),
    command!("→STR", lists::to_text, "Text"),
    command!("MEM", store::mem, "Memory"),
    command!("GC", store::gc, "Memory"),
];

/// The handler record of a command tag.
pub fn handlers(tag: Tag) -> &'static Handlers {
    if !tag.is_command() {
        return &OBJECT;
    }
    let index = (tag.value() - Tag::Dup.value()) as usize;
    COMMANDS.get(index).unwrap_or(&OBJECT)
}

/// Other spellings a command is read from.
fn aliases(tag: Tag) -> &'static [&'static str] {
    match tag {
        Tag::ToList => &["->LIST"],
        Tag::FromList => &["LIST->"],
        Tag::ToText => &["->STR"],
        Tag::Eq => &["="],
        Tag::Ne => &["≠"],
        Tag::Le => &["≤"],
        Tag::Ge => &["≥"],
        _ => &[],
    }
}

pub fn evaluate(object: &Ptr) -> Result<(), Error> {
    let tag = object.tag();
    tracing::trace!(%tag, "command");
    dispatch::command(tag)?(object.runtime())
}

pub fn parse<'rt>(tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    if !tag.is_command() {
        return Parsed::Skip;
    }
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !token.is(tag.name()) && !aliases(tag).iter().any(|a| token.is(a)) {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.make(&Command(tag))
}

pub fn render(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    r.put(object.tag().name())
}
