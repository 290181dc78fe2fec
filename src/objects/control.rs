//! Control structures.
//!
//! Each structure is a length-prefixed composite whose children are
//! programs: the clauses between its keywords. A conditional holds
//! `[test, then]` or `[test, then, else]`, the loops hold `[body, test]` or
//! `[test, body]`, and counted loops hold `[body]` and take their bounds
//! from the stack.

use crate::data::objects;
use crate::data::{Ptr, Tag};
use crate::dispatch::{Handlers, OBJECT};
use crate::eval::{self, arith::Number, Error};
use crate::reader::{Parsed, Parser, ReadResult};
use crate::render::Renderer;

use super::{next_token, sequence};

pub static CONDITIONAL: Handlers = Handlers {
    name: "IF",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(evaluate_conditional),
    parse: Some(parse_conditional),
    render: Some(render_control),
    help: Some("Conditionals"),
    ..Handlers::NONE
};

pub static DO_UNTIL: Handlers = Handlers {
    name: "DO",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(evaluate_do_until),
    parse: Some(parse_do_until),
    render: Some(render_control),
    help: Some("Loops"),
    ..Handlers::NONE
};

pub static WHILE_REPEAT: Handlers = Handlers {
    name: "WHILE",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(evaluate_while_repeat),
    parse: Some(parse_while_repeat),
    render: Some(render_control),
    help: Some("Loops"),
    ..Handlers::NONE
};

pub static START: Handlers = Handlers {
    name: "START",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(evaluate_start),
    parse: Some(parse_start),
    render: Some(render_control),
    help: Some("Loops"),
    ..Handlers::NONE
};

/// Keywords around the clauses of each structure, in order:
/// one before each clause, and the closing one.
fn keywords(tag: Tag) -> &'static [&'static str] {
    match tag {
        Tag::IfThen => &["IF", "THEN", "END"],
        Tag::IfThenElse => &["IF", "THEN", "ELSE", "END"],
        Tag::DoUntil => &["DO", "UNTIL", "END"],
        Tag::WhileRepeat => &["WHILE", "REPEAT", "END"],
        Tag::StartNext => &["START", "NEXT"],
        Tag::StartStep => &["START", "STEP"],
        _ => &[],
    }
}

/// Parse a structure that starts with the keyword `opening`.
/// `clauses` parses the rest and picks the final tag.
fn parse_structure<'rt, 's>(
    parser: &mut Parser<'rt, 's>,
    opening: &str,
    clauses: impl FnOnce(&mut Parser<'rt, 's>) -> ReadResult<Tag>,
) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !token.is(opening) {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.structure(clauses).into()
}

fn parse_conditional<'rt>(tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    if tag != Tag::IfThen {
        return Parsed::Skip;
    }
    parse_structure(parser, "IF", |p| {
        p.clause(&["THEN"])?;
        match p.clause(&["ELSE", "END"])? {
            0 => {
                p.clause(&["END"])?;
                Ok(Tag::IfThenElse)
            }
            _ => Ok(Tag::IfThen),
        }
    })
}

fn parse_do_until<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    parse_structure(parser, "DO", |p| {
        p.clause(&["UNTIL"])?;
        p.clause(&["END"])?;
        Ok(Tag::DoUntil)
    })
}

fn parse_while_repeat<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    parse_structure(parser, "WHILE", |p| {
        p.clause(&["REPEAT"])?;
        p.clause(&["END"])?;
        Ok(Tag::WhileRepeat)
    })
}

fn parse_start<'rt>(tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    if tag != Tag::StartNext {
        return Parsed::Skip;
    }
    parse_structure(parser, "START", |p| match p.clause(&["NEXT", "STEP"])? {
        0 => Ok(Tag::StartNext),
        _ => Ok(Tag::StartStep),
    })
}

/// Keywords at the start of lines, clauses indented under them.
fn render_control(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    let words = keywords(object.tag());
    let clauses = object.children();
    if words.len() != clauses.len() + 1 {
        return Err(Error::InvalidObject(format!(
            "{} with {} clauses",
            object.tag(),
            clauses.len()
        )));
    }
    for (word, clause) in words.iter().zip(clauses.iter()) {
        r.put(word)?;
        let body = clause.children();
        if !body.is_empty() {
            r.indent();
            r.newline()?;
            sequence(&body, r)?;
            r.unindent();
        }
        r.newline()?;
    }
    r.put(words[words.len() - 1])
}

fn clauses<'rt, const N: usize>(object: &Ptr<'rt>) -> Result<[Ptr<'rt>; N], Error> {
    let tag = object.tag();
    object
        .children()
        .try_into()
        .map_err(|v: Vec<_>| Error::InvalidObject(format!("{tag} with {} clauses", v.len())))
}

fn evaluate_conditional(object: &Ptr) -> Result<(), Error> {
    match object.tag() {
        Tag::IfThen => {
            let [test, then] = clauses(object)?;
            if eval::test(&test)? {
                eval::run(&then)?;
            }
        }
        _ => {
            let [test, then, otherwise] = clauses(object)?;
            if eval::test(&test)? {
                eval::run(&then)?;
            } else {
                eval::run(&otherwise)?;
            }
        }
    }
    Ok(())
}

fn evaluate_do_until(object: &Ptr) -> Result<(), Error> {
    let rt = object.runtime();
    let [body, test] = clauses(object)?;
    loop {
        rt.interrupt().check()?;
        eval::run(&body)?;
        if eval::test(&test)? {
            return Ok(());
        }
    }
}

fn evaluate_while_repeat(object: &Ptr) -> Result<(), Error> {
    let rt = object.runtime();
    let [test, body] = clauses(object)?;
    loop {
        rt.interrupt().check()?;
        if !eval::test(&test)? {
            return Ok(());
        }
        eval::run(&body)?;
    }
}

/// `start end START body NEXT` and `start end START body step STEP`.
/// The body always runs once; the counter is checked after each pass.
fn evaluate_start(object: &Ptr) -> Result<(), Error> {
    let rt = object.runtime();
    let [body] = clauses(object)?;
    rt.args(2)?;
    let end = Number::from_ptr(&rt.peek(0)?)?;
    let mut counter = Number::from_ptr(&rt.peek(1)?)?;
    rt.discard(2)?;
    let stepped = object.tag() == Tag::StartStep;
    loop {
        rt.interrupt().check()?;
        eval::run(&body)?;
        let step = if stepped {
            Number::from_ptr(&rt.pop()?)?
        } else {
            Number::Integer(1)
        };
        counter = counter + step;
        let done = if step.is_negative() {
            counter < end
        } else {
            counter > end
        };
        if done {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{Runtime, Tag};
    use crate::reader::parse;
    use crate::render::to_string;

    #[test]
    fn keywords_are_canonical() {
        let rt = Runtime::default();
        for (source, canonical) in [
            ("if 1 then 2 end", "IF 1 THEN 2 END"),
            ("IF 1 THEN 2 else 3 END", "IF 1 THEN 2 ELSE 3 END"),
            ("do 1 until 2 end", "DO 1 UNTIL 2 END"),
            ("while 1 repeat 2 end", "WHILE 1 REPEAT 2 END"),
            ("start 1 next", "START 1 NEXT"),
            ("start 1 2 step", "START 1 2 STEP"),
            ("if then end", "IF THEN END"),
        ] {
            let object = parse(&rt, source).unwrap();
            assert_eq!(to_string(&object, true).unwrap(), canonical, "{source}");
            let again = parse(&rt, canonical).unwrap();
            assert_eq!(again.to_bytes(), object.to_bytes(), "{source}");
        }
    }

    #[test]
    fn conditional_tags() {
        let rt = Runtime::default();
        assert_eq!(parse(&rt, "IF 1 THEN 2 END").unwrap().tag(), Tag::IfThen);
        assert_eq!(parse(&rt, "IF 1 THEN 2 ELSE 3 END").unwrap().tag(), Tag::IfThenElse);
        assert_eq!(parse(&rt, "START NEXT").unwrap().tag(), Tag::StartNext);
        assert_eq!(parse(&rt, "START 1 STEP").unwrap().tag(), Tag::StartStep);
    }

    #[test]
    fn indented_layout() {
        let rt = Runtime::default();
        let object = parse(&rt, "IF x THEN 1 ELSE 2 3 END").unwrap();
        assert_eq!(
            to_string(&object, false).unwrap(),
            "IF\n  x\nTHEN\n  1\nELSE\n  2 3\nEND"
        );
    }

    #[test]
    fn unterminated_structures_are_incomplete() {
        let rt = Runtime::default();
        for source in ["IF 1 THEN 2", "DO 1", "WHILE 1 REPEAT", "START 1"] {
            match parse(&rt, source) {
                Err(e) if e.is_incomplete() => (),
                v => panic!("unexpected result for {source}: {v:?}"),
            };
        }
        assert_eq!(rt.stats().scratch, 0);
    }
}
