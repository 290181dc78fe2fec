//! Quotes, lists and programs: length-prefixed runs of children.

use crate::data::objects;
use crate::data::{Ptr, Tag};
use crate::dispatch::{self, Handlers, OBJECT};
use crate::eval::{self, Error};
use crate::reader::{Parsed, Parser};
use crate::render::Renderer;

use super::{next_token, sequence};

pub static QUOTE: Handlers = Handlers {
    name: "quote",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(super::push_self),
    execute: Some(execute_quote),
    parse: Some(parse_quote),
    render: Some(render_quote),
    help: Some("Quoted names"),
    marker: Some('\''),
    ..Handlers::NONE
};

pub static LIST: Handlers = Handlers {
    name: "list",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(super::push_self),
    execute: Some(eval::run),
    parse: Some(parse_list),
    render: Some(render_list),
    help: Some("Lists"),
    marker: Some('{'),
    ..Handlers::NONE
};

pub static PROGRAM: Handlers = Handlers {
    name: "program",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(super::push_self),
    execute: Some(eval::run),
    parse: Some(parse_program),
    render: Some(render_program),
    help: Some("Programs"),
    marker: Some('«'),
    ..Handlers::NONE
};

fn execute_quote(object: &Ptr) -> Result<(), Error> {
    match object.children().first() {
        Some(child) => dispatch::evaluate(child),
        None => Err(Error::InvalidObject("empty quote".to_owned())),
    }
}

fn parse_quote<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if token.text != "'" {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser
        .structure(|p| {
            let child = p.object()?;
            p.append(&child)?;
            match p.token()? {
                Some(t) if t.text == "'" => {
                    p.accept(t);
                    Ok(Tag::Quote)
                }
                Some(t) => Err(p.error(format!("expected ' to close quote, found {:?}", t.text))),
                None => Err(p.incomplete("expected ' to close quote")),
            }
        })
        .into()
}

fn parse_list<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if token.text != "{" {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.build(Tag::List, &["}"]).map(|(list, _)| list).into()
}

fn parse_program<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !token.opens_program() {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.build(Tag::Program, &["»"]).map(|(program, _)| program).into()
}

fn render_quote(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    r.put("'")?;
    sequence(&object.children(), r)?;
    r.put("'")
}

fn render_list(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    let children = object.children();
    if children.is_empty() {
        return r.put("{ }");
    }
    r.put("{ ")?;
    sequence(&children, r)?;
    r.put(" }")
}

fn render_program(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    let children = object.children();
    if children.is_empty() {
        return r.put("« »");
    }
    r.put("«")?;
    r.indent();
    r.newline()?;
    sequence(&children, r)?;
    r.unindent();
    r.newline()?;
    r.put("»")
}

#[cfg(test)]
mod tests {
    use crate::data::{Runtime, Tag};
    use crate::reader::parse;
    use crate::render::to_string;

    #[test]
    fn list_renders_back() {
        let rt = Runtime::default();
        let list = parse(&rt, "{ 1 2 3 }").unwrap();
        assert_eq!(list.size(), 8);
        assert_eq!(to_string(&list, true).unwrap(), "{ 1 2 3 }");
        assert_eq!(to_string(&list, false).unwrap(), "{ 1 2 3 }");
    }

    #[test]
    fn canonical_forms() {
        let rt = Runtime::default();
        for (source, canonical) in [
            ("{}", "{ }"),
            ("<<>>", "« »"),
            ("<< 1 2 + >>", "« 1 2 + »"),
            ("<<1 dup>>", "« 1 DUP »"),
            ("{ 'x' { \"a\" } }", "{ 'x' { \"a\" } }"),
        ] {
            let object = parse(&rt, source).unwrap();
            assert_eq!(to_string(&object, true).unwrap(), canonical, "{source}");
            let again = parse(&rt, canonical).unwrap();
            assert_eq!(again.to_bytes(), object.to_bytes(), "{source}");
        }
    }

    #[test]
    fn program_breaks_lines() {
        let rt = Runtime::default();
        let program = parse(&rt, "« 1 « 2 » + »").unwrap();
        assert_eq!(
            to_string(&program, false).unwrap(),
            "«\n  1 «\n    2\n  » +\n»"
        );
    }

    #[test]
    fn quote_needs_closing_mark() {
        let rt = Runtime::default();
        assert!(parse(&rt, "'x").unwrap_err().is_incomplete());
        assert!(!parse(&rt, "'x y'").unwrap_err().is_incomplete());
        assert_eq!(parse(&rt, "'x'").unwrap().tag(), Tag::Quote);
    }
}
