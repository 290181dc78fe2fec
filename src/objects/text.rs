//! Text and symbols: length-prefixed UTF-8.

use crate::data::objects::{self, Object, Text};
use crate::data::{Ptr, Tag};
use crate::dispatch::{self, Handlers, OBJECT};
use crate::eval::Error;
use crate::reader::token::{is_symbol, unquote};
use crate::reader::{Parsed, Parser};
use crate::render::Renderer;

use super::next_token;

pub static TEXT: Handlers = Handlers {
    name: "text",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(super::push_self),
    parse: Some(parse_text),
    render: Some(render_text),
    help: Some("Text"),
    marker: Some('"'),
    ..Handlers::NONE
};

pub static SYMBOL: Handlers = Handlers {
    name: "symbol",
    base: Some(&OBJECT),
    size: Some(objects::prefixed_size),
    evaluate: Some(evaluate_symbol),
    parse: Some(parse_symbol),
    render: Some(render_symbol),
    help: Some("Variables"),
    ..Handlers::NONE
};

/// Words that belong to control structures and cannot name variables.
pub const KEYWORDS: &[&str] = &[
    "IF", "THEN", "ELSE", "END", "DO", "UNTIL", "WHILE", "REPEAT", "START", "NEXT", "STEP",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

fn parse_text<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !token.text.starts_with('"') {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.make(&Text::text(&unquote(token.text)))
}

fn render_text(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    match object.get()? {
        Object::Text(s) => {
            r.put("\"")?;
            r.put(&s.replace('"', "\"\""))?;
            r.put("\"")
        }
        v => Err(Error::InvalidObject(format!("{v:?} is not text"))),
    }
}

fn parse_symbol<'rt>(_tag: Tag, parser: &mut Parser<'rt, '_>) -> Parsed<'rt> {
    let token = match next_token(parser) {
        Ok(t) => t,
        Err(p) => return p,
    };
    if !is_symbol(token.text) || is_keyword(token.text) {
        return Parsed::Skip;
    }
    parser.accept(token);
    parser.make(&Text::symbol(token.text))
}

fn render_symbol(object: &Ptr, r: &mut Renderer) -> Result<(), Error> {
    match object.get()? {
        Object::Symbol(s) => r.put(&s),
        v => Err(Error::InvalidObject(format!("{v:?} is not a symbol"))),
    }
}

/// A bound name runs its program or evaluates its value;
/// an unbound name stands for itself.
fn evaluate_symbol(object: &Ptr) -> Result<(), Error> {
    let rt = object.runtime();
    let name = match object.get()? {
        Object::Symbol(s) => s,
        v => return Err(Error::InvalidObject(format!("{v:?} is not a symbol"))),
    };
    match rt.lookup(&name) {
        Some(value) if value.tag() == Tag::Program => dispatch::execute(&value),
        Some(value) => dispatch::evaluate(&value),
        None => rt.push(object),
    }
}

#[cfg(test)]
mod tests {
    use crate::data::objects::Object;
    use crate::data::{Runtime, Tag};
    use crate::reader::parse;
    use crate::render::to_string;

    #[test]
    fn text_round_trip() {
        let rt = Runtime::default();
        let source = r#""a ""quoted"" word""#;
        let text = parse(&rt, source).unwrap();
        match text.get().unwrap() {
            Object::Text(s) => assert_eq!(s, r#"a "quoted" word"#),
            v => panic!("unexpected object: {v:?}"),
        }
        assert_eq!(to_string(&text, true).unwrap(), source);
    }

    #[test]
    fn keywords_are_not_symbols() {
        let rt = Runtime::default();
        assert!(parse(&rt, "then").is_err());
        let s = parse(&rt, "thenceforth").unwrap();
        assert_eq!(s.tag(), Tag::Symbol);
    }

    #[test]
    fn unbound_symbol_pushes_itself() {
        let rt = Runtime::default();
        let s = parse(&rt, "x").unwrap();
        crate::dispatch::evaluate(&s).unwrap();
        assert_eq!(rt.depth(), 1);
        assert_eq!(rt.peek(0).unwrap().tag(), Tag::Symbol);
    }
}
