//! Splitting RPL source into tokens.
//!
//! Tokens are whitespace-separated words, except that the structural
//! delimiters `{ } « » '` always stand alone, `<<` and `>>` are accepted for
//! `«` and `»`, and a text literal runs from `"` to the matching `"`
//! (a doubled `""` inside is a literal quote).

use crate::reader::ReadErr;

/// A token and its byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub text: &'s str,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    /// Case-insensitive comparison, for keywords and command names.
    pub fn is(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }

    /// Whether this token opens a program.
    pub fn opens_program(&self) -> bool {
        self.text == "«" || self.text == "<<"
    }

    /// Whether this token closes a program.
    pub fn closes_program(&self) -> bool {
        self.text == "»" || self.text == ">>"
    }
}

mod regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub(super) fn space() -> &'static Regex {
        static SPACE: OnceLock<Regex> = OnceLock::new();
        SPACE.get_or_init(|| Regex::new(r"\A\s+").expect("could not compile regex for space"))
    }

    pub(super) fn delimiter() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r#"\A(<<|>>|[{}«»'])"#).expect("could not compile regex for delimiters")
        })
    }

    pub(super) fn text() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            // Opening quote, then doubled quotes or anything but a quote.
            // The closing quote is checked separately, so an unterminated
            // literal can be reported as incomplete.
            Regex::new(r#"\A"(""|[^"])*"#).expect("could not compile regex for text")
        })
    }

    pub(super) fn word() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r#"\A[^\s{}«»'"]+"#).expect("could not compile regex for words")
        })
    }

    pub(super) fn integer() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| Regex::new(r"\A-?[0-9]+\z").expect("could not compile regex for integer"))
    }

    pub(super) fn decimal() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A-?([0-9]+\.[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?\z")
                .expect("could not compile regex for decimal")
        })
    }

    pub(super) fn symbol() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[\pL_][\pL\pN_]*\z").expect("could not compile regex for symbol")
        })
    }
}

pub fn is_integer(word: &str) -> bool {
    regex::integer().is_match(word)
}

pub fn is_decimal(word: &str) -> bool {
    regex::decimal().is_match(word)
}

pub fn is_symbol(word: &str) -> bool {
    regex::symbol().is_match(word)
}

/// Number of bytes of whitespace at the start of `input`.
pub fn space(input: &str) -> usize {
    regex::space().find(input).map(|m| m.end()).unwrap_or(0)
}

/// The token starting exactly at `position`, if the input is not exhausted.
pub fn next(source: &str, position: usize) -> Result<Option<Token<'_>>, ReadErr> {
    let input = &source[position..];
    if input.is_empty() {
        return Ok(None);
    }
    let token = |len: usize| Token {
        text: &source[position..position + len],
        start: position,
        end: position + len,
    };

    if let Some(m) = regex::delimiter().find(input) {
        return Ok(Some(token(m.end())));
    }
    if let Some(m) = regex::text().find(input) {
        let rest = &input[m.end()..];
        if !rest.starts_with('"') {
            return Err(ReadErr::Incomplete {
                message: "unterminated text".to_owned(),
                position,
            });
        }
        return Ok(Some(token(m.end() + 1)));
    }
    if let Some(m) = regex::word().find(input) {
        // `>>` ends a word so that `<<1 2 +>>` closes the program.
        let len = match m.as_str().find(">>") {
            Some(0) | None => m.end(),
            Some(i) => i,
        };
        return Ok(Some(token(len)));
    }
    unreachable!("whitespace must be skipped before reading a token")
}

/// The contents of a text token, without quotes and with `""` collapsed.
pub fn unquote(token: &str) -> String {
    token[1..token.len() - 1].replace("\"\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<&str> {
        let mut result = Vec::new();
        let mut position = space(source);
        while let Some(t) = next(source, position).unwrap() {
            result.push(t.text);
            position = t.end + space(&source[t.end..]);
        }
        result
    }

    #[test]
    fn delimiters_stand_alone() {
        assert_eq!(tokens("{1 2}"), vec!["{", "1", "2", "}"]);
        assert_eq!(tokens("«dup»"), vec!["«", "dup", "»"]);
        assert_eq!(tokens("'X'"), vec!["'", "X", "'"]);
        assert_eq!(tokens("<<1 2 +>>"), vec!["<<", "1", "2", "+", ">>"]);
    }

    #[test]
    fn text_with_quotes() {
        assert_eq!(tokens(r#" "say ""hi""" x"#), vec![r#""say ""hi""""#, "x"]);
        assert_eq!(unquote(r#""say ""hi""""#), r#"say "hi""#);
    }

    #[test]
    fn unterminated_text_is_incomplete() {
        match next(r#""abc"#, 0) {
            Err(ReadErr::Incomplete { position: 0, .. }) => (),
            v => panic!("unexpected result: {v:?}"),
        };
    }

    #[test]
    fn number_shapes() {
        for good in ["0", "-12", "123456789012345678901234567890"] {
            assert!(is_integer(good), "{good}");
        }
        for good in ["1.", "-.5", "2.5e10", "3.E-2"] {
            assert!(is_decimal(good), "{good}");
            assert!(!is_integer(good), "{good}");
        }
        for bad in ["-", "1e5", "1.2.3", "."] {
            assert!(!is_decimal(bad), "{bad}");
        }
    }

    #[test]
    fn symbol_shapes() {
        assert!(is_symbol("x"));
        assert!(is_symbol("_tmp2"));
        assert!(is_symbol("Δt"));
        assert!(!is_symbol("2x"));
        assert!(!is_symbol("a-b"));
    }
}
