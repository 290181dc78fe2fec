//! Interactive loop: read a command line, run it, show the stack.

use std::io::{BufRead, Write};

use crate::data::{Ptr, Runtime};
use crate::eval::{self, Error};
use crate::reader::parse_body;
use crate::render;
use crate::Config;

const ELLIPSIS: char = '…';

/// Parse `source` as a command line and run it.
pub fn execute(rt: &Runtime, source: &str) -> Result<(), Error> {
    let program = parse_body(rt, source)?;
    eval::run(&program)
}

/// One stack entry, cut to `width` columns with a trailing ellipsis.
fn entry(object: &Ptr, width: usize, flat: bool) -> Result<String, Error> {
    let mut buffer = vec![0u8; width];
    let len = render::render(object, &mut buffer, flat)?;
    if len <= width {
        return Ok(String::from_utf8_lossy(&buffer[..len]).into_owned());
    }
    let valid = std::str::from_utf8(&buffer).map_or_else(|e| e.valid_up_to(), str::len);
    let mut text = String::from_utf8_lossy(&buffer[..valid]).into_owned();
    while !text.is_empty() && text.chars().count() + 1 > width {
        text.pop();
    }
    text.push(ELLIPSIS);
    Ok(text)
}

/// Write the stack, highest level first, as `N: value`.
pub fn show_stack(rt: &Runtime, output: &mut impl Write, config: &Config) -> std::io::Result<()> {
    for level in (0..rt.depth()).rev() {
        let label = format!("{}: ", level + 1);
        let width = config.stack_width.saturating_sub(label.len()).max(1);
        let text = match rt.peek(level).and_then(|p| entry(&p, width, config.flat_stack)) {
            Ok(text) => text,
            Err(e) => format!("<{e}>"),
        };
        writeln!(output, "{label}{text}")?;
    }
    Ok(())
}

/// Run lines from `input` until it ends.
///
/// Lines are joined while the reader reports incomplete input, so a program
/// can span several lines. Errors go to `errors`; the runtime is collected
/// after every command line either way.
pub fn repl(
    input: impl BufRead,
    output: &mut impl Write,
    errors: &mut impl Write,
    config: &Config,
) -> std::io::Result<()> {
    let rt = Runtime::new(config);
    let mut pending = String::new();
    for line in input.lines() {
        pending.push_str(&line?);
        pending.push('\n');
        match execute(&rt, &pending) {
            Err(Error::Read(e)) if e.is_incomplete() => continue,
            Err(e) => {
                tracing::debug!(error = %e, "command line failed");
                writeln!(errors, "error: {e}")?;
            }
            Ok(()) => (),
        }
        pending.clear();
        rt.interrupt().clear();
        rt.collect();
        show_stack(&rt, output, config)?;
        output.flush()?;
    }
    if !pending.trim().is_empty() {
        if let Err(e) = parse_body(&rt, &pending) {
            writeln!(errors, "error: {e}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str, config: &Config) -> (String, String) {
        let mut output = Vec::new();
        let mut errors = Vec::new();
        repl(input.as_bytes(), &mut output, &mut errors, config).unwrap();
        (
            String::from_utf8(output).unwrap(),
            String::from_utf8(errors).unwrap(),
        )
    }

    #[test]
    fn shows_the_stack_after_each_line() {
        let (output, errors) = session("1 2\n+\n", &Config::default());
        assert_eq!(output, "2: 1\n1: 2\n1: 3\n");
        assert_eq!(errors, "");
    }

    #[test]
    fn programs_span_lines() {
        let (output, errors) = session("« 1\n2 + »\nEVAL\n", &Config::default());
        assert_eq!(output, "1: « 1 2 + »\n1: 3\n");
        assert_eq!(errors, "");
    }

    #[test]
    fn errors_leave_the_stack() {
        let (output, errors) = session("1 +\n", &Config::default());
        assert_eq!(output, "1: 1\n");
        assert!(errors.starts_with("error: too few arguments"), "{errors}");
    }

    #[test]
    fn long_entries_are_cut() {
        let config = Config {
            stack_width: 12,
            ..Config::default()
        };
        let (output, _) = session("{ 1 2 3 4 5 6 7 8 }\n", &config);
        assert_eq!(output, "1: { 1 2 3 …\n");
    }

    #[test]
    fn unterminated_input_is_reported_at_the_end() {
        let (output, errors) = session("{ 1 2\n", &Config::default());
        assert_eq!(output, "");
        assert!(errors.contains("incomplete input"), "{errors}");
    }
}
