//! Rendering objects as text.
//!
//! A [`Renderer`] writes either into a fixed buffer, for stack display, or
//! into the scratchpad, when the text becomes an object of its own. Object
//! kinds render themselves through their Render handler, calling back into
//! the renderer for their pieces and for layout.
//!
//! A bounded buffer keeps whole characters only. Once a piece does not fit,
//! nothing more is written, but the renderer keeps counting, so the caller
//! gets the full length and can tell the output was cut short.

use crate::data::{Ptr, Runtime, Tag};
use crate::dispatch;
use crate::eval::Error;

enum Target<'a, 'rt> {
    Buffer(&'a mut [u8]),
    Scratchpad(&'rt Runtime),
}

pub struct Renderer<'a, 'rt> {
    target: Target<'a, 'rt>,
    /// Collapse line breaks to single spaces.
    flat: bool,
    indent: usize,
    /// Logical length of everything put so far.
    length: usize,
    /// Bytes actually in the buffer.
    written: usize,
    truncated: bool,
}

impl<'a, 'rt> Renderer<'a, 'rt> {
    fn new(target: Target<'a, 'rt>, flat: bool) -> Self {
        Renderer {
            target,
            flat,
            indent: 0,
            length: 0,
            written: 0,
            truncated: false,
        }
    }

    pub fn put(&mut self, text: &str) -> Result<(), Error> {
        self.length += text.len();
        match &mut self.target {
            Target::Scratchpad(rt) => rt.scratch_append(text.as_bytes()),
            Target::Buffer(_) if self.truncated => Ok(()),
            Target::Buffer(buffer) => {
                let room = buffer.len() - self.written;
                let mut fits = text.len().min(room);
                while !text.is_char_boundary(fits) {
                    fits -= 1;
                }
                buffer[self.written..self.written + fits].copy_from_slice(&text.as_bytes()[..fits]);
                self.written += fits;
                self.truncated = fits < text.len();
                Ok(())
            }
        }
    }

    /// A line break at the current indentation, or a space when flat.
    pub fn newline(&mut self) -> Result<(), Error> {
        if self.flat {
            return self.put(" ");
        }
        self.put("\n")?;
        for _ in 0..self.indent {
            self.put("  ")?;
        }
        Ok(())
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Logical length of the output so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Render into `buffer`. Returns the full length of the text, which is more
/// than `buffer.len()` if it was truncated.
pub fn render(object: &Ptr, buffer: &mut [u8], flat: bool) -> Result<usize, Error> {
    let mut r = Renderer::new(Target::Buffer(buffer), flat);
    dispatch::render(object, &mut r)?;
    Ok(r.len())
}

/// Render onto the end of the scratchpad. Returns the number of bytes added.
/// On error, the scratchpad is left as it was.
pub fn render_to_scratch(object: &Ptr, flat: bool) -> Result<usize, Error> {
    let rt = object.runtime();
    let mark = rt.scratch_mark();
    let mut r = Renderer::new(Target::Scratchpad(rt), flat);
    match dispatch::render(object, &mut r) {
        Ok(()) => Ok(r.len()),
        Err(e) => {
            rt.scratch_release(mark);
            Err(e)
        }
    }
}

/// The rendered text, without a size limit.
pub fn to_string(object: &Ptr, flat: bool) -> Result<String, Error> {
    let rt = object.runtime();
    let mark = rt.scratch_mark();
    render_to_scratch(object, flat)?;
    let bytes = rt.scratch_bytes(mark);
    rt.scratch_release(mark);
    String::from_utf8(bytes).map_err(|e| Error::InvalidObject(e.to_string()))
}

/// A text object holding the rendered form.
pub fn to_text<'rt>(object: &Ptr<'rt>) -> Result<Ptr<'rt>, Error> {
    let rt = object.runtime();
    let mark = rt.scratch_mark();
    render_to_scratch(object, false)?;
    rt.make_from_scratch(Tag::Text, mark)
}
