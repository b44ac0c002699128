// Adapted from the cursor design in `rustc_lexer`.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

pub(crate) const EOF_CHAR: char = '\0';

/// Peekable iterator over a char sequence.
pub struct Cursor<'a> {
    len_remaining: usize,
    chars: Chars<'a>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            len_remaining: input.len(),
            chars: input.chars(),
        }
    }

    /// Peek the next character without consuming it.
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Length of the token consumed since the last reset.
    pub(crate) fn pos_in_token(&self) -> usize {
        self.len_remaining - self.chars.as_str().len()
    }

    pub(crate) fn reset_pos(&mut self) {
        self.len_remaining = self.chars.as_str().len();
    }

    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Consume characters while the predicate holds.
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while pred(self.first()) && !self.is_eof() {
            self.bump();
        }
    }
}
