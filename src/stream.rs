//! A UTF-8 code-point stream with small lookahead and pushback, used by the
//! tokenizer to decode source bytes while tracking line/column position.
//!
//! Unlike a general-purpose byte stream this does not attempt character-set
//! detection: the input is assumed to be UTF-8 and malformed sequences are
//! replaced with U+FFFD, each replacement reported through the diagnostic
//! sink passed to [`ByteStream::new`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::errors::{DiagnosticKind, Sink};
use crate::unicode::UnicodeChar;

/// A single code point of input, or the end-of-stream sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Character {
    Ch(char),
    Eof,
}

impl Character {
    pub fn is_eof(self) -> bool {
        matches!(self, Character::Eof)
    }

    pub fn char(self) -> Option<char> {
        match self {
            Character::Ch(c) => Some(c),
            Character::Eof => None,
        }
    }
}

/// A 1-based line/column position, plus a 0-based byte offset into the
/// decoded source. Only `line` is surfaced in diagnostics and tokens, but the
/// rest is kept around for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

/// Decodes a byte slice into code points on demand, tracking line position
/// and supporting up to a few code points of lookahead and pushback.
pub struct ByteStream<'sink> {
    buffer: Vec<u8>,
    byte_pos: Cell<usize>,
    /// Code points decoded-but-not-yet-consumed, front of queue is next.
    queue: RefCell<VecDeque<char>>,
    /// Location as of the front of `queue`; advanced by `advance()`.
    location: Cell<Location>,
    /// Locations consumed by `advance()`, so `pushback` can restore them.
    history: RefCell<Vec<Location>>,
    sink: &'sink Sink,
}

impl<'sink> ByteStream<'sink> {
    pub fn new(input: &[u8], sink: &'sink Sink) -> Self {
        Self {
            buffer: input.to_vec(),
            byte_pos: Cell::new(0),
            queue: RefCell::new(VecDeque::new()),
            location: Cell::new(Location::default()),
            history: RefCell::new(Vec::new()),
            sink,
        }
    }

    pub fn from_str(input: &str, sink: &'sink Sink) -> Self {
        Self::new(input.as_bytes(), sink)
    }

    /// Returns the current source line (the line of the next unconsumed
    /// code point).
    pub fn line(&self) -> usize {
        self.location.get().line
    }

    pub fn location(&self) -> Location {
        self.location.get()
    }

    /// Decodes one more code point from the byte buffer into `queue`, if any
    /// remain. Malformed UTF-8 is replaced with U+FFFD and reported.
    fn fill_one(&self) {
        let pos = self.byte_pos.get();
        if pos >= self.buffer.len() {
            return;
        }

        let rest = &self.buffer[pos..];
        match std::str::from_utf8(rest) {
            Ok(s) => {
                // Fast path: the remainder is valid, decode just one char.
                if let Some(c) = s.chars().next() {
                    self.byte_pos.set(pos + c.len_utf8());
                    self.queue.borrow_mut().push_back(c);
                }
            }
            Err(e) => {
                let valid_len = e.valid_up_to();
                if valid_len > 0 {
                    // SAFETY-free path: we already know this prefix is valid UTF-8.
                    if let Ok(s) = std::str::from_utf8(&rest[..valid_len]) {
                        if let Some(c) = s.chars().next() {
                            self.byte_pos.set(pos + c.len_utf8());
                            self.queue.borrow_mut().push_back(c);
                            return;
                        }
                    }
                }
                let bad_len = e.error_len().unwrap_or(rest.len() - valid_len).max(1);
                self.byte_pos.set(pos + valid_len + bad_len);
                self.sink.report(DiagnosticKind::InvalidUtf8, self.line());
                self.queue.borrow_mut().push_back(UnicodeChar::REPLACEMENT_CHARACTER);
            }
        }
    }

    fn ensure(&self, k: usize) {
        while self.queue.borrow().len() <= k {
            let before = self.queue.borrow().len();
            self.fill_one();
            if self.queue.borrow().len() == before {
                break; // exhausted
            }
        }
    }

    /// Returns the k-th upcoming code point (k = 0 is the very next one)
    /// without consuming it.
    pub fn peek(&self, k: usize) -> Character {
        self.ensure(k);
        match self.queue.borrow().get(k) {
            Some(c) => Character::Ch(*c),
            None => Character::Eof,
        }
    }

    /// Consumes and returns the next code point, advancing the line counter.
    pub fn advance(&self) -> Character {
        self.ensure(0);
        let c = match self.queue.borrow_mut().pop_front() {
            Some(c) => c,
            None => return Character::Eof,
        };

        self.history.borrow_mut().push(self.location.get());
        self.bump_location(c);
        Character::Ch(c)
    }

    fn bump_location(&self, c: char) {
        let mut loc = self.location.get();
        match c {
            UnicodeChar::LINE_FEED => {
                loc.line += 1;
                loc.column = 1;
            }
            UnicodeChar::CARRIAGE_RETURN => {
                // A CR immediately followed by LF counts as one line break;
                // the LF's own consumption does the increment in that case.
                if self.peek(0) != Character::Ch(UnicodeChar::LINE_FEED) {
                    loc.line += 1;
                    loc.column = 1;
                } else {
                    loc.column += 1;
                }
            }
            UnicodeChar::FORM_FEED => {
                loc.line += 1;
                loc.column = 1;
            }
            _ => {
                loc.column += 1;
            }
        }
        loc.offset += 1;
        self.location.set(loc);
    }

    /// Returns a code point to the front of the stream, as if it had not
    /// been consumed. Used after a one-token lookahead turns out to be
    /// unneeded (for example the `url(` specialization).
    pub fn pushback(&self, c: char) {
        self.queue.borrow_mut().push_front(c);
        if let Some(loc) = self.history.borrow_mut().pop() {
            self.location.set(loc);
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.peek(0), Character::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream<'s>(input: &str, sink: &'s Sink) -> ByteStream<'s> {
        ByteStream::from_str(input, sink)
    }

    #[test]
    fn peek_does_not_consume() {
        let sink = Sink::new();
        let s = stream("ab", &sink);
        assert_eq!(s.peek(0), Character::Ch('a'));
        assert_eq!(s.peek(1), Character::Ch('b'));
        assert_eq!(s.peek(0), Character::Ch('a'));
        assert_eq!(s.advance(), Character::Ch('a'));
        assert_eq!(s.advance(), Character::Ch('b'));
        assert_eq!(s.advance(), Character::Eof);
    }

    #[test]
    fn pushback_restores_char_and_line() {
        let sink = Sink::new();
        let s = stream("a\nb", &sink);
        let _ = s.advance(); // 'a'
        let nl = s.advance(); // '\n', line becomes 2
        assert_eq!(s.line(), 2);
        s.pushback(nl.char().unwrap());
        assert_eq!(s.line(), 1);
        assert_eq!(s.advance(), Character::Ch('\n'));
        assert_eq!(s.line(), 2);
    }

    #[test]
    fn crlf_counts_as_one_line_break() {
        let sink = Sink::new();
        let s = stream("a\r\nb", &sink);
        assert_eq!(s.advance(), Character::Ch('a'));
        assert_eq!(s.line(), 1);
        assert_eq!(s.advance(), Character::Ch('\r'));
        assert_eq!(s.line(), 1);
        assert_eq!(s.advance(), Character::Ch('\n'));
        assert_eq!(s.line(), 2);
        assert_eq!(s.advance(), Character::Ch('b'));
        assert_eq!(s.line(), 2);
    }

    #[test]
    fn lone_cr_and_ff_are_line_breaks() {
        let sink = Sink::new();
        let s = stream("a\rb\x0cc", &sink);
        let _ = s.advance();
        assert_eq!(s.advance(), Character::Ch('\r'));
        assert_eq!(s.line(), 2);
        let _ = s.advance();
        assert_eq!(s.advance(), Character::Ch('\x0c'));
        assert_eq!(s.line(), 3);
    }

    #[test]
    fn malformed_utf8_becomes_replacement_char() {
        let sink = Sink::new();
        let bytes = [b'a', 0xFF, b'b'];
        let s = ByteStream::new(&bytes, &sink);
        assert_eq!(s.advance(), Character::Ch('a'));
        assert_eq!(s.advance(), Character::Ch(UnicodeChar::REPLACEMENT_CHARACTER));
        assert_eq!(s.advance(), Character::Ch('b'));
        assert_eq!(sink.diagnostics().len(), 1);
    }
}
