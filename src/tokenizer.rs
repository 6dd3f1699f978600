//! The CSS tokenizer: turns a code point stream into a flat sequence of
//! [`Token`]s, handling the `url(` specialization, escape decoding, and the
//! multi-character operators (`~=`, `|=`, `<!--`, `-->`) along the way.

use crate::errors::{DiagnosticKind, Sink};
use crate::stream::{ByteStream, Character};
use crate::unicode::{is_non_printable, is_whitespace, UnicodeChar};

/// The closed set of token kinds this tokenizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Delim,
    Space,
    Comment,
    Number,
    String,
    Ident,
    AtKeyword,
    Percentage,
    Dimension,
    Function,
    Hash,
    Uri,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Includes,
    DashMatch,
    Cdo,
    Cdc,
}

impl TokenKind {
    /// The name used to render this kind in the CLI/test-harness output
    /// (`<Kind> "text"`).
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Delim => "Delim",
            TokenKind::Space => "Space",
            TokenKind::Comment => "Comment",
            TokenKind::Number => "Number",
            TokenKind::String => "String",
            TokenKind::Ident => "Ident",
            TokenKind::AtKeyword => "AtKeyword",
            TokenKind::Percentage => "Percentage",
            TokenKind::Dimension => "Dimension",
            TokenKind::Function => "Function",
            TokenKind::Hash => "Hash",
            TokenKind::Uri => "URI",
            TokenKind::LBrace => "LBrace",
            TokenKind::RBrace => "RBrace",
            TokenKind::LBracket => "LBracket",
            TokenKind::RBracket => "RBracket",
            TokenKind::LParen => "LParen",
            TokenKind::RParen => "RParen",
            TokenKind::Colon => "Colon",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::Includes => "Includes",
            TokenKind::DashMatch => "DashMatch",
            TokenKind::Cdo => "CDO",
            TokenKind::Cdc => "CDC",
        }
    }

    /// Whether this kind ever carries meaningful text (as opposed to being
    /// printed bare, e.g. `<LParen>`).
    pub fn has_text(self) -> bool {
        !matches!(
            self,
            TokenKind::Eof
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Colon
                | TokenKind::Semicolon
                | TokenKind::Includes
                | TokenKind::DashMatch
                | TokenKind::Cdo
                | TokenKind::Cdc
        )
    }
}

/// A single token: its kind, its rendered text (see [`crate::spec_text`]
/// module doc on the `Token` data model for what "text" holds per kind),
/// and the 1-based source line its first code point occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_space(&self) -> bool {
        self.kind == TokenKind::Space
    }
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn is_newline(c: char) -> bool {
    matches!(
        c,
        UnicodeChar::LINE_FEED | UnicodeChar::CARRIAGE_RETURN | UnicodeChar::FORM_FEED
    )
}

/// `nmstart`: ASCII letter, `_`, or any non-ASCII code point at or above
/// U+00A0 (U+0080..=U+009F are C1 controls and remain `Delim`).
fn is_nmstart(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (c as u32) >= 0xA0
}

/// `nmchar`: `nmstart`, digit, or `-`.
fn is_nmchar(c: char) -> bool {
    is_nmstart(c) || c.is_ascii_digit() || c == '-'
}

fn is_valid_escape_start(c0: Character, c1: Character) -> bool {
    match (c0, c1) {
        (Character::Ch('\\'), Character::Ch(next)) => !is_newline(next),
        _ => false,
    }
}

/// Whether the next three code points would start an identifier, per the
/// `-`-prefix rule: a leading `-` only starts an identifier if the code
/// point after it is itself a name-start code point or a valid escape
/// (unlike modern CSS custom properties, a second literal `-` does not
/// qualify here).
fn starts_ident_sequence(c0: Character, c1: Character, c2: Character) -> bool {
    match c0 {
        Character::Ch('\\') => is_valid_escape_start(c0, c1),
        Character::Ch(c) if is_nmstart(c) => true,
        Character::Ch('-') => match c1 {
            Character::Ch(c) if is_nmstart(c) => true,
            Character::Ch('\\') => is_valid_escape_start(c1, c2),
            _ => false,
        },
        _ => false,
    }
}

/// Tokenizes raw `input` bytes, reporting malformed-UTF-8/comment/string
/// diagnostics to `sink`. Does not include a trailing `EOF` token; callers
/// that need an end-of-stream sentinel synthesize one (see the tree
/// builder), using the `eof_line` returned alongside the tokens.
///
/// This is the only entry point that can actually observe malformed input
/// bytes: `input` need not already be valid UTF-8 (component A decodes it,
/// replacing bad sequences with U+FFFD and reporting
/// [`DiagnosticKind::InvalidUtf8`](crate::errors::DiagnosticKind::InvalidUtf8)
/// as it goes). [`tokenize_all`] is a thin wrapper for callers who already
/// hold a `&str` and so can never trigger that diagnostic.
pub fn tokenize_all_bytes(input: &[u8], sink: &Sink) -> (Vec<Token>, usize) {
    let stream = ByteStream::new(input, sink);
    let mut tokenizer = Tokenizer { stream: &stream, sink, tokens: Vec::new() };
    tokenizer.run();
    let eof_line = stream.line();
    (tokenizer.tokens, eof_line)
}

/// Tokenizes `input`, reporting comment/string diagnostics to `sink`. Since
/// `&str` is already guaranteed valid UTF-8, this can never produce an
/// [`InvalidUtf8`](crate::errors::DiagnosticKind::InvalidUtf8) diagnostic;
/// use [`tokenize_all_bytes`] on raw bytes when that matters.
pub fn tokenize_all(input: &str, sink: &Sink) -> (Vec<Token>, usize) {
    tokenize_all_bytes(input.as_bytes(), sink)
}

/// Convenience wrapper over [`tokenize_all_bytes`] for callers that only
/// need the token stream.
pub fn tokenize_bytes(input: &[u8], sink: &Sink) -> Vec<Token> {
    tokenize_all_bytes(input, sink).0
}

/// Convenience wrapper over [`tokenize_all`] for callers that only need the
/// token stream.
pub fn tokenize(input: &str, sink: &Sink) -> Vec<Token> {
    tokenize_all(input, sink).0
}

struct Tokenizer<'a> {
    stream: &'a ByteStream<'a>,
    sink: &'a Sink,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn peek(&self, k: usize) -> Character {
        self.stream.peek(k)
    }

    fn advance(&self) -> Character {
        self.stream.advance()
    }

    fn line(&self) -> usize {
        self.stream.line()
    }

    fn run(&mut self) {
        while !matches!(self.peek(0), Character::Eof) {
            self.consume_token();
        }
    }

    fn consume_token(&mut self) {
        let line = self.line();
        let c = match self.advance() {
            Character::Ch(c) => c,
            Character::Eof => return,
        };

        if is_whitespace(c) {
            self.consume_whitespace(c, line);
            return;
        }

        match c {
            '/' if self.peek(0) == Character::Ch('*') => self.consume_comment(line),
            '"' | '\'' => {
                let (token, _) = self.consume_string(c, line);
                self.tokens.push(token);
            }
            '#' => self.consume_hash(line),
            '(' => self.tokens.push(Token::new(TokenKind::LParen, "", line)),
            ')' => self.tokens.push(Token::new(TokenKind::RParen, "", line)),
            '[' => self.tokens.push(Token::new(TokenKind::LBracket, "", line)),
            ']' => self.tokens.push(Token::new(TokenKind::RBracket, "", line)),
            '{' => self.tokens.push(Token::new(TokenKind::LBrace, "", line)),
            '}' => self.tokens.push(Token::new(TokenKind::RBrace, "", line)),
            ';' => self.tokens.push(Token::new(TokenKind::Semicolon, "", line)),
            ':' => self.tokens.push(Token::new(TokenKind::Colon, "", line)),
            '~' => {
                if self.peek(0) == Character::Ch('=') {
                    self.advance();
                    self.tokens.push(Token::new(TokenKind::Includes, "", line));
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, "~", line));
                }
            }
            '|' => {
                if self.peek(0) == Character::Ch('=') {
                    self.advance();
                    self.tokens.push(Token::new(TokenKind::DashMatch, "", line));
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, "|", line));
                }
            }
            '<' => {
                if self.peek(0) == Character::Ch('!') && self.peek(1) == Character::Ch('-') && self.peek(2) == Character::Ch('-') {
                    self.advance();
                    self.advance();
                    self.advance();
                    self.tokens.push(Token::new(TokenKind::Cdo, "", line));
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, "<", line));
                }
            }
            '@' => {
                if starts_ident_sequence(self.peek(0), self.peek(1), self.peek(2)) {
                    let ident = self.consume_ident();
                    self.tokens.push(Token::new(TokenKind::AtKeyword, format!("@{ident}"), line));
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, "@", line));
                }
            }
            '-' => self.consume_minus(line),
            '.' => {
                if matches!(self.peek(0), Character::Ch(d) if d.is_ascii_digit()) {
                    self.stream.pushback('.');
                    self.consume_numeric(line);
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, ".", line));
                }
            }
            '\\' => {
                if is_valid_escape_start(Character::Ch('\\'), self.peek(0)) {
                    self.stream.pushback('\\');
                    self.consume_ident_like(line);
                } else {
                    self.tokens.push(Token::new(TokenKind::Delim, "\\", line));
                }
            }
            d if d.is_ascii_digit() => {
                self.stream.pushback(d);
                self.consume_numeric(line);
            }
            c if is_nmstart(c) => {
                self.stream.pushback(c);
                self.consume_ident_like(line);
            }
            other => self.tokens.push(Token::new(TokenKind::Delim, other.to_string(), line)),
        }
    }

    fn consume_minus(&mut self, line: usize) {
        // `-->` is CDC, but only when the `-` did not instead begin an
        // identifier (`red--` is `Ident("red--")`, not `Ident("red")` + CDC).
        if starts_ident_sequence(Character::Ch('-'), self.peek(0), self.peek(1)) {
            self.stream.pushback('-');
            self.consume_ident_like(line);
            return;
        }
        if self.peek(0) == Character::Ch('-') && self.peek(1) == Character::Ch('>') {
            self.advance();
            self.advance();
            self.tokens.push(Token::new(TokenKind::Cdc, "", line));
            return;
        }
        // A bare `-` before a digit (or anything else) is never a sign in
        // this grammar; leave the following code point for the next token.
        self.tokens.push(Token::new(TokenKind::Delim, "-", line));
    }

    fn consume_whitespace(&mut self, first: char, line: usize) {
        let mut text = String::new();
        text.push(first);
        while let Character::Ch(c) = self.peek(0) {
            if !is_whitespace(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        self.tokens.push(Token::new(TokenKind::Space, text, line));
    }

    fn consume_comment(&mut self, line: usize) {
        self.advance(); // the '*'
        let mut text = String::from("/*");
        loop {
            match self.advance() {
                Character::Eof => {
                    self.sink.report(DiagnosticKind::UnterminatedComment, line);
                    break;
                }
                Character::Ch('*') if self.peek(0) == Character::Ch('/') => {
                    self.advance();
                    text.push_str("*/");
                    break;
                }
                Character::Ch(c) => text.push(c),
            }
        }
        self.tokens.push(Token::new(TokenKind::Comment, text, line));
    }

    /// Consumes a hex-or-literal escape. The caller has already established
    /// (via [`is_valid_escape_start`]) that the current position is `\`
    /// followed by a non-newline code point.
    fn consume_escape(&self) -> char {
        self.advance(); // the backslash
        let first = match self.peek(0) {
            Character::Ch(c) => c,
            Character::Eof => return UnicodeChar::REPLACEMENT_CHARACTER,
        };

        if !is_hex_digit(first) {
            self.advance();
            return first;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek(0) {
                Character::Ch(c) if is_hex_digit(c) => {
                    hex.push(c);
                    self.advance();
                }
                _ => break,
            }
        }

        // A single trailing whitespace code point is consumed as part of
        // the escape; a CR immediately followed by LF counts as one unit.
        if let Character::Ch(c) = self.peek(0) {
            if is_whitespace(c) {
                self.advance();
                if c == UnicodeChar::CARRIAGE_RETURN && self.peek(0) == Character::Ch(UnicodeChar::LINE_FEED) {
                    self.advance();
                }
            }
        }

        let value = u32::from_str_radix(&hex, 16).unwrap_or(0);
        // Surrogates and out-of-range values are never valid scalar values;
        // zero is kept (char::from_u32 gives Some('\0'), not filtered out).
        char::from_u32(value).unwrap_or(UnicodeChar::REPLACEMENT_CHARACTER)
    }

    fn consume_ident(&self) -> String {
        let mut out = String::new();
        loop {
            match self.peek(0) {
                Character::Ch(c) if is_nmchar(c) => {
                    out.push(c);
                    self.advance();
                }
                Character::Ch('\\') if is_valid_escape_start(Character::Ch('\\'), self.peek(1)) => {
                    out.push(self.consume_escape());
                }
                _ => break,
            }
        }
        out
    }

    fn consume_numeric(&mut self, line: usize) {
        let mut text = String::new();
        while let Character::Ch(c) = self.peek(0) {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.advance();
        }
        if self.peek(0) == Character::Ch('.') && matches!(self.peek(1), Character::Ch(d) if d.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Character::Ch(c) = self.peek(0) {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                self.advance();
            }
        }

        if self.peek(0) == Character::Ch('%') {
            self.advance();
            text.push('%');
            self.tokens.push(Token::new(TokenKind::Percentage, text, line));
        } else if starts_ident_sequence(self.peek(0), self.peek(1), self.peek(2)) {
            let ident = self.consume_ident();
            text.push_str(&ident);
            self.tokens.push(Token::new(TokenKind::Dimension, text, line));
        } else {
            self.tokens.push(Token::new(TokenKind::Number, text, line));
        }
    }

    fn consume_hash(&mut self, line: usize) {
        let has_body = matches!(self.peek(0), Character::Ch(c) if is_nmchar(c))
            || is_valid_escape_start(self.peek(0), self.peek(1));
        if !has_body {
            self.tokens.push(Token::new(TokenKind::Delim, "#", line));
            return;
        }
        let ident = self.consume_ident();
        self.tokens.push(Token::new(TokenKind::Hash, format!("#{ident}"), line));
    }

    /// Consumes an identifier-like token: a plain `Ident`, an `AtKeyword`
    /// handled separately, or (when followed immediately by `(`) a
    /// `Function` — specialized to `URI` when the identifier is `url`.
    fn consume_ident_like(&mut self, line: usize) {
        let ident = self.consume_ident();
        if self.peek(0) != Character::Ch('(') {
            self.tokens.push(Token::new(TokenKind::Ident, ident, line));
            return;
        }
        self.advance(); // '('

        if ident.to_ascii_lowercase() == "url" {
            self.consume_url(line);
        } else {
            self.tokens.push(Token::new(TokenKind::Function, format!("{ident}("), line));
        }
    }

    /// Implements the `url(` specialization (spec §4.3): on any failure to
    /// match a well-formed URI, falls back to a plain `Function("url(")`
    /// token followed by whatever had already been consumed, and resumes
    /// ordinary tokenizing from there.
    fn consume_url(&mut self, line: usize) {
        let leading_ws = self.consume_ws_run();

        match self.peek(0) {
            Character::Ch(q @ ('"' | '\'')) => {
                self.advance();
                let (string_token, terminated) = self.consume_string(q, self.line());
                if !terminated {
                    self.emit_url_fallback(line, &leading_ws, Some(string_token), "");
                    return;
                }
                let trailing_ws = self.consume_ws_run();
                if self.peek(0) == Character::Ch(')') {
                    self.advance();
                    let text = format!("url({leading_ws}{}{trailing_ws})", string_token.text);
                    self.tokens.push(Token::new(TokenKind::Uri, text, line));
                } else {
                    self.emit_url_fallback(line, &leading_ws, Some(string_token), &trailing_ws);
                }
            }
            _ => self.consume_unquoted_url(line, &leading_ws),
        }
    }

    fn consume_ws_run(&self) -> String {
        let mut ws = String::new();
        while let Character::Ch(c) = self.peek(0) {
            if !is_whitespace(c) {
                break;
            }
            ws.push(c);
            self.advance();
        }
        ws
    }

    fn consume_unquoted_url(&mut self, line: usize, leading_ws: &str) {
        let mut body = String::new();
        loop {
            match self.peek(0) {
                Character::Ch(')') => {
                    // An empty unquoted body (nothing but whitespace, or
                    // nothing at all, between the parens) is never a URI:
                    // `url()` and `url(   )` both fall back to `Function`.
                    if body.is_empty() {
                        self.tokens.push(Token::new(TokenKind::Function, "url(", line));
                        if !leading_ws.is_empty() {
                            self.tokens.push(Token::new(TokenKind::Space, leading_ws.to_string(), line));
                        }
                        return;
                    }
                    self.advance();
                    self.tokens.push(Token::new(TokenKind::Uri, format!("url({leading_ws}{body})"), line));
                    return;
                }
                Character::Eof => {
                    // end-of-input while in URI mode: fall back, nothing
                    // further has been committed to a token yet.
                    self.tokens.push(Token::new(TokenKind::Function, "url(", line));
                    if !leading_ws.is_empty() {
                        self.tokens.push(Token::new(TokenKind::Space, leading_ws, line));
                    }
                    if !body.is_empty() {
                        self.tokens.push(Token::new(TokenKind::Ident, body, line));
                    }
                    return;
                }
                Character::Ch(c) if is_whitespace(c) => {
                    let trailing_ws = self.consume_ws_run();
                    if self.peek(0) == Character::Ch(')') {
                        self.advance();
                        self.tokens
                            .push(Token::new(TokenKind::Uri, format!("url({leading_ws}{body}{trailing_ws})"), line));
                    } else {
                        self.tokens.push(Token::new(TokenKind::Function, "url(", line));
                        if !leading_ws.is_empty() {
                            self.tokens.push(Token::new(TokenKind::Space, leading_ws, line));
                        }
                        if !body.is_empty() {
                            self.tokens.push(Token::new(TokenKind::Ident, body, line));
                        }
                        self.tokens.push(Token::new(TokenKind::Space, trailing_ws, line));
                    }
                    return;
                }
                Character::Ch('\\') if is_valid_escape_start(Character::Ch('\\'), self.peek(1)) => {
                    body.push(self.consume_escape());
                }
                Character::Ch(c) if c == '"' || c == '\'' || c == '(' || is_non_printable(c) => {
                    // Malformed body: fall back and re-tokenize from here.
                    self.tokens.push(Token::new(TokenKind::Function, "url(", line));
                    if !leading_ws.is_empty() {
                        self.tokens.push(Token::new(TokenKind::Space, leading_ws, line));
                    }
                    if !body.is_empty() {
                        self.tokens.push(Token::new(TokenKind::Ident, body, line));
                    }
                    return;
                }
                Character::Ch(c) => {
                    body.push(c);
                    self.advance();
                }
            }
        }
    }

    fn emit_url_fallback(&mut self, line: usize, leading_ws: &str, string_token: Option<Token>, trailing_ws: &str) {
        self.tokens.push(Token::new(TokenKind::Function, "url(", line));
        if !leading_ws.is_empty() {
            self.tokens.push(Token::new(TokenKind::Space, leading_ws, line));
        }
        if let Some(t) = string_token {
            self.tokens.push(t);
        }
        if !trailing_ws.is_empty() {
            self.tokens.push(Token::new(TokenKind::Space, trailing_ws, line));
        }
    }

    /// Consumes a quoted string starting *after* the opening quote has
    /// already been consumed by the caller. Returns the token and whether it
    /// terminated normally (as opposed to hitting a raw newline or EOF).
    fn consume_string(&mut self, quote: char, line: usize) -> (Token, bool) {
        let mut text = String::new();
        text.push(quote);
        loop {
            match self.peek(0) {
                Character::Ch(c) if c == quote => {
                    self.advance();
                    text.push(quote);
                    return (Token::new(TokenKind::String, text, line), true);
                }
                Character::Eof => {
                    self.sink.report(DiagnosticKind::UnterminatedString, self.line());
                    return (Token::new(TokenKind::String, text, line), false);
                }
                Character::Ch(c) if is_newline(c) => {
                    self.sink.report(DiagnosticKind::UnterminatedString, self.line());
                    return (Token::new(TokenKind::String, text, line), false);
                }
                Character::Ch('\\') => {
                    self.advance();
                    match self.peek(0) {
                        Character::Eof => {
                            self.sink.report(DiagnosticKind::UnterminatedStringBackslash, self.line());
                            return (Token::new(TokenKind::String, text, line), false);
                        }
                        Character::Ch(c) if is_newline(c) => {
                            // Line continuation: the escape produces nothing.
                            self.advance();
                            if c == UnicodeChar::CARRIAGE_RETURN && self.peek(0) == Character::Ch(UnicodeChar::LINE_FEED) {
                                self.advance();
                            }
                        }
                        _ => {
                            self.stream.pushback('\\');
                            text.push(self.consume_escape());
                        }
                    }
                }
                Character::Ch(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }
}
