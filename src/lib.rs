//! A CSS 2.1/3 tokenizer and shallow structural tree builder.
//!
//! This crate implements two independent stages of a CSS front-end:
//!
//! - [`tokenizer`]: turns source text into a flat stream of CSS tokens.
//! - [`tree`]: groups that stream into a shallow tree of rulesets,
//!   at-rules, and balanced-delimiter groups, recovering locally from
//!   malformed input rather than aborting.
//!
//! Neither stage understands CSS semantics — selectors, the cascade, or
//! property values are out of scope here. Both stages are *recoverable*:
//! malformed input never produces a hard error, only a [`errors::Diagnostic`]
//! alongside a best-effort token stream or tree.
//!
//! [`format`] renders either stage's output the way a small command-line
//! front-end would: one token or node per line, prefixed with its source
//! line number.

pub mod errors;
pub mod format;
pub mod tokenizer;
pub mod tree;

mod stream;
mod unicode;

pub use errors::{Context, Diagnostic, DiagnosticKind, Sink};
pub use tokenizer::{tokenize, tokenize_all, tokenize_all_bytes, tokenize_bytes, Token, TokenKind};
pub use tree::{build, Node, NodeKind};

/// Tokenizes `input`, returning the flat token stream and every diagnostic
/// collected while lexing (unterminated comments/strings). `input` is
/// already a `&str`, so it is already valid UTF-8 by construction — use
/// [`lex_bytes`] on raw bytes to also observe
/// [`DiagnosticKind::InvalidUtf8`].
pub fn lex(input: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let sink = Sink::new();
    let tokens = tokenize(input, &sink);
    (tokens, sink.diagnostics())
}

/// Tokenizes raw `input` bytes, which need not already be valid UTF-8:
/// malformed sequences are replaced with U+FFFD and reported as
/// [`DiagnosticKind::InvalidUtf8`] alongside whatever else lexing finds.
/// This mirrors the teacher's `parse_str`/`parse_stream` split — a
/// convenience `&str` entry point layered over the byte-level primitive
/// that can actually see malformed input.
pub fn lex_bytes(input: &[u8]) -> (Vec<Token>, Vec<Diagnostic>) {
    let sink = Sink::new();
    let tokens = tokenize_bytes(input, &sink);
    (tokens, sink.diagnostics())
}

/// Tokenizes and tree-builds `input` in one pass, returning the stylesheet
/// tree and every diagnostic collected along the way, lexer- and
/// tree-builder-level alike, in the order they occurred. As with [`lex`],
/// `input`'s `&str` type makes [`DiagnosticKind::InvalidUtf8`] unreachable
/// here; use [`parse_bytes`] for that.
pub fn parse(input: &str) -> (Node, Vec<Diagnostic>) {
    let sink = Sink::new();
    let tree = tree::parse(input, &sink);
    (tree, sink.diagnostics())
}

/// Tokenizes and tree-builds raw `input` bytes in one pass. See
/// [`lex_bytes`] for why this, and not [`parse`], is the entry point that
/// can actually produce [`DiagnosticKind::InvalidUtf8`].
pub fn parse_bytes(input: &[u8]) -> (Node, Vec<Diagnostic>) {
    let sink = Sink::new();
    let tree = tree::parse_bytes(input, &sink);
    (tree, sink.diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_collects_diagnostics_alongside_tokens() {
        let (tokens, diagnostics) = lex("\"unterminated");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn parse_builds_a_tree_and_surfaces_lexer_diagnostics_too() {
        let (root, diagnostics) = parse("a { color: url(\"x) }");
        assert_eq!(root.kind, NodeKind::Stylesheet);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn empty_input_yields_an_empty_stylesheet() {
        let (root, diagnostics) = parse("");
        assert_eq!(root.kind, NodeKind::Stylesheet);
        assert!(root.children.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn lex_bytes_reports_invalid_utf8_unreachable_through_lex() {
        let bytes = [b'a', 0xFF, b'b'];
        let (tokens, diagnostics) = lex_bytes(&bytes);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "a\u{FFFD}b");
        assert_eq!(diagnostics, vec![Diagnostic { kind: DiagnosticKind::InvalidUtf8, line: 1 }]);
    }

    #[test]
    fn parse_bytes_surfaces_invalid_utf8_in_the_tree_too() {
        let bytes = [b'a', b'{', 0xFF, b'}'];
        let (root, diagnostics) = parse_bytes(&bytes);
        assert_eq!(root.kind, NodeKind::Stylesheet);
        assert!(diagnostics.contains(&Diagnostic { kind: DiagnosticKind::InvalidUtf8, line: 1 }));
    }
}
