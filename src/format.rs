//! Renders tokens and tree nodes the way `./test --lexer`/`--tree` print
//! them: one item per line, C0 control characters escaped as `^X`, and
//! every grouped tree node indented by one ASCII space per depth level.

use crate::tokenizer::{Token, TokenKind};
use crate::tree::{Node, NodeKind};

/// Escapes C0 control characters (`U+0000..=U+001F`) as `^X`, where `X` is
/// the control's letter equivalent (`^@` for NUL, `^I` for tab, `^M` for
/// CR, and so on) — the same convention terminals use for `stty`/`cat -v`.
/// Everything else, including non-ASCII text, passes through unchanged.
pub fn printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code < 0x20 {
            out.push('^');
            out.push(char::from_u32(code + 0x40).unwrap_or('?'));
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders a single token as `<Kind> "text"`, or bare `<Kind>` for kinds
/// with no interesting text (e.g. `LParen`).
pub fn render_token(token: &Token) -> String {
    if token.kind.has_text() {
        format!("<{}> \"{}\"", token.kind.name(), printable(&token.text))
    } else {
        format!("<{}>", token.kind.name())
    }
}

/// Renders a full token stream, one `render_token` line per token. Unlike
/// [`render_tree`], lexer-mode output carries no line-number prefix (§6).
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&render_token(token));
        out.push('\n');
    }
    out
}

/// Renders a tree from its root, depth-first, `<line>:<indent><label>` per
/// node.
pub fn render_tree(root: &Node) -> String {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    out
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    out.push_str(&node.line.to_string());
    out.push(':');
    for _ in 0..depth {
        out.push(' ');
    }
    out.push_str(&node_label(node));
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

fn node_label(node: &Node) -> String {
    match &node.kind {
        NodeKind::Stylesheet => "Stylesheet".to_string(),
        NodeKind::TopLevel => "TopLevel".to_string(),
        NodeKind::Block => "Block".to_string(),
        NodeKind::Brackets => "Brackets".to_string(),
        NodeKind::Parens => "Parens".to_string(),
        NodeKind::AtRule(name) => format!("AtRule \"{name}\""),
        NodeKind::Function(name) => format!("Function \"{name}\""),
        // A Space leaf's text is whitespace-only filler; rendering it bare
        // keeps the tree output readable and matches the CLI's convention
        // of never quoting it.
        NodeKind::Leaf(kind, text) => {
            if !kind.has_text() || *kind == TokenKind::Space || text.is_empty() {
                format!("Token ({})", kind.name())
            } else {
                format!("Token ({}) \"{}\"", kind.name(), printable(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Sink;
    use crate::tokenizer::tokenize;
    use crate::tree::parse;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(printable("a\tb\nc"), "a^Ib^Jc");
        assert_eq!(printable("\x00"), "^@");
        assert_eq!(printable("\x1f"), "^_");
    }

    #[test]
    fn leaves_printable_ascii_and_unicode_alone() {
        assert_eq!(printable("héllo!"), "héllo!");
    }

    #[test]
    fn bare_tokens_render_without_quotes() {
        let sink = Sink::new();
        let toks = tokenize("(", &sink);
        assert_eq!(render_token(&toks[0]), "<LParen>");
    }

    #[test]
    fn text_bearing_tokens_render_with_quotes() {
        let sink = Sink::new();
        let toks = tokenize("foo", &sink);
        assert_eq!(render_token(&toks[0]), "<Ident> \"foo\"");
    }

    #[test]
    fn render_tokens_carries_no_line_prefix() {
        let sink = Sink::new();
        let toks = tokenize("( foo", &sink);
        assert_eq!(render_tokens(&toks), "<LParen>\n<Space> \" \"\n<Ident> \"foo\"\n");
    }

    #[test]
    fn tree_render_indents_and_labels_nodes() {
        let sink = Sink::new();
        let tree = parse("@foo { y }", &sink);
        let rendered = render_tree(&tree);
        let mut lines = rendered.lines();
        assert!(lines.next().unwrap().ends_with(":Stylesheet"));
        assert!(lines.next().unwrap().ends_with(": AtRule \"foo\""));
        assert!(lines.next().unwrap().ends_with("  Block"));
        assert!(lines.next().unwrap().ends_with("   Token (Ident) \"y\""));
    }

    #[test]
    fn space_leaves_never_show_quoted_text() {
        let sink = Sink::new();
        let tree = parse("@baz 1 2 {}", &sink);
        let rendered = render_tree(&tree);
        assert!(rendered.contains("Token (Space)\n"));
        assert!(!rendered.contains("Token (Space) \""));
    }
}
