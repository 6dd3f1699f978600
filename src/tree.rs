//! The structural tree builder (component D): groups the flat token stream
//! into a shallow tree of rulesets, at-rules, blocks, brackets, parens, and
//! function calls, with the balanced-delimiter error recovery described in
//! the module's design notes.
//!
//! Comments never reach this module: they are filtered out of the token
//! stream before the builder sees it. Everything else — including `Space`
//! — is a candidate for a leaf, subject to the leading-whitespace rule
//! documented on [`Builder::parse_group_body`].

use std::cell::Cell;

use crate::errors::{Context, DiagnosticKind, Sink};
use crate::tokenizer::{tokenize_all, tokenize_all_bytes, Token, TokenKind};

/// A node of the shallow stylesheet tree (§3 "Tree node").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Stylesheet,
    AtRule(String),
    TopLevel,
    Block,
    Brackets,
    Parens,
    Function(String),
    /// A preserved token, kept verbatim as a leaf.
    Leaf(TokenKind, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: usize,
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(kind: TokenKind, text: String, line: usize) -> Node {
        Node {
            kind: NodeKind::Leaf(kind, text),
            line,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(..))
    }
}

/// Tokenizes and tree-builds `input` in one pass. Diagnostics from both the
/// lexer and the tree builder land in `sink`, in the order they occurred.
pub fn parse(input: &str, sink: &Sink) -> Node {
    let (tokens, eof_line) = tokenize_all(input, sink);
    build(&tokens, eof_line, sink)
}

/// Tokenizes and tree-builds raw `input` bytes in one pass. Unlike [`parse`],
/// `input` need not already be valid UTF-8 — malformed sequences are
/// reported to `sink` as [`DiagnosticKind::InvalidUtf8`] and replaced before
/// lexing continues. See [`tokenize_all_bytes`].
pub fn parse_bytes(input: &[u8], sink: &Sink) -> Node {
    let (tokens, eof_line) = tokenize_all_bytes(input, sink);
    build(&tokens, eof_line, sink)
}

/// Builds a tree from an already-tokenized stream. `eof_line` is the line
/// the tokenizer had reached when it ran out of input (see
/// [`tokenize_all`]), used to attribute end-of-input diagnostics.
pub fn build(tokens: &[Token], eof_line: usize, sink: &Sink) -> Node {
    let filtered: Vec<Token> = tokens.iter().filter(|t| t.kind != TokenKind::Comment).cloned().collect();
    let mut builder = Builder {
        cur: Cursor::new(&filtered, eof_line),
        sink,
        stack: Vec::new(),
    };
    builder.parse_stylesheet()
}

/// The four balanced-delimiter group shapes. `Function` is the odd one out:
/// it closes on `)` like `Parens`, but does not push its own name onto the
/// context stack (see [`Builder::parse_group`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Block,
    Brackets,
    Parens,
    Function,
}

fn closer_of(kind: GroupKind) -> TokenKind {
    match kind {
        GroupKind::Block => TokenKind::RBrace,
        GroupKind::Brackets => TokenKind::RBracket,
        GroupKind::Parens | GroupKind::Function => TokenKind::RParen,
    }
}

/// The context pushed onto [`Builder::stack`] while a group of this kind is
/// open. `Parens` pushes `Brackets` — see [`Context`]'s doc comment — so
/// nested diagnostics read "inside brackets" whether the enclosing group was
/// written with `(...)` or `[...]`.
fn named_context(kind: GroupKind) -> Option<Context> {
    match kind {
        GroupKind::Block => Some(Context::Block),
        GroupKind::Brackets | GroupKind::Parens => Some(Context::Brackets),
        GroupKind::Function => None,
    }
}

/// How a group body's consuming loop ended.
enum Termination {
    /// Its own closer was found and consumed.
    Closed,
    /// Real end-of-input; already diagnosed by the innermost frame.
    Eof,
    /// A `}` belonging to an enclosing `Block` was found instead of this
    /// group's own closer. Carries the line it occurred on so every
    /// ancestor frame that unwinds because of it attributes its own
    /// diagnostic to the same line. See [`Builder::absorb_invasion`].
    Invasion(usize),
}

/// A read-only, pushback-free cursor over an already-filtered token slice,
/// presenting a synthetic `EOF` token past the end.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: Cell<usize>,
    eof: Token,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], eof_line: usize) -> Self {
        Self {
            tokens,
            pos: Cell::new(0),
            eof: Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: eof_line,
            },
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos.get()).unwrap_or(&self.eof)
    }

    fn advance(&self) {
        if self.pos.get() < self.tokens.len() {
            self.pos.set(self.pos.get() + 1);
        }
    }
}

struct Builder<'a> {
    cur: Cursor<'a>,
    sink: &'a Sink,
    /// The stack of currently-open *named* contexts (`AtRule`, `Block`,
    /// `Brackets` — `Parens` groups push `Brackets` too, see [`Context`]) —
    /// `Function` bodies never push, so a `Function` opened directly inside
    /// one of these reports that context's name in its own diagnostics (see
    /// [`Builder::parse_group`]).
    stack: Vec<Context>,
}

impl<'a> Builder<'a> {
    fn parse_stylesheet(&mut self) -> Node {
        let mut children = Vec::new();
        loop {
            let tok = self.cur.peek().clone();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Space | TokenKind::Cdo | TokenKind::Cdc => self.cur.advance(),
                TokenKind::AtKeyword => {
                    self.cur.advance();
                    children.push(self.parse_at_rule(tok));
                }
                TokenKind::RBrace => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseBrace, tok.line);
                    self.cur.advance();
                }
                TokenKind::RBracket => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseBracket, tok.line);
                    self.cur.advance();
                }
                TokenKind::RParen => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseParen, tok.line);
                    self.cur.advance();
                }
                _ => children.push(self.parse_top_level()),
            }
        }
        Node {
            kind: NodeKind::Stylesheet,
            line: 1,
            children,
        }
    }

    /// A contiguous run of selector-like tokens and `Block`s, terminated by
    /// an `AtKeyword` (left unconsumed, for `parse_stylesheet` to pick up)
    /// or `EOF`. A top-level `;` has no grammatical meaning and is dropped;
    /// `CDO`/`CDC` are legal here and are silently discarded rather than
    /// kept (unlike inside a group, where they become a `Space`-equivalent
    /// leaf — see [`Builder::parse_group_body`]).
    fn parse_top_level(&mut self) -> Node {
        let line = self.cur.peek().line;
        let mut children = Vec::new();
        loop {
            let tok = self.cur.peek().clone();
            match tok.kind {
                TokenKind::Eof | TokenKind::AtKeyword => break,
                TokenKind::Semicolon | TokenKind::Cdo | TokenKind::Cdc => self.cur.advance(),
                TokenKind::RBrace => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseBrace, tok.line);
                    self.cur.advance();
                }
                TokenKind::RBracket => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseBracket, tok.line);
                    self.cur.advance();
                }
                TokenKind::RParen => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseParen, tok.line);
                    self.cur.advance();
                }
                TokenKind::LBrace => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Block, tok.line));
                }
                TokenKind::LBracket => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Brackets, tok.line));
                }
                TokenKind::LParen => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Parens, tok.line));
                }
                TokenKind::Function => {
                    self.cur.advance();
                    children.push(self.open_function(&tok));
                }
                _ => {
                    self.cur.advance();
                    children.push(Node::leaf(tok.kind, tok.text, tok.line));
                }
            }
        }
        Node {
            kind: NodeKind::TopLevel,
            line,
            children,
        }
    }

    /// An `@`-rule: a prelude of tokens and grouped nodes, terminated by
    /// `;` (no block), `{` (its block — this also ends the rule), or `EOF`
    /// (diagnosed `Incomplete @-rule`).
    fn parse_at_rule(&mut self, keyword: Token) -> Node {
        let name = keyword.text.trim_start_matches('@').to_string();
        let line = keyword.line;
        self.stack.push(Context::AtRule);
        let mut children = Vec::new();
        let mut started = false;
        loop {
            let tok = self.cur.peek().clone();
            match tok.kind {
                TokenKind::Eof => {
                    self.sink.report(DiagnosticKind::IncompleteAtRule, tok.line);
                    break;
                }
                TokenKind::Semicolon => {
                    self.cur.advance();
                    break;
                }
                TokenKind::LBrace => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Block, tok.line));
                    break;
                }
                // The leading whitespace of the prelude is insignificant
                // separator text and is dropped; any later Space is kept.
                TokenKind::Space if !started => {
                    self.cur.advance();
                    started = true;
                }
                TokenKind::RParen => {
                    self.sink
                        .report(DiagnosticKind::UnexpectedCloseParenInside(Context::AtRule), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::RBracket => {
                    self.sink
                        .report(DiagnosticKind::UnexpectedCloseBracketInside(Context::AtRule), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::RBrace => {
                    self.sink
                        .report(DiagnosticKind::UnexpectedCloseBraceInside(Context::AtRule), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::AtKeyword => {
                    self.sink
                        .report(DiagnosticKind::UnexpectedAtKeywordInside(Context::AtRule), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::Cdo | TokenKind::Cdc => {
                    self.sink
                        .report(DiagnosticKind::HtmlCommentDelimitersInside(Context::AtRule), tok.line);
                    self.cur.advance();
                    children.push(Node::leaf(TokenKind::Space, String::new(), tok.line));
                    started = true;
                }
                TokenKind::LBracket => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Brackets, tok.line));
                    started = true;
                }
                TokenKind::LParen => {
                    self.cur.advance();
                    children.push(self.open_group(GroupKind::Parens, tok.line));
                    started = true;
                }
                TokenKind::Function => {
                    self.cur.advance();
                    children.push(self.open_function(&tok));
                    started = true;
                }
                _ => {
                    self.cur.advance();
                    children.push(Node::leaf(tok.kind, tok.text, tok.line));
                    started = true;
                }
            }
        }
        self.stack.pop();
        Node {
            kind: NodeKind::AtRule(name),
            line,
            children,
        }
    }

    /// Opens a `Block`/`Brackets`/`Parens` child at the current position
    /// (the opening delimiter has already been consumed) and wraps its body
    /// in the corresponding node.
    fn open_group(&mut self, kind: GroupKind, line: usize) -> Node {
        let node_kind = match kind {
            GroupKind::Block => NodeKind::Block,
            GroupKind::Brackets => NodeKind::Brackets,
            // Only called with Block/Brackets/Parens; Function nodes go
            // through `open_function` instead, which names the call.
            GroupKind::Parens | GroupKind::Function => NodeKind::Parens,
        };
        let (children, _) = self.parse_group(kind);
        Node {
            kind: node_kind,
            line,
            children,
        }
    }

    /// Opens a `Function` child; `token` is the already-consumed `Function`
    /// token (its text is `name(`).
    fn open_function(&mut self, token: &Token) -> Node {
        let name = token.text.trim_end_matches('(').to_string();
        let (children, _) = self.parse_group(GroupKind::Function);
        Node {
            kind: NodeKind::Function(name),
            line: token.line,
            children,
        }
    }

    /// Runs a group body, pushing/popping its named context (if any) around
    /// the call.
    fn parse_group(&mut self, kind: GroupKind) -> (Vec<Node>, Termination) {
        let ctx = match kind {
            GroupKind::Block => Context::Block,
            GroupKind::Brackets | GroupKind::Parens => Context::Brackets,
            GroupKind::Function => self.stack.last().copied().unwrap_or(Context::Brackets),
        };
        if let Some(c) = named_context(kind) {
            self.stack.push(c);
        }
        let result = self.parse_group_body(kind, ctx);
        if named_context(kind).is_some() {
            self.stack.pop();
        }
        result
    }

    /// The balanced-delimiter body shared by `Block`, `Brackets`, `Parens`,
    /// and `Function`.
    ///
    /// The very first token of the body is dropped, uncommented, if it is a
    /// bare `Space` — that leading run is pure separator text between the
    /// opening delimiter and the body's real content, mirroring the
    /// at-rule prelude's leading-space rule in [`Builder::parse_at_rule`].
    /// Every later token, including subsequent `Space` runs, is kept.
    ///
    /// `Brackets` and `Parens` share every context-sensitive rule: a bare
    /// `;` or a nested `{...}` is invalid content in either, reported as
    /// "inside brackets" regardless of which delimiter actually opened the
    /// group (see [`Context`]). A misplaced `{...}` is still parsed so its
    /// own balance (and any cascading close-delimiter invasion) is
    /// accounted for, but it is never attached to the tree as a child —
    /// only the diagnostic and the surrounding separators survive.
    ///
    /// A `}` that does not belong to this group (i.e. `kind != Block`)
    /// means an enclosing `Block` is closing while this group — and
    /// possibly further ancestors — never got their own close. That token
    /// is kept as a `Token(RBrace)` leaf here (the innermost still-open
    /// group), each ancestor frame reports its own `Missing close-delimiter`
    /// as it unwinds, and the enclosing `Block` reports `Unexpected end of
    /// block` once it absorbs the cascade. See [`Termination::Invasion`].
    fn parse_group_body(&mut self, kind: GroupKind, ctx: Context) -> (Vec<Node>, Termination) {
        let closer = closer_of(kind);
        let mut children = Vec::new();
        let mut started = false;
        loop {
            let tok = self.cur.peek().clone();
            if tok.kind == closer {
                self.cur.advance();
                return (children, Termination::Closed);
            }
            match tok.kind {
                TokenKind::Eof => {
                    if kind == GroupKind::Block {
                        self.sink.report(DiagnosticKind::UnexpectedEndOfBlock, tok.line);
                    } else {
                        self.sink.report(DiagnosticKind::MissingCloseDelimiter, tok.line);
                    }
                    return (children, Termination::Eof);
                }
                TokenKind::RBrace => {
                    // kind != Block, since the Block case was handled by
                    // the `closer` check above.
                    self.cur.advance();
                    children.push(Node::leaf(TokenKind::RBrace, String::new(), tok.line));
                    self.sink.report(DiagnosticKind::MissingCloseDelimiter, tok.line);
                    return (children, Termination::Invasion(tok.line));
                }
                TokenKind::RParen if !matches!(kind, GroupKind::Parens | GroupKind::Function) => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseParenInside(ctx), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::RBracket if kind != GroupKind::Brackets => {
                    self.sink.report(DiagnosticKind::UnexpectedCloseBracketInside(ctx), tok.line);
                    self.cur.advance();
                    started = true;
                }
                TokenKind::AtKeyword => {
                    self.sink.report(DiagnosticKind::UnexpectedAtKeywordInside(ctx), tok.line);
                    self.cur.advance();
                    if started {
                        children.push(Node::leaf(TokenKind::Space, String::new(), tok.line));
                    }
                    started = true;
                }
                TokenKind::Semicolon if matches!(kind, GroupKind::Brackets | GroupKind::Parens) => {
                    self.sink.report(DiagnosticKind::UnexpectedSemicolonInside(ctx), tok.line);
                    self.cur.advance();
                    if started {
                        children.push(Node::leaf(TokenKind::Space, String::new(), tok.line));
                    }
                    started = true;
                }
                TokenKind::Cdo | TokenKind::Cdc => {
                    self.sink.report(DiagnosticKind::HtmlCommentDelimitersInside(ctx), tok.line);
                    self.cur.advance();
                    if started {
                        children.push(Node::leaf(TokenKind::Space, String::new(), tok.line));
                    }
                    started = true;
                }
                TokenKind::LBrace => {
                    let misplaced = matches!(kind, GroupKind::Brackets | GroupKind::Parens);
                    if misplaced {
                        self.sink.report(DiagnosticKind::UnexpectedBlockInside(ctx), tok.line);
                    }
                    self.cur.advance();
                    let (block_children, term) = self.parse_group(GroupKind::Block);
                    // A block directly inside brackets/parens is invalid
                    // content: it is parsed for balance (so its own closer
                    // and any cascading invasion are accounted for) but
                    // never attached to the tree.
                    if !misplaced {
                        children.push(Node {
                            kind: NodeKind::Block,
                            line: tok.line,
                            children: block_children,
                        });
                    }
                    started = true;
                    if let Termination::Invasion(at) = term {
                        return self.absorb_invasion(kind, children, at);
                    }
                }
                TokenKind::LBracket => {
                    self.cur.advance();
                    let (c, term) = self.parse_group(GroupKind::Brackets);
                    children.push(Node {
                        kind: NodeKind::Brackets,
                        line: tok.line,
                        children: c,
                    });
                    started = true;
                    if let Termination::Invasion(at) = term {
                        return self.absorb_invasion(kind, children, at);
                    }
                }
                TokenKind::LParen => {
                    self.cur.advance();
                    let (c, term) = self.parse_group(GroupKind::Parens);
                    children.push(Node {
                        kind: NodeKind::Parens,
                        line: tok.line,
                        children: c,
                    });
                    started = true;
                    if let Termination::Invasion(at) = term {
                        return self.absorb_invasion(kind, children, at);
                    }
                }
                TokenKind::Function => {
                    self.cur.advance();
                    let name = tok.text.trim_end_matches('(').to_string();
                    let (c, term) = self.parse_group(GroupKind::Function);
                    children.push(Node {
                        kind: NodeKind::Function(name),
                        line: tok.line,
                        children: c,
                    });
                    started = true;
                    if let Termination::Invasion(at) = term {
                        return self.absorb_invasion(kind, children, at);
                    }
                }
                TokenKind::Space if !started => {
                    self.cur.advance();
                    started = true;
                }
                _ => {
                    self.cur.advance();
                    children.push(Node::leaf(tok.kind, tok.text, tok.line));
                    started = true;
                }
            }
        }
    }

    /// A nested group signalled [`Termination::Invasion`]: a `}` consumed
    /// somewhere below us belongs to an ancestor `Block`, not to us. We
    /// never got our own close either, so we report accordingly and keep
    /// propagating — unless we *are* the `Block` in question, in which case
    /// the cascade ends here.
    fn absorb_invasion(&mut self, kind: GroupKind, children: Vec<Node>, at: usize) -> (Vec<Node>, Termination) {
        if kind == GroupKind::Block {
            self.sink.report(DiagnosticKind::UnexpectedEndOfBlock, at);
            (children, Termination::Closed)
        } else {
            self.sink.report(DiagnosticKind::MissingCloseDelimiter, at);
            (children, Termination::Invasion(at))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DiagnosticKind as D;

    fn parse_tree(input: &str) -> (Node, Vec<DiagnosticKind>) {
        let sink = Sink::new();
        let tree = parse(input, &sink);
        (tree, sink.diagnostics().into_iter().map(|d| d.kind).collect())
    }

    fn leaf(kind: TokenKind, text: &str) -> Node {
        Node {
            kind: NodeKind::Leaf(kind, text.to_string()),
            line: 0,
            children: Vec::new(),
        }
    }

    /// Compares tree shape only (kind + children), ignoring line numbers.
    fn shapes_match(a: &Node, b: &Node) -> bool {
        a.kind == b.kind && a.children.len() == b.children.len() && a.children.iter().zip(&b.children).all(|(x, y)| shapes_match(x, y))
    }

    #[test]
    fn empty_input_is_bare_stylesheet() {
        let (tree, errs) = parse_tree("\n");
        assert_eq!(tree.kind, NodeKind::Stylesheet);
        assert!(tree.children.is_empty());
        assert!(errs.is_empty());
    }

    #[test]
    fn adjacent_blocks_share_one_top_level() {
        let (tree, errs) = parse_tree("{}{}");
        let want = Node {
            kind: NodeKind::Stylesheet,
            line: 0,
            children: vec![Node {
                kind: NodeKind::TopLevel,
                line: 0,
                children: vec![
                    Node { kind: NodeKind::Block, line: 0, children: vec![] },
                    Node { kind: NodeKind::Block, line: 0, children: vec![] },
                ],
            }],
        };
        assert!(shapes_match(&tree, &want));
        assert!(errs.is_empty());
    }

    #[test]
    fn cdo_cdc_are_dropped_at_top_level_without_splitting_the_run() {
        let (tree, errs) = parse_tree("  <!-- {} --> {} --> ");
        let want = Node {
            kind: NodeKind::Stylesheet,
            line: 0,
            children: vec![Node {
                kind: NodeKind::TopLevel,
                line: 0,
                children: vec![
                    Node { kind: NodeKind::Block, line: 0, children: vec![] },
                    Node { kind: NodeKind::Block, line: 0, children: vec![] },
                ],
            }],
        };
        assert!(shapes_match(&tree, &want));
        assert!(errs.is_empty());
    }

    #[test]
    fn at_rule_without_block_has_no_leading_space_leaf() {
        let (tree, errs) = parse_tree(" @foo ; prop {} ");
        let want = Node {
            kind: NodeKind::Stylesheet,
            line: 0,
            children: vec![
                Node { kind: NodeKind::AtRule("foo".into()), line: 0, children: vec![] },
                Node {
                    kind: NodeKind::TopLevel,
                    line: 0,
                    children: vec![
                        leaf(TokenKind::Ident, "prop"),
                        leaf(TokenKind::Space, " "),
                        Node { kind: NodeKind::Block, line: 0, children: vec![] },
                    ],
                },
            ],
        };
        assert!(shapes_match(&tree, &want));
        assert!(errs.is_empty());
    }

    #[test]
    fn at_rule_prelude_keeps_internal_spaces() {
        let (tree, _errs) = parse_tree("@baz 1 2 3 {}");
        let at_rule = &tree.children[0];
        assert_eq!(at_rule.kind, NodeKind::AtRule("baz".into()));
        let want_children = vec![
            leaf(TokenKind::Number, "1"),
            leaf(TokenKind::Space, " "),
            leaf(TokenKind::Number, "2"),
            leaf(TokenKind::Space, " "),
            leaf(TokenKind::Number, "3"),
            leaf(TokenKind::Space, " "),
            Node { kind: NodeKind::Block, line: 0, children: vec![] },
        ];
        for (got, want) in at_rule.children.iter().zip(&want_children) {
            assert_eq!(got.kind, want.kind);
        }
        assert_eq!(at_rule.children.len(), want_children.len());
    }

    #[test]
    fn nested_groups_and_function_calls() {
        let (tree, errs) = parse_tree("@foo { y[x(z)] }");
        let want = Node {
            kind: NodeKind::Stylesheet,
            line: 0,
            children: vec![Node {
                kind: NodeKind::AtRule("foo".into()),
                line: 0,
                children: vec![Node {
                    kind: NodeKind::Block,
                    line: 0,
                    children: vec![
                        leaf(TokenKind::Ident, "y"),
                        Node {
                            kind: NodeKind::Brackets,
                            line: 0,
                            children: vec![Node {
                                kind: NodeKind::Function("x".into()),
                                line: 0,
                                children: vec![leaf(TokenKind::Ident, "z")],
                            }],
                        },
                        leaf(TokenKind::Space, " "),
                    ],
                }],
            }],
        };
        assert!(shapes_match(&tree, &want));
        assert!(errs.is_empty());
    }

    #[test]
    fn mismatched_close_bracket_cascades_to_unexpected_end_of_block() {
        let (tree, errs) = parse_tree("@foo { y[x(z] }");
        assert_eq!(
            errs,
            vec![
                D::UnexpectedCloseBracketInside(Context::Brackets),
                D::MissingCloseDelimiter,
                D::MissingCloseDelimiter,
                D::UnexpectedEndOfBlock,
            ]
        );
        let block = &tree.children[0].children[0];
        assert_eq!(block.kind, NodeKind::Block);
        let brackets = &block.children[1];
        assert_eq!(brackets.kind, NodeKind::Brackets);
        let func = &brackets.children[0];
        assert_eq!(func.kind, NodeKind::Function("x".into()));
        assert_eq!(
            func.children.iter().map(|c| &c.kind).collect::<Vec<_>>(),
            vec![
                &NodeKind::Leaf(TokenKind::Ident, "z".into()),
                &NodeKind::Leaf(TokenKind::Space, " ".into()),
                &NodeKind::Leaf(TokenKind::RBrace, String::new()),
            ]
        );
    }

    #[test]
    fn unterminated_function_reports_end_of_block() {
        let (tree, errs) = parse_tree("@foo { y[x(z)]");
        assert_eq!(errs, vec![D::UnexpectedEndOfBlock]);
        let block = &tree.children[0].children[0];
        assert_eq!(block.children.len(), 2);
    }

    #[test]
    fn stray_top_level_closers_are_reported_and_dropped() {
        let (tree, errs) = parse_tree(")@foo;]@bar;");
        assert_eq!(errs, vec![D::UnexpectedCloseParen, D::UnexpectedCloseBracket]);
        assert_eq!(
            tree.children.iter().map(|c| &c.kind).collect::<Vec<_>>(),
            vec![&NodeKind::AtRule("foo".into()), &NodeKind::AtRule("bar".into())]
        );
        assert!(tree.children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn incomplete_at_rule_is_reported() {
        let (tree, errs) = parse_tree("@foo ");
        assert_eq!(errs, vec![D::IncompleteAtRule]);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].kind, NodeKind::AtRule("foo".into()));
    }

    #[test]
    fn prelude_rejects_stray_closers_and_nested_at_keyword() {
        let (_, errs) = parse_tree("@foo <!-- ) ] @bar ;");
        assert_eq!(
            errs,
            vec![
                D::HtmlCommentDelimitersInside(Context::AtRule),
                D::UnexpectedCloseParenInside(Context::AtRule),
                D::UnexpectedCloseBracketInside(Context::AtRule),
                D::UnexpectedAtKeywordInside(Context::AtRule),
            ]
        );
    }

    #[test]
    fn semicolon_and_nested_block_are_diagnosed_inside_both_brackets_and_parens() {
        let (tree, errs) = parse_tree("{ ( ; ) [ {} ] }");
        assert_eq!(
            errs,
            vec![
                D::UnexpectedSemicolonInside(Context::Brackets),
                D::UnexpectedBlockInside(Context::Brackets),
            ]
        );
        let want = Node {
            kind: NodeKind::Stylesheet,
            line: 0,
            children: vec![Node {
                kind: NodeKind::TopLevel,
                line: 0,
                children: vec![Node {
                    kind: NodeKind::Block,
                    line: 0,
                    children: vec![
                        Node {
                            kind: NodeKind::Parens,
                            line: 0,
                            children: vec![leaf(TokenKind::Space, ""), leaf(TokenKind::Space, " ")],
                        },
                        leaf(TokenKind::Space, " "),
                        Node {
                            kind: NodeKind::Brackets,
                            line: 0,
                            children: vec![leaf(TokenKind::Space, " ")],
                        },
                        leaf(TokenKind::Space, " "),
                    ],
                }],
            }],
        };
        assert!(shapes_match(&tree, &want));
        // A bare `;` inside the Parens becomes a Space-equivalent leaf
        // (like CDO/CDC), and the Brackets' own nested `{}` is parsed for
        // balance but never attached as a child — only the diagnostic and
        // the surrounding separators survive.
        let block = &tree.children[0].children[0];
        let parens = &block.children[0];
        assert!(parens.children.iter().all(|c| matches!(c.kind, NodeKind::Leaf(TokenKind::Space, _))));
        let brackets = &block.children[2];
        assert_eq!(brackets.children.len(), 1);
    }

    #[test]
    fn cdo_cdc_inside_a_group_become_space_leaves() {
        let (tree, errs) = parse_tree("{ --> ) ] }");
        assert_eq!(
            errs,
            vec![
                D::HtmlCommentDelimitersInside(Context::Block),
                D::UnexpectedCloseParenInside(Context::Block),
                D::UnexpectedCloseBracketInside(Context::Block),
            ]
        );
        let block = &tree.children[0].children[0];
        assert!(block.children.iter().all(|c| c.kind == NodeKind::Leaf(TokenKind::Space, String::new())));
    }
}
