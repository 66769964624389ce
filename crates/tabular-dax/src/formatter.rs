//! Canonical DAX source formatter.
//!
//! The formatter re-renders the token stream rather than an AST: comments
//! must survive formatting, and trivia never reaches the parser. Whitespace
//! and newlines are discarded and re-synthesized; every layout decision is a
//! pure function of the remaining token sequence. Since formatting preserves
//! that sequence (re-lexing the output yields the same significant tokens),
//! running the formatter on its own output reproduces it byte-for-byte.
//!
//! Input the formatter cannot lay out safely — an unrecognized character or
//! unbalanced `(`/`{` nesting — is returned unchanged.

use crate::lexer;
use crate::token::{Token, TokenKind};

/// A group whose one-line rendering is wider than this breaks one argument
/// per line.
const BREAK_WIDTH: usize = 60;

const INDENT: &str = "    ";

/// Format `source` into canonical layout. Total and idempotent; returns the
/// input unchanged when it cannot be laid out.
pub fn format(source: &str) -> String {
    let tokens = lexer::tokenize(source);
    if tokens.iter().any(|t| t.kind == TokenKind::Error) {
        return source.to_string();
    }

    let items: Vec<Token> = tokens
        .into_iter()
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof
            )
        })
        .collect();
    if items.is_empty() {
        return source.to_string();
    }

    let Some(nodes) = group(&items) else {
        return source.to_string();
    };

    let mut writer = Writer {
        out: String::new(),
        indent: 0,
        line_start: true,
        prev: None,
        prev_unary_minus: false,
    };
    writer.write_statements(&nodes);
    writer.newline();

    // Formatting must not change what the text means: the output has to
    // re-lex to the same significant token sequence. Inputs that cannot keep
    // that invariant (e.g. an unterminated string or block comment, which
    // would swallow the newline the formatter appends) fall back to identity,
    // which also keeps `format` idempotent on them.
    if signature(&writer.out) != signature_of(&items) {
        return source.to_string();
    }
    writer.out
}

/// Significant token signature: kinds plus canonical text, comments
/// included. Two texts with equal signatures format identically.
fn signature(source: &str) -> Vec<(TokenKind, String)> {
    signature_of(
        &lexer::tokenize(source)
            .into_iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof
                )
            })
            .collect::<Vec<_>>(),
    )
}

fn signature_of(items: &[Token]) -> Vec<(TokenKind, String)> {
    items.iter().map(|t| (t.kind, token_text(t))).collect()
}

/// Delimiter-nesting tree over the significant tokens. `None` when nesting
/// is unbalanced.
enum Node {
    Tok(Token),
    Group {
        open: Token,
        children: Vec<Node>,
        close: Token,
    },
}

/// Deeper nesting than this is left to the identity fallback; grouping and
/// rendering are recursive and must not chase hostile input down the stack.
const MAX_GROUP_DEPTH: usize = 64;

fn group(items: &[Token]) -> Option<Vec<Node>> {
    let mut pos = 0;
    let nodes = group_seq(items, &mut pos, None, 0)?;
    if pos == items.len() {
        Some(nodes)
    } else {
        None
    }
}

fn group_seq(
    items: &[Token],
    pos: &mut usize,
    closing: Option<TokenKind>,
    depth: usize,
) -> Option<Vec<Node>> {
    if depth > MAX_GROUP_DEPTH {
        return None;
    }
    let mut nodes = Vec::new();
    while *pos < items.len() {
        let token = &items[*pos];
        match token.kind {
            TokenKind::LParen | TokenKind::LBrace => {
                let open = token.clone();
                let want = if open.kind == TokenKind::LParen {
                    TokenKind::RParen
                } else {
                    TokenKind::RBrace
                };
                *pos += 1;
                let children = group_seq(items, pos, Some(want), depth + 1)?;
                if *pos >= items.len() {
                    return None; // unclosed group
                }
                let close = items[*pos].clone();
                *pos += 1;
                nodes.push(Node::Group {
                    open,
                    children,
                    close,
                });
            }
            TokenKind::RParen | TokenKind::RBrace => {
                if closing == Some(token.kind) {
                    return Some(nodes); // caller consumes the closer
                }
                return None; // stray closer
            }
            _ => {
                nodes.push(Node::Tok(token.clone()));
                *pos += 1;
            }
        }
    }
    if closing.is_some() {
        None
    } else {
        Some(nodes)
    }
}

fn node_kind(node: &Node) -> Option<TokenKind> {
    match node {
        Node::Tok(t) => Some(t.kind),
        Node::Group { .. } => None,
    }
}

fn is_tok(node: &Node, kind: TokenKind) -> bool {
    node_kind(node) == Some(kind)
}

/// Keywords render uppercased; everything else keeps its source text.
fn token_text(token: &Token) -> String {
    if token.kind.is_keyword() {
        token.text.to_ascii_uppercase()
    } else {
        token.text.clone()
    }
}

/// Token kinds that end an operand, for unary-minus detection.
fn ends_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Number
            | TokenKind::String
            | TokenKind::TableReference
            | TokenKind::ColumnReference
            | TokenKind::Identifier
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Blank
            | TokenKind::RParen
            | TokenKind::RBrace
    )
}

fn needs_space(prev: Option<TokenKind>, prev_unary_minus: bool, next: TokenKind) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    if prev_unary_minus {
        // `-x`, but keep `- -x` apart so the output cannot re-lex as a `--`
        // comment.
        return next == TokenKind::Minus;
    }
    match (prev, next) {
        (_, TokenKind::Comma) => false,
        (TokenKind::LParen | TokenKind::LBrace, _) => false,
        (_, TokenKind::RParen | TokenKind::RBrace) => false,
        // Call syntax: `SUM(` not `SUM (`.
        (
            TokenKind::Identifier | TokenKind::True | TokenKind::False | TokenKind::Blank,
            TokenKind::LParen,
        ) => false,
        // Qualified references: `'Sales'[Amount]`, `Sales[Amount]`.
        (
            TokenKind::TableReference | TokenKind::Identifier,
            TokenKind::ColumnReference,
        ) => false,
        _ => true,
    }
}

/// Any token at any depth that rules out one-line rendering: line comments
/// (they swallow the rest of a line), multi-line block comments, and
/// `VAR`/`RETURN` chains (always laid out one binding per line).
fn must_break(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Tok(t) => match t.kind {
            TokenKind::SingleLineComment | TokenKind::Var | TokenKind::Return => true,
            TokenKind::MultiLineComment => t.text.contains('\n'),
            _ => false,
        },
        Node::Group { children, .. } => must_break(children),
    })
}

fn flat_width(nodes: &[Node]) -> usize {
    let mut out = String::new();
    let mut prev: Option<TokenKind> = None;
    let mut prev_unary = false;
    render_flat(nodes, &mut out, &mut prev, &mut prev_unary);
    out.len()
}

fn render_flat(
    nodes: &[Node],
    out: &mut String,
    prev: &mut Option<TokenKind>,
    prev_unary: &mut bool,
) {
    let mut push = |out: &mut String,
                    prev: &mut Option<TokenKind>,
                    prev_unary: &mut bool,
                    kind: TokenKind,
                    text: &str| {
        if needs_space(*prev, *prev_unary, kind) {
            out.push(' ');
        }
        out.push_str(text);
        *prev_unary = kind == TokenKind::Minus && !matches!(*prev, Some(k) if ends_operand(k));
        *prev = Some(kind);
    };

    for node in nodes {
        match node {
            Node::Tok(t) => push(out, prev, prev_unary, t.kind, &token_text(t)),
            Node::Group {
                open,
                children,
                close,
            } => {
                push(out, prev, prev_unary, open.kind, &open.text);
                render_flat(children, out, prev, prev_unary);
                push(out, prev, prev_unary, close.kind, &close.text);
            }
        }
    }
}

struct Writer {
    out: String,
    indent: usize,
    line_start: bool,
    prev: Option<TokenKind>,
    prev_unary_minus: bool,
}

impl Writer {
    fn newline(&mut self) {
        if !self.line_start {
            self.out.push('\n');
            self.line_start = true;
            self.prev = None;
            self.prev_unary_minus = false;
        }
    }

    fn push(&mut self, kind: TokenKind, text: &str) {
        if self.line_start {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.line_start = false;
        } else if needs_space(self.prev, self.prev_unary_minus, kind) {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.prev_unary_minus =
            kind == TokenKind::Minus && !matches!(self.prev, Some(k) if ends_operand(k));
        self.prev = Some(kind);
    }

    fn push_token(&mut self, token: &Token) {
        self.push(token.kind, &token_text(token));
        if token.kind == TokenKind::SingleLineComment {
            self.newline();
        }
    }

    /// Writes a node sequence on the current line, breaking groups that are
    /// too wide (or that contain comments/`VAR` chains) over multiple lines.
    fn write_seq(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Tok(t) => self.push_token(t),
                Node::Group {
                    open,
                    children,
                    close,
                } => self.write_group(open, children, close),
            }
        }
    }

    fn write_group(&mut self, open: &Token, children: &[Node], close: &Token) {
        let broken = must_break(children)
            || flat_width(children) + open.text.len() + close.text.len() > BREAK_WIDTH;
        if !broken || children.is_empty() {
            self.push(open.kind, &open.text);
            self.write_seq(children);
            self.push(close.kind, &close.text);
            return;
        }

        self.push(open.kind, &open.text);
        self.newline();
        self.indent += 1;
        for (index, arg) in split_args(children).iter().enumerate() {
            if index > 0 {
                self.push(TokenKind::Comma, ",");
                self.newline();
            }
            self.write_arg(arg);
        }
        self.newline();
        self.indent -= 1;
        self.push(close.kind, &close.text);
    }

    /// One argument inside a broken group; `VAR` chains get their own
    /// per-binding layout.
    fn write_arg(&mut self, nodes: &[Node]) {
        if nodes.first().map(|n| is_tok(n, TokenKind::Var)).unwrap_or(false) {
            self.write_var_chain(nodes);
        } else {
            self.write_seq(nodes);
        }
    }

    /// `VAR name = value` per line, then `RETURN` on its own line with the
    /// result indented below it.
    fn write_var_chain(&mut self, nodes: &[Node]) {
        let mut i = 0;
        while i < nodes.len() && is_tok(&nodes[i], TokenKind::Var) {
            self.newline();
            self.write_seq(&nodes[i..i + 1]); // VAR
            i += 1;
            // Name and `=`.
            while i < nodes.len()
                && matches!(
                    node_kind(&nodes[i]),
                    Some(TokenKind::Identifier) | Some(TokenKind::Equal)
                )
            {
                let stop = is_tok(&nodes[i], TokenKind::Equal);
                self.write_seq(&nodes[i..i + 1]);
                i += 1;
                if stop {
                    break;
                }
            }
            let value_end = binding_value_end(nodes, i);
            self.write_seq(&nodes[i..value_end]);
            i = value_end;
            self.newline();
        }
        if i < nodes.len() && is_tok(&nodes[i], TokenKind::Return) {
            self.write_seq(&nodes[i..i + 1]); // RETURN
            i += 1;
            self.newline();
            self.indent += 1;
            self.write_seq(&nodes[i..]);
            self.newline();
            self.indent -= 1;
        } else if i < nodes.len() {
            self.write_seq(&nodes[i..]);
            self.newline();
        }
    }

    /// A statement value: a `VAR` chain gets chain layout, anything else is
    /// written inline.
    fn write_value(&mut self, nodes: &[Node]) {
        if nodes.first().map(|n| is_tok(n, TokenKind::Var)).unwrap_or(false) {
            self.write_var_chain(nodes);
        } else {
            self.write_seq(nodes);
            self.newline();
        }
    }

    fn write_statements(&mut self, nodes: &[Node]) {
        let mut i = 0;
        while i < nodes.len() {
            match node_kind(&nodes[i]) {
                Some(TokenKind::Define) => {
                    self.newline();
                    self.write_seq(&nodes[i..i + 1]);
                    i += 1;
                    self.newline();
                    self.indent += 1;
                    while i < nodes.len()
                        && matches!(
                            node_kind(&nodes[i]),
                            Some(
                                TokenKind::Measure
                                    | TokenKind::Column
                                    | TokenKind::Table
                                    | TokenKind::Var
                            )
                        )
                    {
                        i = self.write_definition(nodes, i);
                    }
                    self.indent -= 1;
                }
                Some(TokenKind::Evaluate) => {
                    self.newline();
                    self.write_seq(&nodes[i..i + 1]);
                    i += 1;
                    self.newline();
                    let end = value_end(nodes, i);
                    self.write_value(&nodes[i..end]);
                    i = end;
                }
                Some(TokenKind::Order) | Some(TokenKind::Start) => {
                    self.newline();
                    // ORDER BY / START AT clause on one line.
                    let end = clause_end(nodes, i);
                    self.write_seq(&nodes[i..end]);
                    self.newline();
                    i = end;
                }
                Some(TokenKind::Measure)
                | Some(TokenKind::Column)
                | Some(TokenKind::Table) => {
                    // Definition outside a DEFINE block; lay it out anyway.
                    self.newline();
                    i = self.write_definition(nodes, i);
                }
                Some(TokenKind::SingleLineComment) | Some(TokenKind::MultiLineComment) => {
                    self.newline();
                    self.write_seq(&nodes[i..i + 1]);
                    self.newline();
                    i += 1;
                }
                _ => {
                    self.newline();
                    let end = value_end(nodes, i);
                    self.write_value(&nodes[i..end]);
                    i = end;
                }
            }
        }
    }

    /// `MEASURE 'T'[Name] = value`, `COLUMN`, `TABLE` and `VAR` definitions.
    /// Returns the index just past the definition.
    fn write_definition(&mut self, nodes: &[Node], mut i: usize) -> usize {
        self.newline();
        self.write_seq(&nodes[i..i + 1]); // keyword
        i += 1;
        // Target name tokens up to `=`.
        while i < nodes.len()
            && matches!(
                node_kind(&nodes[i]),
                Some(
                    TokenKind::Identifier
                        | TokenKind::TableReference
                        | TokenKind::ColumnReference
                )
            )
        {
            self.write_seq(&nodes[i..i + 1]);
            i += 1;
        }
        if i < nodes.len() && is_tok(&nodes[i], TokenKind::Equal) {
            self.write_seq(&nodes[i..i + 1]);
            i += 1;
        }

        let end = value_end(nodes, i);
        let value = &nodes[i..end];
        let starts_with_var = value
            .first()
            .map(|n| is_tok(n, TokenKind::Var))
            .unwrap_or(false);
        if starts_with_var {
            self.indent += 1;
            self.write_var_chain(value);
            self.indent -= 1;
        } else if must_break(value) || flat_width(value) > BREAK_WIDTH {
            self.newline();
            self.indent += 1;
            self.write_seq(value);
            self.newline();
            self.indent -= 1;
        } else {
            self.write_seq(value);
            self.newline();
        }
        end
    }
}

/// Splits a broken group's children into comma-separated arguments.
fn split_args(children: &[Node]) -> Vec<&[Node]> {
    let mut args = Vec::new();
    let mut start = 0;
    for (index, node) in children.iter().enumerate() {
        if is_tok(node, TokenKind::Comma) {
            args.push(&children[start..index]);
            start = index + 1;
        }
    }
    args.push(&children[start..]);
    args
}

/// End of a statement value starting at `start`: stops at the next statement
/// keyword. `VAR`/`RETURN` tokens belong to the value while they form the
/// leading variable chain; once the chain's `RETURN` has been seen, another
/// `VAR` or `RETURN` starts a new statement.
fn value_end(nodes: &[Node], start: usize) -> usize {
    let mut vars_seen = 0usize;
    let mut returns_seen = 0usize;
    let mut i = start;
    while i < nodes.len() {
        match node_kind(&nodes[i]) {
            Some(
                TokenKind::Define
                | TokenKind::Evaluate
                | TokenKind::Order
                | TokenKind::Start
                | TokenKind::Measure
                | TokenKind::Column
                | TokenKind::Table,
            ) => break,
            Some(TokenKind::Var) => {
                let chain_open = vars_seen > 0 && returns_seen == 0;
                if i != start && !chain_open {
                    break;
                }
                vars_seen += 1;
            }
            Some(TokenKind::Return) => {
                if returns_seen > 0 || (vars_seen == 0 && i != start) {
                    break;
                }
                returns_seen += 1;
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// End of an `ORDER BY` / `START AT` clause: the next statement keyword.
fn clause_end(nodes: &[Node], start: usize) -> usize {
    let mut i = start + 1;
    while i < nodes.len() {
        if matches!(
            node_kind(&nodes[i]),
            Some(
                TokenKind::Define
                    | TokenKind::Evaluate
                    | TokenKind::Order
                    | TokenKind::Start
                    | TokenKind::Measure
                    | TokenKind::Column
                    | TokenKind::Table
            )
        ) {
            break;
        }
        i += 1;
    }
    i
}

/// End of one `VAR` binding's value inside a chain: the next `VAR`/`RETURN`
/// at this nesting depth.
fn binding_value_end(nodes: &[Node], start: usize) -> usize {
    let mut i = start;
    while i < nodes.len() {
        if matches!(
            node_kind(&nodes[i]),
            Some(TokenKind::Var | TokenKind::Return)
        ) {
            break;
        }
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_binary_operators() {
        assert_eq!(format("1+2*3"), "1 + 2 * 3\n");
    }

    #[test]
    fn error_tokens_fall_back_to_identity() {
        let source = "EVALUATE ???";
        assert_eq!(format(source), source);
    }

    #[test]
    fn unbalanced_nesting_falls_back_to_identity() {
        let source = "SUM((1)";
        assert_eq!(format(source), source);
    }

    #[test]
    fn unary_minus_stays_attached() {
        assert_eq!(format("EVALUATE ROW(\"x\",-1+-2)"), "EVALUATE\nROW(\"x\", -1 + -2)\n");
    }
}
