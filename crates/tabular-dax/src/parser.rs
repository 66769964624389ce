//! Error-tolerant recursive-descent parser for DAX scripts.
//!
//! The parser never fails: any token that cannot start a statement is
//! skipped (recorded in the returned error list) and parsing continues, so a
//! best-effort [`Script`] is always produced. This matters for editor
//! tooling, which analyzes text on every keystroke while it is still
//! malformed.
//!
//! The expression grammar is a fixed precedence ladder (low to high):
//! `OR` → `AND` → comparison → `&` → `+ -` → `* /` → `^` → unary → primary.
//! All levels loop while their operator matches except comparison and
//! exponent, which consume at most one operator per level; `a < b < c` leaves
//! `< c` dangling for the statement loop to skip.

use crate::ast::{
    BinaryOp, ColumnDef, Define, Evaluate, Expr, LiteralKind, MeasureDef, OrderByItem, ParseError,
    Script, SortDirection, Span, Statement, TableDef, UnaryOp, VarDef,
};
use crate::lexer;
use crate::token::{Token, TokenKind};

/// Parse a lexed token stream. Trivia tokens are filtered out first.
pub fn parse(tokens: &[Token]) -> (Script, Vec<ParseError>) {
    let mut significant: Vec<Token> = tokens
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .cloned()
        .collect();
    if significant.last().map(|t| t.kind) != Some(TokenKind::Eof) {
        let (start, line, column) = significant
            .last()
            .map(|t| (t.end(), t.line, t.column))
            .unwrap_or((0, 1, 1));
        significant.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            start,
            line,
            column,
        });
    }

    let mut parser = Parser {
        tokens: significant,
        pos: 0,
        depth: 0,
        errors: Vec::new(),
    };
    let script = parser.parse_script();
    (script, parser.errors)
}

/// Convenience wrapper: lex and parse in one step.
pub fn parse_source(source: &str) -> (Script, Vec<ParseError>) {
    parse(&lexer::tokenize(source))
}

fn token_span(token: &Token) -> Span {
    Span::new(token.start, token.end(), token.line, token.column)
}

fn empty_span_at(token: &Token) -> Span {
    Span::new(token.start, token.start, token.line, token.column)
}

fn can_start_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Number
            | TokenKind::String
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Blank
            | TokenKind::TableReference
            | TokenKind::ColumnReference
            | TokenKind::Identifier
            | TokenKind::Var
            | TokenKind::Return
            | TokenKind::Not
            | TokenKind::Minus
            | TokenKind::LParen
            | TokenKind::LBrace
    )
}

/// Strips exactly one `'…'` delimiter pair; text without a matching trailing
/// quote is returned unmodified.
pub(crate) fn unquote_table(text: &str) -> String {
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text)
        .to_string()
}

/// Strips exactly one `[…]` delimiter pair; text without a matching trailing
/// bracket is returned unmodified.
pub(crate) fn unquote_column(text: &str) -> String {
    text.strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text)
        .to_string()
}

fn unescape_string(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    inner.replace("\"\"", "\"")
}

/// Maximum expression nesting. Parsing is recursive, so unbounded nesting in
/// hostile input would overflow the stack; real DAX stays far below this.
const MAX_EXPR_DEPTH: usize = 64;

struct Parser {
    /// Non-trivia tokens, always ending with `Eof`.
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consumes the current token. At `Eof` the position stays put, so
    /// `peek` remains valid no matter how often callers bump.
    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            let token = self.peek().clone();
            self.errors.push(ParseError::new(
                format!("expected {kind:?}, found {:?}", token.kind),
                empty_span_at(&token),
            ));
            false
        }
    }

    /// Consumes a closing delimiter if present. A missing closer at end of
    /// input is tolerated silently; anywhere else it is recorded.
    fn expect_closing(&mut self, kind: TokenKind) -> Option<Span> {
        if self.at(kind) {
            return Some(token_span(&self.bump()));
        }
        if !self.at(TokenKind::Eof) {
            let token = self.peek().clone();
            self.errors.push(ParseError::new(
                format!("expected {kind:?}, found {:?}", token.kind),
                empty_span_at(&token),
            ));
        }
        None
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let token = self.peek().clone();
        self.errors
            .push(ParseError::new(message, token_span(&token)));
    }

    /// Span of the last consumed token, for closing an unterminated
    /// construct at the point parsing actually stopped.
    fn prev_span(&self) -> Span {
        let idx = self.pos.saturating_sub(1);
        token_span(&self.tokens[idx.min(self.tokens.len() - 1)])
    }

    /// Span covering every token consumed since `start_pos`.
    fn span_since(&self, start_pos: usize) -> Span {
        let first = &self.tokens[start_pos.min(self.tokens.len() - 1)];
        if self.pos > start_pos {
            let last = &self.tokens[(self.pos - 1).min(self.tokens.len() - 1)];
            Span::new(first.start, last.end(), first.line, first.column)
        } else {
            empty_span_at(first)
        }
    }

    fn parse_script(&mut self) -> Script {
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.kind() {
                TokenKind::Define => {
                    let define = self.parse_define();
                    statements.push(Statement::Define(define));
                }
                TokenKind::Evaluate => {
                    let evaluate = self.parse_evaluate();
                    statements.push(Statement::Evaluate(evaluate));
                }
                kind if can_start_expression(kind) => {
                    let expr = self.parse_expression();
                    statements.push(Statement::Expr(expr));
                }
                kind => {
                    self.error_here(format!("unexpected token {kind:?}"));
                    log::trace!(
                        "statement recovery: skipping {kind:?} at offset {}",
                        self.peek().start
                    );
                    self.bump();
                }
            }
            if self.pos == before {
                // Whatever we dispatched to consumed nothing; force progress.
                self.bump();
            }
        }

        let span = if self.tokens.len() > 1 {
            let first = &self.tokens[0];
            let last = &self.tokens[self.tokens.len() - 2];
            Span::new(first.start, last.end(), first.line, first.column)
        } else {
            empty_span_at(&self.tokens[0])
        };
        Script { statements, span }
    }

    fn parse_define(&mut self) -> Define {
        let start = self.pos;
        self.bump(); // DEFINE
        let mut definitions = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Measure => {
                    definitions.push(Statement::Measure(self.parse_measure_def()));
                }
                TokenKind::Column => {
                    definitions.push(Statement::Column(self.parse_column_def()));
                }
                TokenKind::Table => {
                    definitions.push(Statement::Table(self.parse_table_def()));
                }
                TokenKind::Var => {
                    definitions.push(Statement::Var(self.parse_var_def()));
                }
                _ => break,
            }
        }
        let evaluate = if self.at(TokenKind::Evaluate) {
            Some(self.parse_evaluate())
        } else {
            None
        };
        Define {
            definitions,
            evaluate,
            span: self.span_since(start),
        }
    }

    fn parse_measure_def(&mut self) -> MeasureDef {
        let start = self.pos;
        self.bump(); // MEASURE
        let table_name = self.parse_target_table_name();
        let measure_name = self.parse_target_member_name("measure");
        self.expect(TokenKind::Equal);
        let expression = self.parse_expression();
        MeasureDef {
            table_name,
            measure_name,
            expression,
            span: self.span_since(start),
        }
    }

    fn parse_column_def(&mut self) -> ColumnDef {
        let start = self.pos;
        self.bump(); // COLUMN
        let table_name = self.parse_target_table_name();
        let column_name = self.parse_target_member_name("column");
        self.expect(TokenKind::Equal);
        let expression = self.parse_expression();
        ColumnDef {
            table_name,
            column_name,
            expression,
            span: self.span_since(start),
        }
    }

    fn parse_table_def(&mut self) -> TableDef {
        let start = self.pos;
        self.bump(); // TABLE
        let name = self.parse_target_table_name();
        self.expect(TokenKind::Equal);
        let expression = self.parse_expression();
        TableDef {
            name,
            expression,
            span: self.span_since(start),
        }
    }

    fn parse_var_def(&mut self) -> VarDef {
        let start = self.pos;
        self.bump(); // VAR
        let name = if self.at(TokenKind::Identifier) {
            self.bump().text
        } else {
            self.error_here("expected variable name after VAR");
            String::new()
        };
        self.expect(TokenKind::Equal);
        let value = self.parse_expression();
        VarDef {
            name,
            value,
            span: self.span_since(start),
        }
    }

    fn parse_target_table_name(&mut self) -> String {
        match self.kind() {
            TokenKind::TableReference => unquote_table(&self.bump().text),
            TokenKind::Identifier => self.bump().text,
            _ => {
                self.error_here("expected table name");
                String::new()
            }
        }
    }

    fn parse_target_member_name(&mut self, what: &str) -> String {
        if self.at(TokenKind::ColumnReference) {
            unquote_column(&self.bump().text)
        } else {
            self.error_here(format!("expected bracketed {what} name"));
            String::new()
        }
    }

    fn parse_evaluate(&mut self) -> Evaluate {
        let start = self.pos;
        self.bump(); // EVALUATE
        let expression = self.parse_expression();

        let mut order_by = Vec::new();
        if self.eat(TokenKind::Order) {
            self.expect(TokenKind::By);
            loop {
                let item_start = self.pos;
                let expr = self.parse_expression();
                let direction = if self.eat(TokenKind::Asc) {
                    Some(SortDirection::Asc)
                } else if self.eat(TokenKind::Desc) {
                    Some(SortDirection::Desc)
                } else {
                    None
                };
                order_by.push(OrderByItem {
                    expression: expr,
                    direction,
                    span: self.span_since(item_start),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut start_at = Vec::new();
        if self.eat(TokenKind::Start) {
            self.expect(TokenKind::At);
            loop {
                start_at.push(self.parse_expression());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        Evaluate {
            expression,
            order_by,
            start_at,
            span: self.span_since(start),
        }
    }

    fn parse_expression(&mut self) -> Expr {
        if self.depth >= MAX_EXPR_DEPTH {
            let span = empty_span_at(self.peek());
            self.error_here("expression nesting is too deep");
            return Expr::Missing { span };
        }
        self.depth += 1;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    fn parse_or(&mut self) -> Expr {
        let mut left = self.parse_and();
        while matches!(self.kind(), TokenKind::PipePipe | TokenKind::Or) {
            self.bump();
            let right = self.parse_and();
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let mut left = self.parse_comparison();
        while matches!(self.kind(), TokenKind::AmpAmp | TokenKind::And) {
            self.bump();
            let right = self.parse_comparison();
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    fn parse_comparison(&mut self) -> Expr {
        let left = self.parse_concat();
        let op = match self.kind() {
            TokenKind::Equal => BinaryOp::Eq,
            TokenKind::NotEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::Le,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::GreaterEqual => BinaryOp::Ge,
            TokenKind::In => BinaryOp::In,
            _ => return left,
        };
        // At most one comparison per level: `a < b < c` parses `a < b` and
        // leaves `< c` for the caller to report.
        self.bump();
        let right = self.parse_concat();
        let span = left.span().to(right.span());
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    fn parse_concat(&mut self) -> Expr {
        let mut left = self.parse_additive();
        while self.at(TokenKind::Ampersand) {
            self.bump();
            let right = self.parse_additive();
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op: BinaryOp::Concat,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative();
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut left = self.parse_exponent();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.bump();
            let right = self.parse_exponent();
            let span = left.span().to(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    fn parse_exponent(&mut self) -> Expr {
        let left = self.parse_unary();
        if !self.at(TokenKind::Caret) {
            return left;
        }
        // Like comparison, exponent applies at most once per level.
        self.bump();
        let right = self.parse_unary();
        let span = left.span().to(right.span());
        Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    fn parse_unary(&mut self) -> Expr {
        // Collect the operator run iteratively so `- - - …` cannot recurse.
        let mut ops = Vec::new();
        loop {
            let op = match self.kind() {
                TokenKind::Minus => UnaryOp::Neg,
                TokenKind::Not => UnaryOp::Not,
                _ => break,
            };
            ops.push((op, token_span(self.peek())));
            self.bump();
        }
        let mut expr = self.parse_primary();
        for (op, op_span) in ops.into_iter().rev() {
            let span = op_span.to(expr.span());
            expr = Expr::Unary {
                op,
                operand: Box::new(expr),
                span,
            };
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Number => {
                let token = self.bump();
                Expr::Literal {
                    kind: LiteralKind::Number,
                    raw: token.text.clone(),
                    span: token_span(&token),
                }
            }
            TokenKind::String => {
                let token = self.bump();
                Expr::Literal {
                    kind: LiteralKind::String,
                    raw: unescape_string(&token.text),
                    span: token_span(&token),
                }
            }
            TokenKind::True | TokenKind::False | TokenKind::Blank => self.parse_keyword_literal(),
            TokenKind::TableReference => {
                let table = self.bump();
                if self.at(TokenKind::ColumnReference) {
                    let column = self.bump();
                    Expr::ColumnRef {
                        table: Some(unquote_table(&table.text)),
                        column: unquote_column(&column.text),
                        span: token_span(&table).to(token_span(&column)),
                    }
                } else {
                    Expr::TableRef {
                        name: unquote_table(&table.text),
                        span: token_span(&table),
                    }
                }
            }
            TokenKind::ColumnReference => {
                let token = self.bump();
                Expr::ColumnRef {
                    table: None,
                    column: unquote_column(&token.text),
                    span: token_span(&token),
                }
            }
            TokenKind::Identifier => self.parse_ident_like(),
            TokenKind::Var => self.parse_var_chain(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LParen => self.parse_paren(),
            TokenKind::LBrace => self.parse_table_constructor(),
            kind => {
                let span = empty_span_at(self.peek());
                self.error_here(format!("expected expression, found {kind:?}"));
                Expr::Missing { span }
            }
        }
    }

    /// `TRUE`/`FALSE`/`BLANK` are keyword literals, but DAX also spells them
    /// as zero-argument functions (`BLANK()`); a following `(` turns the
    /// keyword into a call.
    fn parse_keyword_literal(&mut self) -> Expr {
        let kind = match self.kind() {
            TokenKind::True => LiteralKind::True,
            TokenKind::False => LiteralKind::False,
            _ => LiteralKind::Blank,
        };
        let token = self.bump();
        if self.at(TokenKind::LParen) {
            let name = token.text.to_ascii_uppercase();
            let (args, end_span) = self.parse_call_args();
            return Expr::Call {
                name,
                args,
                span: token_span(&token).to(end_span),
            };
        }
        Expr::Literal {
            kind,
            raw: token.text.clone(),
            span: token_span(&token),
        }
    }

    /// An identifier becomes a function call when followed by `(`, a
    /// qualified column reference when followed by `[…]`, and stays a plain
    /// identifier otherwise.
    fn parse_ident_like(&mut self) -> Expr {
        let token = self.bump();
        match self.kind() {
            TokenKind::LParen => {
                let (args, end_span) = self.parse_call_args();
                Expr::Call {
                    name: token.text.clone(),
                    args,
                    span: token_span(&token).to(end_span),
                }
            }
            TokenKind::ColumnReference => {
                let column = self.bump();
                Expr::ColumnRef {
                    table: Some(token.text.clone()),
                    column: unquote_column(&column.text),
                    span: token_span(&token).to(token_span(&column)),
                }
            }
            _ => Expr::Identifier {
                name: token.text.clone(),
                span: token_span(&token),
            },
        }
    }

    /// Comma-separated arguments up to `)`. Caller is positioned at `(`.
    fn parse_call_args(&mut self) -> (Vec<Expr>, Span) {
        self.bump(); // (
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            loop {
                args.push(self.parse_expression());
                if self.eat(TokenKind::Comma) {
                    if self.at(TokenKind::RParen) || self.at(TokenKind::Eof) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let end_span = self
            .expect_closing(TokenKind::RParen)
            .unwrap_or_else(|| self.prev_span());
        (args, end_span)
    }

    /// `( expr )` or a row-constructor tuple `( e1, e2, … )`.
    fn parse_paren(&mut self) -> Expr {
        let open = self.bump(); // (
        let first = self.parse_expression();
        if self.at(TokenKind::Comma) {
            let mut elements = vec![first];
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RParen) || self.at(TokenKind::Eof) {
                    break;
                }
                elements.push(self.parse_expression());
            }
            let end_span = self
                .expect_closing(TokenKind::RParen)
                .unwrap_or_else(|| self.prev_span());
            return Expr::Tuple {
                elements,
                span: token_span(&open).to(end_span),
            };
        }
        self.expect_closing(TokenKind::RParen);
        first
    }

    fn parse_table_constructor(&mut self) -> Expr {
        let open = self.bump(); // {
        let mut elements = Vec::new();
        if !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            loop {
                elements.push(self.parse_expression());
                if self.eat(TokenKind::Comma) {
                    if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let end_span = self
            .expect_closing(TokenKind::RBrace)
            .unwrap_or_else(|| self.prev_span());
        Expr::TableConstructor {
            elements,
            span: token_span(&open).to(end_span),
        }
    }

    /// `VAR name = value` chains ending in `RETURN expr`, right-nested so a
    /// whole chain hangs off one expression node. Bindings are collected
    /// iteratively; long chains are legal DAX and must not recurse.
    fn parse_var_chain(&mut self) -> Expr {
        let mut bindings = Vec::new();
        while self.at(TokenKind::Var) {
            let start = self.pos;
            self.bump(); // VAR
            let name = if self.at(TokenKind::Identifier) {
                self.bump().text
            } else {
                self.error_here("expected variable name after VAR");
                String::new()
            };
            self.expect(TokenKind::Equal);
            let value = self.parse_expression();
            bindings.push((start, name, value));
        }
        let mut expr = if self.at(TokenKind::Return) {
            self.parse_return()
        } else {
            self.error_here("expected VAR or RETURN");
            Expr::Missing {
                span: empty_span_at(self.peek()),
            }
        };
        for (start, name, value) in bindings.into_iter().rev() {
            expr = Expr::Var {
                name,
                value: Box::new(value),
                body: Box::new(expr),
                span: self.span_since(start),
            };
        }
        expr
    }

    fn parse_return(&mut self) -> Expr {
        let start = self.pos;
        self.bump(); // RETURN
        let value = self.parse_expression();
        Expr::Return {
            value: Box::new(value),
            span: self.span_since(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_expr(source: &str) -> Expr {
        let (script, _) = parse_source(source);
        match script.statements.into_iter().next() {
            Some(Statement::Expr(expr)) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expr("1 + 2 * 3");
        let Expr::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } = expr
        else {
            panic!("expected + at the root, got {expr:?}");
        };
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn comparison_does_not_chain() {
        let (script, errors) = parse_source("1 < 2 < 3");
        assert!(matches!(
            script.statements[0],
            Statement::Expr(Expr::Binary {
                op: BinaryOp::Lt,
                ..
            })
        ));
        // The dangling `<` is skipped at statement level and `3` starts a new
        // expression statement.
        assert_eq!(script.statements.len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn var_chain_is_right_nested() {
        let expr = parse_expr("VAR a = 1 VAR b = 2 RETURN a + b");
        let Expr::Var { name, body, .. } = expr else {
            panic!("expected VAR chain");
        };
        assert_eq!(name, "a");
        let Expr::Var { name, body, .. } = *body else {
            panic!("expected nested VAR");
        };
        assert_eq!(name, "b");
        assert!(matches!(*body, Expr::Return { .. }));
    }

    #[test]
    fn unterminated_call_is_tolerated() {
        let (script, errors) = parse_source("EVALUATE SUM('Sales'[Amount]");
        assert_eq!(script.statements.len(), 1);
        // Stopping at end of input is not an error by itself.
        assert_eq!(errors, vec![]);
    }
}
