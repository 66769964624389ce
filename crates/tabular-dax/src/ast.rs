//! Typed AST for DAX scripts and expressions.
//!
//! Every node carries a [`Span`]: byte offsets plus the 1-based line/column
//! of its first token. Spans are derived from the tokens a node consumed, so
//! a node's range is always contiguous source text. Trees are plain data:
//! children never point back at parents, and traversal is top-down only.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// The smallest span covering both `self` and `other`, anchored at
    /// `self`'s position.
    #[must_use]
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A syntax problem recorded during error-tolerant parsing. Parsing never
/// aborts on one of these; the tree around the offending token is still
/// produced best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

/// Root node: one per parse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Define(Define),
    Evaluate(Evaluate),
    Measure(MeasureDef),
    Column(ColumnDef),
    Table(TableDef),
    Var(VarDef),
    Expr(Expr),
}

impl Statement {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Statement::Define(s) => s.span,
            Statement::Evaluate(s) => s.span,
            Statement::Measure(s) => s.span,
            Statement::Column(s) => s.span,
            Statement::Table(s) => s.span,
            Statement::Var(s) => s.span,
            Statement::Expr(e) => e.span(),
        }
    }
}

/// `DEFINE` block: measure/column/table/var definitions plus an optional
/// trailing `EVALUATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub definitions: Vec<Statement>,
    pub evaluate: Option<Evaluate>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluate {
    pub expression: Expr,
    pub order_by: Vec<OrderByItem>,
    pub start_at: Vec<Expr>,
    pub span: Span,
}

/// `MEASURE 'Table'[Name] = expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureDef {
    pub table_name: String,
    pub measure_name: String,
    pub expression: Expr,
    pub span: Span,
}

/// `COLUMN 'Table'[Name] = expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub table_name: String,
    pub column_name: String,
    pub expression: Expr,
    pub span: Span,
}

/// `TABLE Name = expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub expression: Expr,
    pub span: Span,
}

/// Statement-position `VAR name = expression` (inside `DEFINE`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expr,
    pub direction: Option<SortDirection>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "IN",
            BinaryOp::Concat => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "NOT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Number,
    String,
    True,
    False,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// `raw` preserves source text for numbers and keyword literals; for
    /// strings it holds the content with the surrounding quotes stripped and
    /// `""` unescaped.
    Literal {
        kind: LiteralKind,
        raw: String,
        span: Span,
    },
    /// `'Table'` in table position.
    TableRef { name: String, span: Span },
    /// `'Table'[Col]`, `Ident[Col]`, or bare `[Col]` (`table` is `None`).
    ColumnRef {
        table: Option<String>,
        column: String,
        span: Span,
    },
    Identifier { name: String, span: Span },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `{ e1, e2, … }`.
    TableConstructor { elements: Vec<Expr>, span: Span },
    /// `(e1, e2, …)` row constructor: multi-column rows inside `{ … }` and
    /// the right-hand side of `IN`.
    Tuple { elements: Vec<Expr>, span: Span },
    /// One `VAR name = value` binding; `body` is the rest of the chain (the
    /// next `VAR` or the `RETURN`).
    Var {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    Return { value: Box<Expr>, span: Span },
    /// Placeholder for a child the parser could not produce. Nothing
    /// downstream dereferences it; the analyzer and formatter skip it.
    Missing { span: Span },
}

impl Expr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Literal { span, .. }
            | Expr::TableRef { span, .. }
            | Expr::ColumnRef { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Call { span, .. }
            | Expr::TableConstructor { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Var { span, .. }
            | Expr::Return { span, .. }
            | Expr::Missing { span } => *span,
        }
    }
}
