//! DAX language front end: lexer, parser, semantic analyzer and formatter.
//!
//! Every entry point is a pure, total function — malformed input produces
//! `Error` tokens, recorded parse errors or diagnostics, never a panic or an
//! `Err`. The host application supplies expression text and a read-only
//! [`tabular_model::Schema`] snapshot and gets back tokens, a best-effort
//! AST, diagnostics or canonically formatted text.

mod analyzer;
mod ast;
pub mod catalog;
mod formatter;
mod lexer;
mod parser;
mod token;

pub use crate::analyzer::{analyze, analyze_script, Diagnostic, Severity};
pub use crate::ast::{
    BinaryOp, ColumnDef, Define, Evaluate, Expr, LiteralKind, MeasureDef, OrderByItem, ParseError,
    Script, SortDirection, Span, Statement, TableDef, UnaryOp, VarDef,
};
pub use crate::formatter::format;
pub use crate::lexer::tokenize;
pub use crate::parser::{parse, parse_source};
pub use crate::token::{Token, TokenKind};
