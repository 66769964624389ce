//! Semantic analysis of DAX expressions against a schema snapshot.
//!
//! The analyzer is stateless: every call re-lexes and re-parses the text,
//! walks the best-effort tree, and returns a fresh diagnostic list. It is
//! routinely invoked on partially typed, error-recovered input, so the walk
//! skips [`Expr::Missing`] placeholders instead of dereferencing anything.

use crate::ast::{Define, Evaluate, Expr, Script, Span, Statement};
use crate::catalog::{self, VAR_ARGS};
use crate::parser;
use serde::{Deserialize, Serialize};
use tabular_model::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A structured, position-carrying problem report. The host decides
/// presentation; this core only supplies the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub start: usize,
    pub length: usize,
    /// The caller's context label (e.g. the measure being edited), echoed
    /// back so diagnostics from different analysis calls stay attributable.
    pub source_context: String,
}

impl Diagnostic {
    fn new(severity: Severity, message: String, span: Span, context: &str) -> Self {
        Self {
            severity,
            message,
            line: span.line,
            column: span.column,
            start: span.start,
            length: span.len(),
            source_context: context.to_string(),
        }
    }
}

/// Analyze `source` in one call: lex, parse, then walk. Syntax errors from
/// the parser surface as `Error` diagnostics alongside the semantic ones, in
/// source order.
pub fn analyze(source: &str, context_label: &str, schema: &Schema) -> Vec<Diagnostic> {
    let (script, parse_errors) = parser::parse_source(source);

    let mut diagnostics: Vec<Diagnostic> = parse_errors
        .into_iter()
        .map(|e| Diagnostic::new(Severity::Error, e.message, e.span, context_label))
        .collect();
    diagnostics.extend(analyze_script(&script, context_label, schema));
    diagnostics.sort_by_key(|d| d.start);

    log::debug!(
        "analyze: {} diagnostics for {context_label:?}",
        diagnostics.len()
    );
    diagnostics
}

/// Walk a pre-built tree. Useful when the caller already parsed the text.
pub fn analyze_script(script: &Script, context_label: &str, schema: &Schema) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer {
        schema,
        context: context_label,
        vars: Vec::new(),
        local_tables: Vec::new(),
        local_members: Vec::new(),
        diagnostics: Vec::new(),
    };
    for statement in &script.statements {
        analyzer.visit_statement(statement);
    }
    analyzer.diagnostics
}

struct Analyzer<'a> {
    schema: &'a Schema,
    context: &'a str,
    /// `VAR` names currently in scope.
    vars: Vec<String>,
    /// Tables introduced by `DEFINE TABLE`, visible to later statements.
    local_tables: Vec<String>,
    /// Measure/column names introduced by `DEFINE MEASURE`/`DEFINE COLUMN`.
    local_members: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer<'_> {
    fn report(&mut self, severity: Severity, span: Span, message: String) {
        self.diagnostics
            .push(Diagnostic::new(severity, message, span, self.context));
    }

    fn var_in_scope(&self, name: &str) -> bool {
        self.vars.iter().any(|v| name_eq(v, name))
    }

    fn local_table(&self, name: &str) -> bool {
        self.local_tables.iter().any(|t| name_eq(t, name))
    }

    fn local_member(&self, name: &str) -> bool {
        self.local_members.iter().any(|m| name_eq(m, name))
    }

    fn table_known(&self, name: &str) -> bool {
        self.schema.table(name).is_some() || self.local_table(name)
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Define(define) => self.visit_define(define),
            Statement::Evaluate(evaluate) => self.visit_evaluate(evaluate),
            Statement::Measure(def) => {
                if !def.table_name.is_empty() && !self.table_known(&def.table_name) {
                    self.report(
                        Severity::Error,
                        def.span,
                        format!("unknown table '{}'", def.table_name),
                    );
                }
                self.visit_expr(&def.expression);
                self.local_members.push(def.measure_name.clone());
            }
            Statement::Column(def) => {
                if !def.table_name.is_empty() && !self.table_known(&def.table_name) {
                    self.report(
                        Severity::Error,
                        def.span,
                        format!("unknown table '{}'", def.table_name),
                    );
                }
                self.visit_expr(&def.expression);
                self.local_members.push(def.column_name.clone());
            }
            Statement::Table(def) => {
                self.visit_expr(&def.expression);
                self.local_tables.push(def.name.clone());
            }
            Statement::Var(def) => {
                self.visit_expr(&def.value);
                // Query-level variables stay in scope for the rest of the
                // script.
                self.vars.push(def.name.clone());
            }
            Statement::Expr(expr) => self.visit_expr(expr),
        }
    }

    fn visit_define(&mut self, define: &Define) {
        for definition in &define.definitions {
            self.visit_statement(definition);
        }
        if let Some(evaluate) = &define.evaluate {
            self.visit_evaluate(evaluate);
        }
    }

    fn visit_evaluate(&mut self, evaluate: &Evaluate) {
        self.visit_expr(&evaluate.expression);
        for item in &evaluate.order_by {
            self.visit_expr(&item.expression);
        }
        for expr in &evaluate.start_at {
            self.visit_expr(expr);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Literal { .. } | Expr::Missing { .. } => {}
            Expr::TableRef { name, span } => {
                if !self.table_known(name) {
                    self.report(Severity::Error, *span, format!("unknown table '{name}'"));
                }
            }
            Expr::ColumnRef {
                table,
                column,
                span,
            } => self.check_column_ref(table.as_deref(), column, *span),
            Expr::Identifier { name, span } => {
                // A bare identifier in expression position is either a
                // variable, a table name, or one of the enumeration names
                // some functions take as arguments (DATEDIFF(.., DAY),
                // CROSSFILTER(.., BOTH), DATATABLE type names, ...).
                if !self.var_in_scope(name)
                    && !self.table_known(name)
                    && !is_enumeration_name(name)
                {
                    self.report(
                        Severity::Warning,
                        *span,
                        format!("unknown table or variable '{name}'"),
                    );
                }
            }
            Expr::Call { name, args, span } => {
                self.check_call(name, args.len(), *span);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            Expr::TableConstructor { elements, .. } | Expr::Tuple { elements, .. } => {
                for element in elements {
                    self.visit_expr(element);
                }
            }
            Expr::Var { .. } => {
                // Walk the chain iteratively; bindings stay in scope for the
                // rest of the chain and go out of scope together.
                let mut pushed = 0;
                let mut current = expr;
                while let Expr::Var {
                    name, value, body, ..
                } = current
                {
                    self.visit_expr(value);
                    self.vars.push(name.clone());
                    pushed += 1;
                    current = body.as_ref();
                }
                self.visit_expr(current);
                self.vars.truncate(self.vars.len() - pushed);
            }
            Expr::Return { value, .. } => self.visit_expr(value),
        }
    }

    fn check_column_ref(&mut self, table: Option<&str>, column: &str, span: Span) {
        match table {
            Some(table_name) => {
                if let Some(schema_table) = self.schema.table(table_name) {
                    if !schema_table.resolves(column) && !self.local_member(column) {
                        self.report(
                            Severity::Warning,
                            span,
                            format!(
                                "column or measure '[{column}]' not found on table '{table_name}'"
                            ),
                        );
                    }
                } else if !self.local_table(table_name) {
                    self.report(
                        Severity::Error,
                        span,
                        format!("unknown table '{table_name}'"),
                    );
                }
                // Columns of DEFINE TABLE results are not modeled; qualified
                // references into them are accepted as-is.
            }
            None => {
                if !self.schema.resolves_unqualified(column) && !self.local_member(column) {
                    self.report(
                        Severity::Warning,
                        span,
                        format!("'[{column}]' is not a known measure or column"),
                    );
                }
            }
        }
    }

    fn check_call(&mut self, name: &str, arg_count: usize, span: Span) {
        let Some(spec) = catalog::lookup(name) else {
            self.report(Severity::Error, span, format!("unknown function '{name}'"));
            return;
        };
        if spec.accepts(arg_count) {
            return;
        }
        let expected = if spec.max_args == VAR_ARGS {
            format!("at least {}", spec.min_args)
        } else if spec.min_args == spec.max_args {
            format!("{}", spec.min_args)
        } else {
            format!("between {} and {}", spec.min_args, spec.max_args)
        };
        self.report(
            Severity::Warning,
            span,
            format!(
                "{} expects {expected} argument(s), got {arg_count}",
                spec.name
            ),
        );
    }
}

/// Argument enumeration names that lex as plain identifiers.
fn is_enumeration_name(name: &str) -> bool {
    const ENUM_NAMES: &[&str] = &[
        // DATEDIFF / DATESINPERIOD intervals.
        "DAY", "WEEK", "MONTH", "QUARTER", "YEAR", "HOUR", "MINUTE", "SECOND",
        // RANKX tie handling.
        "DENSE", "SKIP",
        // CROSSFILTER directions.
        "BOTH", "NONE", "ONEWAY",
        // DATATABLE / CONVERT type names.
        "INTEGER", "DOUBLE", "STRING", "BOOLEAN", "CURRENCY", "DATETIME",
    ];
    ENUM_NAMES.iter().any(|e| e.eq_ignore_ascii_case(name))
}

fn name_eq(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}
