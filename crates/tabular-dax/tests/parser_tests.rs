use pretty_assertions::assert_eq;
use tabular_dax::{
    parse_source, BinaryOp, Expr, LiteralKind, SortDirection, Statement, UnaryOp,
};

fn single_expr(source: &str) -> Expr {
    let (script, errors) = parse_source(source);
    assert_eq!(errors, vec![], "unexpected parse errors for {source:?}");
    assert_eq!(script.statements.len(), 1, "for {source:?}");
    match script.statements.into_iter().next() {
        Some(Statement::Expr(expr)) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn precedence_multiplication_before_addition() {
    let expr = single_expr("1 + 2 * 3");
    let Expr::Binary {
        op: BinaryOp::Add,
        left,
        right,
        ..
    } = expr
    else {
        panic!("expected + at the root");
    };
    assert!(matches!(
        *left,
        Expr::Literal {
            kind: LiteralKind::Number,
            ..
        }
    ));
    let Expr::Binary {
        op: BinaryOp::Mul,
        left: mul_left,
        right: mul_right,
        ..
    } = *right
    else {
        panic!("expected * on the right");
    };
    assert!(matches!(*mul_left, Expr::Literal { ref raw, .. } if raw == "2"));
    assert!(matches!(*mul_right, Expr::Literal { ref raw, .. } if raw == "3"));
}

#[test]
fn concatenation_binds_looser_than_addition() {
    let expr = single_expr("\"a\" & 1 + 2");
    assert!(matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::Concat,
            ..
        }
    ));
}

#[test]
fn logical_keywords_and_symbols_are_equivalent() {
    for source in ["1 = 1 && 2 = 2", "1 = 1 AND 2 = 2"] {
        let expr = single_expr(source);
        assert!(
            matches!(
                expr,
                Expr::Binary {
                    op: BinaryOp::And,
                    ..
                }
            ),
            "for {source:?}"
        );
    }
}

#[test]
fn qualified_column_reference_combines_two_tokens() {
    let expr = single_expr("'Sales'[Amount]");
    let Expr::ColumnRef {
        table,
        column,
        span,
    } = expr
    else {
        panic!("expected column reference");
    };
    assert_eq!(table.as_deref(), Some("Sales"));
    assert_eq!(column, "Amount");
    assert_eq!(span.start, 0);
    assert_eq!(span.end, "'Sales'[Amount]".len());
    assert_eq!((span.line, span.column), (1, 1));
}

#[test]
fn unquoted_table_prefix_also_qualifies() {
    let expr = single_expr("Sales[Amount]");
    assert!(matches!(
        expr,
        Expr::ColumnRef { table: Some(ref t), ref column, .. } if t == "Sales" && column == "Amount"
    ));
}

#[test]
fn bare_bracket_reference_is_unqualified() {
    let expr = single_expr("[Total Sales]");
    assert!(matches!(
        expr,
        Expr::ColumnRef { table: None, ref column, .. } if column == "Total Sales"
    ));
}

#[test]
fn malformed_quoting_keeps_text_unmodified() {
    // No trailing delimiter: the extraction must not strip anything.
    let (script, _) = parse_source("[oops");
    let Some(Statement::Expr(Expr::ColumnRef { column, .. })) = script.statements.first() else {
        panic!("expected column reference");
    };
    assert_eq!(column, "[oops");
}

#[test]
fn identifier_dispatch_call_column_or_plain() {
    assert!(matches!(
        single_expr("SUM('s'[a])"),
        Expr::Call { ref name, ref args, .. } if name == "SUM" && args.len() == 1
    ));
    assert!(matches!(
        single_expr("t[a]"),
        Expr::ColumnRef { table: Some(_), .. }
    ));
    assert!(matches!(single_expr("t"), Expr::Identifier { .. }));
}

#[test]
fn comparison_applies_at_most_once() {
    let (script, errors) = parse_source("1 < 2 < 3");
    // `1 < 2` parses; the dangling `<` is skipped and `3` starts a new
    // statement.
    assert_eq!(script.statements.len(), 2);
    assert!(matches!(
        script.statements[0],
        Statement::Expr(Expr::Binary {
            op: BinaryOp::Lt,
            ..
        })
    ));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Less"));
}

#[test]
fn exponent_applies_at_most_once() {
    let (script, errors) = parse_source("2 ^ 3 ^ 2");
    assert!(matches!(
        script.statements[0],
        Statement::Expr(Expr::Binary {
            op: BinaryOp::Pow,
            ..
        })
    ));
    assert_eq!(script.statements.len(), 2);
    assert_eq!(errors.len(), 1);
}

#[test]
fn unary_minus_and_not_nest() {
    let expr = single_expr("NOT -1");
    let Expr::Unary {
        op: UnaryOp::Not,
        operand,
        ..
    } = expr
    else {
        panic!("expected NOT");
    };
    assert!(matches!(
        *operand,
        Expr::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
}

#[test]
fn in_operator_sits_at_comparison_level() {
    let expr = single_expr("'s'[c] IN {1, 2}");
    let Expr::Binary {
        op: BinaryOp::In,
        right,
        ..
    } = expr
    else {
        panic!("expected IN");
    };
    assert!(matches!(
        *right,
        Expr::TableConstructor { ref elements, .. } if elements.len() == 2
    ));
}

#[test]
fn tuples_parse_inside_table_constructors() {
    let expr = single_expr("{(1, \"a\"), (2, \"b\")}");
    let Expr::TableConstructor { elements, .. } = expr else {
        panic!("expected table constructor");
    };
    assert_eq!(elements.len(), 2);
    assert!(matches!(
        elements[0],
        Expr::Tuple { ref elements, .. } if elements.len() == 2
    ));
}

#[test]
fn keyword_literals_become_calls_when_parenthesized() {
    assert!(matches!(
        single_expr("TRUE"),
        Expr::Literal {
            kind: LiteralKind::True,
            ..
        }
    ));
    assert!(matches!(
        single_expr("BLANK()"),
        Expr::Call { ref name, ref args, .. } if name == "BLANK" && args.is_empty()
    ));
}

#[test]
fn var_chain_in_expression_position() {
    let expr = single_expr("VAR x = 1 VAR y = x + 1 RETURN x * y");
    let Expr::Var {
        name, value, body, ..
    } = expr
    else {
        panic!("expected VAR chain");
    };
    assert_eq!(name, "x");
    assert!(matches!(*value, Expr::Literal { .. }));
    let Expr::Var { name, body, .. } = *body else {
        panic!("expected second binding");
    };
    assert_eq!(name, "y");
    let Expr::Return { value, .. } = *body else {
        panic!("expected RETURN");
    };
    assert!(matches!(
        *value,
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn define_block_collects_definitions_and_evaluate() {
    let source = "DEFINE \
        MEASURE Sales[Total] = SUM(Sales[Amount]) \
        COLUMN Sales[Double] = Sales[Amount] * 2 \
        TABLE Big = FILTER(Sales, Sales[Amount] > 100) \
        VAR limit = 10 \
        EVALUATE TOPN(limit, Big) \
        ORDER BY Sales[Total] DESC, Sales[Double] \
        START AT 0";
    let (script, errors) = parse_source(source);
    assert_eq!(errors, vec![]);
    assert_eq!(script.statements.len(), 1);
    let Statement::Define(define) = &script.statements[0] else {
        panic!("expected DEFINE");
    };
    assert_eq!(define.definitions.len(), 4);
    assert!(matches!(
        &define.definitions[0],
        Statement::Measure(m) if m.table_name == "Sales" && m.measure_name == "Total"
    ));
    assert!(matches!(
        &define.definitions[1],
        Statement::Column(c) if c.column_name == "Double"
    ));
    assert!(matches!(
        &define.definitions[2],
        Statement::Table(t) if t.name == "Big"
    ));
    assert!(matches!(
        &define.definitions[3],
        Statement::Var(v) if v.name == "limit"
    ));

    let evaluate = define.evaluate.as_ref().expect("EVALUATE present");
    assert_eq!(evaluate.order_by.len(), 2);
    assert_eq!(
        evaluate.order_by[0].direction,
        Some(SortDirection::Desc)
    );
    assert_eq!(evaluate.order_by[1].direction, None);
    assert_eq!(evaluate.start_at.len(), 1);
}

#[test]
fn script_span_covers_the_token_range() {
    let source = "EVALUATE 1 + 2";
    let (script, _) = parse_source(source);
    assert_eq!(script.span.start, 0);
    assert_eq!(script.span.end, source.len());
}

#[test]
fn unterminated_delimiters_are_tolerated() {
    for source in [
        "EVALUATE SUM('Sales'[Amount]",
        "EVALUATE {1, 2",
        "EVALUATE (1 + 2",
        "DEFINE MEASURE Sales[M] =",
    ] {
        let (script, _) = parse_source(source);
        assert!(
            !script.statements.is_empty(),
            "expected best-effort tree for {source:?}"
        );
    }
}

#[test]
fn garbage_tokens_are_skipped_with_errors() {
    let (script, errors) = parse_source("EVALUATE 1 ? 2");
    // `?` is skipped; `2` becomes its own statement.
    assert_eq!(script.statements.len(), 2);
    assert!(!errors.is_empty());
}

#[test]
fn empty_input_yields_an_empty_script() {
    for source in ["", "   ", "\n\n", "// only a comment"] {
        let (script, errors) = parse_source(source);
        assert_eq!(script.statements.len(), 0, "for {source:?}");
        assert_eq!(errors, vec![], "for {source:?}");
    }
}
