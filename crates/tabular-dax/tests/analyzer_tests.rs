use pretty_assertions::assert_eq;
use tabular_dax::{analyze, Severity};
use tabular_model::{DataType, Schema, SchemaColumn, SchemaMeasure, SchemaTable};

fn sales_schema() -> Schema {
    let mut schema = Schema::new();
    let mut sales = SchemaTable::new("Sales");
    sales
        .add_column(SchemaColumn::new("Amount", DataType::Double))
        .unwrap();
    sales
        .add_column(SchemaColumn::new("Quantity", DataType::Int64))
        .unwrap();
    sales
        .add_measure(SchemaMeasure::new("Total Sales", "SUM(Sales[Amount])"))
        .unwrap();
    schema.add_table(sales).unwrap();
    schema
}

#[test]
fn valid_query_produces_no_diagnostics() {
    let diags = analyze(
        "EVALUATE ROW(\"x\", SUM('Sales'[Amount]) + [Total Sales])",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags, vec![]);
}

#[test]
fn unresolved_column_is_a_warning() {
    let diags = analyze(
        "EVALUATE ROW(\"x\", 'Sales'[Missing])",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert!(diags[0].message.contains("Missing"));
    assert!(diags[0].message.contains("Sales"));
}

#[test]
fn unknown_table_is_an_error() {
    let diags = analyze("EVALUATE 'Nope'[Amount]", "query", &sales_schema());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
    assert!(diags[0].message.contains("Nope"));
}

#[test]
fn unknown_function_is_an_error() {
    let diags = analyze(
        "EVALUATE ROW(\"x\", NOTAFUNCTION(1))",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
    assert!(diags[0].message.contains("NOTAFUNCTION"));
}

#[test]
fn wrong_argument_count_is_a_warning() {
    let diags = analyze("EVALUATE ROW(\"x\", SUM())", "query", &sales_schema());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert!(diags[0].message.contains("SUM"));
    assert!(diags[0].message.contains("got 0"));
}

#[test]
fn function_and_reference_lookup_ignore_case() {
    let diags = analyze(
        "EVALUATE row(\"x\", sum('sales'[amount]) + [total sales])",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags, vec![]);
}

#[test]
fn bare_measure_reference_resolves_model_wide() {
    let schema = sales_schema();
    assert_eq!(
        analyze("EVALUATE ROW(\"x\", [Total Sales])", "query", &schema),
        vec![]
    );
    let diags = analyze("EVALUATE ROW(\"x\", [No Such])", "query", &schema);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert!(diags[0].message.contains("No Such"));
}

#[test]
fn variables_shadow_identifier_resolution() {
    let diags = analyze(
        "EVALUATE VAR x = 1 RETURN x + COUNTROWS(Sales)",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags, vec![]);
}

#[test]
fn unknown_bare_identifier_is_a_warning() {
    let diags = analyze("EVALUATE COUNTROWS(Nope)", "query", &sales_schema());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert!(diags[0].message.contains("Nope"));
}

#[test]
fn interval_enumeration_arguments_are_not_flagged() {
    let diags = analyze(
        "EVALUATE ROW(\"d\", DATEDIFF('Sales'[Amount], 'Sales'[Amount], DAY))",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags, vec![]);
}

#[test]
fn definitions_extend_the_resolution_scope() {
    let source = "DEFINE \
        TABLE Filtered = FILTER(Sales, 'Sales'[Amount] > 0) \
        MEASURE Sales[New Measure] = SUM('Sales'[Amount]) \
        EVALUATE ROW(\"x\", COUNTROWS(Filtered) + [New Measure])";
    assert_eq!(analyze(source, "query", &sales_schema()), vec![]);
}

#[test]
fn measure_definition_on_unknown_table_is_an_error() {
    let diags = analyze(
        "DEFINE MEASURE 'Nope'[M] = 1 EVALUATE ROW(\"x\", 1)",
        "query",
        &sales_schema(),
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
    assert!(diags[0].message.contains("Nope"));
}

#[test]
fn parse_errors_surface_as_error_diagnostics() {
    let diags = analyze("EVALUATE 1 < 2 < 3", "query", &sales_schema());
    assert!(!diags.is_empty());
    assert!(diags.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn diagnostics_carry_positions_and_context() {
    let source = "EVALUATE 'Nope'[Amount]";
    let diags = analyze(source, "Sales report", &sales_schema());
    assert_eq!(diags.len(), 1);
    let d = &diags[0];
    assert_eq!(d.source_context, "Sales report");
    assert_eq!(d.line, 1);
    let start = source.find("'Nope'").unwrap();
    assert_eq!(d.start, start);
    assert_eq!(d.length, "'Nope'[Amount]".len());
    assert_eq!(d.column, (start + 1) as u32);
}

#[test]
fn diagnostics_serialize_for_host_consumption() {
    let diags = analyze("EVALUATE 'Nope'[Amount]", "query", &sales_schema());
    let json = serde_json::to_string(&diags).unwrap();
    assert!(json.contains("\"severity\""));
    assert!(json.contains("\"source_context\""));
    let back: Vec<tabular_dax::Diagnostic> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, diags);
}

#[test]
fn schema_from_json_feeds_analysis() {
    let schema = Schema::from_json(
        r#"{"tables":[{"name":"Sales","columns":[{"name":"Amount","dataType":"Double"}],"measures":[]}]}"#,
    )
    .unwrap();
    assert_eq!(
        analyze("EVALUATE SUM('Sales'[Amount])", "query", &schema),
        vec![]
    );
}

#[test]
fn malformed_input_never_panics_and_analyzer_is_stateless() {
    let schema = sales_schema();
    for source in [
        "",
        "DEFINE MEASURE",
        "EVALUATE SUM('Sales'[Amount]",
        ")))((({{",
        "VAR = RETURN",
        "\u{0}\u{1}\u{2} ?? !!",
        "EVALUATE ROW(\"x\", 'Sales'[Missing]",
    ] {
        // Two identical calls must agree: no state is carried across calls.
        let first = analyze(source, "pass-1", &schema);
        let second = analyze(source, "pass-2", &schema);
        assert_eq!(
            first.iter().map(|d| &d.message).collect::<Vec<_>>(),
            second.iter().map(|d| &d.message).collect::<Vec<_>>(),
            "for {source:?}"
        );
    }
}
