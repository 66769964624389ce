use pretty_assertions::assert_eq;
use tabular_dax::{tokenize, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).iter().map(|t| t.kind).collect()
}

fn round_trip(source: &str) {
    let rebuilt: String = tokenize(source).iter().map(|t| t.text.as_str()).collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn concatenated_token_text_reproduces_the_input() {
    for source in [
        "",
        "EVALUATE ROW(\"x\", 'Sales'[Amount])",
        "define\r\n  measure Sales[T] = 1 -- note\n",
        "/* multi\nline */ \"esc\"\"aped\" 1.5e-3",
        "unterminated 'table [column \"string",
        "a @ b $ c",
        "  \t mixed \u{a0} whitespace",
    ] {
        round_trip(source);
    }
}

#[test]
fn quoted_references_lex_as_two_tokens() {
    let tokens = tokenize("'Sales'[Amount]");
    assert_eq!(tokens[0].kind, TokenKind::TableReference);
    assert_eq!(tokens[0].text, "'Sales'");
    assert_eq!(tokens[1].kind, TokenKind::ColumnReference);
    assert_eq!(tokens[1].text, "[Amount]");
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn keywords_match_case_insensitively() {
    for spelling in ["evaluate", "EVALUATE", "Evaluate", "eVaLuAtE"] {
        assert_eq!(kinds(spelling), vec![TokenKind::Evaluate, TokenKind::Eof]);
    }
    assert_eq!(
        kinds("var return not in order by"),
        vec![
            TokenKind::Var,
            TokenKind::Whitespace,
            TokenKind::Return,
            TokenKind::Whitespace,
            TokenKind::Not,
            TokenKind::Whitespace,
            TokenKind::In,
            TokenKind::Whitespace,
            TokenKind::Order,
            TokenKind::Whitespace,
            TokenKind::By,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keyword_prefixed_identifiers_stay_identifiers() {
    // `VAR.P` and `Variance` contain the keyword VAR but are identifiers.
    assert_eq!(kinds("VAR.P"), vec![TokenKind::Identifier, TokenKind::Eof]);
    assert_eq!(kinds("Variance"), vec![TokenKind::Identifier, TokenKind::Eof]);
}

#[test]
fn crlf_is_one_newline_token() {
    let tokens = tokenize("a\r\nb");
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Eof
        ]
    );
    assert_eq!(tokens[1].text, "\r\n");
    assert_eq!(tokens[2].line, 2);
    assert_eq!(tokens[2].column, 1);
}

#[test]
fn positions_track_lines_and_columns() {
    let tokens = tokenize("a = 1\n  b");
    let b = tokens
        .iter()
        .find(|t| t.text == "b")
        .expect("b token present");
    assert_eq!(b.line, 2);
    assert_eq!(b.column, 3);
    assert_eq!(b.start, 8);
    assert_eq!(b.end(), 9);
}

#[test]
fn both_comment_styles_run_to_end_of_line() {
    let tokens = tokenize("1 // slash comment\n2 -- dash comment");
    let comments: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::SingleLineComment)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(comments, vec!["// slash comment", "-- dash comment"]);
}

#[test]
fn block_comments_span_newlines() {
    let tokens = tokenize("/* a\nb\nc */x");
    assert_eq!(tokens[0].kind, TokenKind::MultiLineComment);
    assert_eq!(tokens[0].text, "/* a\nb\nc */");
    assert_eq!(tokens[1].line, 3);
}

#[test]
fn unterminated_constructs_consume_to_end_of_input() {
    for (source, kind) in [
        ("/* never closed", TokenKind::MultiLineComment),
        ("\"never closed", TokenKind::String),
        ("'never closed", TokenKind::TableReference),
        ("[never closed", TokenKind::ColumnReference),
    ] {
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, kind, "for {source:?}");
        assert_eq!(tokens[0].text, source, "for {source:?}");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }
}

#[test]
fn doubled_quote_escapes_inside_strings() {
    let tokens = tokenize("\"say \"\"hi\"\"\" + 1");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].text, "\"say \"\"hi\"\"\"");
    assert_eq!(tokens[2].kind, TokenKind::Plus);
}

#[test]
fn numbers_cover_fractions_and_exponents() {
    for source in ["0", "42", "3.25", ".5", "1e3", "2.5E-7", "9e+2"] {
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Number, "for {source:?}");
        assert_eq!(tokens[0].text, source, "for {source:?}");
    }
}

#[test]
fn exponent_marker_without_digits_is_not_consumed() {
    // `1e` is a number followed by an identifier, not a malformed literal.
    assert_eq!(
        kinds("1e"),
        vec![TokenKind::Number, TokenKind::Identifier, TokenKind::Eof]
    );
    // A trailing dot stays separate (and lexes as an error token).
    assert_eq!(
        kinds("1."),
        vec![TokenKind::Number, TokenKind::Error, TokenKind::Eof]
    );
}

#[test]
fn two_character_operators_win_over_single() {
    assert_eq!(
        kinds("<> <= >= && ||"),
        vec![
            TokenKind::NotEqual,
            TokenKind::Whitespace,
            TokenKind::LessEqual,
            TokenKind::Whitespace,
            TokenKind::GreaterEqual,
            TokenKind::Whitespace,
            TokenKind::AmpAmp,
            TokenKind::Whitespace,
            TokenKind::PipePipe,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unrecognized_characters_become_error_tokens() {
    let tokens = tokenize("1 ? 2");
    assert_eq!(tokens[2].kind, TokenKind::Error);
    assert_eq!(tokens[2].text, "?");
    // Scanning continues past the error.
    assert_eq!(tokens[4].kind, TokenKind::Number);
}

#[test]
fn identifiers_allow_dotted_and_unicode_names() {
    assert_eq!(
        kinds("Straße.Größe_2"),
        vec![TokenKind::Identifier, TokenKind::Eof]
    );
}
