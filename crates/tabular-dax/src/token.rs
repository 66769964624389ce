use serde::{Deserialize, Serialize};

/// Token kinds produced by the lexer.
///
/// Trivia kinds (whitespace, newlines, comments) are retained in the lexer's
/// output so the formatter can reproduce source layout; the parser filters
/// them out before consuming the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Trivia.
    Whitespace,
    Newline,
    SingleLineComment,
    MultiLineComment,

    // Literals and quoted references.
    String,
    /// `'Table Name'` — quoted table reference, delimiters included in `text`.
    TableReference,
    /// `[Column Name]` — bracketed column/measure reference, delimiters
    /// included in `text`.
    ColumnReference,
    Number,

    Identifier,

    // Keywords (matched case-insensitively).
    Evaluate,
    Define,
    Measure,
    Column,
    Var,
    Return,
    Order,
    By,
    Asc,
    Desc,
    Start,
    At,
    In,
    Not,
    And,
    Or,
    True,
    False,
    Blank,
    Table,

    // Operators and delimiters.
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,

    /// A character the lexer does not recognize; always length 1.
    Error,
    Eof,
}

impl TokenKind {
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::SingleLineComment
                | TokenKind::MultiLineComment
        )
    }

    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::SingleLineComment | TokenKind::MultiLineComment
        )
    }

    #[must_use]
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Evaluate
                | TokenKind::Define
                | TokenKind::Measure
                | TokenKind::Column
                | TokenKind::Var
                | TokenKind::Return
                | TokenKind::Order
                | TokenKind::By
                | TokenKind::Asc
                | TokenKind::Desc
                | TokenKind::Start
                | TokenKind::At
                | TokenKind::In
                | TokenKind::Not
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Blank
                | TokenKind::Table
        )
    }

    /// Maps identifier text onto a keyword kind, case-insensitively.
    #[must_use]
    pub fn keyword(text: &str) -> Option<TokenKind> {
        const KEYWORDS: &[(&str, TokenKind)] = &[
            ("EVALUATE", TokenKind::Evaluate),
            ("DEFINE", TokenKind::Define),
            ("MEASURE", TokenKind::Measure),
            ("COLUMN", TokenKind::Column),
            ("VAR", TokenKind::Var),
            ("RETURN", TokenKind::Return),
            ("ORDER", TokenKind::Order),
            ("BY", TokenKind::By),
            ("ASC", TokenKind::Asc),
            ("DESC", TokenKind::Desc),
            ("START", TokenKind::Start),
            ("AT", TokenKind::At),
            ("IN", TokenKind::In),
            ("NOT", TokenKind::Not),
            ("AND", TokenKind::And),
            ("OR", TokenKind::Or),
            ("TRUE", TokenKind::True),
            ("FALSE", TokenKind::False),
            ("BLANK", TokenKind::Blank),
            ("TABLE", TokenKind::Table),
        ];
        KEYWORDS
            .iter()
            .find(|(kw, _)| kw.eq_ignore_ascii_case(text))
            .map(|&(_, kind)| kind)
    }
}

/// A single lexed token. `text` is the verbatim source slice, so
/// concatenating every token's text reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
}

impl Token {
    /// Byte offset one past the last character; derived, not stored.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}
