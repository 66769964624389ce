//! Single-pass DAX lexer.
//!
//! Tokenization is total: unrecognized characters become [`TokenKind::Error`]
//! tokens of length 1 and scanning continues, so every input string produces
//! a token stream terminated by [`TokenKind::Eof`]. Trivia (whitespace,
//! newlines, comments) is kept in the output; each token's `text` is the
//! verbatim source slice, so the stream concatenates back to the input
//! byte-for-byte.

use crate::token::{Token, TokenKind};

/// Lex `source` into a flat, `Eof`-terminated token sequence.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::str::Chars<'a>,
    peeked: Option<char>,
    /// Byte offset of `peeked`.
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let peeked = chars.next();
        Self {
            source,
            chars,
            peeked,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peeked
    }

    /// The character after `peek`, without consuming anything.
    fn peek2(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn bump(&mut self) -> Option<char> {
        let current = self.peeked.take()?;
        self.offset += current.len_utf8();
        self.peeked = self.chars.next();
        match current {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            // A CR not followed by LF still terminates a line; CRLF counts
            // once, at the LF.
            '\r' if self.peeked != Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(current)
    }

    fn consume_while<F>(&mut self, mut predicate: F)
    where
        F: FnMut(char) -> bool,
    {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }
    }

    fn token(&self, kind: TokenKind, start: usize, line: u32, column: u32) -> Token {
        Token {
            kind,
            text: self.source[start..self.offset].to_string(),
            start,
            line,
            column,
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.offset;
        let line = self.line;
        let column = self.column;

        let Some(ch) = self.peek() else {
            return self.token(TokenKind::Eof, start, line, column);
        };

        let kind = match ch {
            '\r' | '\n' => {
                self.bump();
                if ch == '\r' && self.peek() == Some('\n') {
                    self.bump();
                }
                TokenKind::Newline
            }
            c if c.is_whitespace() => {
                self.consume_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                TokenKind::Whitespace
            }
            '/' => {
                self.bump();
                match self.peek() {
                    Some('/') => {
                        self.bump();
                        self.consume_while(|c| c != '\n' && c != '\r');
                        TokenKind::SingleLineComment
                    }
                    Some('*') => {
                        self.bump();
                        self.scan_block_comment();
                        TokenKind::MultiLineComment
                    }
                    _ => TokenKind::Slash,
                }
            }
            '-' => {
                self.bump();
                if self.peek() == Some('-') {
                    self.bump();
                    self.consume_while(|c| c != '\n' && c != '\r');
                    TokenKind::SingleLineComment
                } else {
                    TokenKind::Minus
                }
            }
            '"' => {
                self.bump();
                self.scan_string();
                TokenKind::String
            }
            '\'' => {
                self.bump();
                self.consume_while(|c| c != '\'');
                if self.peek() == Some('\'') {
                    self.bump();
                }
                TokenKind::TableReference
            }
            '[' => {
                self.bump();
                self.consume_while(|c| c != ']');
                if self.peek() == Some(']') {
                    self.bump();
                }
                TokenKind::ColumnReference
            }
            c if c.is_ascii_digit() || (c == '.' && matches!(self.peek2(), Some(d) if d.is_ascii_digit())) =>
            {
                self.scan_number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' => {
                self.consume_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
                let text = &self.source[start..self.offset];
                TokenKind::keyword(text).unwrap_or(TokenKind::Identifier)
            }
            _ => self.scan_operator(ch),
        };

        self.token(kind, start, line, column)
    }

    /// Body of `/* ... */` with the opening delimiter already consumed.
    /// An unterminated comment runs to end of input.
    fn scan_block_comment(&mut self) {
        loop {
            match self.bump() {
                None => break,
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    break;
                }
                Some(_) => {}
            }
        }
    }

    /// Body of a `"..."` literal with the opening quote already consumed.
    /// `""` is an escaped quote; an unterminated string runs to end of input.
    fn scan_string(&mut self) {
        loop {
            match self.peek() {
                None => break,
                Some('"') => {
                    self.bump();
                    if self.peek() == Some('"') {
                        self.bump();
                        continue;
                    }
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Integer digits, optional fraction, optional exponent. The `.` and the
    /// exponent marker are only consumed when the characters after them keep
    /// the token a valid number, so `1.foo` lexes as `1` `.foo` and `1e`
    /// lexes as `1` `e` rather than producing a malformed literal.
    fn scan_number(&mut self) {
        self.consume_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && matches!(self.peek2(), Some(d) if d.is_ascii_digit()) {
            self.bump();
            self.consume_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut rest = self.chars.clone();
            let valid = match rest.next() {
                Some('+') | Some('-') => matches!(rest.next(), Some(d) if d.is_ascii_digit()),
                Some(d) => d.is_ascii_digit(),
                None => false,
            };
            if valid {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                self.consume_while(|c| c.is_ascii_digit());
            }
        }
    }

    fn scan_operator(&mut self, ch: char) -> TokenKind {
        self.bump();
        match ch {
            '<' => match self.peek() {
                Some('>') => {
                    self.bump();
                    TokenKind::NotEqual
                }
                Some('=') => {
                    self.bump();
                    TokenKind::LessEqual
                }
                _ => TokenKind::Less,
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    TokenKind::PipePipe
                } else {
                    TokenKind::Error
                }
            }
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '^' => TokenKind::Caret,
            '=' => TokenKind::Equal,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            _ => TokenKind::Error,
        }
    }
}
