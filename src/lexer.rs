// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tokenizer for KQL expression fragments
//!
//! Produces the immutable token sequence that the function converters scan.
//! Whitespace and `//` comments are dropped; every remaining token keeps the
//! byte offsets of its text in the source so that converters can slice raw
//! source ranges (e.g. the body of a `datetime(...)` literal).

use alloc::vec::Vec;
use thiserror::Error;

/// Byte range of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BareWord,
    /// Numeric literal, possibly carrying a unit suffix such as `1h` or `100ms`.
    Number,
    /// Single-quoted string.
    StringLiteral,
    /// Double-quoted string. KQL uses these as ordinary string literals.
    QuotedIdentifier,
    OpeningRoundBracket,
    ClosingRoundBracket,
    OpeningSquareBracket,
    ClosingSquareBracket,
    OpeningCurlyBrace,
    ClosingCurlyBrace,
    Comma,
    Semicolon,
    Dot,
    Colon,
    PipeMark,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Equals,
    /// `==`, `!=`, `<>`, `<`, `>`, `<=`, `>=`, `=~`, `!~`
    Comparison,
    Exclamation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.text(source)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
}

pub struct Lexer<'source> {
    source: &'source str,
    bytes: &'source [u8],
    pos: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the whole source.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte(0) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_byte(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte(0) {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let Some(b) = self.peek_byte(0) else {
            return Ok(None);
        };

        let kind = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_word_chars();
                TokenKind::BareWord
            }
            b'0'..=b'9' => self.read_number(),
            b'.' if matches!(self.peek_byte(1), Some(b'0'..=b'9')) => self.read_number(),
            b'"' => self.read_string(b'"', TokenKind::QuotedIdentifier)?,
            b'\'' => self.read_string(b'\'', TokenKind::StringLiteral)?,
            b'(' => self.single(TokenKind::OpeningRoundBracket),
            b')' => self.single(TokenKind::ClosingRoundBracket),
            b'[' => self.single(TokenKind::OpeningSquareBracket),
            b']' => self.single(TokenKind::ClosingSquareBracket),
            b'{' => self.single(TokenKind::OpeningCurlyBrace),
            b'}' => self.single(TokenKind::ClosingCurlyBrace),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semicolon),
            b'.' => self.single(TokenKind::Dot),
            b':' => self.single(TokenKind::Colon),
            b'|' => self.single(TokenKind::PipeMark),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Asterisk),
            b'/' => self.single(TokenKind::Slash),
            b'%' => self.single(TokenKind::Percent),
            b'=' => match self.peek_byte(1) {
                Some(b'=') | Some(b'~') => self.pair(TokenKind::Comparison),
                _ => self.single(TokenKind::Equals),
            },
            b'!' => match self.peek_byte(1) {
                Some(b'=') | Some(b'~') => self.pair(TokenKind::Comparison),
                _ => self.single(TokenKind::Exclamation),
            },
            b'<' => match self.peek_byte(1) {
                Some(b'=') | Some(b'>') => self.pair(TokenKind::Comparison),
                _ => self.single(TokenKind::Comparison),
            },
            b'>' => match self.peek_byte(1) {
                Some(b'=') => self.pair(TokenKind::Comparison),
                _ => self.single(TokenKind::Comparison),
            },
            _ => {
                let ch = self.source[start..].chars().next().unwrap_or('\0');
                return Err(LexError::UnexpectedCharacter { ch, offset: start });
            }
        };

        Ok(Some(Token {
            kind,
            span: Span::new(start, self.pos),
        }))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn pair(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }

    fn eat_word_chars(&mut self) {
        while let Some(b) = self.peek_byte(0) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self) -> TokenKind {
        self.eat_digits();
        if self.peek_byte(0) == Some(b'.') && matches!(self.peek_byte(1), Some(b'0'..=b'9')) {
            self.pos += 1;
            self.eat_digits();
        }
        if matches!(self.peek_byte(0), Some(b'e') | Some(b'E')) {
            let sign = matches!(self.peek_byte(1), Some(b'+') | Some(b'-')) as usize;
            if matches!(self.peek_byte(1 + sign), Some(b'0'..=b'9')) {
                self.pos += 1 + sign;
                self.eat_digits();
            }
        }
        // Unit suffixes (`1h`, `10ms`) and hex digits stay part of the number.
        self.eat_word_chars();
        TokenKind::Number
    }

    fn read_string(&mut self, quote: u8, kind: TokenKind) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek_byte(0) {
                None => return Err(LexError::UnterminatedString { offset: start }),
                Some(b'\\') => self.pos += 2,
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(kind);
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}
