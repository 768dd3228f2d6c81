// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Forward-only scan position over a token sequence.

use crate::lexer::{Span, Token, TokenKind};

/// Index into an immutable token slice.
///
/// A cursor is owned by a single conversion and threaded through the
/// converters by `&mut`. Cloning it yields an independent lookahead position.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            index: 0,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Kind of the token `offset` positions ahead of the current one.
    pub fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.index + offset).map(|t| t.kind)
    }

    /// Text of the current token, or the empty string once exhausted.
    pub fn text(&self) -> &'a str {
        match self.peek() {
            Some(token) => token.text(self.source),
            None => "",
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.peek().map(|t| t.span)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn advance(&mut self) {
        if self.index < self.tokens.len() {
            self.index += 1;
        }
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_end()
    }
}
