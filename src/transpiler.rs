// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! KQL expression to SQL expression transpiler
//!
//! Walks a tokenized KQL expression, hands every builtin call it meets to the
//! matching converter in [`crate::functions`], and copies everything else
//! through. Argument lists are never collected up front: each converter pulls
//! its arguments one at a time through [`ConversionContext::convert_argument`],
//! which in turn recurses into the dispatcher for nested calls.

use crate::cursor::Cursor;
use crate::error::ConvertError;
use crate::functions::{self, format_number};
use crate::lexer::{Lexer, Span, TokenKind};
use crate::options::TranspilerOptions;
use crate::timespan::parse_const_timespan;

use alloc::format;
use alloc::string::String;
use anyhow::Result;

/// Per-conversion state shared by the converters of one call tree.
pub struct ConversionContext<'o> {
    options: &'o TranspilerOptions,
    depth: usize,
}

impl<'o> ConversionContext<'o> {
    pub fn new(options: &'o TranspilerOptions) -> Self {
        Self { options, depth: 0 }
    }

    pub fn options(&self) -> &TranspilerOptions {
        self.options
    }

    /// Number of builtin calls currently being converted.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter(&mut self, function: &str) -> Result<(), ConvertError> {
        if self.depth >= self.options.max_depth {
            return Err(ConvertError::depth_limit(function, self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Convert one argument of `function`, starting at the cursor.
    ///
    /// On return the cursor sits on the delimiter that ended the argument: a
    /// comma or a closing bracket at the argument's own nesting level. An empty
    /// string means the cursor was already on a delimiter, i.e. the argument is
    /// missing; callers decide whether that is an arity error.
    pub fn convert_argument(
        &mut self,
        function: &str,
        cursor: &mut Cursor<'_>,
    ) -> Result<String, ConvertError> {
        match cursor.kind() {
            None | Some(TokenKind::PipeMark) | Some(TokenKind::Semicolon) => {
                return Err(ConvertError::syntax(
                    function,
                    cursor,
                    format!("Need more argument(s) in function: {function}"),
                ));
            }
            Some(TokenKind::Comma)
            | Some(TokenKind::ClosingRoundBracket)
            | Some(TokenKind::ClosingSquareBracket) => return Ok(String::new()),
            Some(_) => {}
        }

        let mut writer = SqlWriter::default();
        let mut round_brackets = 0usize;
        let mut square_brackets = 0usize;

        loop {
            let Some(kind) = cursor.kind() else {
                return Err(ConvertError::syntax(
                    function,
                    cursor,
                    format!("Missing `)` after the arguments of function: {function}"),
                ));
            };
            match kind {
                TokenKind::Comma if round_brackets == 0 && square_brackets == 0 => break,
                TokenKind::ClosingRoundBracket if round_brackets == 0 => break,
                TokenKind::ClosingSquareBracket if square_brackets == 0 => break,
                TokenKind::PipeMark | TokenKind::Semicolon => {
                    return Err(ConvertError::syntax(
                        function,
                        cursor,
                        format!("Missing `)` after the arguments of function: {function}"),
                    ));
                }
                TokenKind::OpeningRoundBracket => round_brackets += 1,
                TokenKind::ClosingRoundBracket => round_brackets -= 1,
                TokenKind::OpeningSquareBracket => square_brackets += 1,
                TokenKind::ClosingSquareBracket => square_brackets -= 1,
                _ => {}
            }
            self.convert_token(cursor, &mut writer)?;
        }

        Ok(writer.finish())
    }

    /// Convert everything from the cursor to the end of the token stream.
    pub fn convert_expression(&mut self, cursor: &mut Cursor<'_>) -> Result<String, ConvertError> {
        let mut writer = SqlWriter::default();
        while cursor.is_valid() {
            self.convert_token(cursor, &mut writer)?;
        }
        Ok(writer.finish())
    }

    /// Write the SQL for the token at the cursor and move past it. A builtin
    /// call is consumed as a whole, up to and including its closing bracket.
    fn convert_token(
        &mut self,
        cursor: &mut Cursor<'_>,
        writer: &mut SqlWriter,
    ) -> Result<(), ConvertError> {
        let Some(token) = cursor.peek() else {
            return Ok(());
        };
        let text = token.text(cursor.source());

        match token.kind {
            TokenKind::BareWord => {
                if let Some(sql) = functions::dispatch(self, cursor)? {
                    let end = cursor.span().map_or(token.span.end, |closing| closing.end);
                    writer.push(Span::new(token.span.start, end), &sql);
                } else {
                    if self.options().strict_functions
                        && cursor.peek_kind_at(1) == Some(TokenKind::OpeningRoundBracket)
                        && !matches!(text, "and" | "or")
                    {
                        return Err(ConvertError::unknown_function(text));
                    }
                    writer.push(token.span, text);
                }
            }
            TokenKind::Number => match parse_const_timespan(text) {
                Some(seconds) => writer.push(token.span, &format_number(seconds)),
                None => writer.push(token.span, text),
            },
            TokenKind::QuotedIdentifier => {
                let inner = text.get(1..text.len() - 1).unwrap_or("");
                writer.push(token.span, &format!("'{}'", escape_single_quotes(inner)));
            }
            _ => writer.push(token.span, text),
        }

        cursor.advance();
        Ok(())
    }
}

/// Make string content safe inside a single-quoted SQL literal.
///
/// Backslash escapes are kept as written, so `\'` stays one escaped quote. A
/// bare `'` is escaped and a trailing lone `\` is doubled.
pub(crate) fn escape_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push_str("\\\\"),
            },
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out
}

/// Joins converted tokens, keeping a single space wherever the source had
/// whitespace between them.
#[derive(Default)]
struct SqlWriter {
    out: String,
    last_end: Option<usize>,
}

impl SqlWriter {
    fn push(&mut self, span: Span, text: &str) {
        if matches!(self.last_end, Some(end) if span.start > end) {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.last_end = Some(span.end);
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Rewrites the builtin calls of KQL expressions into SQL.
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    options: TranspilerOptions,
}

impl Transpiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: TranspilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TranspilerOptions {
        &self.options
    }

    /// Tokenize `kql` and convert the whole expression.
    pub fn transpile(&self, kql: &str) -> Result<String> {
        let tokens = Lexer::new(kql).tokenize()?;
        let mut cursor = Cursor::new(kql, &tokens);
        Ok(self.convert_expression(&mut cursor)?)
    }

    pub fn convert_expression(&self, cursor: &mut Cursor<'_>) -> Result<String, ConvertError> {
        ConversionContext::new(&self.options).convert_expression(cursor)
    }

    /// Convert the builtin call starting at the cursor, if there is one.
    ///
    /// Returns `Ok(None)` with the cursor untouched when no builtin claims the
    /// token. On success the cursor is left on the call's closing bracket.
    pub fn try_convert(&self, cursor: &mut Cursor<'_>) -> Result<Option<String>, ConvertError> {
        functions::dispatch(&mut ConversionContext::new(&self.options), cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::Token;
    use alloc::vec::Vec;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn argument(source: &str) -> (Result<String, ConvertError>, Option<TokenKind>) {
        let tokens = tokens(source);
        let mut cursor = Cursor::new(source, &tokens);
        let options = TranspilerOptions::default();
        let mut ctx = ConversionContext::new(&options);
        let result = ctx.convert_argument("f", &mut cursor);
        (result, cursor.kind())
    }

    #[test]
    fn argument_stops_at_top_level_delimiter() {
        let (sql, at) = argument("a + foo(b, c), d)");
        assert_eq!(sql.unwrap(), "a + foo(b, c)");
        assert_eq!(at, Some(TokenKind::Comma));

        let (sql, at) = argument("x[1, 2])");
        assert_eq!(sql.unwrap(), "x[1, 2]");
        assert_eq!(at, Some(TokenKind::ClosingRoundBracket));
    }

    #[test]
    fn empty_argument_is_a_sentinel() {
        for source in [", 2)", ")", "]"] {
            let (sql, _) = argument(source);
            assert_eq!(sql.unwrap(), "", "{source}");
        }
    }

    #[test]
    fn exhausted_cursor_is_a_syntax_error() {
        for source in ["", "a + b", "(a, b", "a | where"] {
            let (result, _) = argument(source);
            assert_eq!(result.unwrap_err().kind(), ErrorKind::Syntax, "{source}");
        }
    }

    #[test]
    fn literals_are_rendered_for_sql() {
        let (sql, _) = argument("\"it's\" == s and d > 1h)");
        assert_eq!(sql.unwrap(), "'it\\'s' == s and d > 3600");
    }

    #[test]
    fn backslash_escapes_are_kept() {
        assert_eq!(escape_single_quotes("it's"), r"it\'s");
        assert_eq!(escape_single_quotes(r"it\'s"), r"it\'s");
        assert_eq!(escape_single_quotes(r"tab\there"), r"tab\there");
        assert_eq!(escape_single_quotes(r"dir\\"), r"dir\\");
        assert_eq!(escape_single_quotes(r"dir\"), r"dir\\");
        assert_eq!(escape_single_quotes(r"\\'"), r"\\\'");
    }

    #[test]
    fn escaped_quote_stays_inside_the_string() -> Result<()> {
        let sql = Transpiler::new().transpile(r#"iif(Name == "x\' or 1=1 --", 1, 0)"#)?;
        assert_eq!(sql, r#"if(Name == 'x\' or 1=1 --', 1, 0)"#);
        Ok(())
    }

    #[test]
    fn spacing_follows_the_source() {
        let (sql, _) = argument("a.b+c  *  - 3)");
        assert_eq!(sql.unwrap(), "a.b+c * - 3");
    }

    #[test]
    fn nested_builtin_is_replaced() {
        let (sql, at) = argument("1 + iif(a, b, c) * 2)");
        assert_eq!(sql.unwrap(), "1 + if(a, b, c) * 2");
        assert_eq!(at, Some(TokenKind::ClosingRoundBracket));
    }

    #[test]
    fn pass_through() -> Result<()> {
        let transpiler = Transpiler::new();
        for kql in ["x + 1", "foo(a, b) > 2", "bin", "Timestamp > ago(1d)"] {
            let expected = kql.replace("1d", "86400");
            assert_eq!(transpiler.transpile(kql)?, expected);
        }
        Ok(())
    }

    #[test]
    fn try_convert_leaves_cursor_on_closing_bracket() {
        let source = "bin(x, 2) + 1";
        let tokens = tokens(source);
        let mut cursor = Cursor::new(source, &tokens);

        let sql = Transpiler::new().try_convert(&mut cursor).unwrap();
        assert_eq!(sql.as_deref(), Some("toInt64(toFloat64(x) / 2) * 2"));
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.kind(), Some(TokenKind::ClosingRoundBracket));
    }

    #[test]
    fn try_convert_declines_without_side_effects() {
        let source = "foo(x, 2)";
        let tokens = tokens(source);
        let mut cursor = Cursor::new(source, &tokens);

        assert_eq!(Transpiler::new().try_convert(&mut cursor).unwrap(), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn strict_mode_rejects_unknown_calls() {
        let strict =
            Transpiler::new().with_options(TranspilerOptions::new().with_strict_functions(true));
        let err = strict.transpile("iif(foo(x), 1, 2)").unwrap_err();
        let err = err.downcast_ref::<ConvertError>().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownFunction);
        assert_eq!(err.function(), "foo");

        assert_eq!(strict.transpile("a and (b or c)").unwrap(), "a and (b or c)");
        assert_eq!(strict.transpile("iif(x, 1, 2)").unwrap(), "if(x, 1, 2)");
    }

    #[test]
    fn depth_limit() {
        let shallow = Transpiler::new().with_options(TranspilerOptions::new().with_max_depth(1));
        assert!(shallow.transpile("bin(x, 2)").is_ok());

        let err = shallow.transpile("bin(bin(x, 2), 3)").unwrap_err();
        let err = err.downcast_ref::<ConvertError>().unwrap();
        assert_eq!(err.kind(), ErrorKind::DepthLimit);
    }
}
