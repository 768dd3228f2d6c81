// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `datetime(...)` and `timespan(...)` literals.
//!
//! Their argument is not an expression: the text between the brackets is
//! taken as written, so `datetime(2017-01-01 10:00)` is one value rather than a
//! subtraction.

use super::format_number;
use crate::cursor::Cursor;
use crate::error::ConvertError;
use crate::lexer::TokenKind;
use crate::timespan::parse_timespan_argument;
use crate::transpiler::escape_single_quotes;

use alloc::format;
use alloc::string::String;

/// Source text between the brackets of a literal, with the cursor left on the
/// closing bracket. A single quoted token contributes its content.
fn raw_argument<'a>(function: &str, cursor: &mut Cursor<'a>) -> Result<&'a str, ConvertError> {
    cursor.advance();

    let Some(first) = cursor.peek() else {
        return Err(ConvertError::syntax(
            function,
            cursor,
            format!("Need more argument(s) in function: {function}"),
        ));
    };
    if matches!(
        first.kind,
        TokenKind::Comma | TokenKind::ClosingRoundBracket
    ) {
        return Err(ConvertError::arity(
            function,
            cursor,
            format!("The first argument of `{function}` should be valid argument."),
        ));
    }

    let mut depth = 0usize;
    let mut end = first.span.end;
    loop {
        match cursor.kind() {
            None | Some(TokenKind::PipeMark) | Some(TokenKind::Semicolon) => {
                return Err(ConvertError::syntax(
                    function,
                    cursor,
                    format!("Missing `)` after the argument of function: {function}"),
                ));
            }
            Some(TokenKind::Comma) if depth == 0 => {
                return Err(ConvertError::arity(
                    function,
                    cursor,
                    format!("Function `{function}` requires 1 argument."),
                ));
            }
            Some(TokenKind::ClosingRoundBracket) if depth == 0 => break,
            Some(TokenKind::OpeningRoundBracket) => depth += 1,
            Some(TokenKind::ClosingRoundBracket) => depth -= 1,
            Some(_) => {}
        }
        if let Some(span) = cursor.span() {
            end = span.end;
        }
        cursor.advance();
    }

    let source = cursor.source();
    let quoted = matches!(
        first.kind,
        TokenKind::StringLiteral | TokenKind::QuotedIdentifier
    );
    if quoted && end == first.span.end {
        let text = first.text(source);
        return Ok(text.get(1..text.len() - 1).unwrap_or(""));
    }
    Ok(source.get(first.span.start..end).unwrap_or(""))
}

/// `datetime(text)`
pub(super) fn datetime(function: &str, cursor: &mut Cursor<'_>) -> Result<String, ConvertError> {
    let text = raw_argument(function, cursor)?;
    if text == "null" {
        return Ok(String::from("NULL"));
    }
    Ok(format!(
        "parseDateTime64BestEffortOrNull('{}', 9, 'UTC')",
        escape_single_quotes(text)
    ))
}

/// `timespan(text)`
pub(super) fn timespan(function: &str, cursor: &mut Cursor<'_>) -> Result<String, ConvertError> {
    let text = raw_argument(function, cursor)?;
    if text == "null" {
        return Ok(String::from("NULL"));
    }
    match parse_timespan_argument(text) {
        Some(seconds) => Ok(format_number(seconds)),
        None => Err(ConvertError::bad_argument(
            function,
            text,
            format!("`{text}` is not a valid timespan."),
        )),
    }
}
