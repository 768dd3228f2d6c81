// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rounding and conditional builtins: `bin`, `bin_at`, `case`, `iif`.

use super::{
    expect_closing_bracket, expect_comma, format_number, ordinal, parse_number, required_argument,
};
use crate::cursor::Cursor;
use crate::error::ConvertError;
use crate::lexer::TokenKind;
use crate::transpiler::ConversionContext;
use crate::value_kind::ValueKind;

use alloc::format;
use alloc::string::String;

/// Render a bucket of seconds as an `H:M:S` string. `bin` and `bin_at` spell
/// the separator before the seconds differently.
fn hh_mm_ss(bucket: &str, seconds_separator: &str) -> String {
    format!(
        "concat(toString(toInt32((({bucket}) as x) / 3600)),':', toString(toInt32(x % 3600 / 60)){seconds_separator}toString(toInt32(x % 3600 % 60)))"
    )
}

/// Parse a bin size, which must be a positive number.
fn bin_size(function: &str, argument: &str, ordinal: &str) -> Result<f64, ConvertError> {
    match parse_number(argument) {
        Some(size) if size > 0.0 => Ok(size),
        Some(_) => Err(ConvertError::bad_argument(
            function,
            argument,
            format!("The {ordinal} argument of `{function}` should be a positive number."),
        )),
        None => Err(ConvertError::bad_argument(
            function,
            argument,
            format!("The {ordinal} argument of `{function}` should be a valid number."),
        )),
    }
}

/// `bin(value, roundTo)`
pub(super) fn bin(
    ctx: &mut ConversionContext<'_>,
    function: &str,
    cursor: &mut Cursor<'_>,
) -> Result<String, ConvertError> {
    cursor.advance();
    let kind = ValueKind::classify(cursor.text());

    let value = required_argument(ctx, function, cursor, "first")?;
    expect_comma(function, cursor, "2")?;
    let round_to = required_argument(ctx, function, cursor, "second")?;

    // `- 3` and `-3` are the same bin size.
    let round_to: String = round_to.chars().filter(|c| !c.is_whitespace()).collect();
    let b = format_number(bin_size(function, &round_to, "second")?);
    expect_closing_bracket(function, cursor, "2")?;

    let t = format!("toFloat64({value})");
    Ok(match kind {
        ValueKind::Datetime => format!("toDateTime64(toInt64({t}/{b}) * {b}, 9, 'UTC')"),
        ValueKind::Timespan => hh_mm_ss(&format!("toInt64({t}/{b}) * {b}"), ",':',"),
        ValueKind::Other => format!("toInt64({t} / {b}) * {b}"),
    })
}

/// `bin_at(expression, binSize, fixedPoint)` or
/// `bin_at(typeHint, expression, binSize, fixedPoint)`
pub(super) fn bin_at(
    ctx: &mut ConversionContext<'_>,
    function: &str,
    cursor: &mut Cursor<'_>,
) -> Result<String, ConvertError> {
    cursor.advance();
    let kind = ValueKind::classify(cursor.text());

    let first = required_argument(ctx, function, cursor, "first")?;
    expect_comma(function, cursor, "3 or 4")?;
    let second = required_argument(ctx, function, cursor, "second")?;
    expect_comma(function, cursor, "3 or 4")?;
    let third = required_argument(ctx, function, cursor, "third")?;

    let (expression, size, fixed_point, size_ordinal) = match cursor.kind() {
        Some(TokenKind::ClosingRoundBracket) => (first, second, third, "second"),
        Some(TokenKind::Comma) => {
            cursor.advance();
            let fourth = required_argument(ctx, function, cursor, "fourth")?;
            expect_closing_bracket(function, cursor, "3 or 4")?;
            (second, third, fourth, "third")
        }
        _ => {
            return Err(ConvertError::syntax(
                function,
                cursor,
                format!("Function `{function}` requires a valid argument structure."),
            ))
        }
    };

    let b = format_number(bin_size(function, size.trim(), size_ordinal)?);
    let t1 = format!("toFloat64({fixed_point})");
    let t2 = format!("toFloat64({expression})");
    // Compares the rendered SQL text, not the values.
    let dir = if t2 >= t1 { "0" } else { "-1" };

    let bucket = format!("{t1} + toInt64(({t2} - {t1}) / {b} + {dir}) * {b}");
    Ok(match kind {
        ValueKind::Datetime => format!("toDateTime64({bucket}, 9, 'UTC')"),
        ValueKind::Timespan => hh_mm_ss(&bucket, ", ':', "),
        ValueKind::Other => bucket,
    })
}

/// `case(p1, v1, ..., pn, vn, else)`
pub(super) fn case(
    ctx: &mut ConversionContext<'_>,
    function: &str,
    cursor: &mut Cursor<'_>,
) -> Result<String, ConvertError> {
    cursor.advance();

    let mut sql = String::from("multiIf(");
    let mut count = 0usize;
    loop {
        let argument = required_argument(ctx, function, cursor, &ordinal(count + 1))?;
        if count > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&argument);
        count += 1;

        match cursor.kind() {
            Some(TokenKind::Comma) => cursor.advance(),
            Some(TokenKind::ClosingRoundBracket) => break,
            _ => {
                return Err(ConvertError::syntax(
                    function,
                    cursor,
                    format!("Expected `)` after the arguments of function `{function}`."),
                ))
            }
        }
    }

    if count < 3 || count % 2 == 0 {
        return Err(ConvertError::arity(
            function,
            cursor,
            format!(
                "Function `{function}` requires an odd number of arguments, at least 3, got {count}."
            ),
        ));
    }

    sql.push(')');
    Ok(sql)
}

/// `iif(predicate, ifTrue, ifFalse)`
pub(super) fn iif(
    ctx: &mut ConversionContext<'_>,
    function: &str,
    cursor: &mut Cursor<'_>,
) -> Result<String, ConvertError> {
    cursor.advance();

    let predicate = required_argument(ctx, function, cursor, "first")?;
    expect_comma(function, cursor, "3")?;
    let if_true = required_argument(ctx, function, cursor, "second")?;
    expect_comma(function, cursor, "3")?;
    let if_false = required_argument(ctx, function, cursor, "third")?;
    expect_closing_bracket(function, cursor, "3")?;

    Ok(format!("if({predicate}, {if_true}, {if_false})"))
}
