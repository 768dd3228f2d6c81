// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! KQL builtin function converters
//!
//! Each [`Builtin`] knows the KQL names it answers to and how to turn a call
//! into SQL. All converters follow the same steps:
//!
//! 1. match the function name followed by `(`, or decline without moving the cursor
//! 2. step over `(`
//! 3. pull each required argument through the argument extractor, rejecting
//!    empty positions
//! 4. build the SQL text
//! 5. check that the cursor stopped on the closing `)`
//!
//! Failures at any step abort the whole conversion.

mod datatype;
mod general;

use crate::cursor::Cursor;
use crate::error::ConvertError;
use crate::lexer::TokenKind;
use crate::tracing_utils::{debug, trace};
use crate::transpiler::ConversionContext;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Builtin {
    Bin,
    BinAt,
    Case,
    Iif,
    Datetime,
    Timespan,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Bin,
        Builtin::BinAt,
        Builtin::Case,
        Builtin::Iif,
        Builtin::Datetime,
        Builtin::Timespan,
    ];

    /// KQL names of this builtin. Matching is case-sensitive.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Builtin::Bin => &["bin", "floor"],
            Builtin::BinAt => &["bin_at"],
            Builtin::Case => &["case"],
            Builtin::Iif => &["iif", "iff"],
            Builtin::Datetime => &["datetime", "date"],
            Builtin::Timespan => &["timespan", "time"],
        }
    }

    /// Convert a call to this builtin starting at the cursor.
    ///
    /// Returns `Ok(None)` and leaves the cursor where it was if the cursor is
    /// not on one of [`Builtin::names`] followed by `(`. On success the cursor
    /// is on the call's closing bracket.
    pub fn try_convert(
        self,
        ctx: &mut ConversionContext<'_>,
        cursor: &mut Cursor<'_>,
    ) -> Result<Option<String>, ConvertError> {
        let Some(function) = resolve_function_name(cursor, self.names()) else {
            return Ok(None);
        };

        trace!("converting `{}` at depth {}", function, ctx.depth());
        ctx.enter(function)?;
        let sql = match self {
            Builtin::Bin => general::bin(ctx, function, cursor),
            Builtin::BinAt => general::bin_at(ctx, function, cursor),
            Builtin::Case => general::case(ctx, function, cursor),
            Builtin::Iif => general::iif(ctx, function, cursor),
            Builtin::Datetime => datatype::datetime(function, cursor),
            Builtin::Timespan => datatype::timespan(function, cursor),
        }?;
        ctx.exit();

        debug!("`{}` converted to `{}`", function, sql);
        Ok(Some(sql))
    }
}

lazy_static! {
    static ref BUILTINS: BTreeMap<&'static str, Builtin> = {
        let mut m = BTreeMap::new();
        for builtin in Builtin::ALL {
            for name in builtin.names() {
                m.insert(*name, *builtin);
            }
        }
        m
    };
}

/// Find the builtin registered under `name`.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

/// All registered builtin names, in lexicographic order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.keys().copied()
}

/// Hand the call at the cursor to the builtin registered for its name.
pub fn dispatch(
    ctx: &mut ConversionContext<'_>,
    cursor: &mut Cursor<'_>,
) -> Result<Option<String>, ConvertError> {
    if !cursor.is(TokenKind::BareWord) {
        return Ok(None);
    }
    match lookup(cursor.text()) {
        Some(builtin) => builtin.try_convert(ctx, cursor),
        None => Ok(None),
    }
}

/// If the cursor is on one of `names` directly followed by `(`, move to the
/// bracket and return the name as written. Otherwise leave the cursor alone.
pub fn resolve_function_name<'a>(cursor: &mut Cursor<'a>, names: &[&str]) -> Option<&'a str> {
    if !cursor.is(TokenKind::BareWord) {
        return None;
    }
    let name = cursor.text();
    if !names.contains(&name) || cursor.peek_kind_at(1) != Some(TokenKind::OpeningRoundBracket) {
        return None;
    }
    cursor.advance();
    Some(name)
}

/// Extract the next argument and reject it if the position is empty.
fn required_argument(
    ctx: &mut ConversionContext<'_>,
    function: &str,
    cursor: &mut Cursor<'_>,
    ordinal: &str,
) -> Result<String, ConvertError> {
    let argument = ctx.convert_argument(function, cursor)?;
    if argument.is_empty() {
        return Err(ConvertError::arity(
            function,
            cursor,
            format!("The {ordinal} argument of `{function}` should be valid argument."),
        ));
    }
    Ok(argument)
}

fn ordinal(position: usize) -> String {
    match position {
        1 => "first".to_string(),
        2 => "second".to_string(),
        3 => "third".to_string(),
        4 => "fourth".to_string(),
        n => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix}")
        }
    }
}

/// Step over the comma separating two arguments.
fn expect_comma(function: &str, cursor: &mut Cursor<'_>, arity: &str) -> Result<(), ConvertError> {
    match cursor.kind() {
        Some(TokenKind::Comma) => {
            cursor.advance();
            Ok(())
        }
        Some(TokenKind::ClosingRoundBracket) => Err(ConvertError::arity(
            function,
            cursor,
            format!("Function `{function}` requires {arity} arguments."),
        )),
        _ => Err(ConvertError::syntax(
            function,
            cursor,
            format!("Expected `,` between the arguments of function `{function}`."),
        )),
    }
}

fn expect_closing_bracket(
    function: &str,
    cursor: &Cursor<'_>,
    arity: &str,
) -> Result<(), ConvertError> {
    match cursor.kind() {
        Some(TokenKind::ClosingRoundBracket) => Ok(()),
        Some(TokenKind::Comma) => Err(ConvertError::arity(
            function,
            cursor,
            format!("Function `{function}` requires {arity} arguments."),
        )),
        _ => Err(ConvertError::syntax(
            function,
            cursor,
            format!("Expected `)` after the arguments of function `{function}`."),
        )),
    }
}

/// Parse a converted argument as a finite number.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number the way it is spliced into SQL: `2` rather than `2.0`.
pub(crate) fn format_number(value: f64) -> String {
    value.to_string()
}
