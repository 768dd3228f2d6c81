// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::timespan::is_const_timespan;

/// Coarse kind of a function argument, guessed from its leading token.
///
/// This is not type inference: `bin(datetime(2020-01-01), 1d)` is a datetime
/// because the argument starts with the `datetime` keyword, while a column of
/// datetime type is classified as [`ValueKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Datetime,
    Timespan,
    Other,
}

impl ValueKind {
    pub fn classify(leading_token: &str) -> Self {
        match leading_token {
            "datetime" | "date" => ValueKind::Datetime,
            "timespan" | "time" => ValueKind::Timespan,
            text if is_const_timespan(text) => ValueKind::Timespan,
            _ => ValueKind::Other,
        }
    }
}
