// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversion failures.
//!
//! Every error names the KQL function being converted and the literal text of
//! the token the converter was looking at when it gave up. Errors are raised
//! where they are detected and travel up through nested conversions unchanged.

use crate::cursor::Cursor;
use alloc::string::{String, ToString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    Arity,
    BadArgument,
    UnknownFunction,
    DepthLimit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConvertError {
    #[error("syntax error in function `{function}` near `{token}`: {message}")]
    Syntax {
        function: String,
        token: String,
        message: String,
    },

    #[error("number of arguments doesn't match in function `{function}` near `{token}`: {message}")]
    Arity {
        function: String,
        token: String,
        message: String,
    },

    #[error("bad argument in function `{function}` near `{token}`: {message}")]
    BadArgument {
        function: String,
        token: String,
        message: String,
    },

    #[error("`{function}` is not a supported kusto function")]
    UnknownFunction { function: String, token: String },

    #[error("calls nested inside `{function}` exceed the depth limit of {limit}")]
    DepthLimit {
        function: String,
        token: String,
        limit: usize,
    },
}

const END_OF_INPUT: &str = "<end of input>";

fn token_text(cursor: &Cursor<'_>) -> String {
    if cursor.is_end() {
        END_OF_INPUT.to_string()
    } else {
        cursor.text().to_string()
    }
}

impl ConvertError {
    pub fn syntax(function: &str, cursor: &Cursor<'_>, message: impl Into<String>) -> Self {
        Self::Syntax {
            function: function.to_string(),
            token: token_text(cursor),
            message: message.into(),
        }
    }

    pub fn arity(function: &str, cursor: &Cursor<'_>, message: impl Into<String>) -> Self {
        Self::Arity {
            function: function.to_string(),
            token: token_text(cursor),
            message: message.into(),
        }
    }

    /// The offending text is the converted argument itself rather than a token.
    pub fn bad_argument(function: &str, argument: &str, message: impl Into<String>) -> Self {
        Self::BadArgument {
            function: function.to_string(),
            token: argument.to_string(),
            message: message.into(),
        }
    }

    pub fn unknown_function(function: &str) -> Self {
        Self::UnknownFunction {
            function: function.to_string(),
            token: function.to_string(),
        }
    }

    pub fn depth_limit(function: &str, limit: usize) -> Self {
        Self::DepthLimit {
            function: function.to_string(),
            token: function.to_string(),
            limit,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Arity { .. } => ErrorKind::Arity,
            Self::BadArgument { .. } => ErrorKind::BadArgument,
            Self::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            Self::DepthLimit { .. } => ErrorKind::DepthLimit,
        }
    }

    pub fn function(&self) -> &str {
        match self {
            Self::Syntax { function, .. }
            | Self::Arity { function, .. }
            | Self::BadArgument { function, .. }
            | Self::UnknownFunction { function, .. }
            | Self::DepthLimit { function, .. } => function,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Syntax { token, .. }
            | Self::Arity { token, .. }
            | Self::BadArgument { token, .. }
            | Self::UnknownFunction { token, .. }
            | Self::DepthLimit { token, .. } => token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use alloc::string::ToString;

    #[test]
    fn carries_function_and_token() {
        let source = "bin(x, )";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let mut cursor = Cursor::new(source, &tokens);
        for _ in 0..4 {
            cursor.advance();
        }

        let err = ConvertError::arity("bin", &cursor, "The second argument of `bin` should be valid argument.");
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(err.function(), "bin");
        assert_eq!(err.token(), ")");
        assert_eq!(
            err.to_string(),
            "number of arguments doesn't match in function `bin` near `)`: The second argument of `bin` should be valid argument."
        );
    }

    #[test]
    fn end_of_input_is_named() {
        let source = "bin(";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let mut cursor = Cursor::new(source, &tokens);
        cursor.advance();
        cursor.advance();

        let err = ConvertError::syntax("bin", &cursor, "unexpected end of input");
        assert_eq!(err.token(), "<end of input>");
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn kind_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::BadArgument).unwrap(),
            "\"bad_argument\""
        );
    }
}
