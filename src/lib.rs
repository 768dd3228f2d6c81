// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_std]

//! Conversion of Kusto Query Language (KQL) builtin function calls into
//! ClickHouse SQL expressions.
//!
//! ```no_run
//! let sql = kqlsql::kql_to_sql("bin(Price, 10)")?;
//! assert_eq!(sql, "toInt64(toFloat64(Price) / 10) * 10");
//! # Ok::<(), anyhow::Error>(())
//! ```

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod cursor;
mod error;
pub mod functions;
mod lexer;
mod options;
pub mod timespan;
mod tracing_utils;
mod transpiler;
mod value_kind;

pub use cursor::Cursor;
pub use error::{ConvertError, ErrorKind};
pub use functions::Builtin;
pub use lexer::{LexError, Lexer, Span, Token, TokenKind};
pub use options::TranspilerOptions;
pub use transpiler::{ConversionContext, Transpiler};
pub use value_kind::ValueKind;

use alloc::string::String;

/// Convert a KQL expression with the default [`TranspilerOptions`].
pub fn kql_to_sql(kql: &str) -> anyhow::Result<String> {
    Transpiler::new().transpile(kql)
}
