// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the public conversion API

use anyhow::Result;
use kqlsql::*;

#[test]
fn test_kql_to_sql() -> Result<()> {
    assert_eq!(kql_to_sql("bin(7, 2)")?, "toInt64(toFloat64(7) / 2) * 2");
    assert_eq!(
        kql_to_sql("iif(Level == \"Error\", 1, 0) + x")?,
        "if(Level == 'Error', 1, 0) + x"
    );
    Ok(())
}

#[test]
fn test_where_clause_expression() -> Result<()> {
    let kql = "bin(Timestamp, 5m) > 0 and iif(Count > 10, \"high\", \"low\") == \"high\"";
    let sql = kql_to_sql(kql)?;
    assert_eq!(
        sql,
        "toInt64(toFloat64(Timestamp) / 300) * 300 > 0 and if(Count > 10, 'high', 'low') == 'high'"
    );
    Ok(())
}

#[test]
fn test_lex_errors_are_reported() {
    let err = kql_to_sql("bin(x, 2) # 3").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LexError>(),
        Some(&LexError::UnexpectedCharacter { ch: '#', offset: 10 })
    );

    let err = kql_to_sql("iif(a, \"b, c)").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LexError>(),
        Some(LexError::UnterminatedString { offset: 7 })
    ));
}

#[test]
fn test_conversion_errors_carry_context() -> Result<()> {
    let err = kql_to_sql("x + bin(y, )").unwrap_err();
    let err = err
        .downcast_ref::<ConvertError>()
        .ok_or_else(|| anyhow::anyhow!("not a conversion error"))?;

    assert_eq!(err.kind(), ErrorKind::Arity);
    assert_eq!(err.function(), "bin");
    assert_eq!(err.token(), ")");

    let json = serde_json::to_value(err)?;
    assert_eq!(json["Arity"]["function"], "bin");
    assert_eq!(json["Arity"]["token"], ")");
    Ok(())
}

#[test]
fn test_try_convert_on_caller_cursor() -> Result<()> {
    let source = "where bin_at(x, 1, 0) > 3";
    let tokens = Lexer::new(source).tokenize()?;
    let mut cursor = Cursor::new(source, &tokens);
    let transpiler = Transpiler::new();

    assert_eq!(transpiler.try_convert(&mut cursor)?, None);
    cursor.advance();

    let sql = transpiler.try_convert(&mut cursor)?;
    assert_eq!(
        sql.as_deref(),
        Some("toFloat64(0) + toInt64((toFloat64(x) - toFloat64(0)) / 1 + 0) * 1")
    );
    assert!(cursor.is(TokenKind::ClosingRoundBracket));

    cursor.advance();
    assert_eq!(cursor.text(), ">");
    Ok(())
}

#[test]
fn test_builtin_entry_point() -> Result<()> {
    let source = "case(a, 1, 0)";
    let tokens = Lexer::new(source).tokenize()?;
    let options = TranspilerOptions::default();

    for builtin in Builtin::ALL {
        let mut cursor = Cursor::new(source, &tokens);
        let mut ctx = ConversionContext::new(&options);
        let sql = builtin.try_convert(&mut ctx, &mut cursor)?;
        if *builtin == Builtin::Case {
            assert_eq!(sql.as_deref(), Some("multiIf(a, 1, 0)"));
        } else {
            assert_eq!(sql, None);
            assert_eq!(cursor.position(), 0);
        }
    }
    Ok(())
}

#[test]
fn test_registry_covers_all_builtins() {
    for builtin in Builtin::ALL {
        for name in builtin.names() {
            assert_eq!(functions::lookup(name), Some(*builtin));
        }
    }
    assert_eq!(functions::names().count(), 10);
}

#[test]
fn test_options_from_json() -> Result<()> {
    let options = TranspilerOptions::from_json_str(r#"{ "strict_functions": true, "max_depth": 4 }"#)?;
    let transpiler = Transpiler::new().with_options(options);
    assert!(transpiler.options().strict_functions);

    assert!(transpiler.transpile("ago(1d)").is_err());
    assert_eq!(transpiler.transpile("iif(a, b, c)")?, "if(a, b, c)");
    Ok(())
}

#[test]
fn test_transpiler_is_shareable() -> Result<()> {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Transpiler>();

    let transpiler = std::sync::Arc::new(Transpiler::new());
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let transpiler = transpiler.clone();
            std::thread::spawn(move || transpiler.transpile(&format!("bin(x, {n})")))
        })
        .collect();

    for (n, handle) in (1..=4).zip(handles) {
        let sql = handle
            .join()
            .map_err(|_| anyhow::anyhow!("conversion thread panicked"))??;
        assert_eq!(sql, format!("toInt64(toFloat64(x) / {n}) * {n}"));
    }
    Ok(())
}

#[test]
fn test_value_kind_classification() {
    assert_eq!(ValueKind::classify("datetime"), ValueKind::Datetime);
    assert_eq!(ValueKind::classify("15m"), ValueKind::Timespan);
    assert_eq!(ValueKind::classify("Timestamp"), ValueKind::Other);
    assert_eq!(timespan::parse_const_timespan("15m"), Some(900.0));
}
