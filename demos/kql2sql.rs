// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};
use kqlsql::{ConvertError, Transpiler, TranspilerOptions};
use std::io::BufRead;

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|_| anyhow!("could not read {path}"))
}

#[allow(unused_variables)]
fn read_options_from_yaml_file(path: &str) -> Result<TranspilerOptions> {
    #[cfg(feature = "yaml")]
    return TranspilerOptions::from_yaml_str(&read_file(path)?);

    #[cfg(not(feature = "yaml"))]
    bail!("kqlsql has not been built with yaml support");
}

fn load_options(cli: &Cli) -> Result<TranspilerOptions> {
    let mut options = match &cli.options {
        Some(path) if path.ends_with(".json") => {
            TranspilerOptions::from_json_str(&read_file(path)?)?
        }
        Some(path) if path.ends_with(".yaml") || path.ends_with(".yml") => {
            read_options_from_yaml_file(path)?
        }
        Some(path) => bail!("unknown options file type {path}"),
        None => TranspilerOptions::default(),
    };

    if cli.strict {
        options = options.with_strict_functions(true);
    }
    if let Some(max_depth) = cli.max_depth {
        options = options.with_max_depth(max_depth);
    }
    Ok(options)
}

fn json_result(kql: &str, result: &Result<String>) -> serde_json::Value {
    match result {
        Ok(sql) => serde_json::json!({ "kql": kql, "sql": sql }),
        Err(e) => match e.downcast_ref::<ConvertError>() {
            Some(err) => serde_json::json!({
                "kql": kql,
                "error": {
                    "kind": err.kind(),
                    "function": err.function(),
                    "token": err.token(),
                    "message": err.to_string(),
                }
            }),
            None => serde_json::json!({ "kql": kql, "error": { "message": e.to_string() } }),
        },
    }
}

fn convert_all(transpiler: &Transpiler, expressions: Vec<String>, json: bool) -> Result<()> {
    let mut failures = 0;
    for kql in expressions {
        let result = transpiler.transpile(&kql);
        if json {
            println!("{}", serde_json::to_string(&json_result(&kql, &result))?);
        } else {
            match &result {
                Ok(sql) => println!("{sql}"),
                Err(e) => eprintln!("error: {e}"),
            }
        }
        if result.is_err() {
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} expression(s) failed to convert");
    }
    Ok(())
}

#[derive(clap::Parser)]
#[command(author, version, about = "Convert KQL builtin function calls into ClickHouse SQL")]
struct Cli {
    /// KQL expressions. Read one per line from stdin when none are given.
    expressions: Vec<String>,

    /// Options file. json or yaml.
    #[arg(long, short, value_name = "options.json|options.yaml")]
    options: Option<String>,

    /// Reject calls to functions that have no converter.
    #[arg(long, short)]
    strict: bool,

    /// Maximum nesting of builtin calls.
    #[arg(long, value_name = "depth")]
    max_depth: Option<usize>,

    /// Print one JSON object per expression.
    #[arg(long, short)]
    json: bool,
}

fn main() -> Result<()> {
    use clap::Parser;

    // Diagnostics go to stderr, filtered by RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transpiler = Transpiler::new().with_options(load_options(&cli)?);

    let expressions = if cli.expressions.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .collect::<std::io::Result<Vec<_>>>()?
    } else {
        cli.expressions.clone()
    };

    convert_all(&transpiler, expressions, cli.json)
}
