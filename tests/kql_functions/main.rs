// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! YAML-driven conversion cases
//!
//! Every file under `cases/` holds a list of KQL expressions together with the
//! SQL they must convert to, or the kind of error they must fail with.

use anyhow::{bail, Result};
use kqlsql::{ConvertError, ErrorKind, Transpiler, TranspilerOptions};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct FunctionTestCase {
    /// Description of the test case
    note: String,
    /// KQL expression to convert
    kql: String,
    /// Expected SQL output
    sql: Option<String>,
    /// Expected error kind (if conversion should fail)
    error: Option<ErrorKind>,
    /// Text the error message must contain
    message: Option<String>,
    /// Options for this case only
    options: Option<TranspilerOptions>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct FunctionYamlTest {
    cases: Vec<FunctionTestCase>,
}

fn check_case(case: &FunctionTestCase) -> Result<()> {
    let transpiler = Transpiler::new().with_options(case.options.clone().unwrap_or_default());

    match (transpiler.transpile(&case.kql), &case.error) {
        (Ok(actual), None) => {
            let Some(expected) = &case.sql else {
                bail!("case has neither `sql` nor `error`");
            };
            if &actual != expected {
                bail!("SQL mismatch:\nExpected:\n{expected}\n\nActual:\n{actual}");
            }
        }
        (Ok(actual), Some(kind)) => {
            bail!("Expected {kind:?} error but conversion produced `{actual}`");
        }
        (Err(e), None) => bail!("Unexpected error: {e}"),
        (Err(e), Some(kind)) => {
            let Some(err) = e.downcast_ref::<ConvertError>() else {
                bail!("Expected {kind:?} error but got `{e}`");
            };
            if err.kind() != *kind {
                bail!("Expected {kind:?} error but got {:?}: {err}", err.kind());
            }
            if let Some(message) = &case.message {
                if !err.to_string().contains(message.as_str()) {
                    bail!("Error `{err}` does not contain expected `{message}`");
                }
            }
        }
    }
    Ok(())
}

fn function_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml_str = std::fs::read_to_string(file)?;
    let test: FunctionYamlTest = serde_yaml::from_str(&yaml_str)?;

    for case in &test.cases {
        print!("\ncase {} ", case.note);
        if let Err(e) = check_case(case) {
            bail!("case `{}` failed: {e}", case.note);
        }
        println!("passed");
    }

    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn function_test(file: &str) -> Result<()> {
    match function_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/kql_functions/cases/*.yaml")]
fn run_function_tests(path: &str) {
    function_test(path).unwrap()
}
