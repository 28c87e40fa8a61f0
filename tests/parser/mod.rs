// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use bloblang::unstable::*;
use bloblang::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Case {
    pub note: String,
    pub mapping: String,
    pub error: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
    // Number of statements of a successful parse.
    pub statements: Option<usize>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn check_case(case: &Case) -> Result<()> {
    match (Mapping::parse("case.blobl", &case.mapping), &case.error) {
        (Ok(m), None) => {
            if let Some(n) = case.statements {
                assert_eq!(m.program().statements.len(), n, "statement count");
            }
        }
        (Ok(_), Some(e)) => bail!("expected error `{e}` but parsing succeeded"),
        (Err(actual), None) => bail!("unexpected error: {actual}"),
        (Err(actual), Some(expected)) => {
            if !actual.message.contains(expected.as_str()) {
                bail!(
                    "Error message\n`{}\n`\ndoes not contain `{}`",
                    actual,
                    expected
                );
            }
            if let Some(line) = case.line {
                assert_eq!(actual.line, line, "line of `{actual}`");
            }
            if let Some(col) = case.col {
                assert_eq!(actual.col, col, "column of `{actual}`");
            }
            let (line, col) = line_and_col_of(&case.mapping, actual.offset as usize);
            assert_eq!(
                (line as u32, col as u32),
                (actual.line, actual.col),
                "offset of `{actual}` disagrees with its position"
            );
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {}", file);

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        check_case(case)?;
        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let Some(file) = env::args().find(|a| a.ends_with(".yaml")) else {
        bail!("missing yaml test file");
    };

    yaml_test(file.as_str())
}

#[test_resources("tests/parser/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

fn starts(program: &Program) -> Vec<u32> {
    let mut offsets = vec![];
    program.walk(&mut |e| offsets.push(e.span().start));
    offsets
}

#[test]
fn node_offsets_follow_source_order() -> Result<()> {
    let mapping = Mapping::parse(
        "offsets",
        r#"root.a = this.b.uppercase() + "x"
let tmp = [1, -2, {"k": this.c}]
root.b = if $tmp.length() > 2 { "many" } else { "few" }
root.c = this.items.map_each(i -> i.value * 2).filter(v -> v > 0)"#,
    )?;
    let offsets = starts(mapping.program());
    assert!(!offsets.is_empty());
    for pair in offsets.windows(2) {
        assert!(pair[0] <= pair[1], "offsets out of order: {offsets:?}");
    }
    Ok(())
}

#[test]
fn lambda_parameters_resolve_to_params() -> Result<()> {
    let mapping = Mapping::parse("lambda", "root = this.things.map_each(t -> t.name + suffix)")?;
    let mut params = vec![];
    let mut fields = vec![];
    mapping.program().walk(&mut |e| match e {
        Expr::Param { name, .. } => params.push(name.to_string()),
        Expr::RefDot { field, .. } => fields.push(field.0.text().to_string()),
        _ => (),
    });
    assert_eq!(params, vec!["t"]);
    // `suffix` is not a parameter and reads `this.suffix`.
    assert_eq!(fields, vec!["things", "name", "suffix"]);
    Ok(())
}

#[test]
fn negative_literals_are_folded() -> Result<()> {
    let mapping = Mapping::parse("neg", "root = -3")?;
    let mut nodes = vec![];
    mapping.program().walk(&mut |e| nodes.push(e));
    assert_eq!(nodes.len(), 1);
    match nodes[0] {
        Expr::Number { value, span } => {
            assert_eq!(value, &Value::from(-3));
            assert_eq!(span.text(), "-3");
        }
        e => bail!("unexpected node {e:?}"),
    }
    Ok(())
}

#[test]
fn bare_targets_are_root_paths() -> Result<()> {
    let mapping = Mapping::parse("targets", "foo.bar = 1\n\"a b\".0 = 2\nmeta topic = \"t\"")?;
    let targets: Vec<_> = mapping
        .program()
        .statements
        .iter()
        .map(|s| match s {
            Statement::Assign { target, .. } => format!("{target:?}"),
            Statement::Let { .. } => String::new(),
        })
        .collect();
    assert!(targets[0].contains("Key(\"foo\")") && targets[0].contains("Key(\"bar\")"));
    assert!(targets[1].contains("Key(\"a b\")") && targets[1].contains("Index(0)"));
    assert!(targets[2].starts_with("Meta"));
    Ok(())
}

#[test]
fn imports_use_the_environment_resolver() -> Result<()> {
    let env = Environment::new().with_import_resolver(|path| match path {
        "shared.blobl" => Ok("root.shared = true".to_string()),
        _ => bail!("no such mapping"),
    });
    let mapping = env.parse_mapping("main", r#"from "shared.blobl""#)?;
    assert_eq!(mapping.exec(&Value::new_object())?, Value::from_json_str(r#"{"shared":true}"#)?);

    let e = match env.parse_mapping("main", r#"from "missing.blobl""#) {
        Ok(_) => bail!("missing import parsed"),
        Err(e) => e,
    };
    assert!(e.message.contains("failed to read import `missing.blobl`"), "{e}");
    assert_eq!((e.line, e.col), (1, 1));
    Ok(())
}

#[test]
fn recursive_imports_are_bounded() -> Result<()> {
    let env = Environment::new().with_import_resolver(|_| Ok(r#"from "self.blobl""#.to_string()));
    match env.parse_mapping("main", r#"from "self.blobl""#) {
        Ok(_) => bail!("recursive import parsed"),
        Err(e) => assert!(e.message.contains("maximum import depth"), "{e}"),
    }
    Ok(())
}
