// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use bloblang::*;

fn message(json: &str) -> Message {
    Message::new(Value::from_json_str(json).unwrap())
}

#[test]
fn interpolates_expressions() -> Result<()> {
    let field = Field::parse("id-${! this.id }")?;
    assert!(!field.is_static());
    assert_eq!(field.string(0, &[message(r#"{"id":"foo"}"#)]), "id-foo");
    Ok(())
}

#[test]
fn failed_interpolations_contribute_nothing() -> Result<()> {
    let field = Field::parse("id-${! this.id }")?;
    let (s, errors) = field.string_with_errors(0, &[message("{}")]);
    assert_eq!(s, "id-");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::FieldNotFound);
    // Logged rather than returned.
    assert_eq!(field.string(0, &[message("{}")]), "id-");
    Ok(())
}

#[test]
fn static_text_and_escapes() -> Result<()> {
    let field = Field::parse("plain text")?;
    assert!(field.is_static());
    assert_eq!(field.string(0, &[]), "plain text");

    let escaped = Field::parse("literal $${! this.x } and ${! this.x }")?;
    assert_eq!(
        escaped.string(0, &[message(r#"{"x":1}"#)]),
        "literal ${! this.x } and 1"
    );
    Ok(())
}

#[test]
fn values_are_stringified() -> Result<()> {
    let field = Field::parse(
        "${! this.s }|${! this.n }|${! this.b }|${! this.z }|${! this.o }|${! deleted() }",
    )?;
    let m = message(r#"{"s":"str","n":1.5,"b":true,"z":null,"o":{"k":[1]}}"#);
    assert_eq!(field.string(0, &[m]), r#"str|1.5|true|null|{"k":[1]}|"#);
    Ok(())
}

#[test]
fn multiple_interpolations_and_batches() -> Result<()> {
    let field = Field::parse(
        r#"${! batch_index() } of ${! batch_size() }: ${! meta("topic").or("none") }"#,
    )?;
    let batch = [
        message("{}").with_metadata("topic", "a"),
        message("{}"),
    ];
    assert_eq!(field.string(0, &batch), "0 of 2: a");
    assert_eq!(field.string(1, &batch), "1 of 2: none");
    assert_eq!(field.bytes(1, &batch), b"1 of 2: none".to_vec());
    Ok(())
}

#[test]
fn nested_braces_inside_expressions() -> Result<()> {
    let field = Field::parse(r#"${! {"a": this.x}.a }-${! if true { "t" } else { "f" } }"#)?;
    assert_eq!(field.string(0, &[message(r#"{"x":"y"}"#)]), "y-t");
    Ok(())
}

#[test]
fn missing_message_reads_as_empty() -> Result<()> {
    let field = Field::parse("[${! this.a.catch(\"none\") }]")?;
    assert_eq!(field.string(5, &[]), "[none]");
    Ok(())
}

#[test]
fn parse_errors_point_into_the_field() -> Result<()> {
    let e = match Field::parse("abc ${! this.( }") {
        Ok(_) => bail!("field parsed"),
        Err(e) => e,
    };
    assert_eq!((e.line, e.col), (1, 16));
    assert!(e.message.contains("unexpected `}`"), "{e}");

    let e = match Field::parse("abc ${! this.a") {
        Ok(_) => bail!("field parsed"),
        Err(e) => e,
    };
    assert!(e.message.contains("expecting `}` to close the interpolation"), "{e}");
    assert_eq!((e.line, e.col), (1, 15));

    let e = match Field::parse("${! nope() }") {
        Ok(_) => bail!("field parsed"),
        Err(e) => e,
    };
    assert!(e.message.contains("unrecognised function `nope`"), "{e}");
    assert_eq!(e.col, 5);
    Ok(())
}

#[test]
fn fields_parse_against_an_environment() -> Result<()> {
    let env = Environment::new().without_functions(&["hostname"]);
    assert!(env.parse_field("${! hostname() }").is_err());
    assert!(Field::parse("${! hostname() }").is_ok());
    Ok(())
}

#[test]
fn lints_for_fields() {
    assert!(lint_field("ok ${! this.a }").is_empty());
    let lints = lint_field("line one\n${! this.( }");
    assert_eq!(lints.len(), 1);
    assert_eq!((lints[0].line, lints[0].column), (2, 12));
}

#[test]
fn deprecated_calls_in_fields_are_linted() {
    assert_eq!(
        lint_field("at ${! timestamp() } by ${! this.who.replace(\"a\", \"b\") }"),
        vec![
            Lint {
                line: 1,
                column: 8,
                message: "function `timestamp` is deprecated".to_string(),
            },
            Lint {
                line: 1,
                column: 38,
                message: "method `replace` is deprecated".to_string(),
            },
        ]
    );
    assert!(lint_field("${! now() }").is_empty());
}
