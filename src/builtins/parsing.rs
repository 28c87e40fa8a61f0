// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::builtins::utils::{ensure_string, function_error, optional_arg, target_text};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::{Map, Value};

use serde::Serialize;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use MethodCategory::Parsing;

    r.register_method(
        MethodSpec::new("parse_json", MethodImpl::Eager(parse_json))
            .description("Parses a JSON string or bytes into a structured value.")
            .in_category(Parsing, "", vec![])
            .example(Example::new(
                "",
                "root.doc = this.doc.parse_json()",
                &[(r#"{"doc":"{\"foo\":\"bar\"}"}"#, r#"{"doc":{"foo":"bar"}}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("format_json", MethodImpl::Eager(format_json))
            .description(
                "Serializes a value into a JSON string. Output is compact unless an indent \
                 is given.",
            )
            .optional_param("indent", "Indentation placed before each nesting level.")
            .in_category(Parsing, "", vec![])
            .example(Example::new(
                "",
                "root.doc = this.doc.format_json()",
                &[(r#"{"doc":{"foo":"bar"}}"#, r#"{"doc":"{\"foo\":\"bar\"}"}"#)],
            ))
            .example(Example::new(
                "",
                r#"root = this.doc.format_json("  ")"#,
                &[(r#"{"doc":{"foo":"bar"}}"#, r#""{\n  \"foo\": \"bar\"\n}""#)],
            )),
    )?;
    #[cfg(feature = "yaml")]
    {
        r.register_method(
            MethodSpec::new("parse_yaml", MethodImpl::Eager(parse_yaml))
                .description("Parses a YAML string or bytes into a structured value.")
                .in_category(Parsing, "", vec![])
                .example(Example::new(
                    "",
                    "root.doc = this.doc.parse_yaml()",
                    &[(r#"{"doc":"foo: bar"}"#, r#"{"doc":{"foo":"bar"}}"#)],
                )),
        )?;
        r.register_method(
            MethodSpec::new("format_yaml", MethodImpl::Eager(format_yaml))
                .description("Serializes a value into a YAML string.")
                .in_category(Parsing, "", vec![])
                .example(Example::new(
                    "",
                    "root = this.doc.format_yaml()",
                    &[(r#"{"doc":{"foo":"bar"}}"#, r#""foo: bar\n""#)],
                )),
        )?;
    }
    r.register_method(
        MethodSpec::new("parse_url", MethodImpl::Eager(parse_url))
            .description(
                "Parses a URL into an object with the fields `scheme`, `username`, \
                 `password`, `host`, `port`, `path`, `raw_query` and `fragment`.",
            )
            .in_category(Parsing, "", vec![])
            .example(Example::new(
                "",
                "root.domain = this.url.parse_url().host",
                &[(
                    r#"{"url":"https://www.example.com/foo?bar=baz"}"#,
                    r#"{"domain":"www.example.com"}"#,
                )],
            ))
            .example(Example::new(
                "",
                "root.query = this.url.parse_url().raw_query",
                &[(r#"{"url":"https://www.example.com/foo?bar=baz"}"#, r#"{"query":"bar=baz"}"#)],
            )),
    )?;
    Ok(())
}

fn parse_json(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let text = target_text("parse_json", span, target)?;
    Value::from_json_str(&text).map_err(|e| function_error("parse_json", span, e.to_string()))
}

fn format_json(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let serialized = match optional_arg(args, 0) {
        None => serde_json::to_string(target),
        Some(indent) => {
            let indent = ensure_string("format_json", params, 0, indent)?;
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut buf = vec![];
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            target
                .serialize(&mut ser)
                .map(|_| String::from_utf8_lossy(&buf).into_owned())
        }
    };
    serialized
        .map(Value::from)
        .map_err(|e| function_error("format_json", span, e.to_string()))
}

#[cfg(feature = "yaml")]
fn parse_yaml(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let text = target_text("parse_yaml", span, target)?;
    Value::from_yaml_str(&text).map_err(|e| function_error("parse_yaml", span, e.to_string()))
}

#[cfg(feature = "yaml")]
fn format_yaml(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    serde_yaml::to_string(target)
        .map(Value::from)
        .map_err(|e| function_error("format_yaml", span, e.to_string()))
}

fn parse_url(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let text = target_text("parse_url", span, target)?;
    let url = url::Url::parse(&text)
        .map_err(|e| function_error("parse_url", span, format!("invalid url `{text}`: {e}")))?;

    let optional = |v: Option<&str>| v.map(Value::from).unwrap_or(Value::Null);
    let mut fields = Map::new();
    fields.insert("scheme".into(), Value::from(url.scheme()));
    fields.insert("username".into(), Value::from(url.username()));
    fields.insert("password".into(), optional(url.password()));
    fields.insert("host".into(), optional(url.host_str()));
    fields.insert(
        "port".into(),
        url.port().map(|p| Value::from(p as u64)).unwrap_or(Value::Null),
    );
    fields.insert("path".into(), Value::from(url.path()));
    fields.insert("raw_query".into(), Value::from(url.query().unwrap_or("")));
    fields.insert("fragment".into(), Value::from(url.fragment().unwrap_or("")));
    Ok(Value::from(fields))
}
