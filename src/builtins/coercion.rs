// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::builtins::utils::{function_error, mismatch, optional_arg};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use MethodCategory::Coercion;

    r.register_method(
        MethodSpec::new("string", MethodImpl::Eager(string))
            .description(
                "Converts a value into a string. Structured values are serialized as JSON.",
            )
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.nested_json = this.string()",
                &[(r#"{"foo":"bar"}"#, r#"{"nested_json":"{\"foo\":\"bar\"}"}"#)],
            ))
            .example(Example::new(
                "",
                "root.id = this.id.string()",
                &[(r#"{"id":228}"#, r#"{"id":"228"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("number", MethodImpl::Eager(number))
            .description(
                "Converts a number or numeric string into a number. When a default is \
                 given it is returned if the conversion fails.",
            )
            .optional_param("default", "A value to return when the conversion fails.")
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.outcome = this.outcome.number()",
                &[(r#"{"outcome":"5"}"#, r#"{"outcome":5}"#)],
            ))
            .example(Example::new(
                "",
                "root.outcome = this.outcome.number(0)",
                &[(r#"{"outcome":"nope"}"#, r#"{"outcome":0}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("bool", MethodImpl::Eager(to_bool))
            .description(
                "Converts a bool, a `true`/`false` string or a number into a bool. When a \
                 default is given it is returned if the conversion fails.",
            )
            .optional_param("default", "A value to return when the conversion fails.")
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.foo = this.thing.bool()\nroot.bar = this.thing.bool(true)",
                &[(r#"{"thing":"false"}"#, r#"{"bar":false,"foo":false}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("bytes", MethodImpl::Eager(bytes))
            .description("Converts a value into bytes.")
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.first_byte = this.name.bytes().index(0)",
                &[(r#"{"name":"foobar bazson"}"#, r#"{"first_byte":102}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("array", MethodImpl::Eager(array))
            .description("Wraps a non-array value in an array. Arrays are returned unchanged.")
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.foo = this.foo.array()",
                &[
                    (r#"{"foo":"bar"}"#, r#"{"foo":["bar"]}"#),
                    (r#"{"foo":["bar","baz"]}"#, r#"{"foo":["bar","baz"]}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("not_null", MethodImpl::Eager(not_null))
            .description("Returns the value unchanged, or fails when it is null.")
            .in_category(Coercion, "", vec![])
            .example(Example::new(
                "",
                "root.a = this.a.not_null()",
                &[(r#"{"a":"foo"}"#, r#"{"a":"foo"}"#)],
            )),
    )?;
    Ok(())
}

fn string(_span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(match target {
        Value::String(_) => target.clone(),
        _ => Value::from(target.to_text()),
    })
}

fn parse_number(s: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(s.trim()) {
        Ok(v @ Value::Number(_)) => Some(v),
        _ => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::from),
    }
}

fn number(span: &Span, _params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let converted = match target {
        Value::Number(_) => Ok(target.clone()),
        Value::String(_) | Value::Bytes(_) => {
            let text = target.to_text();
            parse_number(&text)
                .ok_or_else(|| function_error("number", span, format!("`{text}` is not a number")))
        }
        _ => Err(mismatch("number", span, None, "number or string", target)),
    };
    match (converted, optional_arg(args, 0)) {
        (Ok(v), _) => Ok(v),
        (Err(_), Some(default)) => Ok(default.clone()),
        (Err(e), None) => Err(e),
    }
}

fn to_bool(span: &Span, _params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let converted = match target {
        Value::Bool(_) => Ok(target.clone()),
        Value::Number(n) => Ok(Value::Bool(n.as_f64() != 0.0)),
        Value::String(s) => match s.as_ref() {
            "true" | "TRUE" | "True" | "t" | "T" | "1" => Ok(Value::Bool(true)),
            "false" | "FALSE" | "False" | "f" | "F" | "0" => Ok(Value::Bool(false)),
            _ => Err(function_error("bool", span, format!("`{s}` is not a bool"))),
        },
        _ => Err(mismatch("bool", span, None, "bool, number or string", target)),
    };
    match (converted, optional_arg(args, 0)) {
        (Ok(v), _) => Ok(v),
        (Err(_), Some(default)) => Ok(default.clone()),
        (Err(e), None) => Err(e),
    }
}

fn bytes(_span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(match target {
        Value::Bytes(_) => target.clone(),
        _ => Value::from(target.to_bytes()),
    })
}

fn array(_span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(match target {
        Value::Array(_) => target.clone(),
        _ => Value::from(vec![target.clone()]),
    })
}

fn not_null(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    match target {
        Value::Null => Err(function_error("not_null", span, "value is null")),
        _ => Ok(target.clone()),
    }
}
