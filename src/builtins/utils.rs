// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::error::{EvalError, EvalResult};
use crate::lexer::Span;
use crate::number::Number;
use crate::value::{Map, Value};
use crate::Rc;

pub fn mismatch(
    fcn: &str,
    span: &Span,
    argument: Option<usize>,
    expected: &str,
    v: &Value,
) -> EvalError {
    EvalError::TypeMismatch {
        pos: span.position(),
        subject: format!("`{fcn}`"),
        argument,
        expected: expected.to_string(),
        got: v.kind().to_string(),
    }
}

pub fn function_error(fcn: &str, span: &Span, message: impl Into<String>) -> EvalError {
    EvalError::Function {
        pos: span.position(),
        name: fcn.to_string(),
        message: message.into(),
    }
}

fn arg_mismatch(
    fcn: &str,
    params: &[Ref<Expr>],
    idx: usize,
    expected: &str,
    v: &Value,
) -> EvalError {
    let span = params[idx].span();
    mismatch(fcn, span, Some(idx + 1), expected, v)
}

pub fn ensure_string(
    fcn: &str,
    params: &[Ref<Expr>],
    idx: usize,
    v: &Value,
) -> EvalResult<Rc<str>> {
    match v {
        Value::String(s) => Ok(s.clone()),
        _ => Err(arg_mismatch(fcn, params, idx, "string", v)),
    }
}

pub fn ensure_integer(fcn: &str, params: &[Ref<Expr>], idx: usize, v: &Value) -> EvalResult<i64> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => Err(arg_mismatch(fcn, params, idx, "integer", v)),
        },
        _ => Err(arg_mismatch(fcn, params, idx, "integer", v)),
    }
}

/// Optional trailing argument.
pub fn optional_arg(args: &[Value], idx: usize) -> Option<&Value> {
    args.get(idx)
}

/// Strings and bytes both read as text.
pub fn target_text(fcn: &str, span: &Span, v: &Value) -> EvalResult<String> {
    match v {
        Value::String(s) => Ok(s.to_string()),
        Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        _ => Err(mismatch(fcn, span, None, "string", v)),
    }
}

pub fn target_number(fcn: &str, span: &Span, v: &Value) -> EvalResult<Number> {
    match v {
        Value::Number(n) => Ok(*n),
        _ => Err(mismatch(fcn, span, None, "number", v)),
    }
}

pub fn target_array(fcn: &str, span: &Span, v: &Value) -> EvalResult<Rc<Vec<Value>>> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        _ => Err(mismatch(fcn, span, None, "array", v)),
    }
}

pub fn target_object(fcn: &str, span: &Span, v: &Value) -> EvalResult<Rc<Map>> {
    match v {
        Value::Object(o) => Ok(o.clone()),
        _ => Err(mismatch(fcn, span, None, "object", v)),
    }
}

/// Resolves a possibly negative index against `len`, clamping to `0..=len`.
pub fn clamp_index(idx: i64, len: usize) -> usize {
    let len_i = len as i64;
    let idx = if idx < 0 { len_i + idx } else { idx };
    idx.clamp(0, len_i) as usize
}
