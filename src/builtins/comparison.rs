// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::BoolOp;
use crate::error::{EvalError, EvalResult};
use crate::lexer::Span;
use crate::value::Value;

/// Compares two values.
///
/// Equality is deep and treats integers and floats with the same value as
/// equal. Ordering is only defined between two numbers or two strings; any
/// other pairing is a type mismatch.
pub fn compare(span: &Span, op: &BoolOp, v1: &Value, v2: &Value) -> EvalResult {
    let ord = match op {
        BoolOp::Eq => return Ok(Value::Bool(v1 == v2)),
        BoolOp::Ne => return Ok(Value::Bool(v1 != v2)),
        _ => v1.compare(v2),
    };
    let Some(ord) = ord else {
        let symbol = match op {
            BoolOp::Lt => "<",
            BoolOp::Le => "<=",
            BoolOp::Gt => ">",
            _ => ">=",
        };
        let (expected, got) = match v1 {
            Value::Number(_) | Value::String(_) => (v1.kind(), v2.kind()),
            _ => ("number or string", v1.kind()),
        };
        return Err(EvalError::TypeMismatch {
            pos: span.position(),
            subject: format!("operator `{symbol}`"),
            argument: None,
            expected: expected.to_string(),
            got: got.to_string(),
        });
    };
    Ok(Value::Bool(match op {
        BoolOp::Lt => ord.is_lt(),
        BoolOp::Le => ord.is_le(),
        BoolOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    }))
}
