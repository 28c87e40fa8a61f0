// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{ArithOp, Expr, ExprRef};
use crate::builtins::utils::{function_error, mismatch, target_array, target_number};
use crate::builtins::MethodImpl;
use crate::error::{EvalError, EvalResult};
use crate::lexer::Span;
use crate::number::Number;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

use std::cmp::Ordering;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.register_method(
        MethodSpec::new("abs", MethodImpl::Eager(abs))
            .description("Returns the absolute value of a number.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.outcome = this.value.abs()",
                &[
                    (r#"{"value":5.3}"#, r#"{"outcome":5.3}"#),
                    (r#"{"value":-5.9}"#, r#"{"outcome":5.9}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("ceil", MethodImpl::Eager(ceil))
            .description("Returns the least integer value greater than or equal to a number.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.new_value = this.value.ceil()",
                &[
                    (r#"{"value":5.3}"#, r#"{"new_value":6}"#),
                    (r#"{"value":-5.9}"#, r#"{"new_value":-5}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("floor", MethodImpl::Eager(floor))
            .description("Returns the greatest integer value less than or equal to a number.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.new_value = this.value.floor()",
                &[(r#"{"value":5.7}"#, r#"{"new_value":5}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("round", MethodImpl::Eager(round))
            .description("Rounds a number to the nearest integer, half away from zero.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.new_value = this.value.round()",
                &[
                    (r#"{"value":5.3}"#, r#"{"new_value":5}"#),
                    (r#"{"value":5.9}"#, r#"{"new_value":6}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("max", MethodImpl::Eager(max))
            .description("Returns the largest number of an array of numbers.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.biggest = this.values.max()",
                &[(r#"{"values":[0,3,2.5,7,5]}"#, r#"{"biggest":7}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("min", MethodImpl::Eager(min))
            .description("Returns the smallest number of an array of numbers.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .example(Example::new(
                "",
                "root.smallest = this.values.min()",
                &[(r#"{"values":[0,3,-2.5,7,5]}"#, r#"{"smallest":-2.5}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("sum", MethodImpl::Eager(sum))
            .description("Sums the numerical values of an array.")
            .in_category(MethodCategory::Numbers, "", vec![])
            .in_category(MethodCategory::ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.sum = this.foo.sum()",
                &[(r#"{"foo":[3,8,4]}"#, r#"{"sum":15}"#)],
            )),
    )?;
    Ok(())
}

fn operand_error(op: &ArithOp, expr: &Expr, expected: &str, v: &Value) -> EvalError {
    let symbol = match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::Mod => "%",
    };
    EvalError::TypeMismatch {
        pos: expr.span().position(),
        subject: format!("operator `{symbol}`"),
        argument: None,
        expected: expected.to_string(),
        got: v.kind().to_string(),
    }
}

/// Applies an arithmetic operator. `+` also concatenates strings and bytes.
pub fn arithmetic_operation(
    span: &Span,
    op: &ArithOp,
    expr1: &ExprRef,
    expr2: &ExprRef,
    v1: Value,
    v2: Value,
) -> EvalResult {
    let (n1, n2) = match (op, &v1, &v2) {
        (ArithOp::Add, Value::String(a), Value::String(b)) => {
            return Ok(Value::from(format!("{a}{b}")));
        }
        (ArithOp::Add, Value::Bytes(a), Value::Bytes(b)) => {
            let mut bytes = a.as_ref().clone();
            bytes.extend_from_slice(b);
            return Ok(Value::from(bytes));
        }
        (_, Value::Number(a), Value::Number(b)) => (*a, *b),
        (ArithOp::Add, Value::String(_), _) => return Err(operand_error(op, expr2, "string", &v2)),
        (ArithOp::Add, Value::Bytes(_), _) => return Err(operand_error(op, expr2, "bytes", &v2)),
        (_, Value::Number(_), _) => return Err(operand_error(op, expr2, "number", &v2)),
        _ => return Err(operand_error(op, expr1, "number", &v1)),
    };

    let n = match op {
        ArithOp::Add => n1.add(&n2),
        ArithOp::Sub => n1.sub(&n2),
        ArithOp::Mul => n1.mul(&n2),
        ArithOp::Div => match n1.divide(&n2) {
            Some(n) => n,
            None => return Err(function_error("/", span, "attempted to divide by zero")),
        },
        ArithOp::Mod => match n1.modulo(&n2) {
            Some(n) => n,
            None => return Err(function_error("%", span, "attempted to divide by zero")),
        },
    };
    Ok(Value::Number(n))
}

fn abs(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::Number(target_number("abs", span, target)?.abs()))
}

fn ceil(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::Number(target_number("ceil", span, target)?.ceil()))
}

fn floor(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::Number(target_number("floor", span, target)?.floor()))
}

fn round(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::Number(target_number("round", span, target)?.round()))
}

fn numbers_of(fcn: &str, span: &Span, target: &Value) -> EvalResult<Vec<Number>> {
    target_array(fcn, span, target)?
        .iter()
        .map(|v| match v {
            Value::Number(n) => Ok(*n),
            _ => Err(mismatch(fcn, span, None, "array of numbers", v)),
        })
        .collect()
}

fn extreme(fcn: &str, span: &Span, target: &Value, want: Ordering) -> EvalResult {
    let numbers = numbers_of(fcn, span, target)?;
    let mut iter = numbers.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(function_error(fcn, span, "the array is empty"));
    };
    for n in iter {
        if n.compare(&best) == want {
            best = n;
        }
    }
    Ok(Value::Number(best))
}

fn max(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    extreme("max", span, target, Ordering::Greater)
}

fn min(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    extreme("min", span, target, Ordering::Less)
}

fn sum(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    let total = numbers_of("sum", span, target)?
        .iter()
        .fold(Number::Int(0), |acc, n| acc.add(n));
    Ok(Value::Number(total))
}
