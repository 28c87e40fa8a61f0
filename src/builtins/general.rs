// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, ExprRef};
use crate::builtins::strings;
use crate::builtins::utils::mismatch;
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::lexer::Span;
use crate::registry::{Example, MethodSpec, Registry, RegistryError, Status};
use crate::value::Value;
use crate::*;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.register_method(
        MethodSpec::new("catch", MethodImpl::Lazy(catch))
            .description(
                "If the target query fails, the argument is returned instead. A named \
                 lambda receives the caught error.",
            )
            .param("fallback", "A query or named lambda to use when the target fails.")
            .example(Example::new(
                "",
                r#"root.doc.id = this.thing.id.string().catch("unknown")"#,
                &[
                    (r#"{"thing":{"id":123}}"#, r#"{"doc":{"id":"123"}}"#),
                    (r#"{"thing":{}}"#, r#"{"doc":{"id":"unknown"}}"#),
                ],
            ))
            .example(Example::new(
                "The error can be inspected by passing a named lambda.",
                r#"root.result = this.count.number().catch(err -> err.type())"#,
                &[(r#"{"count":"nope"}"#, r#"{"result":"error"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("or", MethodImpl::Lazy(or))
            .description(
                "If the target query fails or yields null, the argument is returned instead.",
            )
            .param("fallback", "A query to use when the target is null or fails.")
            .example(Example::new(
                "",
                r#"root.doc.id = this.thing.id.or(this.other_id)"#,
                &[
                    (r#"{"thing":{"id":"a"},"other_id":"b"}"#, r#"{"doc":{"id":"a"}}"#),
                    (r#"{"thing":{"id":null},"other_id":"b"}"#, r#"{"doc":{"id":"b"}}"#),
                    (r#"{"other_id":"b"}"#, r#"{"doc":{"id":"b"}}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("type", MethodImpl::Eager(type_))
            .description(
                "Returns the type of a value as one of `null`, `bool`, `number`, `string`, \
                 `bytes`, `array`, `object`, `deleted` or `error`.",
            )
            .example(Example::new(
                "",
                "root.bar_type = this.bar.type()\nroot.foo_type = this.foo.type()",
                &[(
                    r#"{"bar":10,"foo":"is a string"}"#,
                    r#"{"bar_type":"number","foo_type":"string"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("not", MethodImpl::Eager(not))
            .description("Returns the inverse of a boolean.")
            .example(Example::new(
                "",
                "root.not_foo = this.foo.not()",
                &[(r#"{"foo":true}"#, r#"{"not_foo":false}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("from", MethodImpl::Lazy(from))
            .description(
                "Executes the target query against another message of the batch, \
                 identified by its index.",
            )
            .param("index", "The index of the message within the batch.")
            .example(Example::new(
                "",
                "root.first = this.id.from(0)",
                &[(r#"{"id":"a"}"#, r#"{"first":"a"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("upper", MethodImpl::Eager(strings::uppercase))
            .status(Status::Hidden)
            .description("Converts all letters of a string to upper case."),
    )?;
    Ok(())
}

fn catch(
    i: &mut Interpreter<'_>,
    _span: &Span,
    target: &ExprRef,
    params: &[ExprRef],
) -> EvalResult {
    match i.eval(target) {
        Ok(v) => Ok(v),
        Err(e) => match params[0].as_ref() {
            Expr::Lambda { .. } => i.eval_lambda(&params[0], Value::Error(Rc::new(e))),
            _ => i.eval(&params[0]),
        },
    }
}

fn or(i: &mut Interpreter<'_>, _span: &Span, target: &ExprRef, params: &[ExprRef]) -> EvalResult {
    match i.eval(target) {
        Ok(Value::Null) | Err(_) => i.eval(&params[0]),
        Ok(v) => Ok(v),
    }
}

fn type_(_span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::from(target.kind()))
}

fn not(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    match target {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => Err(mismatch("not", span, None, "bool", target)),
    }
}

fn from(i: &mut Interpreter<'_>, span: &Span, target: &ExprRef, params: &[ExprRef]) -> EvalResult {
    let index = match i.eval(&params[0])? {
        Value::Number(n) => match n.as_usize() {
            Some(idx) => idx,
            None => {
                return Err(mismatch(
                    "from",
                    params[0].span(),
                    Some(1),
                    "non-negative integer",
                    &Value::Number(n),
                ))
            }
        },
        v => return Err(mismatch("from", params[0].span(), Some(1), "integer", &v)),
    };
    i.eval_in_message(span, index, target)
}
