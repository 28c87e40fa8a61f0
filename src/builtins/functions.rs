// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::builtins::utils::{ensure_integer, ensure_string, function_error, optional_arg};
use crate::builtins::FunctionImpl;
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::lexer::Span;
use crate::registry::{Example, FunctionCategory, FunctionSpec, Registry, RegistryError, Status};
use crate::value::{Map, Value};

use lazy_static::lazy_static;
use rand::{thread_rng, Rng};

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use FunctionCategory::*;

    r.register_function(
        FunctionSpec::new("deleted", General, FunctionImpl::Eager(deleted))
            .description(
                "A value that, when assigned, removes the target instead of writing to it. \
                 Within array and object literals the element is omitted.",
            )
            .example(Example::new(
                "",
                "root = this\nroot.bar = deleted()",
                &[(
                    r#"{"bar":"bar_value","baz":"baz_value","foo":"foo value"}"#,
                    r#"{"baz":"baz_value","foo":"foo value"}"#,
                )],
            ))
            .example(Example::new(
                "Elements of an array can be dropped by mapping them to `deleted()`.",
                "root.new_nums = this.nums.map_each(num -> if num < 10 { deleted() } else { num - 10 })",
                &[(r#"{"nums":[3,11,4,17]}"#, r#"{"new_nums":[1,7]}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("throw", General, FunctionImpl::Eager(throw))
            .description("Raises an error with the given message. It can be caught with `catch`.")
            .param("why", "A description of the error.")
            .example(Example::new(
                "",
                r#"root.doc.type = match this.exists("header.id") {
  true => "foo"
  _ => throw("unknown type")
}
root.doc.contents = (this.body.content | this.thing.body)"#,
                &[(
                    r#"{"header":{"id":"first"},"thing":{"body":"hello world"}}"#,
                    r#"{"doc":{"contents":"hello world","type":"foo"}}"#,
                )],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("range", General, FunctionImpl::Eager(range))
            .description(
                "Creates an array of integers from `start` up to, but not including, `stop`. \
                 At most 1048576 elements are produced.",
            )
            .param("start", "The first integer.")
            .param("stop", "The integer the sequence stops before.")
            .optional_param("step", "The amount to increase by, defaults to 1 or -1.")
            .example(Example::new(
                "",
                "root.a = range(0, 10)\nroot.b = range(0, 10, 2)\nroot.c = range(0, -4)",
                &[("{}", r#"{"a":[0,1,2,3,4,5,6,7,8,9],"b":[0,2,4,6,8],"c":[0,-1,-2,-3]}"#)],
            )),
    )?;

    r.register_function(
        FunctionSpec::new("content", Message, FunctionImpl::Eager(content))
            .description("Returns the full raw contents of the message as bytes.")
            .example(Example::new(
                "",
                "root.doc = content().string()",
                &[(r#"{"foo":"bar"}"#, r#"{"doc":"{\"foo\":\"bar\"}"}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("meta", Message, FunctionImpl::Eager(meta))
            .description(
                "Returns a metadata value of the input message as a string, or null when \
                 the key is missing. Without a key, all metadata is returned as an object.",
            )
            .optional_param("key", "The metadata key.")
            .example(Example::new(
                "",
                r#"root.topic = meta("kafka_topic")"#,
                &[("{}", r#"{"topic":null}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("batch_index", Message, FunctionImpl::Eager(batch_index))
            .description("Returns the index of the message within its batch.")
            .example(Example::new(
                "",
                "root.index = batch_index()",
                &[("{}", r#"{"index":0}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("batch_size", Message, FunctionImpl::Eager(batch_size))
            .description("Returns the size of the batch the message belongs to.")
            .example(Example::new(
                "",
                "root.size = batch_size()",
                &[("{}", r#"{"size":1}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("error", Message, FunctionImpl::Eager(error))
            .description(
                "Returns the error flagged on the message by an earlier processing stage, \
                 or null.",
            )
            .example(Example::new(
                "",
                "root.doc.error = error()",
                &[("{}", r#"{"doc":{"error":null}}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("errored", Message, FunctionImpl::Eager(errored))
            .description("Whether the message has been flagged with an error.")
            .example(Example::new(
                "",
                "root.failed = errored()",
                &[("{}", r#"{"failed":false}"#)],
            )),
    )?;
    r.register_function(
        FunctionSpec::new("json", Message, FunctionImpl::Eager(json))
            .description(
                "Returns a value of the input document at a dot separated path, or null \
                 when it does not exist. Without a path the whole document is returned.",
            )
            .optional_param("path", "A dot separated path.")
            .example(Example::new(
                "",
                r#"root.doc = json("foo.bar")"#,
                &[
                    (r#"{"foo":{"bar":"hello world"}}"#, r#"{"doc":"hello world"}"#),
                    (r#"{"foo":{}}"#, r#"{"doc":null}"#),
                ],
            )),
    )?;

    r.register_function(
        FunctionSpec::new("env", Environment, FunctionImpl::Eager(env))
            .description("Returns an environment variable as a string, or null when unset.")
            .param("name", "The variable name.")
            .example(Example::new("", r#"root.thing.key = env("key")"#, &[])),
    )?;
    r.register_function(
        FunctionSpec::new("hostname", Environment, FunctionImpl::Eager(hostname))
            .description("Returns the hostname of the machine.")
            .example(Example::new("", "root.thing.host = hostname()", &[])),
    )?;
    r.register_function(
        FunctionSpec::new("now", Environment, FunctionImpl::Eager(now))
            .description("Returns the current local time as an RFC 3339 string.")
            .example(Example::new("", "root.received_at = now()", &[])),
    )?;
    r.register_function(
        FunctionSpec::new("timestamp_unix", Environment, FunctionImpl::Eager(timestamp_unix))
            .description("Returns the current unix timestamp in seconds.")
            .example(Example::new("", "root.received_at = timestamp_unix()", &[])),
    )?;
    r.register_function(
        FunctionSpec::new("uuid_v4", Environment, FunctionImpl::Eager(uuid_v4))
            .description("Generates a new random version 4 UUID.")
            .example(Example::new("", "root.id = uuid_v4()", &[])),
    )?;
    r.register_function(
        FunctionSpec::new("random_int", Environment, FunctionImpl::Eager(random_int))
            .description("Generates a pseudo-random integer within an inclusive range.")
            .optional_param("min", "The lower bound, defaults to 0.")
            .optional_param("max", "The upper bound, defaults to the largest integer.")
            .example(Example::new("", "root.first = random_int(0, 10)", &[])),
    )?;

    r.register_function(
        FunctionSpec::new("var", General, FunctionImpl::Eager(var))
            .status(Status::Hidden)
            .description("Returns the value of a variable bound with `let`.")
            .param("name", "The variable name."),
    )?;
    Ok(())
}

fn deleted(_: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::Deleted)
}

fn throw(_: &Interpreter<'_>, span: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let why = ensure_string("throw", params, 0, &args[0])?;
    Err(EvalError::User {
        pos: span.position(),
        message: why.to_string(),
    })
}

// Largest array `range` builds.
const MAX_RANGE_LEN: usize = 1 << 20;

fn range(_: &Interpreter<'_>, span: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let fcn = "range";
    let start = ensure_integer(fcn, params, 0, &args[0])?;
    let stop = ensure_integer(fcn, params, 1, &args[1])?;
    let step = match optional_arg(args, 2) {
        Some(v) => ensure_integer(fcn, params, 2, v)?,
        None if stop < start => -1,
        None => 1,
    };
    if step == 0 {
        return Err(function_error(fcn, span, "step must not be zero"));
    }
    if (stop > start && step < 0) || (stop < start && step > 0) {
        return Err(function_error(
            fcn,
            span,
            format!("step {step} does not lead from {start} to {stop}"),
        ));
    }

    let len = (i128::from(stop) - i128::from(start)).abs() as u128;
    let count = len.div_ceil(i128::from(step).unsigned_abs());
    if count > MAX_RANGE_LEN as u128 {
        return Err(function_error(
            fcn,
            span,
            format!("range of {count} elements exceeds the limit of {MAX_RANGE_LEN}"),
        ));
    }

    let mut values = Vec::with_capacity(count as usize);
    let mut v = start;
    while (step > 0 && v < stop) || (step < 0 && v > stop) {
        values.push(Value::from(v));
        v = match v.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::from(values))
}

fn content(i: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(i.message().value.to_bytes()))
}

fn meta(i: &Interpreter<'_>, _: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let metadata = &i.message().metadata;
    match optional_arg(args, 0) {
        Some(key) => {
            let key = ensure_string("meta", params, 0, key)?;
            Ok(match metadata.get(key.as_ref()) {
                Some(v) => Value::from(v.as_str()),
                None => Value::Null,
            })
        }
        None => Ok(Value::from(
            metadata
                .iter()
                .map(|(k, v)| (k.as_str().into(), Value::from(v.as_str())))
                .collect::<Map>(),
        )),
    }
}

fn batch_index(i: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(i.index()))
}

fn batch_size(i: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(i.batch_size()))
}

fn error(i: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(match &i.message().error {
        Some(e) => Value::from(e.as_str()),
        None => Value::Null,
    })
}

fn errored(i: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::Bool(i.message().error.is_some()))
}

fn json(i: &Interpreter<'_>, _: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let path = match optional_arg(args, 0) {
        Some(p) => ensure_string("json", params, 0, p)?,
        None => "".into(),
    };
    Ok(match i.message().value.get_path(&path) {
        Some(v) => v.clone(),
        None => Value::Null,
    })
}

fn env(_: &Interpreter<'_>, _: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let name = ensure_string("env", params, 0, &args[0])?;
    Ok(match std::env::var(name.as_ref()) {
        Ok(v) => Value::from(v),
        Err(_) => Value::Null,
    })
}

lazy_static! {
    // Read once so that evaluation never touches the file system.
    static ref HOSTNAME: Result<String, String> = resolve_hostname();
}

fn resolve_hostname() -> Result<String, String> {
    if let Ok(h) = std::env::var("HOSTNAME") {
        if !h.is_empty() {
            return Ok(h);
        }
    }
    match std::fs::read_to_string("/etc/hostname") {
        Ok(h) => Ok(h.trim().to_string()),
        Err(e) => Err(format!("unable to determine the hostname: {e}")),
    }
}

fn hostname(_: &Interpreter<'_>, span: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    match HOSTNAME.as_ref() {
        Ok(h) => Ok(Value::from(h.as_str())),
        Err(e) => Err(function_error("hostname", span, e.clone())),
    }
}

fn now(_: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(chrono::Local::now().to_rfc3339()))
}

fn timestamp_unix(_: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(chrono::Utc::now().timestamp()))
}

fn uuid_v4(_: &Interpreter<'_>, _: &Span, _: &[ExprRef], _: &[Value]) -> EvalResult {
    Ok(Value::from(uuid::Uuid::new_v4().to_string()))
}

fn random_int(_: &Interpreter<'_>, span: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let fcn = "random_int";
    let min = match optional_arg(args, 0) {
        Some(v) => ensure_integer(fcn, params, 0, v)?,
        None => 0,
    };
    let max = match optional_arg(args, 1) {
        Some(v) => ensure_integer(fcn, params, 1, v)?,
        None => i64::MAX,
    };
    if min > max {
        return Err(function_error(
            fcn,
            span,
            format!("min ({min}) must not exceed max ({max})"),
        ));
    }
    let mut rng = thread_rng();
    Ok(Value::from(rng.gen_range(min..=max)))
}

fn var(i: &Interpreter<'_>, span: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let name = ensure_string("var", params, 0, &args[0])?;
    match i.var(&name) {
        Some(v) => Ok(v.clone()),
        None => Err(EvalError::FieldNotFound {
            pos: span.position(),
            path: format!("${name}"),
        }),
    }
}
