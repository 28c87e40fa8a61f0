// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::builtins::utils::{ensure_string, optional_arg};
use crate::builtins::{regex, strings, time, FunctionImpl, MethodImpl};
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::lexer::Span;
use crate::registry::{
    Example, FunctionCategory, FunctionSpec, MethodCategory, MethodSpec, Registry, RegistryError,
};
use crate::value::Value;

use chrono::{Local, Utc};

// Older spellings kept so that existing mappings continue to parse.
pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.register_function(
        FunctionSpec::new("timestamp", FunctionCategory::Deprecated, FunctionImpl::Eager(timestamp))
            .description("Returns the current local time formatted with a strftime style format.")
            .optional_param("format", "The strftime format, defaults to RFC 3339.")
            .impure()
            .example(Example::new("", r#"root.received_at = timestamp("%H:%M")"#, &[])),
    )?;
    r.register_function(
        FunctionSpec::new(
            "timestamp_utc",
            FunctionCategory::Deprecated,
            FunctionImpl::Eager(timestamp_utc),
        )
        .description("Returns the current UTC time formatted with a strftime style format.")
        .optional_param("format", "The strftime format, defaults to RFC 3339.")
        .impure()
        .example(Example::new("", "root.received_at = timestamp_utc()", &[])),
    )?;

    r.register_method(
        MethodSpec::new("replace", MethodImpl::Eager(strings::replace_all))
            .description("Replaces every occurrence of a substring. Use `replace_all` instead.")
            .param("old", "The substring to replace.")
            .param("new", "The replacement.")
            .in_category(MethodCategory::Deprecated, "", vec![])
            .example(Example::new(
                "",
                r#"root.new_value = this.value.replace("foo","dog")"#,
                &[(
                    r#"{"value":"The foo ate my homework"}"#,
                    r#"{"new_value":"The dog ate my homework"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("re_replace", MethodImpl::Eager(regex::re_replace_all))
            .description(
                "Replaces every match of a regular expression. Use `re_replace_all` instead.",
            )
            .param("pattern", "The regular expression.")
            .param("value", "The replacement.")
            .in_category(MethodCategory::Deprecated, "", vec![])
            .example(Example::new(
                "",
                r#"root.new_value = this.value.re_replace("ADD ([0-9]+)","+($1)")"#,
                &[(r#"{"value":"foo ADD 70"}"#, r#"{"new_value":"foo +(70)"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("format_timestamp", MethodImpl::Eager(format_timestamp))
            .description("Formats a timestamp. Use `ts_format` instead.")
            .optional_param("format", "The strftime format, defaults to RFC 3339.")
            .optional_param("tz", "The timezone of the output.")
            .in_category(MethodCategory::Deprecated, "", vec![])
            .example(Example::new(
                "",
                r#"root.something_at = this.created_at.format_timestamp("%Y-%m-%d")"#,
                &[(r#"{"created_at":1597405526}"#, r#"{"something_at":"2020-08-14"}"#)],
            )),
    )?;
    Ok(())
}

fn format_arg(fcn: &str, params: &[ExprRef], args: &[Value]) -> EvalResult<Option<String>> {
    Ok(match optional_arg(args, 0) {
        Some(f) => Some(ensure_string(fcn, params, 0, f)?.to_string()),
        None => None,
    })
}

fn timestamp(_: &Interpreter<'_>, span: &Span, params: &[ExprRef], args: &[Value]) -> EvalResult {
    let now = Local::now();
    Ok(Value::from(match format_arg("timestamp", params, args)? {
        Some(f) => time::strftime("timestamp", span, &now, &f)?,
        None => now.to_rfc3339(),
    }))
}

fn timestamp_utc(
    _: &Interpreter<'_>,
    span: &Span,
    params: &[ExprRef],
    args: &[Value],
) -> EvalResult {
    let now = Utc::now();
    Ok(Value::from(match format_arg("timestamp_utc", params, args)? {
        Some(f) => time::strftime("timestamp_utc", span, &now, &f)?,
        None => now.to_rfc3339(),
    }))
}

fn format_timestamp(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    time::format_with_args("format_timestamp", span, params, target, args)
}
