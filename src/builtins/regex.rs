// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::builtins::utils::{ensure_string, function_error, target_text};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

use regex::Regex;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.register_method(
        MethodSpec::new("re_match", MethodImpl::Eager(re_match))
            .description("Checks whether a regular expression matches anywhere in a string.")
            .param("pattern", "The regular expression.")
            .in_category(MethodCategory::Regexp, "", vec![])
            .example(Example::new(
                "",
                r#"root.matches = this.value.re_match("[0-9]")"#,
                &[
                    (r#"{"value":"there are 10 puppies"}"#, r#"{"matches":true}"#),
                    (r#"{"value":"there are ten puppies"}"#, r#"{"matches":false}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("re_find_all", MethodImpl::Eager(re_find_all))
            .description("Returns every non-overlapping match of a regular expression.")
            .param("pattern", "The regular expression.")
            .in_category(MethodCategory::Regexp, "", vec![])
            .example(Example::new(
                "",
                r#"root.matches = this.value.re_find_all("a.")"#,
                &[(r#"{"value":"paranormal"}"#, r#"{"matches":["ar","an","al"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("re_replace_all", MethodImpl::Eager(re_replace_all))
            .description(
                "Replaces every match of a regular expression. The replacement may refer to \
                 capture groups with `$1` or `${name}`.",
            )
            .param("pattern", "The regular expression.")
            .param("value", "The replacement.")
            .in_category(MethodCategory::Regexp, "", vec![])
            .example(Example::new(
                "",
                r#"root.new_value = this.value.re_replace_all("ADD ([0-9]+)","+($1)")"#,
                &[(r#"{"value":"foo ADD 70"}"#, r#"{"new_value":"foo +(70)"}"#)],
            )),
    )?;
    Ok(())
}

fn compile(fcn: &str, params: &[Ref<Expr>], args: &[Value]) -> EvalResult<Regex> {
    let pattern = ensure_string(fcn, params, 0, &args[0])?;
    Regex::new(&pattern)
        .map_err(|e| function_error(fcn, params[0].span(), format!("invalid regex: {e}")))
}

fn re_match(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("re_match", span, target)?;
    let re = compile("re_match", params, args)?;
    Ok(Value::Bool(re.is_match(&s)))
}

fn re_find_all(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("re_find_all", span, target)?;
    let re = compile("re_find_all", params, args)?;
    Ok(Value::from(
        re.find_iter(&s)
            .map(|m| Value::from(m.as_str()))
            .collect::<Vec<_>>(),
    ))
}

pub fn re_replace_all(
    span: &Span,
    params: &[Ref<Expr>],
    target: &Value,
    args: &[Value],
) -> EvalResult {
    let s = target_text("re_replace_all", span, target)?;
    let re = compile("re_replace_all", params, args)?;
    let replacement = ensure_string("re_replace_all", params, 1, &args[1])?;
    Ok(Value::from(re.replace_all(&s, replacement.as_ref()).into_owned()))
}
