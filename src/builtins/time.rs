// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::builtins::utils::{ensure_string, function_error, mismatch, optional_arg};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

use core::fmt::{self, Write};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    r.register_method(
        MethodSpec::new("ts_parse", MethodImpl::Eager(ts_parse))
            .description(
                "Parses a string with a strftime style format into an RFC 3339 timestamp \
                 in UTC. Without a format, RFC 3339 input is expected.",
            )
            .optional_param("format", "The strftime format of the input.")
            .in_category(MethodCategory::Time, "", vec![])
            .example(Example::new(
                "",
                r#"root.doc.timestamp = this.doc.timestamp.ts_parse("%Y-%m-%d")"#,
                &[(
                    r#"{"doc":{"timestamp":"2020-08-14"}}"#,
                    r#"{"doc":{"timestamp":"2020-08-14T00:00:00Z"}}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("ts_format", MethodImpl::Eager(ts_format))
            .description(
                "Formats an RFC 3339 timestamp string or a unix timestamp with a strftime \
                 style format. The timezone is `UTC` unless `tz` names `Local` or an offset \
                 such as `+02:00`.",
            )
            .optional_param("format", "The strftime format, defaults to RFC 3339.")
            .optional_param("tz", "The timezone of the output.")
            .in_category(MethodCategory::Time, "", vec![])
            .example(Example::new(
                "",
                r#"root.something_at = (this.created_at + 300).ts_format("%Y-%m-%d %H:%M:%S")"#,
                &[(r#"{"created_at":1597405526}"#, r#"{"something_at":"2020-08-14 11:50:26"}"#)],
            ))
            .example(Example::new(
                "",
                r#"root.something_at = this.created_at.ts_format("%H:%M", "+01:00")"#,
                &[(r#"{"created_at":"2020-08-14T11:45:26Z"}"#, r#"{"something_at":"12:45"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("ts_unix", MethodImpl::Eager(ts_unix))
            .description("Returns the unix timestamp, in seconds, of an RFC 3339 timestamp.")
            .in_category(MethodCategory::Time, "", vec![])
            .example(Example::new(
                "",
                "root.created_at_unix = this.created_at.ts_unix()",
                &[(
                    r#"{"created_at":"2009-11-10T23:00:00Z"}"#,
                    r#"{"created_at_unix":1257894000}"#,
                )],
            )),
    )?;
    Ok(())
}

/// Reads an RFC 3339 string or a unix timestamp in seconds.
pub fn read_timestamp(fcn: &str, span: &Span, v: &Value) -> EvalResult<DateTime<FixedOffset>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s).map_err(|e| {
            function_error(fcn, span, format!("invalid RFC 3339 timestamp `{s}`: {e}"))
        }),
        Value::Number(n) => {
            let secs = n.as_f64();
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            match Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single() {
                Some(t) => Ok(t.fixed_offset()),
                None => Err(function_error(fcn, span, format!("timestamp {n} is out of range"))),
            }
        }
        _ => Err(mismatch(fcn, span, None, "timestamp string or number", v)),
    }
}

/// Formats `t` with a strftime style format, failing on invalid specifiers.
pub fn strftime<Tz: TimeZone>(
    fcn: &str,
    span: &Span,
    t: &DateTime<Tz>,
    format: &str,
) -> EvalResult<String>
where
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    match write!(out, "{}", t.format(format)) {
        Ok(()) => Ok(out),
        Err(_) => Err(function_error(fcn, span, format!("invalid time format `{format}`"))),
    }
}

/// Renders `t` in the timezone named by `tz`.
pub fn format_in(
    fcn: &str,
    span: &Span,
    t: &DateTime<FixedOffset>,
    format: Option<&str>,
    tz: Option<&str>,
) -> EvalResult<String> {
    let render = |t: DateTime<FixedOffset>| match format {
        Some(f) => strftime(fcn, span, &t, f),
        None => Ok(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    };
    match tz {
        None | Some("UTC") => render(t.with_timezone(&Utc).fixed_offset()),
        Some("Local") => render(t.with_timezone(&Local).fixed_offset()),
        Some(offset) => match offset.parse::<FixedOffset>() {
            Ok(o) => render(t.with_timezone(&o)),
            Err(_) => Err(function_error(fcn, span, format!("unknown timezone `{offset}`"))),
        },
    }
}

pub fn format_with_args(
    fcn: &str,
    span: &Span,
    params: &[Ref<Expr>],
    target: &Value,
    args: &[Value],
) -> EvalResult {
    let t = read_timestamp(fcn, span, target)?;
    let format = match optional_arg(args, 0) {
        Some(f) => Some(ensure_string(fcn, params, 0, f)?),
        None => None,
    };
    let tz = match optional_arg(args, 1) {
        Some(z) => Some(ensure_string(fcn, params, 1, z)?),
        None => None,
    };
    Ok(Value::from(format_in(fcn, span, &t, format.as_deref(), tz.as_deref())?))
}

fn ts_parse(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let fcn = "ts_parse";
    let s = match target {
        Value::String(s) => s.clone(),
        _ => return Err(mismatch(fcn, span, None, "string", target)),
    };
    let t = match optional_arg(args, 0) {
        None => read_timestamp(fcn, span, target)?,
        Some(f) => {
            let format = ensure_string(fcn, params, 0, f)?;
            let parsed = DateTime::parse_from_str(&s, &format)
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(&s, &format).map(|t| t.and_utc().fixed_offset())
                })
                .or_else(|_| {
                    NaiveDate::parse_from_str(&s, &format)
                        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset())
                });
            match parsed {
                Ok(t) => t,
                Err(e) => {
                    return Err(function_error(
                        fcn,
                        span,
                        format!("failed to parse `{s}` with format `{format}`: {e}"),
                    ))
                }
            }
        }
    };
    Ok(Value::from(
        t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

fn ts_format(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    format_with_args("ts_format", span, params, target, args)
}

fn ts_unix(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let t = read_timestamp("ts_unix", span, target)?;
    Ok(Value::from(t.timestamp()))
}
