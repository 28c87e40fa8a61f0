// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::builtins::utils::{
    clamp_index, ensure_integer, ensure_string, function_error, mismatch, optional_arg,
    target_text,
};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::Value;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use MethodCategory::*;

    r.register_method(
        MethodSpec::new("uppercase", MethodImpl::Eager(uppercase))
            .description("Converts all letters of a string to upper case.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.foo = this.foo.uppercase()",
                &[(r#"{"foo":"hello world"}"#, r#"{"foo":"HELLO WORLD"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("lowercase", MethodImpl::Eager(lowercase))
            .description("Converts all letters of a string to lower case.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.foo = this.foo.lowercase()",
                &[(r#"{"foo":"HELLO WORLD"}"#, r#"{"foo":"hello world"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("capitalize", MethodImpl::Eager(capitalize))
            .description("Upper cases the first letter of every word of a string.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.title = this.title.capitalize()",
                &[(r#"{"title":"the foo bar"}"#, r#"{"title":"The Foo Bar"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("trim", MethodImpl::Eager(trim))
            .description(
                "Removes leading and trailing whitespace, or the characters of `cutset` \
                 when one is given.",
            )
            .optional_param("cutset", "Characters to remove instead of whitespace.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.title = this.title.trim(\"!?\")\nroot.description = this.description.trim()",
                &[(
                    r#"{"description":"  something happened and its amazing! ","title":"!!!watch out!?"}"#,
                    r#"{"description":"something happened and its amazing!","title":"watch out"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("has_prefix", MethodImpl::Eager(has_prefix))
            .description("Checks whether a string begins with the argument.")
            .param("value", "The prefix to look for.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                r#"root.t1 = this.v1.has_prefix("foo")
root.t2 = this.v2.has_prefix("foo")"#,
                &[(r#"{"v1":"foobar","v2":"barfoo"}"#, r#"{"t1":true,"t2":false}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("has_suffix", MethodImpl::Eager(has_suffix))
            .description("Checks whether a string ends with the argument.")
            .param("value", "The suffix to look for.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                r#"root.t1 = this.v1.has_suffix("foo")
root.t2 = this.v2.has_suffix("foo")"#,
                &[(r#"{"v1":"foobar","v2":"barfoo"}"#, r#"{"t1":false,"t2":true}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("replace_all", MethodImpl::Eager(replace_all))
            .description("Replaces every occurrence of `old` with `new`.")
            .param("old", "The text to replace.")
            .param("new", "The replacement.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                r#"root.new_value = this.value.replace_all("foo","dog")"#,
                &[(
                    r#"{"value":"The foo ate my homework"}"#,
                    r#"{"new_value":"The dog ate my homework"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("split", MethodImpl::Eager(split))
            .description("Splits a string on a delimiter into an array of strings.")
            .param("delimiter", "The delimiter to split with.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                r#"root.new_value = this.value.split(",")"#,
                &[(r#"{"value":"foo,bar,baz"}"#, r#"{"new_value":["foo","bar","baz"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("quote", MethodImpl::Eager(quote))
            .description("Wraps a string in double quotes, escaping special characters.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.quoted = this.thing.quote()",
                &[(r#"{"thing":"foo\nbar"}"#, r#"{"quoted":"\"foo\\nbar\""}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("unquote", MethodImpl::Eager(unquote))
            .description("Removes the quotes of a double quoted string and resolves its escapes.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.unquoted = this.thing.unquote()",
                &[(r#"{"thing":"\"foo\\nbar\""}"#, r#"{"unquoted":"foo\nbar"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("format", MethodImpl::Eager(format))
            .description(
                "Uses the target string as a format template for the arguments. Supported \
                 verbs are `%v`, `%s`, `%d`, `%f`, `%q` and `%%`.",
            )
            .variadic()
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                r#"root.foo = "%s(%v): %v".format(this.name, this.age, this.fingers)"#,
                &[(r#"{"name":"lance","age":37,"fingers":13}"#, r#"{"foo":"lance(37): 13"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("strip_newlines", MethodImpl::Eager(strip_newlines))
            .description("Removes all line breaks from a string.")
            .in_category(Strings, "", vec![])
            .example(Example::new(
                "",
                "root.value_no_newlines = this.value.strip_newlines()",
                &[(r#"{"value":"hello\nworld"}"#, r#"{"value_no_newlines":"helloworld"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("contains", MethodImpl::Eager(contains))
            .description("Checks whether a string, array or object contains the argument.")
            .param("value", "The value to look for.")
            .in_category(
                Strings,
                "Checks whether a string contains a substring.",
                vec![Example::new(
                    "",
                    r#"root.has_foo = this.thing.contains("foo")"#,
                    &[
                        (r#"{"thing":"this foo that"}"#, r#"{"has_foo":true}"#),
                        (r#"{"thing":"this bar that"}"#, r#"{"has_foo":false}"#),
                    ],
                )],
            )
            .in_category(
                ObjectAndArray,
                "Checks whether an array contains an element, or an object a value, equal \
                 to the argument.",
                vec![Example::new(
                    "",
                    r#"root.has_foo = this.thing.contains("foo")"#,
                    &[
                        (r#"{"thing":["this","foo","that"]}"#, r#"{"has_foo":true}"#),
                        (r#"{"thing":["this","bar","that"]}"#, r#"{"has_foo":false}"#),
                    ],
                )],
            ),
    )?;
    r.register_method(
        MethodSpec::new("length", MethodImpl::Eager(length))
            .description("Returns the length of a string, bytes, array or object.")
            .in_category(
                Strings,
                "Returns the number of characters of a string.",
                vec![Example::new(
                    "",
                    "root.foo_len = this.foo.length()",
                    &[(r#"{"foo":"hello world"}"#, r#"{"foo_len":11}"#)],
                )],
            )
            .in_category(
                ObjectAndArray,
                "Returns the number of elements of an array or the number of keys of an object.",
                vec![Example::new(
                    "",
                    "root.foo_len = this.foo.length()",
                    &[
                        (r#"{"foo":["first","second"]}"#, r#"{"foo_len":2}"#),
                        (r#"{"foo":{"first":"bar","second":"baz"}}"#, r#"{"foo_len":2}"#),
                    ],
                )],
            ),
    )?;
    r.register_method(
        MethodSpec::new("slice", MethodImpl::Eager(slice))
            .description(
                "Extracts a slice of a string or array from `low` up to, but not including, \
                 `high`. Negative indexes count from the end.",
            )
            .param("low", "The start of the slice.")
            .optional_param("high", "The end of the slice, defaults to the length.")
            .in_category(
                Strings,
                "",
                vec![Example::new(
                    "",
                    "root.beginning = this.value.slice(0, 2)\nroot.end = this.value.slice(4)\nroot.last = this.value.slice(-2)",
                    &[(r#"{"value":"foo bar"}"#, r#"{"beginning":"fo","end":"bar","last":"ar"}"#)],
                )],
            )
            .in_category(
                ObjectAndArray,
                "",
                vec![Example::new(
                    "",
                    "root.beginning = this.value.slice(0, 2)\nroot.end = this.value.slice(4)",
                    &[(
                        r#"{"value":["foo","bar","baz","buz","bev"]}"#,
                        r#"{"beginning":["foo","bar"],"end":["bev"]}"#,
                    )],
                )],
            ),
    )?;
    Ok(())
}

pub fn uppercase(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::from(target_text("uppercase", span, target)?.to_uppercase()))
}

fn lowercase(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::from(target_text("lowercase", span, target)?.to_lowercase()))
}

fn capitalize(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    let s = target_text("capitalize", span, target)?;
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !c.is_alphanumeric();
    }
    Ok(Value::from(out))
}

fn trim(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("trim", span, target)?;
    Ok(Value::from(match optional_arg(args, 0) {
        Some(cutset) => {
            let cutset = ensure_string("trim", params, 0, cutset)?;
            s.trim_matches(|c| cutset.contains(c)).to_string()
        }
        None => s.trim().to_string(),
    }))
}

fn has_prefix(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("has_prefix", span, target)?;
    let prefix = ensure_string("has_prefix", params, 0, &args[0])?;
    Ok(Value::Bool(s.starts_with(prefix.as_ref())))
}

fn has_suffix(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("has_suffix", span, target)?;
    let suffix = ensure_string("has_suffix", params, 0, &args[0])?;
    Ok(Value::Bool(s.ends_with(suffix.as_ref())))
}

pub fn replace_all(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("replace_all", span, target)?;
    let old = ensure_string("replace_all", params, 0, &args[0])?;
    let new = ensure_string("replace_all", params, 1, &args[1])?;
    Ok(Value::from(s.replace(old.as_ref(), new.as_ref())))
}

fn split(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let s = target_text("split", span, target)?;
    let delim = ensure_string("split", params, 0, &args[0])?;
    let parts: Vec<Value> = match delim.is_empty() {
        true => s.chars().map(|c| Value::from(c.to_string())).collect(),
        false => s.split(delim.as_ref()).map(Value::from).collect(),
    };
    Ok(Value::from(parts))
}

fn quote(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    let s = target_text("quote", span, target)?;
    match serde_json::to_string(&s) {
        Ok(q) => Ok(Value::from(q)),
        Err(e) => Err(function_error("quote", span, e.to_string())),
    }
}

fn unquote(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    let s = target_text("unquote", span, target)?;
    match serde_json::from_str::<String>(&s) {
        Ok(u) => Ok(Value::from(u)),
        Err(e) => Err(function_error("unquote", span, format!("invalid quoted string: {e}"))),
    }
}

fn format(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let template = target_text("format", span, target)?;
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next) else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        match verb {
            'v' | 's' => out.push_str(&arg.to_text()),
            'd' => out.push_str(&ensure_integer("format", params, next, arg)?.to_string()),
            'f' => match arg {
                Value::Number(n) => out.push_str(&format!("{:.6}", n.as_f64())),
                _ => {
                    let span = params[next].span();
                    return Err(mismatch("format", span, Some(next + 1), "number", arg));
                }
            },
            'q' => out.push_str(&serde_json::to_string(&arg.to_text()).unwrap_or_default()),
            other => out.push_str(&format!("%!{other}({})", arg.to_text())),
        }
        next += 1;
    }
    if next < args.len() {
        let extra: Vec<String> = args[next..].iter().map(Value::to_text).collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }
    Ok(Value::from(out))
}

fn strip_newlines(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    let s = target_text("strip_newlines", span, target)?;
    Ok(Value::from(s.replace(['\n', '\r'], "")))
}

fn contains(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let needle = &args[0];
    Ok(Value::Bool(match target {
        Value::String(_) | Value::Bytes(_) => {
            let s = target_text("contains", span, target)?;
            let sub = match needle {
                Value::String(_) | Value::Bytes(_) => target_text("contains", span, needle)?,
                _ => return Err(mismatch("contains", params[0].span(), Some(1), "string", needle)),
            };
            s.contains(&sub)
        }
        Value::Array(items) => items.iter().any(|v| v == needle),
        Value::Object(fields) => fields.values().any(|v| v == needle),
        _ => return Err(mismatch("contains", span, None, "string, array or object", target)),
    }))
}

fn length(span: &Span, _params: &[ExprRef], target: &Value, _args: &[Value]) -> EvalResult {
    Ok(Value::from(match target {
        Value::String(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => return Err(mismatch("length", span, None, "string, bytes, array or object", target)),
    }))
}

fn slice(span: &Span, params: &[ExprRef], target: &Value, args: &[Value]) -> EvalResult {
    let len = match target {
        Value::String(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        Value::Array(a) => a.len(),
        _ => return Err(mismatch("slice", span, None, "string, bytes or array", target)),
    };
    let low = clamp_index(ensure_integer("slice", params, 0, &args[0])?, len);
    let high = match optional_arg(args, 1) {
        Some(h) => clamp_index(ensure_integer("slice", params, 1, h)?, len),
        None => len,
    };
    if low > high {
        return Err(function_error(
            "slice",
            span,
            format!("lower slice bound {low} must not exceed upper bound {high}"),
        ));
    }
    Ok(match target {
        Value::String(s) => Value::from(s.chars().skip(low).take(high - low).collect::<String>()),
        Value::Bytes(b) => Value::from(b[low..high].to_vec()),
        Value::Array(a) => Value::from(a[low..high].to_vec()),
        _ => Value::Null,
    })
}
