// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, ExprRef, Ref};
use crate::builtins::utils::{
    ensure_integer, ensure_string, function_error, mismatch, optional_arg, target_array,
    target_object,
};
use crate::builtins::MethodImpl;
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::lexer::Span;
use crate::registry::{Example, MethodCategory, MethodSpec, Registry, RegistryError};
use crate::value::{Map, PathSegment, Value};
use crate::*;

use std::cmp::Ordering;

pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    use MethodCategory::ObjectAndArray;

    r.register_method(
        MethodSpec::new("map_each", MethodImpl::Lazy(map_each))
            .description(
                "Applies a query to each element of an array, or to each `{\"key\", \"value\"}` \
                 pair of an object, replacing it with the result. Elements mapped to \
                 `deleted()` are removed.",
            )
            .param("query", "A query or named lambda applied to each element.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.new_value = this.value.map_each(ele -> ele.uppercase())",
                &[(r#"{"value":["foo","bar"]}"#, r#"{"new_value":["FOO","BAR"]}"#)],
            ))
            .example(Example::new(
                "Objects are iterated as key/value pairs and keep their keys.",
                "root.new_dict = this.dict.map_each(item -> item.value.uppercase())",
                &[(
                    r#"{"dict":{"foo":"hello","bar":"world"}}"#,
                    r#"{"new_dict":{"foo":"HELLO","bar":"WORLD"}}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("filter", MethodImpl::Lazy(filter))
            .description(
                "Keeps the elements of an array, or the key/value pairs of an object, for \
                 which a query returns true.",
            )
            .param("test", "A query or named lambda that must return a bool.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.new_nums = this.nums.filter(num -> num > 10)",
                &[(r#"{"nums":[3,11,4,17]}"#, r#"{"new_nums":[11,17]}"#)],
            ))
            .example(Example::new(
                "",
                r#"root.new_dict = this.dict.filter(item -> item.value.contains("foo"))"#,
                &[(
                    r#"{"dict":{"first":"hello foo","second":"world","third":"this foo is great"}}"#,
                    r#"{"new_dict":{"first":"hello foo","third":"this foo is great"}}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("fold", MethodImpl::Lazy(fold))
            .description(
                "Reduces an array to a single value. The query sees an object with the \
                 running `tally` and the current `value`.",
            )
            .param("initial", "The starting tally.")
            .param("query", "A query or named lambda producing the next tally.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.sum = this.foo.fold(0, item -> item.tally + item.value)",
                &[(r#"{"foo":[3,8,11]}"#, r#"{"sum":22}"#)],
            ))
            .example(Example::new(
                "",
                r#"root.result = this.foo.fold("", item -> "%v%v".format(item.tally, item.value))"#,
                &[(r#"{"foo":["hello ","world"]}"#, r#"{"result":"hello world"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("any", MethodImpl::Lazy(any))
            .description("Checks whether a query returns true for any element of an array.")
            .param("test", "A query or named lambda that must return a bool.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.any_over_21 = this.patrons.any(patron -> patron.age >= 21)"#,
                &[
                    (
                        r#"{"patrons":[{"id":"1","age":18},{"id":"2","age":23}]}"#,
                        r#"{"any_over_21":true}"#,
                    ),
                    (
                        r#"{"patrons":[{"id":"1","age":18},{"id":"2","age":10}]}"#,
                        r#"{"any_over_21":false}"#,
                    ),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("all", MethodImpl::Lazy(all))
            .description(
                "Checks whether a query returns true for every element of an array. An \
                 empty array yields true.",
            )
            .param("test", "A query or named lambda that must return a bool.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.all_over_21 = this.patrons.all(patron -> patron.age >= 21)"#,
                &[
                    (
                        r#"{"patrons":[{"id":"1","age":18},{"id":"2","age":23}]}"#,
                        r#"{"all_over_21":false}"#,
                    ),
                    (
                        r#"{"patrons":[{"id":"1","age":45},{"id":"2","age":23}]}"#,
                        r#"{"all_over_21":true}"#,
                    ),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("sort", MethodImpl::Eager(sort))
            .description("Sorts an array of numbers or an array of strings in ascending order.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.sorted = this.foo.sort()",
                &[(r#"{"foo":["bbb","ccc","aaa"]}"#, r#"{"sorted":["aaa","bbb","ccc"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("sort_by", MethodImpl::Lazy(sort_by))
            .description(
                "Sorts an array by the number or string a query returns for each element. \
                 The sort is stable.",
            )
            .param("query", "A query or named lambda returning the sort key.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.sorted = this.foo.sort_by(ele -> ele.id)",
                &[(
                    r#"{"foo":[{"id":"bbb","message":"bar"},{"id":"aaa","message":"foo"},{"id":"ccc","message":"baz"}]}"#,
                    r#"{"sorted":[{"id":"aaa","message":"foo"},{"id":"bbb","message":"bar"},{"id":"ccc","message":"baz"}]}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("unique", MethodImpl::Eager(unique))
            .description("Removes duplicate elements from an array, keeping the first occurrence.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.uniques = this.foo.unique()",
                &[(r#"{"foo":["a","b","a","c"]}"#, r#"{"uniques":["a","b","c"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("keys", MethodImpl::Eager(keys))
            .description("Returns the keys of an object in lexical order.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.foo_keys = this.foo.keys()",
                &[(r#"{"foo":{"bar":1,"baz":2}}"#, r#"{"foo_keys":["bar","baz"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("values", MethodImpl::Eager(values))
            .description("Returns the values of an object, ordered by their keys.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.foo_vals = this.foo.values()",
                &[(r#"{"foo":{"baz":2,"bar":1}}"#, r#"{"foo_vals":[1,2]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("index", MethodImpl::Eager(index))
            .description(
                "Returns the element of an array or bytes at an index. Negative indexes \
                 count from the end.",
            )
            .param("index", "The index to read.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.last_name = this.names.index(-1)",
                &[(r#"{"names":["rachel","stevens"]}"#, r#"{"last_name":"stevens"}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("append", MethodImpl::Eager(append))
            .description("Returns an array with the arguments added to its end.")
            .variadic()
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.foo = this.foo.append("and", "this")"#,
                &[(r#"{"foo":["bar","baz"]}"#, r#"{"foo":["bar","baz","and","this"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("merge", MethodImpl::Eager(merge))
            .description(
                "Merges a value into the target. Objects merge recursively; colliding \
                 non-object values are collected into an array. Arrays are concatenated.",
            )
            .param("with", "The value to merge.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root = this.foo.merge(this.bar)",
                &[(
                    r#"{"foo":{"first_name":"fooer","likes":"bars"},"bar":{"second_name":"barer","likes":"foos"}}"#,
                    r#"{"first_name":"fooer","likes":["bars","foos"],"second_name":"barer"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("without", MethodImpl::Eager(without))
            .description("Returns an object with the given dot separated paths removed.")
            .variadic()
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root = this.without("inner.a","inner.c","d")"#,
                &[(
                    r#"{"inner":{"a":"first","b":"second","c":"third"},"d":"fourth","e":"fifth"}"#,
                    r#"{"e":"fifth","inner":{"b":"second"}}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("exists", MethodImpl::Eager(exists))
            .description("Checks whether a dot separated path exists within an object.")
            .param("path", "A dot separated path.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.result = this.foo.exists("bar.baz")"#,
                &[
                    (r#"{"foo":{"bar":{"baz":"yep, I exist"}}}"#, r#"{"result":true}"#),
                    (r#"{"foo":{"bar":{}}}"#, r#"{"result":false}"#),
                    (r#"{"foo":{}}"#, r#"{"result":false}"#),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("get", MethodImpl::Eager(get))
            .description(
                "Returns the value at a dot separated path, or null when it does not exist.",
            )
            .param("path", "A dot separated path.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.result = this.foo.get(this.target)"#,
                &[
                    (
                        r#"{"foo":{"bar":"from bar","baz":"from baz"},"target":"bar"}"#,
                        r#"{"result":"from bar"}"#,
                    ),
                    (
                        r#"{"foo":{"bar":"from bar","baz":"from baz"},"target":"baz"}"#,
                        r#"{"result":"from baz"}"#,
                    ),
                ],
            )),
    )?;
    r.register_method(
        MethodSpec::new("flatten", MethodImpl::Eager(flatten))
            .description("Flattens nested arrays by one level.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.result = this.flatten()",
                &[(r#"["foo",["bar","baz"],"buz"]"#, r#"{"result":["foo","bar","baz","buz"]}"#)],
            )),
    )?;
    r.register_method(
        MethodSpec::new("join", MethodImpl::Eager(join))
            .description("Joins an array of strings with an optional delimiter.")
            .optional_param("delimiter", "Placed between elements.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                r#"root.joined_words = this.words.join()
root.joined_numbers = this.numbers.map_each(this.string()).join(",")"#,
                &[(
                    r#"{"words":["hello","world"],"numbers":[3,8,11]}"#,
                    r#"{"joined_numbers":"3,8,11","joined_words":"helloworld"}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("enumerated", MethodImpl::Eager(enumerated))
            .description("Converts an array into an array of `{\"index\", \"value\"}` objects.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.foo = this.foo.enumerated()",
                &[(
                    r#"{"foo":["bar","baz"]}"#,
                    r#"{"foo":[{"index":0,"value":"bar"},{"index":1,"value":"baz"}]}"#,
                )],
            )),
    )?;
    r.register_method(
        MethodSpec::new("key_values", MethodImpl::Eager(key_values))
            .description("Converts an object into an array of `{\"key\", \"value\"}` objects.")
            .in_category(ObjectAndArray, "", vec![])
            .example(Example::new(
                "",
                "root.foo_key_values = this.foo.key_values().sort_by(pair -> pair.key)",
                &[(
                    r#"{"foo":{"bar":1,"baz":2}}"#,
                    r#"{"foo_key_values":[{"key":"bar","value":1},{"key":"baz","value":2}]}"#,
                )],
            )),
    )?;
    Ok(())
}

fn pair(k1: &str, v1: Value, k2: &str, v2: Value) -> Value {
    let mut m = Map::new();
    m.insert(k1.into(), v1);
    m.insert(k2.into(), v2);
    Value::from(m)
}

fn key_value(key: &Rc<str>, value: &Value) -> Value {
    pair("key", Value::String(key.clone()), "value", value.clone())
}

fn test_result(fcn: &str, query: &Expr, v: Value) -> EvalResult<bool> {
    match v {
        Value::Bool(b) => Ok(b),
        _ => Err(mismatch(fcn, query.span(), Some(1), "bool", &v)),
    }
}

/// Splits a dot separated path. Numeric segments address array indexes.
fn path_segments(path: &str) -> Vec<PathSegment> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(i) => PathSegment::Index(i),
            Err(_) => PathSegment::Key(s.into()),
        })
        .collect()
}

fn map_each(
    i: &mut Interpreter<'_>,
    span: &Span,
    target: &ExprRef,
    params: &[ExprRef],
) -> EvalResult {
    let query = &params[0];
    match i.eval(target)? {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                match i.eval_lambda(query, item.clone())? {
                    Value::Deleted => (),
                    v => out.push(v),
                }
            }
            Ok(Value::from(out))
        }
        Value::Object(fields) => {
            let mut out = Map::new();
            for (k, v) in fields.iter() {
                match i.eval_lambda(query, key_value(k, v))? {
                    Value::Deleted => (),
                    v => {
                        out.insert(k.clone(), v);
                    }
                }
            }
            Ok(Value::from(out))
        }
        v => Err(mismatch("map_each", span, None, "array or object", &v)),
    }
}

fn filter(
    i: &mut Interpreter<'_>,
    span: &Span,
    target: &ExprRef,
    params: &[ExprRef],
) -> EvalResult {
    let query = &params[0];
    match i.eval(target)? {
        Value::Array(items) => {
            let mut out = vec![];
            for item in items.iter() {
                let keep = i.eval_lambda(query, item.clone())?;
                if test_result("filter", query, keep)? {
                    out.push(item.clone());
                }
            }
            Ok(Value::from(out))
        }
        Value::Object(fields) => {
            let mut out = Map::new();
            for (k, v) in fields.iter() {
                let keep = i.eval_lambda(query, key_value(k, v))?;
                if test_result("filter", query, keep)? {
                    out.insert(k.clone(), v.clone());
                }
            }
            Ok(Value::from(out))
        }
        v => Err(mismatch("filter", span, None, "array or object", &v)),
    }
}

fn fold(i: &mut Interpreter<'_>, span: &Span, target: &ExprRef, params: &[ExprRef]) -> EvalResult {
    let items = target_array("fold", span, &i.eval(target)?)?;
    let mut tally = i.eval(&params[0])?;
    for item in items.iter() {
        tally = i.eval_lambda(&params[1], pair("tally", tally, "value", item.clone()))?;
    }
    Ok(tally)
}

fn any(i: &mut Interpreter<'_>, span: &Span, target: &ExprRef, params: &[ExprRef]) -> EvalResult {
    let items = target_array("any", span, &i.eval(target)?)?;
    for item in items.iter() {
        let r = i.eval_lambda(&params[0], item.clone())?;
        if test_result("any", &params[0], r)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn all(i: &mut Interpreter<'_>, span: &Span, target: &ExprRef, params: &[ExprRef]) -> EvalResult {
    let items = target_array("all", span, &i.eval(target)?)?;
    for item in items.iter() {
        let r = i.eval_lambda(&params[0], item.clone())?;
        if !test_result("all", &params[0], r)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Orders sort keys. All keys must be numbers or all must be strings.
fn sort_keys(fcn: &str, span: &Span, keys: &[Value]) -> EvalResult<()> {
    let numbers = keys.iter().all(|k| matches!(k, Value::Number(_)));
    let strings = keys.iter().all(|k| matches!(k, Value::String(_)));
    if numbers || strings {
        return Ok(());
    }
    let odd = keys
        .iter()
        .find(|k| !matches!(k, Value::Number(_) | Value::String(_)))
        .or_else(|| keys.iter().find(|k| k.kind() != keys[0].kind()));
    match odd {
        Some(v) => Err(mismatch(fcn, span, None, "numbers or strings of a single kind", v)),
        None => Ok(()),
    }
}

fn sort(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let items = target_array("sort", span, target)?;
    sort_keys("sort", span, &items)?;
    let mut sorted = items.as_ref().clone();
    sorted.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    Ok(Value::from(sorted))
}

fn sort_by(
    i: &mut Interpreter<'_>,
    span: &Span,
    target: &ExprRef,
    params: &[ExprRef],
) -> EvalResult {
    let items = target_array("sort_by", span, &i.eval(target)?)?;
    let mut keyed = Vec::with_capacity(items.len());
    for item in items.iter() {
        keyed.push((i.eval_lambda(&params[0], item.clone())?, item.clone()));
    }
    let keys: Vec<Value> = keyed.iter().map(|(k, _)| k.clone()).collect();
    sort_keys("sort_by", params[0].span(), &keys)?;
    keyed.sort_by(|(a, _), (b, _)| a.compare(b).unwrap_or(Ordering::Equal));
    Ok(Value::from(keyed.into_iter().map(|(_, v)| v).collect::<Vec<_>>()))
}

fn unique(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let items = target_array("unique", span, target)?;
    let mut out: Vec<Value> = vec![];
    for item in items.iter() {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    Ok(Value::from(out))
}

fn sorted_entries(fields: &Map) -> Vec<(&Rc<str>, &Value)> {
    let mut entries: Vec<_> = fields.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn keys(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let fields = target_object("keys", span, target)?;
    Ok(Value::from(
        sorted_entries(&fields)
            .into_iter()
            .map(|(k, _)| Value::String(k.clone()))
            .collect::<Vec<_>>(),
    ))
}

fn values(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let fields = target_object("values", span, target)?;
    Ok(Value::from(
        sorted_entries(&fields)
            .into_iter()
            .map(|(_, v)| v.clone())
            .collect::<Vec<_>>(),
    ))
}

fn index(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let idx = ensure_integer("index", params, 0, &args[0])?;
    let len = match target {
        Value::Array(a) => a.len(),
        Value::Bytes(b) => b.len(),
        _ => return Err(mismatch("index", span, None, "array or bytes", target)),
    };
    let resolved = if idx < 0 { len as i64 + idx } else { idx };
    if resolved < 0 || resolved >= len as i64 {
        return Err(function_error(
            "index",
            params[0].span(),
            format!("index {idx} is out of bounds for length {len}"),
        ));
    }
    let resolved = resolved as usize;
    Ok(match target {
        Value::Array(a) => a[resolved].clone(),
        Value::Bytes(b) => Value::from(b[resolved] as u64),
        _ => Value::Null,
    })
}

fn append(span: &Span, _params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let items = target_array("append", span, target)?;
    let mut out = items.as_ref().clone();
    out.extend(args.iter().cloned());
    Ok(Value::from(out))
}

fn merge_values(target: Value, with: Value) -> Value {
    match (target, with) {
        (Value::Object(mut a), Value::Object(b)) => {
            let fields = Rc::make_mut(&mut a);
            for (k, v) in b.iter() {
                let merged = match fields.shift_remove(k.as_ref()) {
                    Some(existing) => merge_values(existing, v.clone()),
                    None => v.clone(),
                };
                fields.insert(k.clone(), merged);
            }
            Value::Object(a)
        }
        (Value::Array(mut a), Value::Array(b)) => {
            Rc::make_mut(&mut a).extend(b.iter().cloned());
            Value::Array(a)
        }
        (Value::Array(mut a), v) => {
            Rc::make_mut(&mut a).push(v);
            Value::Array(a)
        }
        (v, Value::Array(b)) => {
            let mut out = vec![v];
            out.extend(b.iter().cloned());
            Value::from(out)
        }
        (a, b) => Value::from(vec![a, b]),
    }
}

fn merge(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    match (target, &args[0]) {
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), _) => {
            Ok(merge_values(target.clone(), args[0].clone()))
        }
        (Value::Object(_), v) => Err(mismatch("merge", params[0].span(), Some(1), "object", v)),
        _ => Err(mismatch("merge", span, None, "object or array", target)),
    }
}

fn without(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    target_object("without", span, target)?;
    let mut out = target.clone();
    for (idx, arg) in args.iter().enumerate() {
        let path = ensure_string("without", params, idx, arg)?;
        let segments = path_segments(&path);
        if !segments.is_empty() {
            out.remove_path(&segments);
        }
    }
    Ok(out)
}

fn exists(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    target_object("exists", span, target)?;
    let path = ensure_string("exists", params, 0, &args[0])?;
    Ok(Value::Bool(target.get_path(&path).is_some()))
}

fn get(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    match target {
        Value::Object(_) | Value::Array(_) => (),
        _ => return Err(mismatch("get", span, None, "object or array", target)),
    }
    let path = ensure_string("get", params, 0, &args[0])?;
    Ok(match target.get_path(&path) {
        Some(v) => v.clone(),
        None => Value::Null,
    })
}

fn flatten(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let items = target_array("flatten", span, target)?;
    let mut out = vec![];
    for item in items.iter() {
        match item {
            Value::Array(inner) => out.extend(inner.iter().cloned()),
            v => out.push(v.clone()),
        }
    }
    Ok(Value::from(out))
}

fn join(span: &Span, params: &[Ref<Expr>], target: &Value, args: &[Value]) -> EvalResult {
    let items = target_array("join", span, target)?;
    let delim = match optional_arg(args, 0) {
        Some(d) => ensure_string("join", params, 0, d)?,
        None => "".into(),
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items.iter() {
        match item {
            Value::String(s) => parts.push(s.to_string()),
            v => return Err(mismatch("join", span, None, "array of strings", v)),
        }
    }
    Ok(Value::from(parts.join(&delim)))
}

fn enumerated(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let items = target_array("enumerated", span, target)?;
    Ok(Value::from(
        items
            .iter()
            .enumerate()
            .map(|(idx, v)| pair("index", Value::from(idx), "value", v.clone()))
            .collect::<Vec<_>>(),
    ))
}

fn key_values(span: &Span, _params: &[Ref<Expr>], target: &Value, _args: &[Value]) -> EvalResult {
    let fields = target_object("key_values", span, target)?;
    Ok(Value::from(
        fields
            .iter()
            .map(|(k, v)| key_value(k, v))
            .collect::<Vec<_>>(),
    ))
}
