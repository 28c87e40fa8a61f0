// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use core::cmp::Ordering;

use anyhow::{bail, Result};
use bloblang::*;

fn key(k: &str) -> PathSegment {
    PathSegment::Key(k.into())
}

#[test]
fn serialize_number() -> Result<()> {
    assert_eq!(serde_json::to_string(&Value::from(1))?, "1");
    assert_eq!(serde_json::to_string(&Value::from(-1))?, "-1");
    assert_eq!(serde_json::to_string(&Value::from(1.5))?, "1.5");
    Ok(())
}

#[test]
fn numbers_compare_across_kinds() -> Result<()> {
    assert_eq!(Value::from(3), Value::from(3.0));
    assert_eq!(Value::from_json_str("2.0")?, Value::from_json_str("2")?);
    assert_ne!(Value::from(3), Value::from(3.5));
    assert_eq!(Value::from(2).compare(&Value::from(2.5)), Some(Ordering::Less));
    assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
    assert_eq!(Value::from("1").compare(&Value::from(1)), None);
    Ok(())
}

#[test]
fn objects_keep_insertion_order() -> Result<()> {
    let v = Value::from_json_str(r#"{"b":1,"a":{"d":2,"c":3}}"#)?;
    assert_eq!(v.to_string(), r#"{"b":1,"a":{"d":2,"c":3}}"#);

    // Order is not part of equality.
    assert_eq!(v, Value::from_json_str(r#"{"a":{"c":3,"d":2},"b":1}"#)?);
    Ok(())
}

#[test]
fn kinds() -> Result<()> {
    let v = Value::from_json_str(r#"[null, true, 1, "s", [], {}]"#)?;
    let kinds: Vec<&str> = v.as_array()?.iter().map(Value::kind).collect();
    assert_eq!(kinds, ["null", "bool", "number", "string", "array", "object"]);
    assert_eq!(Value::from(vec![0u8, 1]).kind(), "bytes");
    assert_eq!(Value::Deleted.kind(), "deleted");
    Ok(())
}

#[test]
fn text_and_display() -> Result<()> {
    assert_eq!(Value::from("raw").to_text(), "raw");
    assert_eq!(Value::from("raw").to_string(), r#""raw""#);
    assert_eq!(Value::from(b"bytes".to_vec()).to_text(), "bytes");
    assert_eq!(Value::from(2.25).to_text(), "2.25");
    assert_eq!(Value::Null.to_text(), "null");
    assert_eq!(
        Value::from_json_str(r#"{"a": [1, "x"]}"#)?.to_text(),
        r#"{"a":[1,"x"]}"#
    );
    assert_eq!(Value::Deleted.to_text(), "");
    assert_eq!(Value::Deleted.to_string(), "deleted()");
    assert_eq!(Value::from("héllo").to_bytes(), "héllo".as_bytes());
    Ok(())
}

#[test]
fn deleted_does_not_serialize() {
    assert!(serde_json::to_string(&Value::Deleted).is_err());
    let nested = Value::from(vec![Value::from(1), Value::Deleted]);
    assert!(nested.to_json_str().is_err());
}

#[test]
fn get_path() -> Result<()> {
    let v = Value::from_json_str(r#"{"a":{"b":[10,{"c":"deep"}]},"x.y":1}"#)?;
    assert_eq!(v.get_path("a.b.0"), Some(&Value::from(10)));
    assert_eq!(v.get_path("a.b.1.c"), Some(&Value::from("deep")));
    assert_eq!(v.get_path(""), Some(&v));
    assert_eq!(v.get_path("a.b.2"), None);
    assert_eq!(v.get_path("a.b.c"), None);
    assert_eq!(v.get_path("a.b.0.z"), None);
    Ok(())
}

#[test]
fn index_operators() -> Result<()> {
    let v = Value::from_json_str(r#"{"a":{"b":[10,20]}}"#)?;
    assert_eq!(v["a"]["b"][1], Value::from(20));
    assert_eq!(v["a"]["missing"], Value::Null);
    assert_eq!(v["a"]["b"][5], Value::Null);
    assert_eq!(v[0], Value::Null);
    Ok(())
}

#[test]
fn set_path_creates_objects() -> Result<()> {
    let mut v = Value::Null;
    v.set_path(&[key("a"), key("b")], Value::from(1))?;
    assert_eq!(v, Value::from_json_str(r#"{"a":{"b":1}}"#)?);

    // Scalars along the way are replaced.
    v.set_path(&[key("a"), key("b"), key("c")], Value::from(true))?;
    assert_eq!(v, Value::from_json_str(r#"{"a":{"b":{"c":true}}}"#)?);

    // Numeric segments name object keys.
    v.set_path(&[key("a"), PathSegment::Index(7)], Value::from("seven"))?;
    assert_eq!(v["a"]["7"], Value::from("seven"));

    v.set_path(&[], Value::from("replaced"))?;
    assert_eq!(v, Value::from("replaced"));
    Ok(())
}

#[test]
fn set_path_in_arrays() -> Result<()> {
    let mut v = Value::from_json_str(r#"{"list":[1,2]}"#)?;
    v.set_path(&[key("list"), PathSegment::Index(0)], Value::from(9))?;
    v.set_path(&[key("list"), PathSegment::Index(2)], Value::from(3))?;
    assert_eq!(v, Value::from_json_str(r#"{"list":[9,2,3]}"#)?);

    let Err(e) = v.set_path(&[key("list"), PathSegment::Index(5)], Value::from(0)) else {
        bail!("write past the end of an array succeeded");
    };
    assert_eq!(e.to_string(), "index 5 is out of bounds for an array of length 3");

    let Err(e) = v.set_path(&[key("list"), key("k")], Value::from(0)) else {
        bail!("keyed write into an array succeeded");
    };
    assert_eq!(e.to_string(), "cannot set field `k` on an array");
    Ok(())
}

#[test]
fn setting_deleted_removes() -> Result<()> {
    let mut v = Value::from_json_str(r#"{"a":{"b":1,"c":2},"list":[1,2,3]}"#)?;
    v.set_path(&[key("a"), key("b")], Value::Deleted)?;
    v.set_path(&[key("list"), PathSegment::Index(1)], Value::Deleted)?;
    v.set_path(&[key("nope"), key("x")], Value::Deleted)?;
    assert_eq!(v, Value::from_json_str(r#"{"a":{"c":2},"list":[1,3]}"#)?);

    assert!(v.set_path(&[], Value::Deleted).is_err());
    Ok(())
}

#[test]
fn remove_path_reports_removal() -> Result<()> {
    let mut v = Value::from_json_str(r#"{"a":{"b":1},"2":"two"}"#)?;
    assert!(v.remove_path(&[key("a"), key("b")]));
    assert!(!v.remove_path(&[key("a"), key("b")]));
    assert!(v.remove_path(&[PathSegment::Index(2)]));
    assert!(!v.remove_path(&[]));
    assert_eq!(v, Value::from_json_str(r#"{"a":{}}"#)?);
    Ok(())
}

#[test]
fn clones_copy_on_write() -> Result<()> {
    let original = Value::from_json_str(r#"{"a":[1,2]}"#)?;
    let mut copy = original.clone();
    copy.set_path(&[key("a"), PathSegment::Index(0)], Value::from(5))?;
    assert_eq!(original, Value::from_json_str(r#"{"a":[1,2]}"#)?);
    assert_eq!(copy, Value::from_json_str(r#"{"a":[5,2]}"#)?);
    Ok(())
}

#[test]
fn deep_clone_shares_nothing() -> Result<()> {
    let original = Value::from_json_str(r#"{"a":[1,2]}"#)?;
    let shallow = original.clone();
    let deep = original.deep_clone();
    assert_eq!(deep, original);

    let inner = |v: &Value| match &v["a"] {
        Value::Array(a) => Ok(a.clone()),
        other => bail!("expected an array, got {other}"),
    };
    assert!(Rc::ptr_eq(&inner(&original)?, &inner(&shallow)?));
    assert!(!Rc::ptr_eq(&inner(&original)?, &inner(&deep)?));
    Ok(())
}

#[test]
fn accessors() -> Result<()> {
    let mut v = Value::from_json_str(r#"{"list":[]}"#)?;
    v.as_object_mut()?.insert("n".into(), Value::from(4));
    assert_eq!(v["n"].as_number()?.as_i64(), Some(4));
    assert!(v.as_array().is_err());
    assert!(v["list"].as_array()?.is_empty());
    assert!(*Value::from(true).as_bool()?);
    assert_eq!(Value::from("s").as_string()?.as_ref(), "s");
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_documents() -> Result<()> {
    let v = Value::from_yaml_str("name: widget\ntags: [a, b]\n1: one\n")?;
    assert_eq!(
        v,
        Value::from_json_str(r#"{"name":"widget","tags":["a","b"],"1":"one"}"#)?
    );
    Ok(())
}

#[test]
fn pretty_json() -> Result<()> {
    let v = Value::from_json_str(r#"{"a":[1]}"#)?;
    assert_eq!(v.to_json_str()?, "{\n  \"a\": [\n    1\n  ]\n}");
    Ok(())
}
