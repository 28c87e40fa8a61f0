// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::EvalError;
use crate::number::Number;
use crate::*;

use core::cmp::Ordering;
use core::fmt;
use std::ops;

use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Object storage. Insertion order is kept and is visible when serialized.
pub type Map = IndexMap<Rc<str>, Value>;

/// A runtime value of the mapping language.
///
/// Containers are reference counted. Cloning a value aliases its
/// substructures; writes go through `Rc::make_mut` so an aliased container is
/// copied only when it is modified.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Json data types. serde will automatically map json to these variants.
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<Map>),

    Bytes(Rc<Vec<u8>>),

    // Assigning this removes the target instead of writing it.
    Deleted,

    // A caught evaluation error, handed to `catch` lambdas.
    Error(Rc<EvalError>),
}

/// One step of an assignment path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(Rc<str>),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error;
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s.as_ref()),
            Value::Number(n) => n.serialize(serializer),
            Value::Array(a) => a.serialize(serializer),
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields.iter() {
                    map.serialize_entry(k.as_ref(), v)?;
                }
                map.end()
            }
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::Deleted => Err(S::Error::custom("deleted value cannot be serialized")),
            Value::Error(e) => Err(S::Error::custom(format!(
                "error value cannot be serialized: {e}"
            ))),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(s.into()))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bytes(Rc::new(v.to_vec())))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut arr: Vec<Value> = vec![];
        while let Some(v) = visitor.next_element()? {
            arr.push(v);
        }
        Ok(Value::from(arr))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut map = Map::new();
        while let Some((key, value)) = visitor.next_entry::<Value, Value>()? {
            let key: Rc<str> = match key {
                Value::String(s) => s,
                // yaml allows non-string keys
                other => other.to_text().into(),
            };
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Deleted => write!(f, "deleted()"),
            Value::Error(e) => write!(f, "{e}"),
            _ => match serde_json::to_string(self) {
                Ok(s) => write!(f, "{s}"),
                Err(_e) => Err(std::fmt::Error),
            },
        }
    }
}

impl Value {
    pub fn new_object() -> Value {
        Value::from(Map::new())
    }

    pub fn from_json_str(json: &str) -> Result<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Value> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Name of the value's kind as shown in error messages and by `type()`.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Deleted => "deleted",
            Value::Error(_) => "error",
        }
    }

    /// Plain text form: strings and bytes are written raw, everything else
    /// as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Number(n) => n.to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Deleted => String::new(),
            Value::Error(e) => e.message(),
            Value::Array(_) | Value::Object(_) => match serde_json::to_string(self) {
                Ok(s) => s,
                Err(e) => e.to_string(),
            },
        }
    }

    /// Raw bytes: strings as UTF-8, bytes verbatim, anything else as its text form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Bytes(b) => b.as_ref().clone(),
            Value::String(s) => s.as_bytes().to_vec(),
            _ => self.to_text().into_bytes(),
        }
    }

    /// Copies every container so that the result shares no storage with `self`.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(a) => Value::from(a.iter().map(Value::deep_clone).collect::<Vec<_>>()),
            Value::Object(o) => Value::from(
                o.iter()
                    .map(|(k, v)| (Rc::from(k.as_ref()), v.deep_clone()))
                    .collect::<Map>(),
            ),
            Value::Bytes(b) => Value::Bytes(Rc::new(b.as_ref().clone())),
            Value::String(s) => Value::String(Rc::from(s.as_ref())),
            _ => self.clone(),
        }
    }

    /// Ordering between two numbers or two strings. Other pairs are not ordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(a.compare(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(Rc::new(a))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Rc::new(b))
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Object(Rc::new(m))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Value::Deleted)
    }

    pub fn as_bool(&self) -> Result<&bool> {
        match self {
            Value::Bool(b) => Ok(b),
            _ => Err(anyhow!("not a bool")),
        }
    }

    pub fn as_string(&self) -> Result<&Rc<str>> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(anyhow!("not a string")),
        }
    }

    pub fn as_number(&self) -> Result<&Number> {
        match self {
            Value::Number(n) => Ok(n),
            _ => Err(anyhow!("not a number")),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Value>> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(anyhow!("not an array")),
        }
    }

    pub fn as_object(&self) -> Result<&Map> {
        match self {
            Value::Object(m) => Ok(m),
            _ => Err(anyhow!("not an object")),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Map> {
        match self {
            Value::Object(m) => Ok(Rc::make_mut(m)),
            _ => Err(anyhow!("not an object")),
        }
    }
}

impl Value {
    /// Looks up a dotted path such as `a.b.0`. Numeric segments index arrays.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for seg in path.split('.') {
            current = match current {
                Value::Object(o) => o.get(seg)?,
                Value::Array(a) => a.get(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at `path`, creating intermediate objects as needed.
    ///
    /// A non-container found along the way is replaced by an object. Writing
    /// `Deleted` removes the target instead.
    pub fn set_path(&mut self, path: &[PathSegment], value: Value) -> Result<()> {
        if value.is_deleted() {
            if path.is_empty() {
                bail!("cannot delete the root of a document in place");
            }
            self.remove_path(path);
            return Ok(());
        }

        let Some((seg, rest)) = path.split_first() else {
            *self = value;
            return Ok(());
        };

        match (self, seg) {
            (Value::Array(a), PathSegment::Index(idx)) => {
                let a = Rc::make_mut(a);
                let len = a.len();
                match a.get_mut(*idx) {
                    Some(v) => v.set_path(rest, value),
                    None if *idx == len => {
                        let mut v = Value::Null;
                        v.set_path(rest, value)?;
                        a.push(v);
                        Ok(())
                    }
                    None => bail!("index {idx} is out of bounds for an array of length {len}"),
                }
            }
            (Value::Array(_), PathSegment::Key(k)) => {
                bail!("cannot set field `{k}` on an array")
            }
            (Value::Object(map), seg) => {
                let key: Rc<str> = match seg {
                    PathSegment::Key(k) => k.clone(),
                    PathSegment::Index(i) => i.to_string().into(),
                };
                let entry = Rc::make_mut(map).entry(key).or_insert(Value::Null);
                entry.set_path(rest, value)
            }
            (v, _) => {
                *v = Value::new_object();
                v.set_path(path, value)
            }
        }
    }

    /// Removes the key or array element at `path`. Missing paths are ignored.
    pub fn remove_path(&mut self, path: &[PathSegment]) -> bool {
        let Some((seg, rest)) = path.split_first() else {
            return false;
        };
        match (self, seg) {
            (Value::Object(map), PathSegment::Key(k)) => {
                if !map.contains_key(k.as_ref()) {
                    return false;
                }
                let map = Rc::make_mut(map);
                match rest.is_empty() {
                    true => map.shift_remove(k.as_ref()).is_some(),
                    false => match map.get_mut(k.as_ref()) {
                        Some(v) => v.remove_path(rest),
                        None => false,
                    },
                }
            }
            (Value::Object(map), PathSegment::Index(i)) => {
                let key = i.to_string();
                if !map.contains_key(key.as_str()) {
                    return false;
                }
                let map = Rc::make_mut(map);
                match rest.is_empty() {
                    true => map.shift_remove(key.as_str()).is_some(),
                    false => match map.get_mut(key.as_str()) {
                        Some(v) => v.remove_path(rest),
                        None => false,
                    },
                }
            }
            (Value::Array(a), PathSegment::Index(i)) => {
                if *i >= a.len() {
                    return false;
                }
                let a = Rc::make_mut(a);
                match rest.is_empty() {
                    true => {
                        a.remove(*i);
                        true
                    }
                    false => a[*i].remove_path(rest),
                }
            }
            _ => false,
        }
    }
}

impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Value::Array(a) if index < a.len() => &a[index],
            _ => &Value::Null,
        }
    }
}

impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match self {
            Value::Object(o) => o.get(key).unwrap_or(&Value::Null),
            _ => &Value::Null,
        }
    }
}
