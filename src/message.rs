// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use std::collections::BTreeMap;

/// A message flowing through a pipeline: a structured document, its string
/// metadata and the error flagged on it by an earlier stage, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub value: Value,
    pub metadata: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl Message {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_error<E: Into<String>>(mut self, error: E) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
