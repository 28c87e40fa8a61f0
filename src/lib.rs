// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod ast;
mod builtins;
mod environment;
mod error;
mod field;
mod interpreter;
mod lexer;
mod lint;
mod mapping;
mod message;
mod number;
mod parser;
mod registry;
mod value;

#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

pub use environment::{Environment, ImportResolver};
pub use error::{ErrorKind, EvalError, ParseError, Position};
pub use field::Field;
pub use interpreter::Vars;
pub use lexer::line_and_col_of;
pub use lint::{lint_field, lint_mapping, lint_mapping_with, Lint};
pub use mapping::Mapping;
pub use message::Message;
pub use number::Number;
pub use registry::{
    Example, FunctionCategory, FunctionSpec, MethodCategory, MethodCategorySpec, MethodSpec,
    Param, Registry, RegistryError, Status,
};
pub use value::{Map, PathSegment, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::builtins::{builtins, ExtensionFcn};
    pub use crate::interpreter::Interpreter;
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
