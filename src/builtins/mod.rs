// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod coercion;
pub mod comparison;
pub mod deprecated;
pub mod encoding;
pub mod functions;
pub mod general;
pub mod numbers;
pub mod objects;
pub mod parsing;
pub mod regex;
pub mod strings;
pub mod time;
pub mod utils;

use crate::ast::ExprRef;
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::lexer::Span;
use crate::registry::{Registry, RegistryError};
use crate::value::Value;
use crate::*;

use core::fmt;

#[cfg(feature = "arc")]
use lazy_static::lazy_static;

/// A function evaluated after its arguments.
pub type FunctionFcn = fn(&Interpreter<'_>, &Span, &[ExprRef], &[Value]) -> EvalResult;

/// A method evaluated after its target and arguments.
pub type MethodFcn = fn(&Span, &[ExprRef], &Value, &[Value]) -> EvalResult;

/// A method that decides itself when, and in which context, its target and
/// arguments are evaluated.
pub type LazyMethodFcn = fn(&mut Interpreter<'_>, &Span, &ExprRef, &[ExprRef]) -> EvalResult;

/// A host-provided function.
pub type ExtensionFcn = Rc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

#[derive(Clone)]
pub enum FunctionImpl {
    Eager(FunctionFcn),
    Extension(ExtensionFcn),
}

impl fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionImpl::Eager(_) => f.write_str("Eager"),
            FunctionImpl::Extension(_) => f.write_str("Extension"),
        }
    }
}

#[derive(Clone)]
pub enum MethodImpl {
    Eager(MethodFcn),
    Lazy(LazyMethodFcn),
}

impl fmt::Debug for MethodImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodImpl::Eager(_) => f.write_str("Eager"),
            MethodImpl::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Adds every builtin function and method to `r`.
pub fn register(r: &mut Registry) -> Result<(), RegistryError> {
    functions::register(r)?;
    general::register(r)?;
    strings::register(r)?;
    numbers::register(r)?;
    regex::register(r)?;
    time::register(r)?;
    coercion::register(r)?;
    objects::register(r)?;
    parsing::register(r)?;
    encoding::register(r)?;
    deprecated::register(r)?;
    Ok(())
}

fn build() -> Rc<Registry> {
    let mut registry = Registry::new();
    if let Err(e) = register(&mut registry) {
        panic!("invalid builtin registry: {e}");
    }
    Rc::new(registry)
}

#[cfg(feature = "arc")]
lazy_static! {
    static ref BUILTINS: Rc<Registry> = build();
}

#[cfg(not(feature = "arc"))]
std::thread_local! {
    static BUILTINS: Rc<Registry> = build();
}

/// The builtin registry. It is built on first use and read-only afterwards.
pub fn builtins() -> Rc<Registry> {
    #[cfg(feature = "arc")]
    {
        BUILTINS.clone()
    }
    #[cfg(not(feature = "arc"))]
    {
        BUILTINS.with(|r| r.clone())
    }
}
