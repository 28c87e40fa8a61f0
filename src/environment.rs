// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::error::ParseError;
use crate::field::Field;
use crate::mapping::Mapping;
use crate::registry::Registry;
use crate::*;

use core::fmt;

use anyhow::{Context, Result};

/// Loads the text of a mapping named by a `from "<path>"` statement.
pub type ImportResolver = Rc<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// The functions, methods and import resolution available to mappings and
/// fields parsed through it.
#[derive(Clone)]
pub struct Environment {
    registry: Rc<Registry>,
    resolver: Option<ImportResolver>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            registry: builtins::builtins(),
            resolver: None,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("functions", &self.registry.function_docs_all().len())
            .field("methods", &self.registry.method_docs_all().len())
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment isolated from the built-in registry.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry: Rc::new(registry),
            resolver: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// A copy of this environment with the named functions removed.
    pub fn without_functions(&self, names: &[&str]) -> Self {
        Self {
            registry: Rc::new(self.registry.without_functions(names)),
            resolver: self.resolver.clone(),
        }
    }

    /// A copy of this environment without functions that read process state.
    pub fn only_pure(&self) -> Self {
        Self {
            registry: Rc::new(self.registry.only_pure()),
            resolver: self.resolver.clone(),
        }
    }

    pub fn with_import_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.resolver = Some(Rc::new(resolver));
        self
    }

    /// Reads the mapping named by a `from` statement. Without a custom
    /// resolver, paths are read from the file system.
    pub fn resolve_import(&self, path: &str) -> Result<String> {
        match &self.resolver {
            Some(resolve) => resolve(path),
            None => std::fs::read_to_string(path).with_context(|| format!("reading {path}")),
        }
    }

    pub fn parse_mapping(&self, name: &str, mapping: &str) -> Result<Mapping, ParseError> {
        Mapping::parse_with(self, name, mapping)
    }

    pub fn parse_field(&self, field: &str) -> Result<Field, ParseError> {
        Field::parse_with(self, field)
    }
}
