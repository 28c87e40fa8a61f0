// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::{ExtensionFcn, FunctionImpl, MethodImpl};
use crate::*;

use core::fmt;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;

/// Errors that can occur when registering builtins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(
        "{registry} registration failed: An item with the name '{name}' is already registered."
    )]
    AlreadyExists { name: String, registry: String },
    #[error(
        "{registry} registration failed: The name '{name}' is invalid \
         (names must be non-empty identifiers)."
    )]
    InvalidName { name: String, registry: String },
}

/// Validates that a name can be spelled in a mapping.
pub fn validate_name(name: &str, registry_name: &str) -> Result<(), RegistryError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            registry: registry_name.to_string(),
        })
    }
}

/// Stability of a builtin. Deprecated and hidden entries stay callable but
/// are left out of generated documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Stable,
    Beta,
    Deprecated,
    Hidden,
}

impl Status {
    pub fn is_documented(&self) -> bool {
        matches!(self, Status::Stable | Status::Beta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionCategory {
    General,
    Message,
    Environment,
    Deprecated,
}

impl FunctionCategory {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionCategory::General => "General",
            FunctionCategory::Message => "Message Info",
            FunctionCategory::Environment => "Environment",
            FunctionCategory::Deprecated => "Deprecated",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MethodCategory {
    Strings,
    Numbers,
    Regexp,
    Time,
    Coercion,
    ObjectAndArray,
    Parsing,
    Encoding,
    Deprecated,
}

impl MethodCategory {
    pub fn name(&self) -> &'static str {
        match self {
            MethodCategory::Strings => "Strings",
            MethodCategory::Numbers => "Numbers",
            MethodCategory::Regexp => "Regular Expressions",
            MethodCategory::Time => "Timestamps",
            MethodCategory::Coercion => "Type Coercion",
            MethodCategory::ObjectAndArray => "Object & Array Manipulation",
            MethodCategory::Parsing => "Parsing",
            MethodCategory::Encoding => "Encoding and Encryption",
            MethodCategory::Deprecated => "Deprecated",
        }
    }
}

impl fmt::Display for MethodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A documented usage. Each result pair is an input document and the
/// output the mapping produces for it, both as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub summary: String,
    pub mapping: String,
    pub results: Vec<(String, String)>,
}

impl Example {
    pub fn new(summary: &str, mapping: &str, results: &[(&str, &str)]) -> Self {
        Self {
            summary: summary.to_string(),
            mapping: mapping.to_string(),
            results: results
                .iter()
                .map(|(i, o)| (i.to_string(), o.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub description: String,
    pub optional: bool,
}

/// Accepted argument counts derived from declared parameters.
pub(crate) fn arity(params: &[Param], variadic: bool) -> (usize, Option<usize>) {
    let min = params.iter().filter(|p| !p.optional).count();
    let max = match variadic {
        true => None,
        false => Some(params.len()),
    };
    (min, max)
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub category: FunctionCategory,
    pub status: Status,
    pub description: String,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub examples: Vec<Example>,
    /// Whether the function reads process state such as the clock.
    pub impure: bool,
    #[serde(skip)]
    pub(crate) fcn: FunctionImpl,
}

impl FunctionSpec {
    pub(crate) fn new(name: &str, category: FunctionCategory, fcn: FunctionImpl) -> Self {
        let status = match category {
            FunctionCategory::Deprecated => Status::Deprecated,
            _ => Status::Stable,
        };
        Self {
            name: name.to_string(),
            category,
            status,
            description: String::new(),
            params: vec![],
            variadic: false,
            examples: vec![],
            impure: matches!(category, FunctionCategory::Environment),
            fcn,
        }
    }

    /// Declares a host-provided function backed by a closure.
    pub fn extension(
        name: &str,
        category: FunctionCategory,
        description: &str,
        params: &[&str],
        fcn: ExtensionFcn,
    ) -> Self {
        let mut spec = Self::new(name, category, FunctionImpl::Extension(fcn));
        spec.description = description.to_string();
        for p in params {
            spec = spec.param(p, "");
        }
        spec
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn param(mut self, name: &str, description: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            description: description.to_string(),
            optional: false,
        });
        self
    }

    pub fn optional_param(mut self, name: &str, description: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            description: description.to_string(),
            optional: true,
        });
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Marks the function as depending on process state.
    pub fn impure(mut self) -> Self {
        self.impure = true;
        self
    }

    pub fn example(mut self, example: Example) -> Self {
        self.examples.push(example);
        self
    }

    pub fn arity(&self) -> (usize, Option<usize>) {
        arity(&self.params, self.variadic)
    }
}

/// Description and examples a method shows within one category.
#[derive(Debug, Clone, Serialize)]
pub struct MethodCategorySpec {
    pub category: MethodCategory,
    pub description: String,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodSpec {
    pub name: String,
    pub status: Status,
    pub description: String,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub examples: Vec<Example>,
    pub categories: Vec<MethodCategorySpec>,
    #[serde(skip)]
    pub(crate) fcn: MethodImpl,
}

impl MethodSpec {
    pub(crate) fn new(name: &str, fcn: MethodImpl) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Stable,
            description: String::new(),
            params: vec![],
            variadic: false,
            examples: vec![],
            categories: vec![],
            fcn,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn param(mut self, name: &str, description: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            description: description.to_string(),
            optional: false,
        });
        self
    }

    pub fn optional_param(mut self, name: &str, description: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            description: description.to_string(),
            optional: true,
        });
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn example(mut self, example: Example) -> Self {
        self.examples.push(example);
        self
    }

    /// Places the method in `category`. Empty `description` or `examples`
    /// fall back to the method's own.
    pub fn in_category(
        mut self,
        category: MethodCategory,
        description: &str,
        examples: Vec<Example>,
    ) -> Self {
        if category == MethodCategory::Deprecated {
            self.status = Status::Deprecated;
        }
        self.categories.push(MethodCategorySpec {
            category,
            description: description.to_string(),
            examples,
        });
        self
    }

    pub fn arity(&self) -> (usize, Option<usize>) {
        arity(&self.params, self.variadic)
    }

    /// The method as documented under `category`, with the category's
    /// description and examples taking precedence.
    pub fn for_category(&self, category: MethodCategory) -> Option<MethodSpec> {
        let cat = self.categories.iter().find(|c| c.category == category)?;
        let mut spec = self.clone();
        if !cat.description.is_empty() {
            spec.description = cat.description.clone();
        }
        if !cat.examples.is_empty() {
            spec.examples = cat.examples.clone();
        }
        spec.categories = vec![cat.clone()];
        Some(spec)
    }

    /// Every example the method carries, across all categories.
    pub fn all_examples(&self) -> Vec<&Example> {
        let mut examples: Vec<&Example> = self.examples.iter().collect();
        for cat in &self.categories {
            examples.extend(cat.examples.iter());
        }
        examples
    }
}

/// Catalogue of functions and methods a mapping may call.
///
/// Lookups are hash based and enumeration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: IndexMap<String, Rc<FunctionSpec>>,
    methods: IndexMap<String, Rc<MethodSpec>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry holding every builtin.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        builtins::register(&mut registry)?;
        Ok(registry)
    }

    pub fn register_function(&mut self, spec: FunctionSpec) -> Result<(), RegistryError> {
        validate_name(&spec.name, "function")?;
        match self.functions.entry(spec.name.clone()) {
            Entry::Occupied(e) => Err(RegistryError::AlreadyExists {
                name: e.key().clone(),
                registry: "function".to_string(),
            }),
            Entry::Vacant(e) => {
                e.insert(Rc::new(spec));
                Ok(())
            }
        }
    }

    pub fn register_method(&mut self, spec: MethodSpec) -> Result<(), RegistryError> {
        validate_name(&spec.name, "method")?;
        match self.methods.entry(spec.name.clone()) {
            Entry::Occupied(e) => Err(RegistryError::AlreadyExists {
                name: e.key().clone(),
                registry: "method".to_string(),
            }),
            Entry::Vacant(e) => {
                e.insert(Rc::new(spec));
                Ok(())
            }
        }
    }

    /// Registers a host-provided function backed by a closure.
    pub fn register_extension(
        &mut self,
        name: &str,
        category: FunctionCategory,
        description: &str,
        params: &[&str],
        fcn: ExtensionFcn,
    ) -> Result<(), RegistryError> {
        self.register_function(FunctionSpec::extension(
            name,
            category,
            description,
            params,
            fcn,
        ))
    }

    pub fn function(&self, name: &str) -> Option<&Rc<FunctionSpec>> {
        self.functions.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<MethodSpec>> {
        self.methods.get(name)
    }

    /// A copy of this registry without the named functions.
    pub fn without_functions(&self, names: &[&str]) -> Self {
        let mut registry = self.clone();
        registry
            .functions
            .retain(|name, _| !names.contains(&name.as_str()));
        registry
    }

    /// A copy of this registry without the named methods.
    pub fn without_methods(&self, names: &[&str]) -> Self {
        let mut registry = self.clone();
        registry
            .methods
            .retain(|name, _| !names.contains(&name.as_str()));
        registry
    }

    /// A copy of this registry restricted to functions that do not read
    /// process state.
    pub fn only_pure(&self) -> Self {
        let mut registry = self.clone();
        registry.functions.retain(|_, spec| !spec.impure);
        registry
    }

    /// Documented functions in registration order.
    pub fn function_docs(&self) -> Vec<FunctionSpec> {
        self.functions
            .values()
            .filter(|spec| spec.status.is_documented())
            .map(|spec| spec.as_ref().clone())
            .collect()
    }

    /// Every function, including deprecated and hidden ones.
    pub fn function_docs_all(&self) -> Vec<FunctionSpec> {
        self.functions
            .values()
            .map(|spec| spec.as_ref().clone())
            .collect()
    }

    /// Documented methods in registration order.
    pub fn method_docs(&self) -> Vec<MethodSpec> {
        self.methods
            .values()
            .filter(|spec| spec.status.is_documented())
            .map(|spec| spec.as_ref().clone())
            .collect()
    }

    /// Every method, including deprecated and hidden ones.
    pub fn method_docs_all(&self) -> Vec<MethodSpec> {
        self.methods
            .values()
            .map(|spec| spec.as_ref().clone())
            .collect()
    }

    pub fn functions_for_category(&self, category: FunctionCategory) -> Vec<FunctionSpec> {
        self.functions
            .values()
            .filter(|spec| spec.category == category && spec.status != Status::Hidden)
            .map(|spec| spec.as_ref().clone())
            .collect()
    }

    /// Methods listed under `category`, with their per-category overrides
    /// applied.
    pub fn methods_for_category(&self, category: MethodCategory) -> Vec<MethodSpec> {
        self.methods
            .values()
            .filter(|spec| spec.status != Status::Hidden)
            .filter_map(|spec| spec.for_category(category))
            .collect()
    }

    /// Methods that belong to no category and are not hidden.
    pub fn general_methods(&self) -> Vec<MethodSpec> {
        self.methods
            .values()
            .filter(|spec| spec.categories.is_empty() && spec.status != Status::Hidden)
            .map(|spec| spec.as_ref().clone())
            .collect()
    }
}
