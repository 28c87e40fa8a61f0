// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Program};
use crate::environment::Environment;
use crate::error::ParseError;
use crate::field::Field;
use crate::lexer::{line_and_col_of, Span};
use crate::mapping::Mapping;
use crate::registry::Status;

use serde::Serialize;

/// A problem found in mapping or field source, with one-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lint {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Lint {
    fn at_span(span: &Span, message: String) -> Self {
        Self {
            line: span.line as usize,
            column: span.col as usize,
            message,
        }
    }

    fn from_parse_error(source: &str, e: &ParseError) -> Self {
        let (line, column) = line_and_col_of(source, e.offset as usize);
        Self {
            line,
            column,
            message: e.message.clone(),
        }
    }
}

pub fn lint_mapping(mapping: &str) -> Vec<Lint> {
    lint_mapping_with(&Environment::default(), mapping)
}

pub fn lint_mapping_with(env: &Environment, mapping: &str) -> Vec<Lint> {
    match Mapping::parse_with(env, "lint", mapping) {
        Ok(m) => deprecations(m.program()),
        Err(e) => vec![Lint::from_parse_error(mapping, &e)],
    }
}

pub fn lint_field(field: &str) -> Vec<Lint> {
    match Field::parse(field) {
        Ok(f) => {
            let mut lints = vec![];
            for expr in f.exprs() {
                expr.as_ref().walk(&mut |e| deprecation(e, &mut lints));
            }
            lints
        }
        Err(e) => vec![Lint::from_parse_error(field, &e)],
    }
}

fn deprecations(program: &Program) -> Vec<Lint> {
    let mut lints = vec![];
    program.walk(&mut |expr| deprecation(expr, &mut lints));
    lints
}

fn deprecation(expr: &Expr, lints: &mut Vec<Lint>) {
    match expr {
        Expr::Call { name, spec, .. } if spec.status == Status::Deprecated => {
            lints.push(Lint::at_span(
                name,
                format!("function `{}` is deprecated", spec.name),
            ));
        }
        Expr::MethodCall { name, spec, .. } if spec.status == Status::Deprecated => {
            lints.push(Lint::at_span(
                name,
                format!("method `{}` is deprecated", spec.name),
            ));
        }
        _ => (),
    }
}
