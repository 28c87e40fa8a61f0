// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{AssignTarget, Program, Statement};
use crate::environment::Environment;
use crate::error::{EvalError, ParseError};
use crate::interpreter::{Interpreter, Vars};
use crate::lexer::{Source, Span};
use crate::message::Message;
use crate::parser::parse_mapping;
use crate::value::Value;

use core::mem;
use core::slice;

use anyhow::{anyhow, Result};

/// How assignments reach the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    // Build a fresh document; every assigned value is deep copied.
    Copy,
    // Write into the input document, sharing storage with it.
    Mutate,
}

/// A compiled mapping. It holds no per-call state and can be executed from
/// many threads at once when the `arc` feature is enabled.
#[derive(Debug)]
pub struct Mapping {
    name: String,
    source: Source,
    program: Program,
}

impl Mapping {
    /// Parses `mapping` against the built-in functions and methods.
    pub fn parse(name: &str, mapping: &str) -> Result<Self, ParseError> {
        Self::parse_with(&Environment::default(), name, mapping)
    }

    pub fn parse_with(env: &Environment, name: &str, mapping: &str) -> Result<Self, ParseError> {
        let source = Source::from_contents(name.to_string(), mapping.to_string()).map_err(|e| {
            ParseError {
                offset: 0,
                line: 1,
                col: 1,
                message: e.to_string(),
            }
        })?;
        Self::compile(env, source)
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let source = Source::from_file(path)?;
        Self::compile(&Environment::default(), source.clone())
            .map_err(|e| anyhow!(source.message(e.line, e.col, "error", &e.message)))
    }

    fn compile(env: &Environment, source: Source) -> Result<Self, ParseError> {
        let program = parse_mapping(&source, env)?;
        log::debug!(
            "compiled mapping `{}` with {} statement(s)",
            source.file(),
            program.statements.len()
        );
        Ok(Self {
            name: source.file().clone(),
            source,
            program,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Maps `value` into a new document. `Value::Deleted` is returned when
    /// the mapping deletes `root`.
    pub fn exec(&self, value: &Value) -> Result<Value, EvalError> {
        let message = Message::new(value.clone());
        match self.map_part(0, slice::from_ref(&message))? {
            Some(m) => Ok(m.value),
            None => Ok(Value::Deleted),
        }
    }

    /// Applies the mapping to `value` in place. A deleted `root` leaves
    /// `Value::Deleted` behind.
    pub fn exec_mut(&self, value: &mut Value) -> Result<(), EvalError> {
        let mut message = Message::new(mem::take(value));
        let r = self.run(Mode::Mutate, &mut message, &[], 0);
        *value = message.value;
        r
    }

    /// Maps the message at `index` of `batch` into a new message. `None` is
    /// returned when the mapping deletes `root`.
    pub fn map_part(&self, index: usize, batch: &[Message]) -> Result<Option<Message>, EvalError> {
        let input = self.part(index, batch)?;
        let mut output = Message {
            value: Value::new_object(),
            metadata: input.metadata.clone(),
            error: input.error.clone(),
        };
        self.run(Mode::Copy, &mut output, batch, index)?;
        Ok(match output.value {
            Value::Deleted => None,
            _ => Some(output),
        })
    }

    /// Applies the mapping to the message at `index` of `batch` in place.
    /// Returns false when the mapping deleted `root`.
    pub fn mutate_part(&self, index: usize, batch: &mut [Message]) -> Result<bool, EvalError> {
        self.part(index, batch)?;
        let mut message = mem::take(&mut batch[index]);
        let r = self.run(Mode::Mutate, &mut message, batch, index);
        let kept = !message.value.is_deleted();
        batch[index] = message;
        r.map(|_| kept)
    }

    /// Renders `e` under the mapping line it points at.
    pub fn describe_error(&self, e: &EvalError) -> String {
        let pos = e.position();
        self.source.message(pos.line, pos.col, "error", &e.message())
    }

    fn part<'b>(&self, index: usize, batch: &'b [Message]) -> Result<&'b Message, EvalError> {
        batch.get(index).ok_or_else(|| EvalError::Function {
            pos: self.program.span.position(),
            name: self.name.clone(),
            message: format!("message index {index} exceeds the batch size of {}", batch.len()),
        })
    }

    // In copy mode `output` starts empty and expressions read the message at
    // `index` of `batch`. In mutate mode expressions read `output` itself.
    fn run(
        &self,
        mode: Mode,
        output: &mut Message,
        batch: &[Message],
        index: usize,
    ) -> Result<(), EvalError> {
        let mut vars = Vars::new();
        for stmt in &self.program.statements {
            log::trace!("{}: executing `{}`", self.name, stmt.span().text());
            let value = {
                let message = match mode {
                    Mode::Copy => &batch[index],
                    Mode::Mutate => &*output,
                };
                let mut interpreter = Interpreter::new(message, batch, index, &vars);
                interpreter.eval(stmt.value())?
            };
            match stmt {
                Statement::Let { name, .. } => {
                    vars.insert(name.1.clone(), value);
                }
                Statement::Assign { target, .. } => {
                    if let Value::Error(_) = value {
                        return Err(EvalError::TypeMismatch {
                            pos: target.span().position(),
                            subject: format!("assignment to `{}`", target.span().text()),
                            argument: None,
                            expected: "a value".to_string(),
                            got: value.kind().to_string(),
                        });
                    }
                    let value = match mode {
                        Mode::Copy => value.deep_clone(),
                        Mode::Mutate => value,
                    };
                    assign(output, target, value)?;
                }
            }
        }
        Ok(())
    }
}

fn assign_error(span: &Span, message: String) -> EvalError {
    EvalError::Function {
        pos: span.position(),
        name: span.text().to_string(),
        message,
    }
}

fn assign(message: &mut Message, target: &AssignTarget, value: Value) -> Result<(), EvalError> {
    match target {
        AssignTarget::Root { path, .. } if path.is_empty() && value.is_deleted() => {
            message.value = Value::Deleted;
            Ok(())
        }
        AssignTarget::Root { span, path } => message
            .value
            .set_path(path, value)
            .map_err(|e| assign_error(span, e.to_string())),
        AssignTarget::Meta { key: Some(key), .. } => {
            match value {
                Value::Deleted => {
                    message.metadata.remove(key.as_ref());
                }
                v => {
                    message.metadata.insert(key.to_string(), v.to_text());
                }
            }
            Ok(())
        }
        AssignTarget::Meta { span, key: None } => {
            match value {
                Value::Deleted => message.metadata.clear(),
                Value::Object(fields) => {
                    message.metadata = fields
                        .iter()
                        .filter(|(_, v)| !v.is_deleted())
                        .map(|(k, v)| (k.to_string(), v.to_text()))
                        .collect();
                }
                v => {
                    return Err(EvalError::TypeMismatch {
                        pos: span.position(),
                        subject: "meta assignment".to_string(),
                        argument: None,
                        expected: "object or deleted".to_string(),
                        got: v.kind().to_string(),
                    })
                }
            }
            Ok(())
        }
    }
}
