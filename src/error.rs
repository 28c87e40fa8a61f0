// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use thiserror::Error;

/// Location of a node within mapping source.
///
/// `offset` is a byte offset. `line` and `col` are one-based, with columns
/// counted in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} char {}", self.line, self.col)
    }
}

/// Malformed mapping or field source. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line} char {col}: {message}")]
pub struct ParseError {
    pub offset: u32,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl ParseError {
    pub fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }
}

/// Broad classification of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FieldNotFound,
    TypeMismatch,
    Function,
    User,
}

/// Error raised while evaluating a mapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{pos}: field `{path}` not found")]
    FieldNotFound { pos: Position, path: String },

    /// `argument` is the one-based position of the offending argument, or
    /// `None` when the target of a method or an operand is at fault.
    #[error("{pos}: {}: expected {expected}, got {got}", describe_subject(.subject, .argument))]
    TypeMismatch {
        pos: Position,
        subject: String,
        argument: Option<usize>,
        expected: String,
        got: String,
    },

    #[error("{pos}: `{name}` failed: {message}")]
    Function {
        pos: Position,
        name: String,
        message: String,
    },

    #[error("{pos}: {message}")]
    User { pos: Position, message: String },
}

fn describe_subject(subject: &str, argument: &Option<usize>) -> String {
    match argument {
        Some(n) => format!("{subject} argument {n}"),
        None => subject.to_string(),
    }
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Function { .. } => ErrorKind::Function,
            Self::User { .. } => ErrorKind::User,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::FieldNotFound { pos, .. }
            | Self::TypeMismatch { pos, .. }
            | Self::Function { pos, .. }
            | Self::User { pos, .. } => *pos,
        }
    }

    /// The error text without its position prefix.
    pub fn message(&self) -> String {
        let text = self.to_string();
        let prefix = format!("{}: ", self.position());
        match text.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None => text,
        }
    }
}

pub type EvalResult<T = crate::Value> = core::result::Result<T, EvalError>;
