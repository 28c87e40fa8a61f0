// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::ExprRef;
use crate::environment::Environment;
use crate::error::{EvalError, ParseError};
use crate::interpreter::{Interpreter, Vars};
use crate::lexer::{Source, TokenKind};
use crate::message::Message;
use crate::parser::Parser;
use crate::value::Value;

#[derive(Debug)]
enum Segment {
    Text(String),
    Expr(ExprRef),
}

/// An interpolated string such as `id-${! this.id }`.
///
/// `$${!` writes a literal `${!`. Evaluation never fails: an expression that
/// errors contributes an empty string and its error is reported separately.
#[derive(Debug)]
pub struct Field {
    source: Source,
    segments: Vec<Segment>,
}

impl Field {
    pub fn parse(field: &str) -> Result<Self, ParseError> {
        Self::parse_with(&Environment::default(), field)
    }

    pub fn parse_with(env: &Environment, field: &str) -> Result<Self, ParseError> {
        let source = Source::from_contents("field".to_string(), field.to_string()).map_err(|e| {
            ParseError {
                offset: 0,
                line: 1,
                col: 1,
                message: e.to_string(),
            }
        })?;

        let text = source.contents().as_str();
        let mut segments = vec![];
        let mut literal = String::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            if rest.starts_with("$${!") {
                literal.push_str("${!");
                pos += 4;
                continue;
            }
            if rest.starts_with("${!") {
                if !literal.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut literal)));
                }
                let mut parser = Parser::new_at(&source, pos + 3, env)?;
                let expr = parser.parse_query()?;
                let tok = parser.token();
                if tok.0 != TokenKind::Symbol || tok.1.text() != "}" {
                    return Err(tok.1.error("expecting `}` to close the interpolation"));
                }
                pos = tok.1.end as usize;
                segments.push(Segment::Expr(expr));
                continue;
            }
            match rest.chars().next() {
                Some(ch) => {
                    literal.push(ch);
                    pos += ch.len_utf8();
                }
                None => break,
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }

        let field = Self { source, segments };
        log::debug!(
            "compiled field with {} interpolation(s)",
            field.exprs().count()
        );
        Ok(field)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The interpolated expressions in source order.
    pub fn exprs(&self) -> impl Iterator<Item = &ExprRef> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Expr(e) => Some(e),
            Segment::Text(_) => None,
        })
    }

    /// Whether the field contains no interpolations.
    pub fn is_static(&self) -> bool {
        self.exprs().next().is_none()
    }

    /// Evaluates the field against the message at `index` of `batch`,
    /// returning the errors of failed interpolations alongside the result.
    pub fn string_with_errors(&self, index: usize, batch: &[Message]) -> (String, Vec<EvalError>) {
        let empty = Message::default();
        let message = batch.get(index).unwrap_or(&empty);
        let vars = Vars::new();

        let mut out = String::new();
        let mut errors = vec![];
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Expr(expr) => {
                    let mut interpreter = Interpreter::new(message, batch, index, &vars);
                    match interpreter.eval(expr) {
                        Ok(Value::Deleted) => (),
                        Ok(v) => out.push_str(&v.to_text()),
                        Err(e) => errors.push(e),
                    }
                }
            }
        }
        (out, errors)
    }

    /// Evaluates the field, logging a warning for each failed interpolation.
    pub fn string(&self, index: usize, batch: &[Message]) -> String {
        let (s, errors) = self.string_with_errors(index, batch);
        for e in errors {
            log::warn!(
                "failed to evaluate interpolation of `{}`: {e}",
                self.source.contents()
            );
        }
        s
    }

    pub fn bytes(&self, index: usize, batch: &[Message]) -> Vec<u8> {
        self.string(index, batch).into_bytes()
    }
}
