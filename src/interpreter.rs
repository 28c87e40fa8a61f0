// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::builtins::{self, FunctionImpl, MethodImpl};
use crate::error::{EvalError, EvalResult};
use crate::lexer::*;
use crate::message::Message;
use crate::registry::{FunctionSpec, MethodSpec};
use crate::value::*;
use crate::*;

use std::collections::BTreeMap;

/// Variables bound by `let` statements.
pub type Vars = BTreeMap<Rc<str>, Value>;

/// Evaluates expressions against one message of a batch.
///
/// `this` starts as the message document and is rebound by higher-order
/// methods and `.(...)` contexts. Lambda parameters live in a stack of
/// frames, one per invocation.
pub struct Interpreter<'a> {
    message: &'a Message,
    batch: &'a [Message],
    index: usize,
    vars: &'a Vars,
    contexts: Vec<Value>,
    params: Vec<(Rc<str>, Value)>,
}

impl<'a> Interpreter<'a> {
    pub fn new(message: &'a Message, batch: &'a [Message], index: usize, vars: &'a Vars) -> Self {
        Self {
            message,
            batch,
            index,
            vars,
            contexts: vec![message.value.clone()],
            params: vec![],
        }
    }

    /// The message being evaluated.
    pub fn message(&self) -> &'a Message {
        self.message
    }

    pub fn batch_size(&self) -> usize {
        self.batch.len().max(self.index + 1)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// A message of the batch. The message being evaluated is returned for
    /// its own index even while it is detached from the batch.
    pub fn message_at(&self, index: usize) -> Option<&'a Message> {
        if index == self.index {
            Some(self.message)
        } else {
            self.batch.get(index)
        }
    }

    /// A variable bound by `let`.
    pub fn var(&self, name: &str) -> Option<&'a Value> {
        self.vars.get(name)
    }

    pub fn this(&self) -> &Value {
        match self.contexts.last() {
            Some(v) => v,
            None => &self.message.value,
        }
    }

    /// Evaluates `expr` with `this` bound to `context`.
    pub fn eval_in_context(&mut self, context: Value, expr: &ExprRef) -> EvalResult {
        self.contexts.push(context);
        let r = self.eval(expr);
        self.contexts.pop();
        r
    }

    /// Applies a higher-order argument to `arg`. A named lambda binds its
    /// parameter; any other expression sees `arg` as `this`.
    pub fn eval_lambda(&mut self, expr: &ExprRef, arg: Value) -> EvalResult {
        match expr.as_ref() {
            Expr::Lambda { param, body, .. } => {
                self.params.push((param.1.clone(), arg));
                let r = self.eval(body);
                self.params.pop();
                r
            }
            _ => self.eval_in_context(arg, expr),
        }
    }

    /// Evaluates `expr` against another message of the batch.
    pub fn eval_in_message(&mut self, span: &Span, index: usize, expr: &ExprRef) -> EvalResult {
        let message = match self.message_at(index) {
            Some(m) => m,
            None => {
                return Err(EvalError::Function {
                    pos: span.position(),
                    name: "from".to_string(),
                    message: format!(
                        "message index {index} exceeds the batch size of {}",
                        self.batch_size()
                    ),
                })
            }
        };
        let mut sub = Interpreter::new(message, self.batch, index, self.vars);
        sub.params = self.params.clone();
        sub.eval(expr)
    }

    fn lookup_param(&self, span: &Span, name: &str) -> EvalResult {
        match self.params.iter().rev().find(|(n, _)| n.as_ref() == name) {
            Some((_, v)) => Ok(v.clone()),
            None => Err(EvalError::FieldNotFound {
                pos: span.position(),
                path: name.to_string(),
            }),
        }
    }

    fn lookup_field(span: &Span, value: &Value, field: &PathSegment) -> EvalResult {
        let found = match (value, field) {
            (Value::Object(fields), PathSegment::Key(k)) => fields.get(k.as_ref()),
            (Value::Object(fields), PathSegment::Index(i)) => fields.get(i.to_string().as_str()),
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
            (Value::Null, _) => None,
            _ => {
                return Err(EvalError::TypeMismatch {
                    pos: span.position(),
                    subject: format!("field `{}`", span.text()),
                    argument: None,
                    expected: match field {
                        PathSegment::Key(_) => "object".to_string(),
                        PathSegment::Index(_) => "array".to_string(),
                    },
                    got: value.kind().to_string(),
                });
            }
        };
        match found {
            Some(v) => Ok(v.clone()),
            None => Err(EvalError::FieldNotFound {
                pos: span.position(),
                path: span.text().to_string(),
            }),
        }
    }

    fn eval_array(&mut self, items: &[ExprRef]) -> EvalResult {
        let mut array = Vec::with_capacity(items.len());
        for item in items {
            match self.eval(item)? {
                Value::Deleted => (),
                v => array.push(v),
            }
        }
        Ok(Value::from(array))
    }

    fn eval_object(&mut self, fields: &[(ExprRef, ExprRef)]) -> EvalResult {
        let mut object = Map::new();
        for (key_expr, value_expr) in fields {
            let key = match self.eval(key_expr)? {
                Value::String(s) => s,
                v => {
                    return Err(EvalError::TypeMismatch {
                        pos: key_expr.span().position(),
                        subject: "object key".to_string(),
                        argument: None,
                        expected: "string".to_string(),
                        got: v.kind().to_string(),
                    })
                }
            };
            match self.eval(value_expr)? {
                Value::Deleted => (),
                v => {
                    object.insert(key, v);
                }
            }
        }
        Ok(Value::from(object))
    }

    fn eval_args(&mut self, params: &[ExprRef]) -> EvalResult<Vec<Value>> {
        params.iter().map(|p| self.eval(p)).collect()
    }

    fn eval_call(&mut self, span: &Span, spec: &FunctionSpec, params: &[ExprRef]) -> EvalResult {
        let args = self.eval_args(params)?;
        match &spec.fcn {
            FunctionImpl::Eager(f) => f(self, span, params, &args),
            FunctionImpl::Extension(f) => f(&args).map_err(|e| EvalError::Function {
                pos: span.position(),
                name: spec.name.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn eval_method_call(
        &mut self,
        target: &ExprRef,
        name: &Span,
        spec: &MethodSpec,
        params: &[ExprRef],
    ) -> EvalResult {
        match &spec.fcn {
            MethodImpl::Eager(f) => {
                let target = self.eval(target)?;
                let args = self.eval_args(params)?;
                f(name, params, &target, &args)
            }
            MethodImpl::Lazy(f) => f(self, name, target, params),
        }
    }

    fn eval_unary_expr(&mut self, span: &Span, op: &UnaryOp, expr: &ExprRef) -> EvalResult {
        let v = self.eval(expr)?;
        match (op, &v) {
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(n.neg())),
            _ => Err(EvalError::TypeMismatch {
                pos: span.position(),
                subject: match op {
                    UnaryOp::Not => "operator `!`".to_string(),
                    UnaryOp::Neg => "operator `-`".to_string(),
                },
                argument: None,
                expected: match op {
                    UnaryOp::Not => "bool".to_string(),
                    UnaryOp::Neg => "number".to_string(),
                },
                got: v.kind().to_string(),
            }),
        }
    }

    fn eval_logic_expr(&mut self, op: &LogicOp, lhs: &ExprRef, rhs: &ExprRef) -> EvalResult {
        let subject = match op {
            LogicOp::And => "operator `&&`",
            LogicOp::Or => "operator `||`",
        };
        let as_bool = |v: Value, e: &ExprRef| match v {
            Value::Bool(b) => Ok(b),
            v => Err(EvalError::TypeMismatch {
                pos: e.span().position(),
                subject: subject.to_string(),
                argument: None,
                expected: "bool".to_string(),
                got: v.kind().to_string(),
            }),
        };
        let l = as_bool(self.eval(lhs)?, lhs)?;
        match (op, l) {
            (LogicOp::And, false) => Ok(Value::Bool(false)),
            (LogicOp::Or, true) => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(as_bool(self.eval(rhs)?, rhs)?)),
        }
    }

    fn eval_coalesce(&mut self, lhs: &ExprRef, rhs: &ExprRef) -> EvalResult {
        match self.eval(lhs) {
            Ok(Value::Null) | Err(_) => self.eval(rhs),
            Ok(v) => Ok(v),
        }
    }

    fn eval_condition(&mut self, cond: &ExprRef) -> EvalResult<bool> {
        match self.eval(cond)? {
            Value::Bool(b) => Ok(b),
            v => Err(EvalError::TypeMismatch {
                pos: cond.span().position(),
                subject: "condition".to_string(),
                argument: None,
                expected: "bool".to_string(),
                got: v.kind().to_string(),
            }),
        }
    }

    fn eval_if_expr(
        &mut self,
        branches: &[(ExprRef, ExprRef)],
        otherwise: &Option<ExprRef>,
    ) -> EvalResult {
        for (cond, body) in branches {
            if self.eval_condition(cond)? {
                return self.eval(body);
            }
        }
        match otherwise {
            Some(body) => self.eval(body),
            None => Ok(Value::Null),
        }
    }

    fn eval_match_case(&mut self, subject: &Value, case: &MatchCase) -> EvalResult<bool> {
        match &case.pattern {
            MatchPattern::Wildcard => Ok(true),
            MatchPattern::Literal(lit) => Ok(self.eval(lit)? == *subject),
            MatchPattern::Query(query) => {
                self.contexts.push(subject.clone());
                let r = self.eval_condition(query);
                self.contexts.pop();
                r
            }
        }
    }

    fn eval_match(&mut self, subject: &Option<ExprRef>, cases: &[MatchCase]) -> EvalResult {
        let (subject, rebind) = match subject {
            Some(s) => (self.eval(s)?, true),
            None => (self.this().clone(), false),
        };
        for case in cases {
            if self.eval_match_case(&subject, case)? {
                return match rebind {
                    true => self.eval_in_context(subject, &case.value),
                    false => self.eval(&case.value),
                };
            }
        }
        Ok(Value::Null)
    }

    pub fn eval(&mut self, expr: &ExprRef) -> EvalResult {
        match expr.as_ref() {
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Number { value, .. } | Expr::String { value, .. } => Ok(value.clone()),
            Expr::Array { items, .. } => self.eval_array(items),
            Expr::Object { fields, .. } => self.eval_object(fields),

            Expr::This { .. } => Ok(self.this().clone()),
            Expr::Root { .. } => Ok(self.message.value.clone()),
            Expr::Var { span, name } => match self.vars.get(name) {
                Some(v) => Ok(v.clone()),
                None => Err(EvalError::FieldNotFound {
                    pos: span.position(),
                    path: format!("${name}"),
                }),
            },
            Expr::Param { span, name } => self.lookup_param(span, name),
            Expr::RefDot {
                span, refr, field, ..
            } => {
                let v = self.eval(refr)?;
                Self::lookup_field(span, &v, &field.1)
            }

            Expr::Call {
                span, spec, params, ..
            } => self.eval_call(span, spec, params),
            Expr::MethodCall {
                target,
                name,
                spec,
                params,
                ..
            } => self.eval_method_call(target, name, spec, params),

            Expr::Lambda { span, .. } => Err(EvalError::Function {
                pos: span.position(),
                name: "lambda".to_string(),
                message: "a lambda can only be passed to a method that accepts one".to_string(),
            }),
            Expr::Context { target, body, .. } => {
                let v = self.eval(target)?;
                self.eval_lambda(body, v)
            }

            Expr::UnaryExpr { span, op, expr } => self.eval_unary_expr(span, op, expr),
            Expr::ArithExpr { span, op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                builtins::numbers::arithmetic_operation(span, op, lhs, rhs, l, r)
            }
            Expr::BoolExpr { span, op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                builtins::comparison::compare(span, op, &l, &r)
            }
            Expr::LogicExpr { op, lhs, rhs, .. } => self.eval_logic_expr(op, lhs, rhs),
            Expr::Coalesce { lhs, rhs, .. } => self.eval_coalesce(lhs, rhs),
            Expr::IfExpr {
                branches,
                otherwise,
                ..
            } => self.eval_if_expr(branches, otherwise),
            Expr::Match { subject, cases, .. } => self.eval_match(subject, cases),
        }
    }
}
