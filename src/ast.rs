// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::registry::{FunctionSpec, MethodSpec};
use crate::value::{PathSegment, Value};
use crate::*;

use core::{cmp, fmt, ops::Deref};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoolOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
}

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;
pub type ExprRef = Ref<Expr>;

#[derive(Debug)]
pub enum Expr {
    Null {
        span: Span,
    },

    Bool {
        span: Span,
        value: bool,
    },

    Number {
        span: Span,
        value: Value,
    },

    // Quoted, single quoted and raw strings.
    String {
        span: Span,
        value: Value,
    },

    Array {
        span: Span,
        items: Vec<ExprRef>,
    },

    // Keys are string literals or expressions that must yield strings.
    Object {
        span: Span,
        fields: Vec<(ExprRef, ExprRef)>,
    },

    This {
        span: Span,
    },

    Root {
        span: Span,
    },

    // `$name`
    Var {
        span: Span,
        name: Rc<str>,
    },

    // Identifier bound by an enclosing lambda.
    Param {
        span: Span,
        name: Rc<str>,
    },

    RefDot {
        span: Span,
        refr: ExprRef,
        field: (Span, PathSegment),
    },

    Call {
        span: Span,
        name: Span,
        spec: Rc<FunctionSpec>,
        params: Vec<ExprRef>,
    },

    MethodCall {
        span: Span,
        target: ExprRef,
        name: Span,
        spec: Rc<MethodSpec>,
        params: Vec<ExprRef>,
    },

    // `name -> body`
    Lambda {
        span: Span,
        param: (Span, Rc<str>),
        body: ExprRef,
    },

    // `target.(body)`
    Context {
        span: Span,
        target: ExprRef,
        body: ExprRef,
    },

    UnaryExpr {
        span: Span,
        op: UnaryOp,
        expr: ExprRef,
    },

    ArithExpr {
        span: Span,
        op: ArithOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    BoolExpr {
        span: Span,
        op: BoolOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    LogicExpr {
        span: Span,
        op: LogicOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    // `lhs | rhs`
    Coalesce {
        span: Span,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    IfExpr {
        span: Span,
        branches: Vec<(ExprRef, ExprRef)>,
        otherwise: Option<ExprRef>,
    },

    Match {
        span: Span,
        subject: Option<ExprRef>,
        cases: Vec<MatchCase>,
    },
}

#[derive(Debug)]
pub enum MatchPattern {
    Wildcard,
    // Compared for equality with the subject.
    Literal(ExprRef),
    // Evaluated with the subject as context, must yield a bool.
    Query(ExprRef),
}

#[derive(Debug)]
pub struct MatchCase {
    pub span: Span,
    pub pattern: MatchPattern,
    pub value: ExprRef,
}

impl Expr {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Null { ref span, .. }
            | Self::Bool { ref span, .. }
            | Self::Number { ref span, .. }
            | Self::String { ref span, .. }
            | Self::Array { ref span, .. }
            | Self::Object { ref span, .. }
            | Self::This { ref span, .. }
            | Self::Root { ref span, .. }
            | Self::Var { ref span, .. }
            | Self::Param { ref span, .. }
            | Self::RefDot { ref span, .. }
            | Self::Call { ref span, .. }
            | Self::MethodCall { ref span, .. }
            | Self::Lambda { ref span, .. }
            | Self::Context { ref span, .. }
            | Self::UnaryExpr { ref span, .. }
            | Self::ArithExpr { ref span, .. }
            | Self::BoolExpr { ref span, .. }
            | Self::LogicExpr { ref span, .. }
            | Self::Coalesce { ref span, .. }
            | Self::IfExpr { ref span, .. }
            | Self::Match { ref span, .. } => span,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Null { .. } | Self::Bool { .. } | Self::Number { .. } | Self::String { .. }
        )
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&ExprRef> {
        match self {
            Self::Null { .. }
            | Self::Bool { .. }
            | Self::Number { .. }
            | Self::String { .. }
            | Self::This { .. }
            | Self::Root { .. }
            | Self::Var { .. }
            | Self::Param { .. } => vec![],
            Self::Array { items, .. } => items.iter().collect(),
            Self::Object { fields, .. } => fields.iter().flat_map(|(k, v)| [k, v]).collect(),
            Self::RefDot { refr, .. } => vec![refr],
            Self::Call { params, .. } => params.iter().collect(),
            Self::MethodCall { target, params, .. } => {
                let mut c = vec![target];
                c.extend(params.iter());
                c
            }
            Self::Lambda { body, .. } => vec![body],
            Self::Context { target, body, .. } => vec![target, body],
            Self::UnaryExpr { expr, .. } => vec![expr],
            Self::ArithExpr { lhs, rhs, .. }
            | Self::BoolExpr { lhs, rhs, .. }
            | Self::LogicExpr { lhs, rhs, .. }
            | Self::Coalesce { lhs, rhs, .. } => vec![lhs, rhs],
            Self::IfExpr {
                branches,
                otherwise,
                ..
            } => {
                let mut c: Vec<&ExprRef> = branches.iter().flat_map(|(k, v)| [k, v]).collect();
                c.extend(otherwise.iter());
                c
            }
            Self::Match { subject, cases, .. } => {
                let mut c: Vec<&ExprRef> = subject.iter().collect();
                for case in cases {
                    match &case.pattern {
                        MatchPattern::Wildcard => (),
                        MatchPattern::Literal(e) | MatchPattern::Query(e) => c.push(e),
                    }
                    c.push(&case.value);
                }
                c
            }
        }
    }

    /// Visits this node and its descendants in pre-order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        for child in self.children() {
            child.as_ref().walk(f);
        }
    }
}

#[derive(Debug)]
pub enum AssignTarget {
    // `root`, `root.a.b` or the bare `a.b` shorthand.
    Root { span: Span, path: Vec<PathSegment> },
    // `meta`, `meta foo` or `meta "foo"`.
    Meta { span: Span, key: Option<Rc<str>> },
}

impl AssignTarget {
    pub fn span(&self) -> &Span {
        match self {
            Self::Root { span, .. } | Self::Meta { span, .. } => span,
        }
    }
}

#[derive(Debug)]
pub enum Statement {
    Assign {
        span: Span,
        target: AssignTarget,
        value: ExprRef,
    },
    Let {
        span: Span,
        name: (Span, Rc<str>),
        value: ExprRef,
    },
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Self::Assign { span, .. } | Self::Let { span, .. } => span,
        }
    }

    pub fn value(&self) -> &ExprRef {
        match self {
            Self::Assign { value, .. } | Self::Let { value, .. } => value,
        }
    }
}

/// A parsed mapping: its statements in source order.
#[derive(Debug)]
pub struct Program {
    pub span: Span,
    pub statements: Vec<Statement>,
}

impl Program {
    /// Visits every expression node in pre-order, statement by statement.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        for stmt in &self.statements {
            stmt.value().as_ref().walk(f);
        }
    }
}
