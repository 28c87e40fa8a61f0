// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::environment::Environment;
use crate::error::ParseError;
use crate::lexer::*;
use crate::value::*;
use crate::*;

type ParseResult<T> = core::result::Result<T, ParseError>;

const MAX_IMPORT_DEPTH: usize = 16;

const KEYWORDS: [&str; 10] = [
    "else", "false", "if", "let", "match", "meta", "null", "root", "this", "true",
];

#[derive(Clone)]
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    tok: Token,
    // Line on which the last consumed token ends.
    line: u32,
    end: u32,
    env: &'source Environment,
    lambda_params: Vec<Rc<str>>,
    import_depth: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source, env: &'source Environment) -> ParseResult<Self> {
        Self::new_at(source, 0, env)
    }

    /// Creates a parser that starts at byte `offset` of the source. Used for
    /// the expressions embedded in interpolated fields.
    pub fn new_at(
        source: &'source Source,
        offset: usize,
        env: &'source Environment,
    ) -> ParseResult<Self> {
        let mut lexer = Lexer::new_at(source, offset);
        let tok = lexer.next_token()?;
        Ok(Self {
            lexer,
            tok,
            line: 0,
            end: offset as u32,
            env,
            lambda_params: vec![],
            import_depth: 0,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::RawString | TokenKind::Var => "",
        }
    }

    /// The token the parser is looking at.
    pub fn token(&self) -> &Token {
        &self.tok
    }

    pub fn next_token(&mut self) -> ParseResult<()> {
        // Raw strings may span lines.
        self.line = self.tok.1.line + self.tok.1.text().matches('\n').count() as u32;
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> ParseResult<()> {
        if self.tok.0 == TokenKind::Symbol && self.token_text() == text {
            self.next_token()
        } else {
            Err(self.error(&format!("expecting `{text}` {context}")))
        }
    }

    fn error(&self, msg: &str) -> ParseError {
        self.tok.1.error(msg)
    }

    fn is_symbol(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.token_text() == text
    }

    fn is_ident(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Ident && self.token_text() == text
    }

    fn is_keyword(&self, ident: &str) -> bool {
        KEYWORDS.contains(&ident)
    }

    /// Span running from `start` to the end of the last consumed token.
    fn span_from(&self, start: &Span) -> Span {
        let mut span = start.clone();
        span.end = self.end;
        span
    }

    fn peek_token(&self) -> Option<Token> {
        let mut ahead = self.clone();
        ahead.next_token().ok()?;
        Some(ahead.tok)
    }

    fn string_value(span: &Span) -> ParseResult<Rc<str>> {
        let contents = span.source.contents();
        let start = span.start as usize;
        let json = match contents[..start].chars().last() {
            Some('\'') => {
                let mut json = String::from("\"");
                let mut chars = span.text().chars();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('\'') => json.push('\''),
                            Some(n) => {
                                json.push('\\');
                                json.push(n);
                            }
                            None => json.push('\\'),
                        },
                        '"' => json.push_str("\\\""),
                        c => json.push(c),
                    }
                }
                json.push('"');
                json
            }
            _ => contents[start - 1..span.end as usize + 1].to_string(),
        };
        match serde_json::from_str::<String>(&json) {
            Ok(s) => Ok(s.into()),
            Err(e) => Err(span.error(&format!("invalid string literal: {e}"))),
        }
    }

    /// Text of a quoted or raw string token.
    fn read_string(tok: &Token) -> ParseResult<Rc<str>> {
        match tok.0 {
            TokenKind::String => Self::string_value(&tok.1),
            TokenKind::RawString => Ok(tok.1.text().into()),
            _ => Err(tok.1.error("expecting a string")),
        }
    }

    fn read_number(span: &Span) -> ParseResult<Value> {
        match serde_json::from_str::<Value>(span.text()) {
            Ok(v @ Value::Number(_)) => Ok(v),
            _ => Err(span.error("invalid number literal")),
        }
    }

    /// Path segments of a numeric token following a dot. `0.1` is lexed as a
    /// single number but addresses two nested indexes.
    fn read_indexes(span: &Span) -> ParseResult<Vec<PathSegment>> {
        span.text()
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(idx) => Ok(PathSegment::Index(idx)),
                Err(_) => Err(span.error("expecting an array index")),
            })
            .collect()
    }

    /// Reads the segment after a `.` within an assignment target.
    fn parse_target_segments(&mut self, path: &mut Vec<PathSegment>) -> ParseResult<()> {
        while self.is_symbol(".") {
            self.next_token()?;
            match self.tok.0 {
                TokenKind::Ident => path.push(PathSegment::Key(self.tok.1.text().into())),
                TokenKind::String | TokenKind::RawString => {
                    path.push(PathSegment::Key(Self::read_string(&self.tok)?))
                }
                TokenKind::Number => path.extend(Self::read_indexes(&self.tok.1)?),
                _ => return Err(self.error("expecting a field name after `.`")),
            }
            self.next_token()?;
        }
        Ok(())
    }

    fn parse_target(&mut self) -> ParseResult<AssignTarget> {
        let start = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident if self.token_text() == "meta" => {
                self.next_token()?;
                let key = match self.tok.0 {
                    TokenKind::Ident => {
                        let key = self.tok.1.text().into();
                        self.next_token()?;
                        Some(key)
                    }
                    TokenKind::String | TokenKind::RawString => {
                        let key = Self::read_string(&self.tok)?;
                        self.next_token()?;
                        Some(key)
                    }
                    _ => None,
                };
                Ok(AssignTarget::Meta {
                    span: self.span_from(&start),
                    key,
                })
            }
            TokenKind::Ident if self.token_text() == "root" => {
                self.next_token()?;
                let mut path = vec![];
                self.parse_target_segments(&mut path)?;
                Ok(AssignTarget::Root {
                    span: self.span_from(&start),
                    path,
                })
            }
            TokenKind::Ident if self.token_text() == "this" => {
                Err(self.error("cannot assign to `this`, use `root` instead"))
            }
            TokenKind::Ident if !self.is_keyword(self.token_text()) => {
                let mut path = vec![PathSegment::Key(self.tok.1.text().into())];
                self.next_token()?;
                self.parse_target_segments(&mut path)?;
                Ok(AssignTarget::Root {
                    span: self.span_from(&start),
                    path,
                })
            }
            TokenKind::String | TokenKind::RawString => {
                let mut path = vec![PathSegment::Key(Self::read_string(&self.tok)?)];
                self.next_token()?;
                self.parse_target_segments(&mut path)?;
                Ok(AssignTarget::Root {
                    span: self.span_from(&start),
                    path,
                })
            }
            _ => Err(self.error("expecting an assignment, `let` or `meta` statement")),
        }
    }

    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let start = self.tok.1.clone();
        if self.is_ident("let") {
            self.next_token()?;
            let name: Rc<str> = match self.tok.0 {
                TokenKind::Ident => self.tok.1.text().into(),
                TokenKind::String | TokenKind::RawString => Self::read_string(&self.tok)?,
                _ => return Err(self.error("expecting a variable name after `let`")),
            };
            let name_span = self.tok.1.clone();
            self.next_token()?;
            self.expect("=", "after variable name")?;
            let value = self.parse_query()?;
            return Ok(Statement::Let {
                span: self.span_from(&start),
                name: (name_span, name),
                value,
            });
        }

        let target = self.parse_target()?;
        self.expect("=", "after assignment target")?;
        let value = self.parse_query()?;
        Ok(Statement::Assign {
            span: self.span_from(&start),
            target,
            value,
        })
    }

    /// Parses a whole mapping. Statements are separated by newlines.
    pub fn parse(&mut self) -> ParseResult<Program> {
        let start = self.tok.1.clone();

        if self.is_ident("from")
            && matches!(
                self.peek_token(),
                Some(Token(TokenKind::String | TokenKind::RawString, _))
            )
        {
            return self.parse_import();
        }

        let mut statements = vec![];
        while self.tok.0 != TokenKind::Eof {
            let stmt = self.parse_statement()?;
            if self.tok.0 != TokenKind::Eof && self.tok.1.line == self.line {
                return Err(self.error("expecting end of statement (a new line)"));
            }
            statements.push(stmt);
        }
        Ok(Program {
            span: self.span_from(&start),
            statements,
        })
    }

    fn parse_import(&mut self) -> ParseResult<Program> {
        let start = self.tok.1.clone();
        self.next_token()?;
        let path = Self::read_string(&self.tok)?;
        self.next_token()?;
        if self.tok.0 != TokenKind::Eof {
            return Err(self.error("`from` must be the only statement of a mapping"));
        }
        if self.import_depth >= MAX_IMPORT_DEPTH {
            return Err(start.error(&format!(
                "import of `{path}` exceeds the maximum import depth of {MAX_IMPORT_DEPTH}"
            )));
        }

        let contents = self
            .env
            .resolve_import(&path)
            .map_err(|e| start.error(&format!("failed to read import `{path}`: {e}")))?;
        log::debug!("resolved mapping import `{path}`");
        let source = Source::from_contents(path.to_string(), contents)
            .map_err(|e| start.error(&format!("failed to read import `{path}`: {e}")))?;

        let wrap = |e: ParseError| start.error(&format!("failed to parse import `{path}`: {e}"));
        let mut parser = Parser::new(&source, self.env).map_err(wrap)?;
        parser.import_depth = self.import_depth + 1;
        parser.parse().map_err(wrap)
    }

    pub fn parse_query(&mut self) -> ParseResult<ExprRef> {
        self.parse_coalesce_expr()
    }

    fn parse_coalesce_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_or_expr()?;
        while self.is_symbol("|") {
            self.next_token()?;
            let rhs = self.parse_or_expr()?;
            expr = Ref::new(Expr::Coalesce {
                span: self.span_from(&start),
                lhs: expr,
                rhs,
            });
        }
        Ok(expr)
    }

    fn parse_or_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_and_expr()?;
        while self.is_symbol("||") {
            self.next_token()?;
            let rhs = self.parse_and_expr()?;
            expr = Ref::new(Expr::LogicExpr {
                span: self.span_from(&start),
                op: LogicOp::Or,
                lhs: expr,
                rhs,
            });
        }
        Ok(expr)
    }

    fn parse_and_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_bool_expr()?;
        while self.is_symbol("&&") {
            self.next_token()?;
            let rhs = self.parse_bool_expr()?;
            expr = Ref::new(Expr::LogicExpr {
                span: self.span_from(&start),
                op: LogicOp::And,
                lhs: expr,
                rhs,
            });
        }
        Ok(expr)
    }

    fn parse_bool_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_arith_expr()?;
        loop {
            if self.tok.0 != TokenKind::Symbol {
                return Ok(expr);
            }
            let op = match self.token_text() {
                "<" => BoolOp::Lt,
                "<=" => BoolOp::Le,
                "==" => BoolOp::Eq,
                ">=" => BoolOp::Ge,
                ">" => BoolOp::Gt,
                "!=" => BoolOp::Ne,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let rhs = self.parse_arith_expr()?;
            expr = Ref::new(Expr::BoolExpr {
                span: self.span_from(&start),
                op,
                lhs: expr,
                rhs,
            });
        }
    }

    fn parse_arith_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_mul_div_mod_expr()?;
        loop {
            if self.tok.0 != TokenKind::Symbol {
                return Ok(expr);
            }
            let op = match self.token_text() {
                "+" => ArithOp::Add,
                "-" => ArithOp::Sub,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let rhs = self.parse_mul_div_mod_expr()?;
            expr = Ref::new(Expr::ArithExpr {
                span: self.span_from(&start),
                op,
                lhs: expr,
                rhs,
            });
        }
    }

    fn parse_mul_div_mod_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_unary_expr()?;
        loop {
            if self.tok.0 != TokenKind::Symbol {
                return Ok(expr);
            }
            let op = match self.token_text() {
                "*" => ArithOp::Mul,
                "/" => ArithOp::Div,
                "%" => ArithOp::Mod,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let rhs = self.parse_unary_expr()?;
            expr = Ref::new(Expr::ArithExpr {
                span: self.span_from(&start),
                op,
                lhs: expr,
                rhs,
            });
        }
    }

    fn parse_unary_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let op = match self.token_text() {
            "!" if self.tok.0 == TokenKind::Symbol => UnaryOp::Not,
            "-" if self.tok.0 == TokenKind::Symbol => UnaryOp::Neg,
            _ => return self.parse_postfix_expr(),
        };
        self.next_token()?;
        let expr = self.parse_unary_expr()?;
        let span = self.span_from(&start);

        // Fold negative literals so they can be used as match patterns.
        if let (
            UnaryOp::Neg,
            Expr::Number {
                value: Value::Number(n),
                ..
            },
        ) = (op, expr.as_ref())
        {
            return Ok(Ref::new(Expr::Number {
                span,
                value: Value::Number(n.neg()),
            }));
        }
        Ok(Ref::new(Expr::UnaryExpr { span, op, expr }))
    }

    fn parse_postfix_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        let mut expr = self.parse_primary()?;

        while self.is_symbol(".") {
            self.next_token()?;
            match self.tok.0 {
                TokenKind::Symbol if self.token_text() == "(" => {
                    self.next_token()?;
                    let body = self.parse_lambda_or_query()?;
                    self.expect(")", "while parsing context expression")?;
                    expr = Ref::new(Expr::Context {
                        span: self.span_from(&start),
                        target: expr,
                        body,
                    });
                }
                TokenKind::Ident => {
                    let name = self.tok.1.clone();
                    self.next_token()?;
                    if self.is_symbol("(") {
                        let spec = match self.env.registry().method(name.text()) {
                            Some(spec) => spec.clone(),
                            None => {
                                return Err(
                                    name.error(&format!("unrecognised method `{}`", name.text()))
                                )
                            }
                        };
                        let params = self.parse_args()?;
                        Self::check_arity(&name, spec.arity(), &params)?;
                        expr = Ref::new(Expr::MethodCall {
                            span: self.span_from(&start),
                            target: expr,
                            name,
                            spec,
                            params,
                        });
                    } else {
                        let key = PathSegment::Key(name.text().into());
                        expr = Ref::new(Expr::RefDot {
                            span: self.span_from(&start),
                            refr: expr,
                            field: (name, key),
                        });
                    }
                }
                TokenKind::String | TokenKind::RawString => {
                    let name = self.tok.1.clone();
                    let key = PathSegment::Key(Self::read_string(&self.tok)?);
                    self.next_token()?;
                    expr = Ref::new(Expr::RefDot {
                        span: self.span_from(&start),
                        refr: expr,
                        field: (name, key),
                    });
                }
                TokenKind::Number => {
                    let name = self.tok.1.clone();
                    let indexes = Self::read_indexes(&name)?;
                    self.next_token()?;
                    for idx in indexes {
                        expr = Ref::new(Expr::RefDot {
                            span: self.span_from(&start),
                            refr: expr,
                            field: (name.clone(), idx),
                        });
                    }
                }
                _ => return Err(self.error("expecting a field, index or method after `.`")),
            }
        }
        Ok(expr)
    }

    fn check_arity(
        name: &Span,
        (min, max): (usize, Option<usize>),
        args: &[ExprRef],
    ) -> ParseResult<()> {
        let got = args.len();
        if got >= min && max.map_or(true, |m| got <= m) {
            return Ok(());
        }
        let expected = match max {
            Some(m) if m == min => format!("{min} argument{}", if m == 1 { "" } else { "s" }),
            Some(m) => format!("{min} to {m} arguments"),
            None => format!("at least {min} arguments"),
        };
        let at = match max {
            Some(m) if got > m => args[m].span(),
            _ => name,
        };
        Err(at.error(&format!(
            "`{}` expects {expected}, got {got}",
            name.text()
        )))
    }

    fn parse_args(&mut self) -> ParseResult<Vec<ExprRef>> {
        self.expect("(", "while parsing arguments")?;
        let mut args = vec![];
        while !self.is_symbol(")") {
            args.push(self.parse_lambda_or_query()?);
            if self.is_symbol(",") {
                self.next_token()?;
            } else if !self.is_symbol(")") {
                return Err(self.error("expecting `,` or `)` while parsing arguments"));
            }
        }
        self.expect(")", "while parsing arguments")?;
        Ok(args)
    }

    fn parse_lambda_or_query(&mut self) -> ParseResult<ExprRef> {
        let is_lambda = self.tok.0 == TokenKind::Ident
            && matches!(
                self.peek_token(),
                Some(Token(TokenKind::Symbol, ref s)) if s.text() == "->"
            );
        if !is_lambda {
            return self.parse_query();
        }

        let start = self.tok.1.clone();
        if self.is_keyword(start.text()) {
            return Err(start.error(&format!(
                "`{}` is a keyword and cannot name a lambda parameter",
                start.text()
            )));
        }
        let name: Rc<str> = start.text().into();
        self.next_token()?;
        self.next_token()?;

        self.lambda_params.push(name.clone());
        let body = self.parse_query();
        self.lambda_params.pop();
        let body = body?;

        Ok(Ref::new(Expr::Lambda {
            span: self.span_from(&start),
            param: (start, name),
            body,
        }))
    }

    fn parse_block(&mut self, context: &str) -> ParseResult<ExprRef> {
        self.expect("{", context)?;
        let expr = self.parse_query()?;
        self.expect("}", context)?;
        Ok(expr)
    }

    fn parse_if_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;

        let mut branches = vec![];
        let mut otherwise = None;
        loop {
            let cond = self.parse_query()?;
            let body = self.parse_block("while parsing if expression")?;
            branches.push((cond, body));

            if !self.is_ident("else") {
                break;
            }
            self.next_token()?;
            if self.is_ident("if") {
                self.next_token()?;
                continue;
            }
            otherwise = Some(self.parse_block("while parsing else block")?);
            break;
        }

        Ok(Ref::new(Expr::IfExpr {
            span: self.span_from(&start),
            branches,
            otherwise,
        }))
    }

    fn parse_match_expr(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;

        let subject = match self.is_symbol("{") {
            true => None,
            false => Some(self.parse_query()?),
        };
        self.expect("{", "while parsing match expression")?;

        let mut cases = vec![];
        while !self.is_symbol("}") {
            let case_start = self.tok.1.clone();
            let pattern = if self.is_ident("_") {
                self.next_token()?;
                MatchPattern::Wildcard
            } else {
                let expr = self.parse_query()?;
                match expr.is_literal() {
                    true => MatchPattern::Literal(expr),
                    false => MatchPattern::Query(expr),
                }
            };
            self.expect("=>", "while parsing match case")?;
            let value = self.parse_query()?;
            cases.push(MatchCase {
                span: self.span_from(&case_start),
                pattern,
                value,
            });
            if self.is_symbol(",") {
                self.next_token()?;
            }
            if self.tok.0 == TokenKind::Eof {
                return Err(self.error("expecting `}` while parsing match expression"));
            }
        }
        self.expect("}", "while parsing match expression")?;

        Ok(Ref::new(Expr::Match {
            span: self.span_from(&start),
            subject,
            cases,
        }))
    }

    fn parse_array(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;
        let mut items = vec![];
        while !self.is_symbol("]") {
            items.push(self.parse_query()?);
            if self.is_symbol(",") {
                self.next_token()?;
            } else if !self.is_symbol("]") {
                return Err(self.error("expecting `,` or `]` while parsing array"));
            }
        }
        self.next_token()?;
        Ok(Ref::new(Expr::Array {
            span: self.span_from(&start),
            items,
        }))
    }

    fn parse_object(&mut self) -> ParseResult<ExprRef> {
        let start = self.tok.1.clone();
        self.next_token()?;
        let mut fields = vec![];
        while !self.is_symbol("}") {
            let key = self.parse_query()?;
            self.expect(":", "after object key")?;
            let value = self.parse_query()?;
            fields.push((key, value));
            if self.is_symbol(",") {
                self.next_token()?;
            } else if !self.is_symbol("}") {
                return Err(self.error("expecting `,` or `}` while parsing object"));
            }
        }
        self.next_token()?;
        Ok(Ref::new(Expr::Object {
            span: self.span_from(&start),
            fields,
        }))
    }

    fn parse_call(&mut self, name: Span) -> ParseResult<ExprRef> {
        let spec = match self.env.registry().function(name.text()) {
            Some(spec) => spec.clone(),
            None => {
                return Err(name.error(&format!("unrecognised function `{}`", name.text())))
            }
        };
        let params = self.parse_args()?;
        Self::check_arity(&name, spec.arity(), &params)?;
        Ok(Ref::new(Expr::Call {
            span: self.span_from(&name),
            name,
            spec,
            params,
        }))
    }

    fn parse_primary(&mut self) -> ParseResult<ExprRef> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Number => {
                let value = Self::read_number(&span)?;
                self.next_token()?;
                Ok(Ref::new(Expr::Number { span, value }))
            }
            TokenKind::String | TokenKind::RawString => {
                let value = Value::String(Self::read_string(&self.tok)?);
                self.next_token()?;
                Ok(Ref::new(Expr::String { span, value }))
            }
            TokenKind::Var => {
                let name = span.text()[1..].into();
                self.next_token()?;
                Ok(Ref::new(Expr::Var { span, name }))
            }
            TokenKind::Symbol => match self.token_text() {
                "(" => {
                    self.next_token()?;
                    let expr = self.parse_query()?;
                    self.expect(")", "while parsing parenthesized expression")?;
                    Ok(expr)
                }
                "[" => self.parse_array(),
                "{" => self.parse_object(),
                t => Err(self.error(&format!("unexpected `{t}`"))),
            },
            TokenKind::Ident => match self.token_text() {
                "null" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::Null { span }))
                }
                "true" | "false" => {
                    let value = self.token_text() == "true";
                    self.next_token()?;
                    Ok(Ref::new(Expr::Bool { span, value }))
                }
                "this" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::This { span }))
                }
                "root" => {
                    self.next_token()?;
                    Ok(Ref::new(Expr::Root { span }))
                }
                "if" => self.parse_if_expr(),
                "match" => self.parse_match_expr(),
                // `meta` names an assignment target but is also a function.
                "meta" => {
                    self.next_token()?;
                    match self.is_symbol("(") {
                        true => self.parse_call(span),
                        false => Err(span.error("unexpected keyword `meta`")),
                    }
                }
                kw if self.is_keyword(kw) => Err(self.error(&format!("unexpected keyword `{kw}`"))),
                _ => {
                    self.next_token()?;
                    if self.is_symbol("(") {
                        return self.parse_call(span);
                    }

                    let name: Rc<str> = span.text().into();
                    if self.lambda_params.contains(&name) {
                        return Ok(Ref::new(Expr::Param { span, name }));
                    }

                    // A bare identifier is shorthand for `this.<ident>`.
                    let mut this_span = span.clone();
                    this_span.end = this_span.start;
                    Ok(Ref::new(Expr::RefDot {
                        span: span.clone(),
                        refr: Ref::new(Expr::This { span: this_span }),
                        field: (span, PathSegment::Key(name)),
                    }))
                }
            },
            TokenKind::Eof => Err(self.error("unexpected end of input, expecting an expression")),
        }
    }
}

/// Parses mapping source using the functions and methods of `env`.
pub fn parse_mapping(source: &Source, env: &Environment) -> ParseResult<Program> {
    let mut parser = Parser::new(source, env)?;
    parser.parse()
}
