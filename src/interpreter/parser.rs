use chumsky::Parser as _;
use chumsky::span::SimpleSpan;
use std::rc::Rc;

use crate::ast::{
    BinaryOp, Expr, ExprKind, Iterable, MemberKey, Program, Stmt, TupleEntry, TypeIndicator,
    UnaryOp,
};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer;
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    at_eof: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            at_eof: false,
        }
    }

    /// True when the parse failed because input ran out; an interactive
    /// host can keep reading instead of reporting.
    pub fn is_incomplete(&self) -> bool {
        self.at_eof
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::primary(self.span, "here"))
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Lex and parse a complete program.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let (output, errors) = lexer::lexer().parse(source).into_output_errors();
    if let Some(err) = errors.first() {
        let span = err.span();
        return Err(ParseError {
            message: err.to_string(),
            span: Span::new(span.start, span.end),
            at_eof: err.found().is_none(),
        });
    }
    let tokens = output.unwrap_or_default();
    TokenParser::from_lexer_output(tokens, source.len()).parse()
}

pub struct TokenParser {
    tokens: Vec<(Token, Span)>,
    current: usize,
    eof: Span,
}

impl TokenParser {
    pub fn from_lexer_output(tokens: Vec<(Token, SimpleSpan)>, source_len: usize) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|(tok, span)| (tok, Span::new(span.start, span.end)))
            .collect();
        Self {
            tokens,
            current: 0,
            eof: Span::new(source_len, source_len),
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|(tok, _)| tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|(tok, _)| tok)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.current)
            .map(|(_, span)| *span)
            .unwrap_or(self.eof)
    }

    fn prev_span(&self) -> Span {
        if self.current == 0 {
            return self.eof;
        }
        self.tokens
            .get(self.current - 1)
            .map(|(_, span)| *span)
            .unwrap_or(self.eof)
    }

    fn advance(&mut self) -> Option<Token> {
        if self.current < self.tokens.len() {
            let token = self.tokens[self.current].0.clone();
            self.current += 1;
            Some(token)
        } else {
            None
        }
    }

    fn found_desc(&self) -> String {
        match self.current_token() {
            Some(tok) => format!("`{}`", tok),
            None => "end of input".to_string(),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            span: self.current_span(),
            at_eof: self.current_token().is_none(),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        match self.current_token() {
            Some(tok) if std::mem::discriminant(tok) == std::mem::discriminant(expected) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(format!(
                "expected `{}`, found {}",
                expected,
                self.found_desc()
            ))),
        }
    }

    /// Consume the token if it matches.
    fn check(&mut self, token: &Token) -> bool {
        match self.current_token() {
            Some(tok) if std::mem::discriminant(tok) == std::mem::discriminant(token) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn at_any(&self, terminators: &[Token]) -> bool {
        match self.current_token() {
            Some(tok) => terminators
                .iter()
                .any(|t| std::mem::discriminant(t) == std::mem::discriminant(tok)),
            None => false,
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<str>, ParseError> {
        match self.current_token() {
            Some(Token::Ident(_)) => match self.advance() {
                Some(Token::Ident(name)) => Ok(Rc::from(name.as_str())),
                _ => unreachable!(),
            },
            _ => Err(self.error_here(format!(
                "expected an identifier, found {}",
                self.found_desc()
            ))),
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.current_token().is_some() {
            statements.push(self.parse_statement()?);
            self.expect(&Token::Semicolon)?;
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current_token() {
            Some(Token::Var) => self.parse_var_statement(),
            Some(Token::If) => self.parse_if_statement(),
            Some(Token::While) => self.parse_while_statement(),
            Some(Token::For) => self.parse_for_statement(),
            Some(Token::Loop) => self.parse_loop_statement(),
            _ => {
                let expr = self.parse_expression()?;
                if self.check(&Token::Assign) {
                    let value = self.parse_expression()?;
                    Ok(Stmt::Assign {
                        target: expr,
                        value,
                    })
                } else {
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }

    /// Statements up to (not including) one of `terminators`, each
    /// terminated by `;`.
    fn parse_body(&mut self, terminators: &[Token]) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        loop {
            if self.current_token().is_none() {
                let expected: Vec<String> =
                    terminators.iter().map(|t| format!("`{}`", t)).collect();
                return Err(self.error_here(format!(
                    "expected {} before end of input",
                    expected.join(" or ")
                )));
            }
            if self.at_any(terminators) {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
            self.expect(&Token::Semicolon)?;
        }
    }

    fn parse_var_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Token::Var)?;
        let name_span = self.current_span();
        let name = self.expect_ident()?;
        let init = if self.check(&Token::Assign) {
            self.parse_expression()?
        } else {
            Expr::new(ExprKind::Empty, name_span)
        };
        Ok(Stmt::Var { name, init })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Token::If)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::Then)?;
        let then_body = self.parse_body(&[Token::Else, Token::End])?;
        let else_body = if self.check(&Token::Else) {
            self.parse_body(&[Token::End])?
        } else {
            Vec::new()
        };
        self.expect(&Token::End)?;
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Token::While)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::Loop)?;
        let body = self.parse_body(&[Token::End])?;
        self.expect(&Token::End)?;
        Ok(Stmt::While { cond, body })
    }

    /// `loop … end` is sugar for `while true loop … end`.
    fn parse_loop_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword_span = self.current_span();
        self.expect(&Token::Loop)?;
        let body = self.parse_body(&[Token::End])?;
        self.expect(&Token::End)?;
        Ok(Stmt::While {
            cond: Expr::new(ExprKind::Bool(true), keyword_span),
            body,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Token::For)?;
        let var = self.expect_ident()?;
        self.expect(&Token::In)?;
        let first = self.parse_expression()?;
        let iterable = if self.check(&Token::DotDot) {
            let hi = self.parse_expression()?;
            Iterable::Range(first, hi)
        } else {
            Iterable::Expr(first)
        };
        self.expect(&Token::Loop)?;
        let body = self.parse_body(&[Token::End])?;
        self.expect(&Token::End)?;
        Ok(Stmt::For {
            var,
            iterable,
            body,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current_token() {
                Some(Token::And) => BinaryOp::And,
                Some(Token::Or) => BinaryOp::Or,
                Some(Token::Xor) => BinaryOp::Xor,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_token() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_term(),
        };
        let op_span = self.current_span();
        self.advance();
        let operand = self.parse_unary()?;
        let span = op_span.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// A primary followed by any number of postfix tails.
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_token() {
                Some(Token::LParen) => {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.current_token(), Some(Token::RParen)) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.check(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Some(Token::Dot) => {
                    self.advance();
                    let key = match self.current_token() {
                        Some(Token::Ident(_)) => MemberKey::Name(self.expect_ident()?),
                        Some(Token::Int(n)) => {
                            let n = *n;
                            self.advance();
                            MemberKey::Index(n)
                        }
                        _ => {
                            return Err(self.error_here(format!(
                                "expected a member name or index after `.`, found {}",
                                self.found_desc()
                            )));
                        }
                    };
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr::new(
                        ExprKind::Member {
                            target: Box::new(expr),
                            key,
                        },
                        span,
                    );
                }
                Some(Token::Is) => {
                    self.advance();
                    let indicator = self.parse_type_indicator()?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr::new(
                        ExprKind::Is {
                            operand: Box::new(expr),
                            indicator,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_type_indicator(&mut self) -> Result<TypeIndicator, ParseError> {
        match self.current_token() {
            Some(Token::Func) => {
                self.advance();
                Ok(TypeIndicator::Func)
            }
            Some(Token::Ident(name)) => match TypeIndicator::from_name(name) {
                Some(indicator) => {
                    self.advance();
                    Ok(indicator)
                }
                None => Err(self.error_here(format!(
                    "expected a type indicator, found {}",
                    self.found_desc()
                ))),
            },
            _ => Err(self.error_here(format!(
                "expected a type indicator, found {}",
                self.found_desc()
            ))),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        match self.current_token() {
            Some(Token::True) => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            Some(Token::Int(n)) => {
                let n = *n;
                self.advance();
                Ok(Expr::new(ExprKind::Int(n), span))
            }
            Some(Token::Real(r)) => {
                let r = *r;
                self.advance();
                Ok(Expr::new(ExprKind::Real(r), span))
            }
            Some(Token::Str(_)) => match self.advance() {
                Some(Token::Str(s)) => Ok(Expr::new(ExprKind::Str(Rc::from(s.as_str())), span)),
                _ => unreachable!(),
            },
            Some(Token::Ident(_)) => {
                let name = self.expect_ident()?;
                Ok(Expr::new(ExprKind::Ident(name), span))
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => self.parse_array_literal(),
            Some(Token::LBrace) => self.parse_tuple_literal(),
            Some(Token::Func) => self.parse_function_literal(),
            _ => Err(self.error_here(format!(
                "expected an expression, found {}",
                self.found_desc()
            ))),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        self.expect(&Token::LBracket)?;
        let mut elements = Vec::new();
        if !matches!(self.current_token(), Some(Token::RBracket)) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.check(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RBracket)?;
        Ok(Expr::new(
            ExprKind::Array(elements),
            start.merge(self.prev_span()),
        ))
    }

    fn parse_tuple_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        if !matches!(self.current_token(), Some(Token::RBrace)) {
            loop {
                // `IDENT :=` starts a named entry; anything else is an
                // anonymous slot.
                let named = matches!(self.current_token(), Some(Token::Ident(_)))
                    && matches!(self.peek_at(1), Some(Token::Assign));
                let entry = if named {
                    let name = self.expect_ident()?;
                    self.expect(&Token::Assign)?;
                    let value = self.parse_expression()?;
                    TupleEntry { name, value }
                } else {
                    TupleEntry {
                        name: Rc::from(""),
                        value: self.parse_expression()?,
                    }
                };
                entries.push(entry);
                if !self.check(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::new(
            ExprKind::Tuple(entries),
            start.merge(self.prev_span()),
        ))
    }

    fn parse_function_literal(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        self.expect(&Token::Func)?;

        // The parameter list is optional in its entirety.
        let mut params = Vec::new();
        if self.check(&Token::LParen) {
            if !matches!(self.current_token(), Some(Token::RParen)) {
                loop {
                    params.push(self.expect_ident()?);
                    if !self.check(&Token::Comma) {
                        break;
                    }
                }
            }
            self.expect(&Token::RParen)?;
        }

        let body = if self.check(&Token::Arrow) {
            // Short form: one expression statement.
            vec![Stmt::Expr(self.parse_expression()?)]
        } else {
            self.expect(&Token::Is)?;
            let body = self.parse_body(&[Token::End])?;
            self.expect(&Token::End)?;
            body
        };

        Ok(Expr::new(
            ExprKind::Func {
                params,
                body: Rc::new(body),
            },
            start.merge(self.prev_span()),
        ))
    }
}

fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
