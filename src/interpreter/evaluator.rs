use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, ExprKind, Iterable, MemberKey, Stmt, UnaryOp};
use crate::diagnostic::Span;
use crate::value::{Closure, Value};

use super::builtins;
use super::environment::Env;
use super::error::RuntimeError;
use super::parser::parse_program;

pub struct Interpreter {
    env: Env,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self { env: Env::new() }
    }

    pub fn with_env(env: Env) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Run a program; the result is the value of its last statement, or
    /// `Empty` for an empty program.
    pub fn run(&self, program: &[Stmt]) -> Result<Value, RuntimeError> {
        let env = self.env.clone();
        self.exec_block(&env, program)
    }

    fn exec_block(&self, env: &Env, body: &[Stmt]) -> Result<Value, RuntimeError> {
        let mut last = Value::Empty;
        for statement in body {
            last = self.exec_statement(env, statement)?;
        }
        Ok(last)
    }

    fn exec_statement(&self, env: &Env, statement: &Stmt) -> Result<Value, RuntimeError> {
        match statement {
            Stmt::Var { name, init } => {
                let value = self.evaluate(env, init)?;
                env.define(name, value.clone());
                Ok(value)
            }
            Stmt::Assign { target, value } => match &target.kind {
                ExprKind::Ident(name) => {
                    let value = self.evaluate(env, value)?;
                    if env.assign(name, value.clone()) {
                        Ok(value)
                    } else {
                        Err(RuntimeError::setting(name.as_ref(), target.span))
                    }
                }
                other => Err(RuntimeError::type_mismatch(
                    "an assignable name",
                    lvalue_desc(other),
                    target.span,
                )),
            },
            Stmt::Expr(expr) => self.evaluate(env, expr),
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => match self.evaluate(env, cond)? {
                // Branches run in the same environment; there is no
                // block scope.
                Value::Bool(true) => self.exec_block(env, then_body),
                Value::Bool(false) => self.exec_block(env, else_body),
                other => Err(RuntimeError::type_mismatch(
                    "bool",
                    other.type_name(),
                    cond.span,
                )),
            },
            Stmt::While { cond, body } => {
                loop {
                    match self.evaluate(env, cond)? {
                        Value::Bool(true) => {
                            self.exec_block(env, body)?;
                        }
                        Value::Bool(false) => break,
                        other => {
                            return Err(RuntimeError::type_mismatch(
                                "bool",
                                other.type_name(),
                                cond.span,
                            ));
                        }
                    }
                }
                Ok(Value::Empty)
            }
            Stmt::For {
                var,
                iterable,
                body,
            } => {
                match iterable {
                    Iterable::Range(lo, hi) => {
                        let lo_val = self.int_operand(env, lo)?;
                        let hi_val = self.int_operand(env, hi)?;
                        for i in lo_val..hi_val {
                            env.define(var, Value::Int(i));
                            self.exec_block(env, body)?;
                        }
                    }
                    Iterable::Expr(expr) => match self.evaluate(env, expr)? {
                        Value::Array(items) => {
                            for item in items.iter() {
                                env.define(var, item.clone());
                                self.exec_block(env, body)?;
                            }
                        }
                        other => {
                            return Err(RuntimeError::type_mismatch(
                                "array",
                                other.type_name(),
                                expr.span,
                            ));
                        }
                    },
                }
                Ok(Value::Empty)
            }
        }
    }

    fn evaluate(&self, env: &Env, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Empty => Ok(Value::Empty),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Real(r) => Ok(Value::Real(*r)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),

            ExprKind::Ident(name) => env
                .lookup(name)
                .ok_or_else(|| RuntimeError::reading(name.as_ref(), expr.span)),

            ExprKind::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(env, element)?);
                }
                Ok(Value::Array(Rc::new(values)))
            }

            ExprKind::Tuple(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for entry in entries {
                    let value = self.evaluate(env, &entry.value)?;
                    values.push((entry.name.clone(), value));
                }
                Ok(Value::Tuple(Rc::new(values)))
            }

            // The environment is captured by reference, not snapshot:
            // later writes in the defining scope stay visible.
            ExprKind::Func { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),

            ExprKind::Index { target, index } => {
                let container = self.evaluate(env, target)?;
                let index_val = self.evaluate(env, index)?;
                self.eval_index(container, index_val, target.span, index.span, expr.span)
            }

            ExprKind::Member { target, key } => {
                let container = self.evaluate(env, target)?;
                self.eval_member(container, key, target.span, expr.span)
            }

            ExprKind::Call { callee, args } => {
                let callee_val = self.evaluate(env, callee)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.evaluate(env, arg)?);
                }
                match callee_val {
                    Value::Builtin(builtin) => {
                        (builtin.func)(&arg_vals).map_err(|e| e.or_span(expr.span))
                    }
                    Value::Closure(closure) => {
                        if arg_vals.len() != closure.params.len() {
                            return Err(RuntimeError::num_args(
                                closure.params.len(),
                                arg_vals,
                                expr.span,
                            ));
                        }
                        let call_env = closure
                            .env
                            .bind_vars(closure.params.iter().cloned().zip(arg_vals));
                        self.exec_block(&call_env, &closure.body)
                    }
                    Value::Empty => Err(RuntimeError::null_access(callee.span)),
                    other => Err(RuntimeError::not_function(
                        "call target is not callable",
                        &other,
                        callee.span,
                    )),
                }
            }

            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(env, operand)?;
                self.eval_unary(*op, value, operand.span, expr.span)
            }

            // Both operands are always evaluated; the logical operators
            // do not short-circuit.
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_val = self.evaluate(env, lhs)?;
                let rhs_val = self.evaluate(env, rhs)?;
                self.eval_binary(*op, lhs_val, rhs_val, lhs.span, rhs.span, expr.span)
            }

            ExprKind::Is { operand, indicator } => {
                let value = self.evaluate(env, operand)?;
                Ok(Value::Bool(value.matches_indicator(*indicator)))
            }
        }
    }

    fn eval_index(
        &self,
        container: Value,
        index: Value,
        target_span: Span,
        index_span: Span,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match (&container, &index) {
            (Value::Array(items), Value::Int(i)) => {
                if *i < 0 || *i as usize >= items.len() {
                    Err(RuntimeError::attribute(&container, i.to_string(), span))
                } else {
                    Ok(items[*i as usize].clone())
                }
            }
            // Strings are byte sequences; indexing yields a
            // one-character string.
            (Value::Str(s), Value::Int(i)) => {
                let bytes = s.as_bytes();
                if *i < 0 || *i as usize >= bytes.len() {
                    Err(RuntimeError::attribute(&container, i.to_string(), span))
                } else {
                    let i = *i as usize;
                    let ch = String::from_utf8_lossy(&bytes[i..i + 1]).into_owned();
                    Ok(Value::Str(Rc::from(ch)))
                }
            }
            (Value::Empty, _) | (_, Value::Empty) => Err(RuntimeError::null_access(span)),
            (Value::Array(_) | Value::Str(_), other) => Err(RuntimeError::type_mismatch(
                "int",
                other.type_name(),
                index_span,
            )),
            (other, _) => Err(RuntimeError::type_mismatch(
                "array or string",
                other.type_name(),
                target_span,
            )),
        }
    }

    fn eval_member(
        &self,
        container: Value,
        key: &MemberKey,
        target_span: Span,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match &container {
            Value::Tuple(entries) => match key {
                // Duplicate names are legal; the first match wins.
                MemberKey::Name(name) => entries
                    .iter()
                    .find(|(entry_name, _)| entry_name.as_ref() == name.as_ref())
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| RuntimeError::attribute(&container, name.to_string(), span)),
                MemberKey::Index(i) => {
                    if *i < 0 || *i as usize >= entries.len() {
                        Err(RuntimeError::attribute(&container, i.to_string(), span))
                    } else {
                        Ok(entries[*i as usize].1.clone())
                    }
                }
            },
            Value::Empty => Err(RuntimeError::null_access(span)),
            other => Err(RuntimeError::type_mismatch(
                "tuple",
                other.type_name(),
                target_span,
            )),
        }
    }

    fn eval_unary(
        &self,
        op: UnaryOp,
        value: Value,
        operand_span: Span,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match (op, &value) {
            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::other_at("integer overflow", span)),
            (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
            (UnaryOp::Pos, Value::Int(n)) => Ok(Value::Int(*n)),
            (UnaryOp::Pos, Value::Real(r)) => Ok(Value::Real(*r)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (_, Value::Empty) => Err(RuntimeError::null_access(span)),
            (UnaryOp::Not, other) => Err(RuntimeError::type_mismatch(
                "bool",
                other.type_name(),
                operand_span,
            )),
            (_, other) => Err(RuntimeError::type_mismatch(
                "int or real",
                other.type_name(),
                operand_span,
            )),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        lhs_span: Span,
        rhs_span: Span,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        use BinaryOp::*;
        match op {
            And | Or | Xor => {
                let a = bool_operand(&lhs, lhs_span)?;
                let b = bool_operand(&rhs, rhs_span)?;
                Ok(Value::Bool(match op {
                    And => a && b,
                    Or => a || b,
                    Xor => a != b,
                    _ => unreachable!(),
                }))
            }
            Eq => Ok(Value::Bool(values_equal(&lhs, &rhs, span)?)),
            Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs, span)?)),
            // Ordering is numeric only; both sides go through real.
            Lt | Le | Gt | Ge => {
                let a = numeric_operand(&lhs, lhs_span)?;
                let b = numeric_operand(&rhs, rhs_span)?;
                Ok(Value::Bool(match op {
                    Lt => a < b,
                    Le => a <= b,
                    Gt => a > b,
                    Ge => a >= b,
                    _ => unreachable!(),
                }))
            }
            Add => self.eval_add(lhs, rhs, span),
            Sub | Mul => self.eval_numeric(op, lhs, rhs, span),
            Div => self.eval_div(lhs, rhs, span),
        }
    }

    fn eval_add(&self, lhs: Value, rhs: Value, span: Span) -> Result<Value, RuntimeError> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::other_at("integer overflow", span)),
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(a as f64 + b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a + b as f64)),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a + b)),
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(&a);
                joined.push_str(&b);
                Ok(Value::Str(Rc::from(joined)))
            }
            (Value::Array(a), Value::Array(b)) => {
                let mut items = a.as_ref().clone();
                items.extend(b.iter().cloned());
                Ok(Value::Array(Rc::new(items)))
            }
            // Keys come along, duplicates included; lookup still finds
            // the first match.
            (Value::Tuple(a), Value::Tuple(b)) => {
                let mut entries = a.as_ref().clone();
                entries.extend(b.iter().cloned());
                Ok(Value::Tuple(Rc::new(entries)))
            }
            (Value::Empty, _) | (_, Value::Empty) => Err(RuntimeError::null_access(span)),
            (l, r) => Err(RuntimeError::type_mismatch(
                "two numbers, strings, arrays, or tuples",
                format!("{} and {}", l.type_name(), r.type_name()),
                span,
            )),
        }
    }

    fn eval_numeric(
        &self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match op {
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    _ => unreachable!(),
                };
                result
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::other_at("integer overflow", span))
            }
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(apply_real(op, a as f64, b))),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(apply_real(op, a, b as f64))),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(apply_real(op, a, b))),
            (Value::Empty, _) | (_, Value::Empty) => Err(RuntimeError::null_access(span)),
            (l, r) => Err(RuntimeError::type_mismatch(
                "two numbers",
                format!("{} and {}", l.type_name(), r.type_name()),
                span,
            )),
        }
    }

    fn eval_div(&self, lhs: Value, rhs: Value, span: Span) -> Result<Value, RuntimeError> {
        match (lhs, rhs) {
            // Integer division is the truncating quotient.
            (Value::Int(a), Value::Int(b)) => {
                if b == 0 {
                    Err(RuntimeError::other_at("integer division by zero", span))
                } else {
                    a.checked_div(b)
                        .map(Value::Int)
                        .ok_or_else(|| RuntimeError::other_at("integer overflow", span))
                }
            }
            // Mixed and real division follow IEEE-754.
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(a as f64 / b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a / b as f64)),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a / b)),
            (Value::Empty, _) | (_, Value::Empty) => Err(RuntimeError::null_access(span)),
            (l, r) => Err(RuntimeError::type_mismatch(
                "two numbers",
                format!("{} and {}", l.type_name(), r.type_name()),
                span,
            )),
        }
    }

    fn int_operand(&self, env: &Env, expr: &Expr) -> Result<i64, RuntimeError> {
        match self.evaluate(env, expr)? {
            Value::Int(n) => Ok(n),
            other => Err(RuntimeError::type_mismatch(
                "int",
                other.type_name(),
                expr.span,
            )),
        }
    }
}

fn lvalue_desc(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Index { .. } => "an index expression",
        ExprKind::Member { .. } => "a member expression",
        ExprKind::Call { .. } => "a call",
        _ => "an expression",
    }
}

fn bool_operand(value: &Value, span: Span) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Empty => Err(RuntimeError::null_access(span)),
        other => Err(RuntimeError::type_mismatch(
            "bool",
            other.type_name(),
            span,
        )),
    }
}

fn numeric_operand(value: &Value, span: Span) -> Result<f64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Real(r) => Ok(*r),
        Value::Empty => Err(RuntimeError::null_access(span)),
        other => Err(RuntimeError::type_mismatch(
            "int or real",
            other.type_name(),
            span,
        )),
    }
}

/// Scalar equality: same-kind values compare by value, mixed numerics
/// promote to real, and `empty` equals only itself. Compound values and
/// functions are not comparable.
fn values_equal(a: &Value, b: &Value, span: Span) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Empty, Value::Empty) => Ok(true),
        (Value::Empty, _) | (_, Value::Empty) => Ok(false),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Int(x), Value::Real(y)) => Ok((*x as f64) == *y),
        (Value::Real(x), Value::Int(y)) => Ok(*x == (*y as f64)),
        (Value::Real(x), Value::Real(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (l, r) => Err(RuntimeError::type_mismatch(
            "comparable values",
            format!("{} and {}", l.type_name(), r.type_name()),
            span,
        )),
    }
}

fn apply_real(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        _ => unreachable!(),
    }
}

/// Run a program in an existing environment.
pub fn exec(env: &Env, program: &[Stmt]) -> Result<Value, RuntimeError> {
    Interpreter::with_env(env.clone()).run(program)
}

/// Convenience for hosts and tests: parse, install the standard
/// built-ins, run, and flatten both error kinds to strings.
pub fn parse_and_run(source: &str) -> Result<Value, String> {
    let program = parse_program(source).map_err(|e| format!("Parse error: {}", e))?;
    let env = Env::new();
    builtins::install(&env);
    Interpreter::with_env(env)
        .run(&program)
        .map_err(|e| format!("Runtime error: {}", e))
}

/// Like `parse_and_run`, but keeps errors structured for rendering.
pub fn parse_and_run_with_diagnostics(
    source: &str,
) -> Result<Value, Vec<crate::diagnostic::Diagnostic>> {
    let program = match parse_program(source) {
        Ok(program) => program,
        Err(e) => return Err(vec![e.to_diagnostic()]),
    };
    let env = Env::new();
    builtins::install(&env);
    match Interpreter::with_env(env).run(&program) {
        Ok(value) => Ok(value),
        Err(e) => Err(vec![e.to_diagnostic()]),
    }
}
