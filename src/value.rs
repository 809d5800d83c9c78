use std::fmt;
use std::rc::Rc;

use crate::ast::{Stmt, TypeIndicator};
use crate::interpreter::environment::Env;
use crate::interpreter::error::RuntimeError;

#[derive(Debug, Clone)]
pub enum Value {
    Empty,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(Rc<str>),
    Array(Rc<Vec<Value>>),
    Tuple(Rc<Vec<(Rc<str>, Value)>>),
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
}

/// A function literal together with the environment reference captured
/// where it was written.
#[derive(Clone)]
pub struct Closure {
    pub params: Vec<Rc<str>>,
    pub body: Rc<Vec<Stmt>>,
    pub env: Env,
}

impl fmt::Debug for Closure {
    // The captured environment may contain this closure; keep Debug shallow.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure(/{})", self.params.len())
    }
}

pub type HostFn = Rc<dyn Fn(&[Value]) -> Result<Value, RuntimeError>>;

/// A host function embedded as a callable value.
#[derive(Clone)]
pub struct Builtin {
    pub name: Rc<str>,
    pub func: HostFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Int(left), Value::Int(right)) => left == right,
            (Value::Real(left), Value::Real(right)) => left == right,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Tuple(left), Value::Tuple(right)) => left == right,
            (Value::Closure(left), Value::Closure(right)) => Rc::ptr_eq(left, right),
            (Value::Builtin(left), Value::Builtin(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Closure(_) | Value::Builtin(_) => "func",
        }
    }

    /// The `is` test: total, and exactly one indicator holds per value.
    pub fn matches_indicator(&self, indicator: TypeIndicator) -> bool {
        self.type_name() == indicator.as_str()
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(b) = self { Some(*b) } else { None }
    }

    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(n) = self { Some(*n) } else { None }
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Empty => "empty".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Real(r) => format_real(*r),
        Value::Str(s) => s.to_string(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(value_to_display).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Tuple(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(name, v)| {
                    if name.is_empty() {
                        value_to_display(v)
                    } else {
                        format!("{} := {}", name, value_to_display(v))
                    }
                })
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
        Value::Closure(_) => "<func>".to_string(),
        Value::Builtin(b) => format!("<builtin:{}>", b.name),
    }
}

/// Like `value_to_string`, but quotes strings; used for nested values
/// and error messages.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{}\"", s),
        _ => value_to_string(value),
    }
}

fn format_real(r: f64) -> String {
    let rendered = format!("{:?}", r);
    if rendered.contains('.') || rendered.contains('e') || rendered.contains("inf") || rendered.contains("NaN") {
        rendered
    } else {
        format!("{}.0", r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", value_to_string(self))
    }
}
